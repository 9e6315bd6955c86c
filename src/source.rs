//! The page-retrieval boundary.
//!
//! The analysis core never talks to Google Scholar directly. It asks a
//! [`ScholarSource`] for already-extracted raw text fields and turns them into
//! typed records itself. Sources fail open: a page that cannot be retrieved is
//! reported as an empty result, not an error.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Placeholder name used when the profile header cannot be read.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Identity of the profile owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl AuthorProfile {
    /// The identity reported when the profile page could not be read.
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_AUTHOR.to_string(),
            affiliation: None,
        }
    }
}

impl Default for AuthorProfile {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Raw text of one row of the profile's publication table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPublication {
    pub title: String,
    pub url: Option<String>,
    pub authors: String,
    pub citation_count: String,
    pub citation_url: Option<String>,
    pub venue: String,
    pub year: String,
}

/// Raw text of one entry on a "Cited by" page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCitation {
    /// Title as displayed, possibly with tags such as "[PDF]"
    pub title: String,
    pub url: Option<String>,
    /// "Authors - Venue, Year - Source"
    pub info: String,
}

/// Something that can retrieve Google Scholar pages as raw field bundles.
///
/// Implementations handle pagination, retries and rate limiting. They must stop
/// paginating as soon as `cancel` is triggered and return what they have.
#[allow(async_fn_in_trait)]
pub trait ScholarSource {
    /// Profile owner's name and affiliation, or [`AuthorProfile::unknown`].
    async fn fetch_author_profile(&self, profile_url: &str) -> AuthorProfile;

    /// The profile's publications in display order, at most `max_papers`.
    async fn fetch_publication_list(
        &self,
        profile_url: &str,
        max_papers: Option<usize>,
        cancel: &CancellationToken,
    ) -> Vec<RawPublication>;

    /// Works citing one publication, at most `max_citations`.
    async fn fetch_citing_works(
        &self,
        citation_url: &str,
        max_citations: Option<usize>,
        cancel: &CancellationToken,
    ) -> Vec<RawCitation>;
}
