//! Typed publication and citation records.
//!
//! Turns the raw field bundles produced by a [`ScholarSource`](crate::source::ScholarSource)
//! into [`Publication`]s and [`CitationRecord`]s. The self-citation flag of a
//! citation is decided once, here, against the cited publication's authors.

use crate::authors::AuthorSet;
use crate::error::{OptionExt, Result};
use crate::matching::has_overlap;
use crate::source::{RawCitation, RawPublication};
use regex::Regex;
use std::sync::LazyLock;

/// Bracketed tags such as "[PDF]", "[HTML]" or "[CITATION]".
static BRACKET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid bracket tag regex"));

/// Dash separating the fields of an info line. A leading dash marks an empty author field.
static FIELD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s+)[-‐–—]\s+").expect("valid separator regex"));

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid year regex"));

/// One work of the profile owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub title: String,
    pub url: Option<String>,
    pub authors: String,
    pub author_list: AuthorSet,
    pub citation_count: u32,
    /// Present only when `citation_count > 0`
    pub citation_url: Option<String>,
    pub venue: String,
    pub year: Option<i32>,
    /// 1-based position in the profile's list
    pub index: usize,
}

impl Publication {
    /// Whether there is anything to follow for this publication.
    pub fn has_citations(&self) -> bool {
        self.citation_count > 0 && self.citation_url.is_some()
    }
}

/// One work citing a [`Publication`].
#[derive(Debug, Clone, PartialEq)]
pub struct CitationRecord {
    pub title: String,
    pub url: Option<String>,
    pub authors: String,
    pub author_list: AuthorSet,
    pub year: Option<i32>,
    pub venue: String,
    pub is_self_citation: bool,
}

/// Build a [`Publication`] from one raw profile row.
///
/// `index` is the row's 1-based position. Rows without a title are rejected.
pub fn extract_publication(raw: &RawPublication, index: usize) -> Result<Publication> {
    let title = non_empty(raw.title.trim())
        .ok_or_extract(&format!("publication #{index} has no title"))?;

    let citation_count = parse_citation_count(&raw.citation_count);
    let citation_url = if citation_count > 0 {
        raw.citation_url.as_deref().and_then(non_empty).map(str::to_string)
    } else {
        None
    };

    Ok(Publication {
        title: title.to_string(),
        url: raw.url.as_deref().and_then(non_empty).map(str::to_string),
        authors: raw.authors.trim().to_string(),
        author_list: AuthorSet::parse(&raw.authors),
        citation_count,
        citation_url,
        venue: raw.venue.trim().to_string(),
        year: parse_year_text(&raw.year),
        index,
    })
}

/// Build a [`CitationRecord`] for a work citing a publication by `original_authors`.
///
/// Entries whose title is empty once bracketed tags are removed are rejected.
pub fn extract_citation(raw: &RawCitation, original_authors: &AuthorSet) -> Result<CitationRecord> {
    let title = strip_bracket_tags(&raw.title);
    let title = non_empty(&title).ok_or_extract("citing work has no title")?;

    let info = raw.info.trim();
    let mut fields = FIELD_SEPARATOR.split(info);
    let authors = fields.next().unwrap_or_default().trim().to_string();
    let venue = fields.next().map(str::trim).unwrap_or_default().to_string();

    let author_list = AuthorSet::parse(&authors);
    let is_self_citation = has_overlap(original_authors, &author_list);

    Ok(CitationRecord {
        title: title.to_string(),
        url: raw.url.as_deref().and_then(non_empty).map(str::to_string),
        authors,
        author_list,
        year: find_year(info),
        venue,
        is_self_citation,
    })
}

/// Remove "[...]" tags and surrounding whitespace from a title.
pub fn strip_bracket_tags(title: &str) -> String {
    BRACKET_TAG.replace_all(title, "").trim().to_string()
}

/// First 4-digit year between 1900 and 2099 anywhere in `text`.
pub fn find_year(text: &str) -> Option<i32> {
    YEAR.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Citation count shown in the profile table; a trailing `*` marks merged counts.
fn parse_citation_count(text: &str) -> u32 {
    text.trim().trim_end_matches('*').parse().unwrap_or(0)
}

fn parse_year_text(text: &str) -> Option<i32> {
    let text = text.trim();
    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}
