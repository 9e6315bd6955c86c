//! Analysis and client settings.

use std::path::PathBuf;
use std::time::Duration;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Default number of publications between partial snapshots
pub const DEFAULT_SNAPSHOT_EVERY: usize = 5;

/// Limits and cadence of one profile traversal.
///
/// A limit of 0 means no limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Analyze at most this many publications
    pub max_papers: Option<usize>,
    /// Inspect at most this many citing works per publication
    pub max_citations_per_paper: Option<usize>,
    /// Write a partial snapshot every N publications
    pub snapshot_every: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_papers: None,
            max_citations_per_paper: None,
            snapshot_every: DEFAULT_SNAPSHOT_EVERY,
        }
    }
}

impl AnalysisOptions {
    /// Effective publication limit.
    pub fn paper_limit(&self) -> Option<usize> {
        self.max_papers.filter(|&max| max > 0)
    }

    /// Effective per-publication sampling cap.
    pub fn citation_cap(&self) -> Option<usize> {
        self.max_citations_per_paper.filter(|&max| max > 0)
    }
}

/// Settings of the HTTP Scholar client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Scholar base URL, or a mirror
    pub base_url: String,
    /// Proxy URL (e.g., "http://127.0.0.1:7890")
    pub proxy: Option<String>,
    /// Pause for the operator to solve CAPTCHAs instead of giving up
    pub interactive: bool,
    /// Attempts per page before failing open; CAPTCHA pauses do not count
    pub max_attempts: u32,
    /// First retry delay, doubled on each further attempt
    pub initial_backoff: Duration,
    /// Lower bound of the random delay before each request
    pub min_delay: Duration,
    /// Upper bound of the random delay before each request
    pub max_delay: Duration,
    /// Cookie file; `None` uses the default location
    pub cookie_path: Option<PathBuf>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SCHOLAR_URL.to_string(),
            proxy: None,
            interactive: false,
            max_attempts: 3,
            initial_backoff: Duration::from_secs(5),
            min_delay: Duration::from_millis(2000),
            max_delay: Duration::from_millis(5000),
            cookie_path: None,
        }
    }
}
