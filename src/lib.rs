//! # rustselfcite
//!
//! Google Scholar self-citation analyzer.
//!
//! Reads an author's publication list from a Scholar profile, follows each
//! publication's "Cited by" listing and estimates what share of the citations
//! come from works sharing an author with the cited paper.
//!
//! ## Modules
//!
//! - [`authors`] - Author name normalization
//! - [`matching`] - Author identity matching and overlap detection
//! - [`records`] - Publication and citation record extraction
//! - [`aggregate`] - Per-publication exact or estimated self-citation counts
//! - [`profile`] - Profile-level totals and partial snapshots
//! - [`analyzer`] - The profile traversal
//! - [`snapshot`] - JSON/CSV persistence of results
//! - [`source`] - The page-retrieval boundary
//! - [`gscholar`] - HTTP Google Scholar client
//! - [`cookies`] - Cookie persistence
//! - [`config`] - Analysis and client settings
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustselfcite::{analyze_profile, AnalysisOptions, ClientOptions, ScholarClient};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScholarClient::new(ClientOptions::default())?;
//!     let outcome = analyze_profile(
//!         &client,
//!         "https://scholar.google.com/citations?user=XXXXXXXXXXXX",
//!         &AnalysisOptions::default(),
//!         None,
//!         &CancellationToken::new(),
//!     )
//!     .await;
//!     println!("{:.2}% self-citations", outcome.result.self_citation_percentage);
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod analyzer;
pub mod authors;
pub mod config;
pub mod cookies;
pub mod error;
pub mod gscholar;
pub mod matching;
pub mod profile;
pub mod records;
pub mod snapshot;
pub mod source;

pub use analyzer::{analyze_profile, AnalysisOutcome};
pub use config::{AnalysisOptions, ClientOptions};
pub use error::{Result, SelfCiteError};
pub use gscholar::ScholarClient;
pub use profile::ProfileResult;
