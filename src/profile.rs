//! Profile-level aggregation.
//!
//! [`ProfileAggregator`] accumulates per-publication results into a
//! [`ProfileResult`] as a traversal progresses. It can hand out a partial
//! snapshot at any point without finalizing.

use crate::aggregate::PaperResult;
use crate::records::{CitationRecord, Publication};
use crate::source::AuthorProfile;
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Timestamp format of `last_updated` in partial snapshots.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Marker distinguishing a partial snapshot from a final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    InProgress,
}

/// One self-citation found while inspecting a publication's citing works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfCitationDetail {
    pub paper_index: usize,
    pub original_paper: String,
    pub original_authors: String,
    pub original_year: Option<i32>,
    pub citing_paper: String,
    pub citing_authors: String,
    pub citing_year: Option<i32>,
}

impl SelfCitationDetail {
    fn new(publication: &Publication, citation: &CitationRecord) -> Self {
        Self {
            paper_index: publication.index,
            original_paper: publication.title.clone(),
            original_authors: publication.authors.clone(),
            original_year: publication.year,
            citing_paper: citation.title.clone(),
            citing_authors: citation.authors.clone(),
            citing_year: citation.year,
        }
    }
}

/// Aggregate self-citation statistics for one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResult {
    pub author: AuthorProfile,
    pub total_papers: usize,
    pub analyzed_papers: usize,
    pub total_citations: u64,
    /// Mix of exact counts and sampled estimates
    pub self_citations: u64,
    pub self_citation_percentage: f64,
    pub self_citation_details: Vec<SelfCitationDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SnapshotStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl ProfileResult {
    /// A zero-valued result for `author`.
    pub fn empty(author: AuthorProfile) -> Self {
        Self {
            author,
            total_papers: 0,
            analyzed_papers: 0,
            total_citations: 0,
            self_citations: 0,
            self_citation_percentage: 0.0,
            self_citation_details: Vec::new(),
            status: None,
            last_updated: None,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.status == Some(SnapshotStatus::InProgress)
    }
}

/// `self_citations / total_citations * 100`, or 0 when there are no citations.
pub fn self_citation_percentage(self_citations: u64, total_citations: u64) -> f64 {
    if total_citations == 0 {
        0.0
    } else {
        self_citations as f64 / total_citations as f64 * 100.0
    }
}

/// Running totals of a profile traversal.
#[derive(Debug, Clone)]
pub struct ProfileAggregator {
    result: ProfileResult,
    estimated_papers: usize,
}

impl ProfileAggregator {
    pub fn new(author: AuthorProfile, total_papers: usize) -> Self {
        let mut result = ProfileResult::empty(author);
        result.total_papers = total_papers;
        Self {
            result,
            estimated_papers: 0,
        }
    }

    /// Add one publication's tally and its self-citation details.
    pub fn record_paper(
        &mut self,
        publication: &Publication,
        citations: &[CitationRecord],
        paper: &PaperResult,
    ) {
        self.result.total_citations += u64::from(publication.citation_count);
        self.result.self_citations += paper.self_citations;
        if !paper.exact {
            self.estimated_papers += 1;
        }

        self.result.self_citation_details.extend(
            citations
                .iter()
                .filter(|c| c.is_self_citation)
                .map(|c| SelfCitationDetail::new(publication, c)),
        );

        self.result.self_citation_percentage =
            self_citation_percentage(self.result.self_citations, self.result.total_citations);
    }

    /// Count one more publication as processed, whether or not it had citations.
    pub fn mark_analyzed(&mut self) {
        self.result.analyzed_papers += 1;
    }

    /// Publications whose contribution is a sampled estimate.
    pub fn estimated_papers(&self) -> usize {
        self.estimated_papers
    }

    pub fn current(&self) -> &ProfileResult {
        &self.result
    }

    /// Copy of the running result marked as in progress, stamped with the local time.
    pub fn partial_snapshot(&self) -> ProfileResult {
        let mut snapshot = self.result.clone();
        snapshot.status = Some(SnapshotStatus::InProgress);
        snapshot.last_updated = Some(Local::now().format(TIMESTAMP_FORMAT).to_string());
        snapshot
    }

    pub fn finish(self) -> ProfileResult {
        self.result
    }
}
