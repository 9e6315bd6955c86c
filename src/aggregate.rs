//! Per-publication self-citation counting.
//!
//! When every citing work of a publication was inspected the count is exact.
//! When only a sample was inspected (the per-paper cap is below the publication's
//! citation count) the sample's self-citation ratio is scaled up to the full
//! citation count and the result is marked as an estimate. Halfway projections
//! round to the nearest even count.

use crate::records::CitationRecord;
use serde::Serialize;

/// Why a publication contributed nothing despite having citations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperWarning {
    /// Sampling was required but no citing works were retrieved
    EmptySample,
}

/// Self-citation tally for one publication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperResult {
    /// Self-citations among the inspected citing works
    pub matched: usize,
    /// Number of citing works inspected
    pub inspected: usize,
    /// Contribution to the profile total: `matched` when exact, a projection otherwise
    pub self_citations: u64,
    pub exact: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<PaperWarning>,
}

impl PaperResult {
    /// Self-citation ratio of the inspected sample, if anything was inspected.
    pub fn sample_ratio(&self) -> Option<f64> {
        (self.inspected > 0).then(|| self.matched as f64 / self.inspected as f64)
    }
}

/// Tally the citing works retrieved for a publication with `citation_count` citations.
///
/// `cap` is the configured per-paper sampling cap, `None` when uncapped.
pub fn aggregate_paper(
    records: &[CitationRecord],
    citation_count: u32,
    cap: Option<usize>,
) -> PaperResult {
    let inspected = records.len();
    let matched = records.iter().filter(|r| r.is_self_citation).count();

    let sampled = cap.is_some_and(|cap| cap < citation_count as usize);
    if !sampled {
        return PaperResult {
            matched,
            inspected,
            self_citations: matched as u64,
            exact: true,
            warning: None,
        };
    }

    if inspected == 0 {
        return PaperResult {
            matched,
            inspected,
            self_citations: 0,
            exact: false,
            warning: Some(PaperWarning::EmptySample),
        };
    }

    let ratio = matched as f64 / inspected as f64;
    PaperResult {
        matched,
        inspected,
        self_citations: (ratio * f64::from(citation_count)).round_ties_even() as u64,
        exact: false,
        warning: None,
    }
}
