//! Profile traversal.
//!
//! Walks a profile's publications in order, one at a time: retrieve the citing
//! works of each cited publication, flag self-citations, tally the publication
//! and fold it into the running [`ProfileResult`]. Nothing that goes wrong with
//! a single publication or citation stops the walk.
//!
//! The walk checks `cancel` between publications and returns whatever has been
//! accumulated when it fires.

use crate::aggregate::{aggregate_paper, PaperWarning};
use crate::config::AnalysisOptions;
use crate::profile::{ProfileAggregator, ProfileResult};
use crate::records::{extract_citation, extract_publication, CitationRecord, Publication};
use crate::snapshot::SnapshotSink;
use crate::source::ScholarSource;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of one traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub result: ProfileResult,
    /// Whether the final result was written to the snapshot sink
    pub saved: bool,
}

/// Analyze the self-citations of the profile at `profile_url`.
///
/// Partial snapshots go to `sink` every `options.snapshot_every` publications,
/// and the final result once the walk ends, cancelled or not.
pub async fn analyze_profile<S: ScholarSource>(
    source: &S,
    profile_url: &str,
    options: &AnalysisOptions,
    sink: Option<&dyn SnapshotSink>,
    cancel: &CancellationToken,
) -> AnalysisOutcome {
    info!(url = profile_url, "Starting analysis");
    info!(
        max_papers = ?options.paper_limit(),
        max_citations_per_paper = ?options.citation_cap(),
        "Settings"
    );

    let author = source.fetch_author_profile(profile_url).await;
    info!(author = %author.name, "Getting publications");

    let mut raw_publications = source
        .fetch_publication_list(profile_url, options.paper_limit(), cancel)
        .await;
    if let Some(max) = options.paper_limit() {
        raw_publications.truncate(max);
    }

    let publications: Vec<Publication> = raw_publications
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| match extract_publication(raw, i + 1) {
            Ok(publication) => Some(publication),
            Err(e) => {
                error!(index = i + 1, error = %e, "Error extracting publication");
                None
            }
        })
        .collect();

    let mut aggregator = ProfileAggregator::new(author, publications.len());

    if publications.is_empty() {
        warn!("No publications found. Check if the profile is accessible.");
    } else {
        info!(count = publications.len(), "Found publications");
    }

    let snapshot_every = options.snapshot_every.max(1);
    let total = publications.len();

    for (i, publication) in publications.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(analyzed = i, total, "Analysis cancelled, keeping partial results");
            break;
        }

        info!(
            "[{}/{}] Analyzing: {}",
            i + 1,
            total,
            truncate_title(&publication.title, 50)
        );
        if !analyze_publication(source, publication, options, &mut aggregator, cancel).await {
            warn!(
                paper = publication.index,
                analyzed = i,
                total,
                "Analysis cancelled mid-publication, discarding its citations"
            );
            break;
        }
        aggregator.mark_analyzed();

        if i % snapshot_every == 0 {
            if let Some(sink) = sink {
                if let Err(e) = sink.save_partial(&aggregator.partial_snapshot()) {
                    warn!(error = %e, "Failed to save partial snapshot");
                }
            }
        }
    }

    let estimated_papers = aggregator.estimated_papers();
    let result = aggregator.finish();
    info!(
        analyzed = result.analyzed_papers,
        estimated_papers,
        total_citations = result.total_citations,
        self_citations = result.self_citations,
        percentage = %format!("{:.2}", result.self_citation_percentage),
        "Analysis complete"
    );

    let saved = match sink.map(|sink| sink.save_final(&result)) {
        Some(Ok(())) => true,
        Some(Err(e)) => {
            error!(error = %e, "Failed to save results");
            false
        }
        None => false,
    };

    AnalysisOutcome { result, saved }
}

/// Tally one publication. Returns `false`, recording nothing, when `cancel`
/// cut its citation retrieval short.
async fn analyze_publication<S: ScholarSource>(
    source: &S,
    publication: &Publication,
    options: &AnalysisOptions,
    aggregator: &mut ProfileAggregator,
    cancel: &CancellationToken,
) -> bool {
    let citation_url = match publication.citation_url.as_deref() {
        Some(url) if publication.has_citations() => url,
        _ => {
            info!("  No citations to analyze.");
            return true;
        }
    };

    let cap = options.citation_cap();
    let to_check = cap.map_or(publication.citation_count as usize, |cap| {
        cap.min(publication.citation_count as usize)
    });
    info!(
        "  Checking up to {} of {} citations...",
        to_check, publication.citation_count
    );

    let mut raw_citations = source.fetch_citing_works(citation_url, cap, cancel).await;
    if let Some(cap) = cap {
        raw_citations.truncate(cap);
    }
    if cancel.is_cancelled() && raw_citations.len() < to_check {
        return false;
    }

    let citations: Vec<CitationRecord> = raw_citations
        .iter()
        .filter_map(|raw| match extract_citation(raw, &publication.author_list) {
            Ok(record) => Some(record),
            Err(e) => {
                error!(paper = publication.index, error = %e, "Error extracting citation details");
                None
            }
        })
        .collect();

    let paper = aggregate_paper(&citations, publication.citation_count, cap);
    match (paper.exact, paper.warning) {
        (_, Some(PaperWarning::EmptySample)) => {
            warn!(paper = publication.index, "  No citations retrieved for estimation");
        }
        (true, None) => info!("  Found {} self-citations.", paper.self_citations),
        (false, None) => info!(
            "  Found {} self-citations in sample. Estimated total: {}",
            paper.matched, paper.self_citations
        ),
    }
    debug!(paper = publication.index, inspected = paper.inspected, ratio = ?paper.sample_ratio(), "Paper tallied");

    aggregator.record_paper(publication, &citations, &paper);
    true
}

/// First `max` characters of a title, with "..." if it was cut.
pub fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() > max {
        format!("{}...", title.chars().take(max).collect::<String>())
    } else {
        title.to_string()
    }
}
