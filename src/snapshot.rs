//! Snapshot persistence.
//!
//! Results are written as pretty JSON. Partial snapshots go to `<output>.partial`,
//! the final result to `<output>`. Every write replaces the whole file through a
//! temporary sibling and a rename, so readers never see a half-written file.

use crate::error::Result;
use crate::profile::{ProfileResult, SelfCitationDetail};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Destination for in-progress and final results.
pub trait SnapshotSink {
    /// Persist a partial snapshot. May be called many times.
    fn save_partial(&self, snapshot: &ProfileResult) -> Result<()>;

    /// Persist the final result.
    fn save_final(&self, result: &ProfileResult) -> Result<()>;
}

/// JSON file writer for `<output>` and `<output>.partial`.
pub struct JsonSnapshotWriter {
    output: PathBuf,
}

impl JsonSnapshotWriter {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    /// Path of the final result file
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Path of the partial snapshot file
    pub fn partial_path(&self) -> PathBuf {
        with_suffix(&self.output, ".partial")
    }
}

impl SnapshotSink for JsonSnapshotWriter {
    fn save_partial(&self, snapshot: &ProfileResult) -> Result<()> {
        let path = self.partial_path();
        write_json_atomic(&path, snapshot)?;
        debug!(
            path = %path.display(),
            analyzed = snapshot.analyzed_papers,
            "Saved partial snapshot"
        );
        Ok(())
    }

    fn save_final(&self, result: &ProfileResult) -> Result<()> {
        write_json_atomic(&self.output, result)?;
        info!(path = %self.output.display(), "Saved results");
        Ok(())
    }
}

/// Serialize `value` and replace `path` with it in one rename.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    let tmp = with_suffix(path, ".tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a result or snapshot back from disk.
pub fn load_result(path: &Path) -> Result<ProfileResult> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Export the self-citation details as CSV, one row per self-citation.
pub fn save_details_csv(path: &Path, details: &[SelfCitationDetail]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    for detail in details {
        wtr.serialize(detail)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = details.len(), "Saved self-citation details");
    Ok(())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
