//! Result types returned by the export entry points.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What an export run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    /// Rows in the input table.
    pub total_rows: usize,
    /// Per-row documents written.
    pub documents_written: usize,
    /// Whether `summary.docx` was written.
    pub summary_written: bool,
    /// Pictures embedded, summed over every written document.
    pub images_embedded: usize,
    /// Image fields rendered as text, summed over every written document.
    pub image_fallbacks: usize,
    /// Identifiers seen more than once; later rows overwrote earlier files.
    pub duplicate_ids: Vec<String>,
    /// Every file written, in write order.
    pub outputs: Vec<PathBuf>,
    /// Wall-clock time for the run.
    pub total_duration_ms: u64,
}

impl ExportStats {
    /// Fold the stats of a later pass into this one.
    pub fn merge(&mut self, other: ExportStats) {
        self.total_rows = self.total_rows.max(other.total_rows);
        self.documents_written += other.documents_written;
        self.summary_written |= other.summary_written;
        self.images_embedded += other.images_embedded;
        self.image_fallbacks += other.image_fallbacks;
        self.duplicate_ids.extend(other.duplicate_ids);
        self.outputs.extend(other.outputs);
        self.total_duration_ms += other.total_duration_ms;
    }
}
