//! Progress-callback trait for per-row export events.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to receive
//! events as the export processes each row. The CLI forwards them to a
//! terminal progress bar; a library caller might count fallbacks or log them.
//!
//! # Example
//!
//! ```rust
//! use csv2docx::{ExportConfig, ExportProgressCallback, FallbackReason};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FallbackCounter {
//!     fallbacks: AtomicUsize,
//! }
//!
//! impl ExportProgressCallback for FallbackCounter {
//!     fn on_image_fallback(&self, row: usize, label: &str, reason: &FallbackReason) {
//!         self.fallbacks.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("row {row}: '{label}' rendered as text ({reason})");
//!     }
//! }
//!
//! let counter = Arc::new(FallbackCounter { fallbacks: AtomicUsize::new(0) });
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::FallbackReason;
use std::path::Path;
use std::sync::Arc;

/// Called by the export pipeline as it processes rows.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Rows are processed one at a time on the calling
/// thread, but the trait is `Send + Sync` so a callback can be shared with
/// other threads (e.g. a progress bar ticker).
pub trait ExportProgressCallback: Send + Sync {
    /// Called once before the first row of a pass.
    ///
    /// # Arguments
    /// * `total_rows` — number of rows in the table
    fn on_export_start(&self, total_rows: usize) {
        let _ = total_rows;
    }

    /// Called before a row is rendered.
    ///
    /// # Arguments
    /// * `row`   — 1-based record number
    /// * `total` — number of rows in the table
    fn on_row_start(&self, row: usize, total: usize) {
        let _ = (row, total);
    }

    /// Called after a row's document is on disk (per-row mode) or after its
    /// table row is rendered (summary mode, `path` is `None`).
    fn on_row_complete(&self, row: usize, total: usize, path: Option<&Path>) {
        let _ = (row, total, path);
    }

    /// Called when an image field is rendered as text.
    ///
    /// # Arguments
    /// * `row`    — 1-based record number
    /// * `label`  — display label of the column
    /// * `reason` — why the picture could not be produced
    fn on_image_fallback(&self, row: usize, label: &str, reason: &FallbackReason) {
        let _ = (row, label, reason);
    }

    /// Called once after a pass finished without a fatal error.
    ///
    /// # Arguments
    /// * `total_rows` — number of rows in the table
    /// * `written`    — documents written by this pass
    fn on_export_complete(&self, total_rows: usize, written: usize) {
        let _ = (total_rows, written);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;
