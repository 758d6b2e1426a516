//! # csv2docx
//!
//! Turn CSV records into Word documents, embedding a base64-encoded image
//! (typically a signature captured by a web form) for each record.
//!
//! Two output shapes are supported:
//!
//! * **Per row** — one `{id}.docx` per record: a title heading, one
//!   `"{label}: {value}"` paragraph per text column, and the decoded picture
//!   for each image column.
//! * **Summary** — a single `summary.docx` with a table: a header row of
//!   labels, then one table row per record with smaller pictures.
//!
//! An image field that is not valid base64, or not a readable image, never
//! aborts the run: the field is rendered as text and the fallback is logged
//! and counted.
//!
//! ## Pipeline Overview
//!
//! ```text
//! CSV
//!  │
//!  ├─ 1. Input   read rows, check the header has every configured column
//!  ├─ 2. Render  per row (or per table): heading + one block per column
//!  ├─ 3. Decode  data-URI → base64 → image → PNG bytes, or text fallback
//!  └─ 4. Write   docx-rs → zip bytes → atomic write into the output folder
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use csv2docx::{export, ColumnSpec, ExportConfig, ExportMode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExportConfig::builder()
//!         .title("Signed receipts")
//!         .columns(vec![
//!             ColumnSpec::text("name", "Name"),
//!             ColumnSpec::image("signature", "Signature"),
//!         ])
//!         .id_field("id")
//!         .mode(ExportMode::Both)
//!         .output_dir("results")
//!         .build()?;
//!
//!     let stats = export("payment.csv", &config)?;
//!     eprintln!(
//!         "{} documents, {} images, {} fallbacks",
//!         stats.documents_written, stats.images_embedded, stats.image_fallbacks
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `csv2docx` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ColumnKind, ColumnSpec, ExportConfig, ExportConfigBuilder, ExportMode, ImageSize, Layout,
};
pub use error::{ExportError, FallbackReason};
pub use export::{export, export_documents, export_from_bytes, export_summary, export_table};
pub use model::{Block, Cell, EmbeddedImage, RenderedDocument, Row, SummaryDocument, Table};
pub use output::ExportStats;
pub use pipeline::decode::{decode_image, ImageDecode};
pub use pipeline::render::DocumentRenderer;
pub use progress::{ExportProgressCallback, NoopProgressCallback, ProgressCallback};
