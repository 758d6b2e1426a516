//! Error types for the csv2docx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExportError`] — **Fatal**: the export cannot proceed (input file
//!   missing, malformed CSV, a configured column absent, output not
//!   writable). Returned as `Err(ExportError)` from the `export*` functions.
//!   The batch stops at the first fatal error; documents already written
//!   stay on disk.
//!
//! * [`FallbackReason`] — **Non-fatal**: one image field could not be turned
//!   into an embedded picture. The renderer substitutes the text form of the
//!   field and carries on with the rest of the row and the rest of the batch.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the csv2docx library.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The CSV reader rejected the input (bad quoting, ragged record, bad UTF-8).
    #[error("Malformed CSV in '{path}': {source}")]
    MalformedCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A configured field is not part of the header row.
    #[error("Column '{field}' is missing from the header of '{path}'\nAvailable columns: {available}")]
    MissingColumn {
        path: PathBuf,
        field: String,
        available: String,
    },

    // ── Row errors ────────────────────────────────────────────────────────
    /// A row has no value for a configured field.
    #[error("Row {row} has no value for field '{field}'")]
    MissingField { row: usize, field: String },

    /// The identifier value cannot be used as a file name.
    #[error("Row {row} has an unusable identifier {value:?}: {reason}")]
    InvalidIdentifier {
        row: usize,
        value: String,
        reason: &'static str,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// docx-rs failed to assemble the document archive.
    #[error("Failed to pack DOCX for '{path}': {detail}")]
    PackFailed { path: PathBuf, detail: String },

    /// Could not create the output directory or write a document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a layout file could not be read.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why an image field was rendered as text instead of a picture.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FallbackReason {
    /// The field was blank (or only a data-URI prefix).
    #[error("image field is empty")]
    Empty,

    /// The payload is not valid base64.
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    /// The bytes decoded fine but are not an image the `image` crate can read.
    #[error("undecodable image: {0}")]
    UndecodableImage(String),

    /// The decoded image could not be re-encoded as PNG for embedding.
    #[error("PNG re-encoding failed: {0}")]
    PngEncode(String),
}
