//! Pipeline stages for CSV-to-DOCX export.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ decode ──▶ write
//! (CSV)     (rows)     (base64)   (docx-rs, disk)
//! ```
//!
//! 1. [`input`]  — read the delimited file into a [`crate::model::Table`] and
//!    check the header carries every configured field
//! 2. [`render`] — turn a row into document blocks, or every row into a
//!    summary table, in column order
//! 3. [`decode`] — called by `render` for image columns: data-URI → base64 →
//!    image → in-memory PNG, or a typed fallback reason
//! 4. [`write`]  — build the `docx-rs` document, pack it, write it atomically

pub mod decode;
pub mod input;
pub mod render;
pub mod write;
