//! In-memory data model: input rows and rendered documents.
//!
//! ```text
//! Table ─▶ Row ─▶ DocumentRenderer ─▶ RenderedDocument ─▶ docx-rs ─▶ bytes
//!    └──────────▶ DocumentRenderer ─▶ SummaryDocument  ─▶ docx-rs ─▶ bytes
//! ```
//!
//! Rendered documents are plain values: they know nothing about DOCX. The
//! writer stage turns them into `docx-rs` structures, which keeps rendering
//! decisions (text vs picture, fallback) testable without unpacking a zip.

use crate::config::ImageSize;
use crate::error::{ExportError, FallbackReason};
use std::collections::HashMap;
use std::path::PathBuf;

/// One record of the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based record number (header excluded).
    pub number: usize,
    fields: HashMap<String, String>,
}

impl Row {
    pub fn new(number: usize, fields: HashMap<String, String>) -> Self {
        Self { number, fields }
    }

    /// Build a row from `(field, value)` pairs.
    pub fn from_pairs<K, V>(number: usize, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            number,
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a field. A missing field is fatal for the run.
    pub fn get(&self, field: &str) -> Result<&str, ExportError> {
        self.fields
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| ExportError::MissingField {
                row: self.number,
                field: field.to_string(),
            })
    }
}

/// The loaded input file.
#[derive(Debug, Clone)]
pub struct Table {
    /// Where the rows came from.
    pub source: PathBuf,
    /// Header names in file order.
    pub headers: Vec<String>,
    /// Rows in file order.
    pub rows: Vec<Row>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A decoded picture ready for embedding: PNG bytes plus pixel dimensions.
#[derive(Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl std::fmt::Debug for EmbeddedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedImage")
            .field("png", &format_args!("<{} bytes>", self.png.len()))
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish()
    }
}

/// A block of a per-row document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Title heading.
    Heading(String),
    /// Plain paragraph, including image fallbacks.
    Paragraph(String),
    /// Embedded picture at a fixed display size.
    Image { image: EmbeddedImage, size: ImageSize },
}

/// An image field that was rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFallback {
    pub row: usize,
    pub field: String,
    pub reason: FallbackReason,
}

/// A per-row document: title heading then one block per column.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    /// Identifier value; names the output file.
    pub id: String,
    pub blocks: Vec<Block>,
    pub fallbacks: Vec<ImageFallback>,
}

impl RenderedDocument {
    pub fn image_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Image { .. }))
            .count()
    }
}

/// A summary table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Image { image: EmbeddedImage, size: ImageSize },
}

/// The combined document: title, header row, one table row per input row.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryDocument {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub fallbacks: Vec<ImageFallback>,
}

impl SummaryDocument {
    pub fn image_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| matches!(c, Cell::Image { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_get_reports_missing_field() {
        let row = Row::from_pairs(3, [("num", "7")]);
        assert_eq!(row.get("num").unwrap(), "7");
        match row.get("sign").unwrap_err() {
            ExportError::MissingField { row, field } => {
                assert_eq!(row, 3);
                assert_eq!(field, "sign");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn embedded_image_debug_hides_bytes() {
        let img = EmbeddedImage {
            png: vec![0; 2048],
            width_px: 8,
            height_px: 8,
        };
        let s = format!("{img:?}");
        assert!(s.contains("<2048 bytes>"));
        assert!(!s.contains("0, 0, 0"));
    }
}
