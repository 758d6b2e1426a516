//! Output sink: document models → `docx-rs` → `.docx` files on disk.
//!
//! ## Atomic writes
//!
//! Each file is written to a [`tempfile::NamedTempFile`] in the output
//! directory and then persisted (renamed) over the final name. A failure
//! half-way through a write therefore never leaves a truncated `.docx` that
//! Word refuses to open. The temp file lives next to the target so the
//! rename never crosses file systems.

use crate::config::{ImageSize, DOCX_EXTENSION};
use crate::error::ExportError;
use crate::model::{Block, Cell, EmbeddedImage, RenderedDocument, SummaryDocument};
use docx_rs::{
    Docx, Paragraph, Pic, Run, Style, StyleType, Table, TableCell, TableRow,
};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const TITLE_STYLE: &str = "Title";
const TITLE_SIZE: usize = 52; // half-points, 26pt
const BODY_SIZE: usize = 22; // 11pt

/// Build the `docx-rs` document for one row.
pub fn build_document(doc: &RenderedDocument) -> Docx {
    doc.blocks.iter().fold(with_title_style(Docx::new()), |docx, block| {
        let paragraph = match block {
            Block::Heading(text) => title_paragraph(text),
            Block::Paragraph(text) => text_paragraph(text, false),
            Block::Image { image, size } => Paragraph::new().add_run(picture_run(image, *size)),
        };
        docx.add_paragraph(paragraph)
    })
}

/// Build the `docx-rs` document holding the summary table.
pub fn build_summary(summary: &SummaryDocument) -> Docx {
    let mut table_rows = Vec::with_capacity(summary.rows.len() + 1);

    let header_cells: Vec<TableCell> = summary
        .header
        .iter()
        .map(|label| TableCell::new().add_paragraph(text_paragraph(label, true)))
        .collect();
    table_rows.push(TableRow::new(header_cells));

    for row in &summary.rows {
        let cells: Vec<TableCell> = row
            .iter()
            .map(|cell| {
                let paragraph = match cell {
                    Cell::Text(text) => text_paragraph(text, false),
                    Cell::Image { image, size } => Paragraph::new().add_run(picture_run(image, *size)),
                };
                TableCell::new().add_paragraph(paragraph)
            })
            .collect();
        table_rows.push(TableRow::new(cells));
    }

    with_title_style(Docx::new())
        .add_paragraph(title_paragraph(&summary.title))
        .add_table(Table::new(table_rows))
}

/// Serialise a document to `.docx` bytes. `path` is only used in errors.
pub fn pack(docx: Docx, path: &Path) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::PackFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    Ok(buf.into_inner())
}

/// File name for a row's document: the identifier plus `.docx`.
///
/// Identifiers that cannot be a single path component are rejected rather
/// than rewritten, so two distinct identifiers never map to the same file.
pub fn document_file_name(id: &str, row: usize) -> Result<String, ExportError> {
    let invalid = |reason| ExportError::InvalidIdentifier {
        row,
        value: id.to_string(),
        reason,
    };
    if id.trim().is_empty() {
        return Err(invalid("identifier is empty"));
    }
    if id == "." || id == ".." {
        return Err(invalid("identifier is a relative path"));
    }
    if id.contains(['/', '\\']) {
        return Err(invalid("contains a path separator"));
    }
    if id.contains('\0') {
        return Err(invalid("contains a NUL byte"));
    }
    Ok(format!("{id}.{DOCX_EXTENSION}"))
}

/// Create `dir` (and parents) if needed.
pub fn ensure_dir(dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Write `bytes` to `dir/file_name` atomically and return the final path.
pub fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    let path = dir.join(file_name);
    let failed = |source| ExportError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(failed)?;
    tmp.write_all(bytes).map_err(failed)?;
    tmp.flush().map_err(failed)?;
    tmp.persist(&path).map_err(|e| failed(e.error))?;

    debug!("Wrote {} bytes → {}", bytes.len(), path.display());
    Ok(path)
}

// ── docx-rs helpers ──────────────────────────────────────────────────────

fn with_title_style(docx: Docx) -> Docx {
    docx.add_style(
        Style::new(TITLE_STYLE, StyleType::Paragraph)
            .name(TITLE_STYLE)
            .size(TITLE_SIZE)
            .bold(),
    )
}

fn title_paragraph(text: &str) -> Paragraph {
    Paragraph::new()
        .style(TITLE_STYLE)
        .add_run(Run::new().add_text(text).size(TITLE_SIZE).bold())
}

fn text_paragraph(text: &str, bold: bool) -> Paragraph {
    let run = Run::new().add_text(text).size(BODY_SIZE);
    Paragraph::new().add_run(if bold { run.bold() } else { run })
}

fn picture_run(image: &EmbeddedImage, size: ImageSize) -> Run {
    let (cx, cy) = size.to_emu();
    let pic = Pic::new_with_dimensions(image.png.clone(), image.width_px, image.height_px)
        .size(cx, cy);
    Run::new().add_image(pic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageFallback;

    fn tiny_png() -> EmbeddedImage {
        use image::{DynamicImage, Rgba, RgbaImage};
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        EmbeddedImage {
            png,
            width_px: 2,
            height_px: 2,
        }
    }

    #[test]
    fn file_name_is_identifier_plus_extension() {
        assert_eq!(document_file_name("7", 1).unwrap(), "7.docx");
        assert_eq!(document_file_name("A-12 b", 1).unwrap(), "A-12 b.docx");
        assert_ne!(
            document_file_name("1", 1).unwrap(),
            document_file_name("01", 2).unwrap()
        );
    }

    #[test]
    fn file_name_rejects_path_like_identifiers() {
        for bad in ["", "   ", ".", "..", "a/b", "..\\x", "nul\0"] {
            let err = document_file_name(bad, 3).unwrap_err();
            assert!(
                matches!(err, ExportError::InvalidIdentifier { row: 3, .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn packed_document_is_a_zip() {
        let doc = RenderedDocument {
            id: "1".into(),
            blocks: vec![
                Block::Heading("Title".into()),
                Block::Paragraph("Name: Avi".into()),
                Block::Image {
                    image: tiny_png(),
                    size: ImageSize::inches(4.0, 4.0),
                },
            ],
            fallbacks: vec![],
        };
        let bytes = pack(build_document(&doc), Path::new("1.docx")).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn packed_summary_is_a_zip() {
        let summary = SummaryDocument {
            title: "Title".into(),
            header: vec!["Name".into(), "Signature".into()],
            rows: vec![
                vec![
                    Cell::Text("Avi".into()),
                    Cell::Image {
                        image: tiny_png(),
                        size: ImageSize::inches(2.0, 2.0),
                    },
                ],
                vec![Cell::Text("Dana".into()), Cell::Text("broken".into())],
            ],
            fallbacks: vec![ImageFallback {
                row: 2,
                field: "sign".into(),
                reason: crate::error::FallbackReason::Empty,
            }],
        };
        let bytes = pack(build_summary(&summary), Path::new("summary.docx")).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_atomic(dir.path(), "7.docx", b"first").unwrap();
        let second = write_atomic(dir.path(), "7.docx", b"second").unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
        // Only the final file is left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/results");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
