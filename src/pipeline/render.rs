//! Rendering: rows → [`RenderedDocument`] / [`SummaryDocument`].
//!
//! The renderer borrows an immutable [`Layout`] for its whole life. Each
//! column becomes exactly one block (or one cell) in column order; the only
//! branch is text vs image, and an image that cannot be decoded becomes the
//! text form of the field. Fallbacks are logged here and also recorded on the
//! document so callers can report them.

use crate::config::{ColumnKind, ColumnSpec, ImageSize, Layout};
use crate::error::{ExportError, FallbackReason};
use crate::model::{Block, Cell, ImageFallback, RenderedDocument, Row, SummaryDocument};
use crate::pipeline::decode::{decode_image, ImageDecode};
use tracing::{debug, warn};

/// Turns rows into document models according to a fixed layout.
#[derive(Debug, Clone, Copy)]
pub struct DocumentRenderer<'a> {
    layout: &'a Layout,
}

impl<'a> DocumentRenderer<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    /// Render one row: title heading, then one block per column.
    pub fn render_row(&self, row: &Row) -> Result<RenderedDocument, ExportError> {
        let id = row.get(&self.layout.id_field)?.to_string();
        let mut blocks = Vec::with_capacity(self.layout.columns.len() + 1);
        let mut fallbacks = Vec::new();

        blocks.push(Block::Heading(self.layout.title.clone()));

        for column in &self.layout.columns {
            let value = row.get(&column.field)?;
            let block = match column.kind {
                ColumnKind::Text => Block::Paragraph(labelled(column, value)),
                ColumnKind::Image => match decode_image(value) {
                    ImageDecode::Embedded(image) => Block::Image {
                        image,
                        size: self.layout.image_size,
                    },
                    ImageDecode::Fallback(reason) => {
                        fallbacks.push(note_fallback(row, column, reason));
                        Block::Paragraph(labelled(column, value))
                    }
                },
            };
            blocks.push(block);
        }

        debug!(
            "Rendered row {} (id {:?}): {} blocks, {} fallbacks",
            row.number,
            id,
            blocks.len(),
            fallbacks.len()
        );

        Ok(RenderedDocument {
            id,
            blocks,
            fallbacks,
        })
    }

    /// Render one table row of the summary document.
    ///
    /// Cells hold the bare value; the label is already in the header row.
    pub fn render_cells(
        &self,
        row: &Row,
        fallbacks: &mut Vec<ImageFallback>,
    ) -> Result<Vec<Cell>, ExportError> {
        self.layout
            .columns
            .iter()
            .map(|column| {
                let value = row.get(&column.field)?;
                Ok(match column.kind {
                    ColumnKind::Text => Cell::Text(value.to_string()),
                    ColumnKind::Image => match decode_image(value) {
                        ImageDecode::Embedded(image) => Cell::Image {
                            image,
                            size: self.summary_size(),
                        },
                        ImageDecode::Fallback(reason) => {
                            fallbacks.push(note_fallback(row, column, reason));
                            Cell::Text(value.to_string())
                        }
                    },
                })
            })
            .collect()
    }

    /// Assemble the summary document from rendered table rows.
    pub fn summary_document(
        &self,
        rows: Vec<Vec<Cell>>,
        fallbacks: Vec<ImageFallback>,
    ) -> SummaryDocument {
        SummaryDocument {
            title: self.layout.title.clone(),
            header: self.header(),
            rows,
            fallbacks,
        }
    }

    /// Column labels in order.
    pub fn header(&self) -> Vec<String> {
        self.layout.columns.iter().map(|c| c.label.clone()).collect()
    }

    fn summary_size(&self) -> ImageSize {
        self.layout.summary_image_size
    }
}

fn labelled(column: &ColumnSpec, value: &str) -> String {
    format!("{}: {}", column.label, value)
}

fn note_fallback(row: &Row, column: &ColumnSpec, reason: FallbackReason) -> ImageFallback {
    warn!(
        "Row {}: '{}' rendered as text: {}",
        row.number, column.field, reason
    );
    ImageFallback {
        row: row.number,
        field: column.field.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_data_uri() -> String {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(&buf))
    }

    fn layout() -> Layout {
        Layout {
            columns: vec![
                ColumnSpec::text("name", "שם"),
                ColumnSpec::image("sign", "חתימה"),
                ColumnSpec::text("amount", "סכום"),
            ],
            id_field: "num".into(),
            ..Layout::default()
        }
    }

    #[test]
    fn blocks_follow_column_order() {
        let layout = layout();
        let row = Row::from_pairs(
            1,
            [("num", "7"), ("name", "Avi"), ("sign", png_data_uri().as_str()), ("amount", "50")],
        );
        let doc = DocumentRenderer::new(&layout).render_row(&row).unwrap();

        assert_eq!(doc.id, "7");
        assert_eq!(doc.blocks.len(), 4);
        assert_eq!(doc.blocks[0], Block::Heading("חתימת נבדק".into()));
        assert_eq!(doc.blocks[1], Block::Paragraph("שם: Avi".into()));
        match &doc.blocks[2] {
            Block::Image { image, size } => {
                assert_eq!((image.width_px, image.height_px), (4, 4));
                assert_eq!(*size, ImageSize::inches(4.0, 4.0));
            }
            other => panic!("expected image, got {other:?}"),
        }
        assert_eq!(doc.blocks[3], Block::Paragraph("סכום: 50".into()));
        assert!(doc.fallbacks.is_empty());
        assert_eq!(doc.image_count(), 1);
    }

    #[test]
    fn bad_image_falls_back_to_label_and_value() {
        let layout = layout();
        let row = Row::from_pairs(
            5,
            [("num", "7"), ("name", "Avi"), ("sign", "not-base64!!"), ("amount", "1")],
        );
        let doc = DocumentRenderer::new(&layout).render_row(&row).unwrap();

        assert_eq!(doc.blocks[2], Block::Paragraph("חתימה: not-base64!!".into()));
        assert_eq!(doc.image_count(), 0);
        assert_eq!(doc.fallbacks.len(), 1);
        assert_eq!(doc.fallbacks[0].row, 5);
        assert_eq!(doc.fallbacks[0].field, "sign");
        assert!(matches!(
            doc.fallbacks[0].reason,
            FallbackReason::InvalidBase64(_)
        ));
    }

    #[test]
    fn missing_field_is_fatal() {
        let layout = layout();
        let row = Row::from_pairs(2, [("num", "7"), ("name", "Avi")]);
        let err = DocumentRenderer::new(&layout).render_row(&row).unwrap_err();
        assert!(matches!(err, ExportError::MissingField { row: 2, .. }));
    }

    #[test]
    fn summary_has_header_and_one_row_per_input() {
        let layout = layout();
        let rows = vec![
            Row::from_pairs(
                1,
                [("num", "1"), ("name", "Avi"), ("sign", png_data_uri().as_str()), ("amount", "10")],
            ),
            Row::from_pairs(2, [("num", "2"), ("name", "Dana"), ("sign", ""), ("amount", "20")]),
        ];
        let renderer = DocumentRenderer::new(&layout);
        let mut fallbacks = Vec::new();
        let cells = rows
            .iter()
            .map(|row| renderer.render_cells(row, &mut fallbacks))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let summary = renderer.summary_document(cells, fallbacks);

        assert_eq!(summary.header, vec!["שם", "חתימה", "סכום"]);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0][0], Cell::Text("Avi".into()));
        assert!(matches!(
            summary.rows[0][1],
            Cell::Image { size, .. } if size == ImageSize::inches(2.0, 2.0)
        ));
        assert_eq!(summary.rows[1][0], Cell::Text("Dana".into()));
        assert_eq!(summary.rows[1][1], Cell::Text(String::new()));
        assert_eq!(summary.fallbacks.len(), 1);
        assert_eq!(summary.fallbacks[0].reason, FallbackReason::Empty);
        assert_eq!(summary.image_count(), 1);
    }

    #[test]
    fn summary_of_no_rows_keeps_header() {
        let layout = layout();
        let summary = DocumentRenderer::new(&layout).summary_document(Vec::new(), Vec::new());
        assert_eq!(summary.header.len(), 3);
        assert!(summary.rows.is_empty());
    }
}
