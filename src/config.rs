//! Configuration types for CSV-to-DOCX export.
//!
//! Configuration is split in two:
//!
//! * [`Layout`] — what a document looks like: title, ordered columns,
//!   identifier field, picture sizes. Immutable once built and handed to
//!   [`crate::pipeline::render::DocumentRenderer`]. Serde-enabled so it can be
//!   loaded from a JSON layout file.
//! * [`ExportConfig`] — where and how to run: the layout, output directory,
//!   export mode, CSV delimiter, progress callback. Built via
//!   [`ExportConfigBuilder`].
//!
//! Defaults reproduce the signature-sheet layout the tool was written for.

use crate::error::ExportError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// English Metric Units per inch, the unit DOCX drawing extents use.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Default output folder.
pub const DEFAULT_OUTPUT_DIR: &str = "results";

/// Default input file used by the CLI when none is given.
pub const DEFAULT_INPUT: &str = "./payment.csv";

/// File name of the combined table document.
pub const SUMMARY_FILE_NAME: &str = "summary.docx";

/// Extension appended to every generated document.
pub const DOCX_EXTENSION: &str = "docx";

/// How a column is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Rendered as `"{label}: {value}"`.
    #[serde(alias = "string")]
    Text,
    /// Base64 image, embedded as a picture; falls back to text.
    Image,
}

/// One configured column: source field, display label, rendering kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Header name in the input file.
    pub field: String,
    /// Label shown in the document.
    pub label: String,
    /// Rendering kind.
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn text(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            kind: ColumnKind::Text,
        }
    }

    pub fn image(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            kind: ColumnKind::Image,
        }
    }
}

/// Display size of an embedded picture, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl ImageSize {
    pub const fn inches(width_in: f64, height_in: f64) -> Self {
        Self {
            width_in,
            height_in,
        }
    }

    /// Size in EMU as `(cx, cy)`, rounded to the nearest unit.
    pub fn to_emu(self) -> (u32, u32) {
        (
            (self.width_in * EMU_PER_INCH).round() as u32,
            (self.height_in * EMU_PER_INCH).round() as u32,
        )
    }

    fn is_valid(self) -> bool {
        let ok = |v: f64| v.is_finite() && v > 0.0 && v * EMU_PER_INCH <= u32::MAX as f64;
        ok(self.width_in) && ok(self.height_in)
    }
}

/// Document layout: everything the renderer needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Title heading at the top of every document.
    pub title: String,
    /// Ordered columns; order is rendering order.
    pub columns: Vec<ColumnSpec>,
    /// Field whose value names each per-row document.
    pub id_field: String,
    /// Picture size in per-row documents. Default: 4 × 4 in.
    pub image_size: ImageSize,
    /// Picture size inside summary table cells. Default: 2 × 2 in.
    pub summary_image_size: ImageSize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            title: "חתימת נבדק".to_string(),
            columns: vec![
                ColumnSpec::text("block/payment_phone.text1", "שם"),
                ColumnSpec::image("sign", "חתימה"),
            ],
            id_field: "num".to_string(),
            image_size: ImageSize::inches(4.0, 4.0),
            summary_image_size: ImageSize::inches(2.0, 2.0),
        }
    }
}

impl Layout {
    /// Load a layout from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExportError::InvalidConfig(format!("cannot read layout file {}: {e}", path.display()))
        })?;
        let layout: Layout = serde_json::from_str(&text).map_err(|e| {
            ExportError::InvalidConfig(format!("bad layout file {}: {e}", path.display()))
        })?;
        layout.validate()?;
        Ok(layout)
    }

    /// Every field the input header must contain: the id field plus each column.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id_field.as_str()).chain(self.columns.iter().map(|c| c.field.as_str()))
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.columns.is_empty() {
            return Err(ExportError::InvalidConfig(
                "at least one column is required".into(),
            ));
        }
        if self.id_field.trim().is_empty() {
            return Err(ExportError::InvalidConfig(
                "identifier field must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for col in &self.columns {
            if col.field.is_empty() {
                return Err(ExportError::InvalidConfig(format!(
                    "column '{}' has an empty field name",
                    col.label
                )));
            }
            if !seen.insert(col.field.as_str()) {
                return Err(ExportError::InvalidConfig(format!(
                    "column field '{}' is configured twice",
                    col.field
                )));
            }
        }
        for (name, size) in [
            ("image_size", self.image_size),
            ("summary_image_size", self.summary_image_size),
        ] {
            if !size.is_valid() {
                return Err(ExportError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {} × {} in",
                    size.width_in, size.height_in
                )));
            }
        }
        Ok(())
    }
}

/// Which documents an export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportMode {
    /// One document per row, named by the identifier field. (default)
    #[default]
    PerRow,
    /// A single `summary.docx` with one table row per input row.
    Summary,
    /// Per-row documents followed by the summary.
    Both,
}

impl ExportMode {
    pub fn writes_per_row(self) -> bool {
        matches!(self, ExportMode::PerRow | ExportMode::Both)
    }

    pub fn writes_summary(self) -> bool {
        matches!(self, ExportMode::Summary | ExportMode::Both)
    }
}

/// Configuration for an export run.
///
/// # Example
/// ```rust
/// use csv2docx::{ColumnSpec, ExportConfig, ExportMode};
///
/// let config = ExportConfig::builder()
///     .columns(vec![
///         ColumnSpec::text("name", "Name"),
///         ColumnSpec::image("signature", "Signature"),
///     ])
///     .id_field("id")
///     .mode(ExportMode::Both)
///     .output_dir("out")
///     .build()
///     .unwrap();
/// assert_eq!(config.layout.columns.len(), 2);
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Document layout.
    pub layout: Layout,

    /// Directory receiving the generated documents. Created if missing.
    /// Default: `results`.
    pub output_dir: PathBuf,

    /// Which documents to produce. Default: [`ExportMode::PerRow`].
    pub mode: ExportMode,

    /// Field delimiter of the input file. Default: `b','`.
    pub delimiter: u8,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            mode: ExportMode::default(),
            delimiter: b',',
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("layout", &self.layout)
            .field("output_dir", &self.output_dir)
            .field("mode", &self.mode)
            .field("delimiter", &(self.delimiter as char))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExportProgressCallback>"),
            )
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn layout(mut self, layout: Layout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.layout.title = title.into();
        self
    }

    pub fn columns(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.config.layout.columns = columns;
        self
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.config.layout.id_field = field.into();
        self
    }

    pub fn image_size(mut self, size: ImageSize) -> Self {
        self.config.layout.image_size = size;
        self
    }

    pub fn summary_image_size(mut self, size: ImageSize) -> Self {
        self.config.layout.summary_image_size = size;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn mode(mut self, mode: ExportMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        self.config.layout.validate()?;
        if self.config.output_dir.as_os_str().is_empty() {
            return Err(ExportError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        if self.config.delimiter == b'"' || self.config.delimiter == b'\n' {
            return Err(ExportError::InvalidConfig(format!(
                "{:?} cannot be used as a delimiter",
                self.config.delimiter as char
            )));
        }
        Ok(self.config)
    }
}
