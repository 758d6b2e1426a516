//! Export entry points.
//!
//! ```text
//! CSV ──▶ input::load_table ──▶ Table
//!                                 ├─▶ per row: render_row ───▶ pack ─▶ {id}.docx
//!                                 └─▶ per row: render_cells ─▶ pack ─▶ summary.docx
//! ```
//!
//! Everything runs on the calling thread, one row at a time. The first fatal
//! error stops the run and is returned; documents written before it stay on
//! disk. Image problems are not fatal (see [`crate::pipeline::decode`]).

use crate::config::{ExportConfig, SUMMARY_FILE_NAME};
use crate::error::ExportError;
use crate::model::{ImageFallback, Table};
use crate::output::ExportStats;
use crate::pipeline::render::DocumentRenderer;
use crate::pipeline::{input, write};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Load a CSV file and export it according to `config.mode`.
///
/// # Errors
/// Returns `Err(ExportError)` for fatal errors only:
/// - input missing, unreadable or malformed
/// - a configured column absent from the header
/// - an unusable identifier value
/// - the output directory or a document cannot be written
pub fn export(input_path: impl AsRef<Path>, config: &ExportConfig) -> Result<ExportStats, ExportError> {
    let input_path = input_path.as_ref();
    info!("Starting export: {}", input_path.display());
    let table = input::load_table(input_path, &config.layout, config.delimiter)?;
    info!("Loaded {} rows", table.len());
    export_table(&table, config)
}

/// Export CSV bytes held in memory.
pub fn export_from_bytes(bytes: &[u8], config: &ExportConfig) -> Result<ExportStats, ExportError> {
    let table = input::read_table(bytes, Path::new("<memory>"), config.delimiter)?;
    input::check_columns(&table, &config.layout)?;
    export_table(&table, config)
}

/// Export an already loaded table according to `config.mode`.
pub fn export_table(table: &Table, config: &ExportConfig) -> Result<ExportStats, ExportError> {
    let mut stats = ExportStats {
        total_rows: table.len(),
        ..Default::default()
    };
    if config.mode.writes_per_row() && config.mode.writes_summary() {
        check_summary_collision(table, config)?;
    }
    if config.mode.writes_per_row() {
        stats.merge(export_documents(table, config)?);
    }
    if config.mode.writes_summary() {
        stats.merge(export_summary(table, config)?);
    }
    info!(
        "Export complete: {} documents, summary: {}, {} images, {} fallbacks, {}ms",
        stats.documents_written,
        stats.summary_written,
        stats.images_embedded,
        stats.image_fallbacks,
        stats.total_duration_ms
    );
    Ok(stats)
}

/// Write one document per row, named by the identifier field.
pub fn export_documents(table: &Table, config: &ExportConfig) -> Result<ExportStats, ExportError> {
    let start = Instant::now();
    let renderer = DocumentRenderer::new(&config.layout);
    let total = table.len();
    let mut stats = ExportStats {
        total_rows: total,
        ..Default::default()
    };
    let mut seen = HashSet::with_capacity(total);

    write::ensure_dir(&config.output_dir)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_export_start(total);
    }

    for row in &table.rows {
        if let Some(ref cb) = config.progress_callback {
            cb.on_row_start(row.number, total);
        }

        let doc = renderer.render_row(row)?;
        let file_name = write::document_file_name(&doc.id, row.number)?;
        if !seen.insert(doc.id.clone()) {
            warn!(
                "Row {}: identifier {:?} already used; overwriting {}",
                row.number, doc.id, file_name
            );
            stats.duplicate_ids.push(doc.id.clone());
        }
        report_fallbacks(config, &doc.fallbacks);

        let target = config.output_dir.join(&file_name);
        let bytes = write::pack(write::build_document(&doc), &target)?;
        let path = write::write_atomic(&config.output_dir, &file_name, &bytes)?;

        stats.documents_written += 1;
        stats.images_embedded += doc.image_count();
        stats.image_fallbacks += doc.fallbacks.len();

        if let Some(ref cb) = config.progress_callback {
            cb.on_row_complete(row.number, total, Some(path.as_path()));
        }
        stats.outputs.push(path);
    }

    stats.total_duration_ms = start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress_callback {
        cb.on_export_complete(total, stats.documents_written);
    }
    Ok(stats)
}

/// Write a single `summary.docx` holding every row in a table.
pub fn export_summary(table: &Table, config: &ExportConfig) -> Result<ExportStats, ExportError> {
    let start = Instant::now();
    let renderer = DocumentRenderer::new(&config.layout);
    let total = table.len();

    write::ensure_dir(&config.output_dir)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_export_start(total);
    }

    let mut fallbacks = Vec::new();
    let mut rows = Vec::with_capacity(total);
    for row in &table.rows {
        if let Some(ref cb) = config.progress_callback {
            cb.on_row_start(row.number, total);
        }
        let before = fallbacks.len();
        rows.push(renderer.render_cells(row, &mut fallbacks)?);
        report_fallbacks(config, &fallbacks[before..]);
        if let Some(ref cb) = config.progress_callback {
            cb.on_row_complete(row.number, total, None);
        }
    }

    let summary = renderer.summary_document(rows, fallbacks);

    let target = config.output_dir.join(SUMMARY_FILE_NAME);
    let bytes = write::pack(write::build_summary(&summary), &target)?;
    let path = write::write_atomic(&config.output_dir, SUMMARY_FILE_NAME, &bytes)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_export_complete(total, 1);
    }

    Ok(ExportStats {
        total_rows: total,
        documents_written: 0,
        summary_written: true,
        images_embedded: summary.image_count(),
        image_fallbacks: summary.fallbacks.len(),
        duplicate_ids: Vec::new(),
        outputs: vec![path],
        total_duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Reject any row whose document would be replaced by `summary.docx`.
///
/// Runs before anything is written. Compared case-insensitively because the
/// output folder may live on a case-insensitive file system.
fn check_summary_collision(table: &Table, config: &ExportConfig) -> Result<(), ExportError> {
    for row in &table.rows {
        let Ok(id) = row.get(&config.layout.id_field) else {
            continue;
        };
        let file_name = write::document_file_name(id, row.number)?;
        if file_name.eq_ignore_ascii_case(SUMMARY_FILE_NAME) {
            return Err(ExportError::InvalidIdentifier {
                row: row.number,
                value: id.to_string(),
                reason: "collides with the summary document",
            });
        }
    }
    Ok(())
}

fn report_fallbacks(config: &ExportConfig, fallbacks: &[ImageFallback]) {
    let Some(ref cb) = config.progress_callback else {
        return;
    };
    for fb in fallbacks {
        let label = config
            .layout
            .columns
            .iter()
            .find(|c| c.field == fb.field)
            .map(|c| c.label.as_str())
            .unwrap_or(fb.field.as_str());
        cb.on_image_fallback(fb.row, label, &fb.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnSpec, ExportMode};
    use crate::error::FallbackReason;
    use crate::progress::ExportProgressCallback;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ExportProgressCallback for Recorder {
        fn on_export_start(&self, total_rows: usize) {
            self.events.lock().unwrap().push(format!("start {total_rows}"));
        }
        fn on_row_start(&self, row: usize, _total: usize) {
            self.events.lock().unwrap().push(format!("row {row}"));
        }
        fn on_row_complete(&self, row: usize, _total: usize, path: Option<&Path>) {
            let name = path
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "-".into());
            self.events.lock().unwrap().push(format!("done {row} {name}"));
        }
        fn on_image_fallback(&self, row: usize, label: &str, reason: &FallbackReason) {
            let kind = match reason {
                FallbackReason::Empty => "empty",
                FallbackReason::InvalidBase64(_) => "base64",
                FallbackReason::UndecodableImage(_) => "image",
                FallbackReason::PngEncode(_) => "png",
            };
            self.events
                .lock()
                .unwrap()
                .push(format!("fallback {row} {label} {kind}"));
        }
        fn on_export_complete(&self, total_rows: usize, written: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("complete {total_rows} {written}"));
        }
    }

    fn config(dir: &Path, mode: ExportMode, cb: Option<Arc<Recorder>>) -> ExportConfig {
        let mut builder = ExportConfig::builder()
            .columns(vec![ColumnSpec::text("name", "Name"), ColumnSpec::image("sig", "Sig")])
            .id_field("id")
            .output_dir(dir)
            .mode(mode);
        if let Some(cb) = cb {
            builder = builder.progress_callback(cb);
        }
        builder.build().unwrap()
    }

    #[test]
    fn per_row_export_reports_progress_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let cfg = config(dir.path(), ExportMode::PerRow, Some(recorder.clone()));

        let csv = "id,name,sig\n1,Avi,not-base64!!\n2,Dana,\n";
        let stats = export_from_bytes(csv.as_bytes(), &cfg).unwrap();

        assert_eq!(stats.documents_written, 2);
        assert_eq!(stats.image_fallbacks, 2);
        assert!(!stats.summary_written);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![
                "start 2",
                "row 1",
                "fallback 1 Sig base64",
                "done 1 1.docx",
                "row 2",
                "fallback 2 Sig empty",
                "done 2 2.docx",
                "complete 2 2",
            ]
        );
    }

    #[test]
    fn duplicate_identifiers_overwrite_and_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), ExportMode::PerRow, None);

        let csv = "id,name,sig\n1,Avi,x\n1,Dana,y\n";
        let stats = export_from_bytes(csv.as_bytes(), &cfg).unwrap();

        assert_eq!(stats.documents_written, 2);
        assert_eq!(stats.duplicate_ids, vec!["1"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn invalid_identifier_stops_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), ExportMode::PerRow, None);

        let csv = "id,name,sig\n1,Avi,x\n../2,Dana,y\n3,Noa,z\n";
        let err = export_from_bytes(csv.as_bytes(), &cfg).unwrap_err();

        assert!(matches!(err, ExportError::InvalidIdentifier { row: 2, .. }));
        assert!(dir.path().join("1.docx").exists());
        assert!(!dir.path().join("3.docx").exists());
    }

    #[test]
    fn both_mode_writes_rows_then_summary() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), ExportMode::Both, None);

        let csv = "id,name,sig\n1,Avi,x\n2,Dana,y\n";
        let stats = export_from_bytes(csv.as_bytes(), &cfg).unwrap();

        assert_eq!(stats.total_rows, 2);
        assert_eq!(stats.documents_written, 2);
        assert!(stats.summary_written);
        assert_eq!(stats.outputs.len(), 3);
        assert_eq!(stats.outputs[2], dir.path().join("summary.docx"));
        // Fallbacks counted once per pass.
        assert_eq!(stats.image_fallbacks, 4);
    }

    #[test]
    fn both_mode_rejects_identifier_named_like_the_summary() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), ExportMode::Both, None);

        let csv = "id,name,sig\n2,Dana,y\nSummary,Avi,x\n";
        let err = export_from_bytes(csv.as_bytes(), &cfg).unwrap_err();

        assert!(matches!(
            err,
            ExportError::InvalidIdentifier { row: 2, reason: "collides with the summary document", .. }
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn summary_identifier_is_fine_without_a_summary_pass() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), ExportMode::PerRow, None);

        let stats = export_from_bytes(b"id,name,sig\nsummary,Avi,x\n", &cfg).unwrap();
        assert_eq!(stats.outputs, vec![dir.path().join("summary.docx")]);
    }

    #[test]
    fn missing_column_is_fatal_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        let cfg = config(&out, ExportMode::PerRow, None);

        let err = export_from_bytes(b"id,name\n1,Avi\n", &cfg).unwrap_err();
        assert!(matches!(err, ExportError::MissingColumn { .. }));
        assert!(!out.exists());
    }
}
