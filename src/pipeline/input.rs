//! Input loading: read a delimited file into a [`Table`].
//!
//! The whole file is read up front so that a malformed record is reported
//! before any document is written, and so the progress bar knows the total.
//! Column presence is the only schema check: every field the layout names
//! (identifier included) must appear in the header row.

use crate::config::Layout;
use crate::error::ExportError;
use crate::model::{Row, Table};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: char = '\u{feff}';

/// Load `path` and check it against `layout`.
pub fn load_table(
    path: impl AsRef<Path>,
    layout: &Layout,
    delimiter: u8,
) -> Result<Table, ExportError> {
    let path = path.as_ref().to_path_buf();
    let file = open_local(&path)?;
    let table = read_table(file, &path, delimiter)?;
    check_columns(&table, layout)?;
    debug!(
        "Loaded {} rows × {} columns from {}",
        table.rows.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

/// Parse delimited text from any reader. `source` is only used in errors.
pub fn read_table<R: Read>(
    reader: R,
    source: &Path,
    delimiter: u8,
) -> Result<Table, ExportError> {
    let malformed = |e: csv::Error| ExportError::MalformedCsv {
        path: source.to_path_buf(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches(UTF8_BOM).to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(malformed)?;
        let fields: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(String::from))
            .collect();
        rows.push(Row::new(i + 1, fields));
    }

    Ok(Table {
        source: source.to_path_buf(),
        headers,
        rows,
    })
}

/// Fail if the header lacks a field the layout needs.
pub fn check_columns(table: &Table, layout: &Layout) -> Result<(), ExportError> {
    for field in layout.required_fields() {
        if !table.headers.iter().any(|h| h == field) {
            return Err(ExportError::MissingColumn {
                path: table.source.clone(),
                field: field.to_string(),
                available: table.headers.join(", "),
            });
        }
    }
    Ok(())
}

fn open_local(path: &Path) -> Result<std::fs::File, ExportError> {
    if !path.is_file() {
        return Err(ExportError::FileNotFound { path: path.to_path_buf() });
    }
    match std::fs::File::open(path) {
        Ok(f) => Ok(f),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ExportError::PermissionDenied { path: path.to_path_buf() })
        }
        Err(_) => Err(ExportError::FileNotFound { path: path.to_path_buf() }),
    }
}
