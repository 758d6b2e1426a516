//! CLI binary for csv2docx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExportConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use csv2docx::config::{DEFAULT_INPUT, DEFAULT_OUTPUT_DIR};
use csv2docx::{
    export, ExportConfig, ExportMode, ExportProgressCallback, FallbackReason, Layout,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per image
/// fallback.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_export_start
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Reading rows…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_export_start(&self, total_rows: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} rows  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        // `Both` mode runs two passes over the same bar.
        self.bar.reset();
        self.bar.set_length(total_rows as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Exporting");
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_row_start(&self, row: usize, _total: usize) {
        self.bar.set_message(format!("row {row}"));
    }

    fn on_row_complete(&self, _row: usize, _total: usize, _path: Option<&Path>) {
        self.bar.inc(1);
    }

    fn on_image_fallback(&self, row: usize, label: &str, reason: &FallbackReason) {
        self.bar.println(format!(
            "  {} Row {:>4}  {} as text  {}",
            yellow("⚠"),
            row,
            bold(label),
            dim(&reason.to_string()),
        ));
    }

    fn on_export_complete(&self, _total_rows: usize, _written: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One document per row into ./results
  csv2docx payment.csv

  # A single summary.docx with a table
  csv2docx payment.csv --mode summary

  # Both, into a custom folder, with a custom layout
  csv2docx payment.csv --mode both -o out --layout layout.json

LAYOUT FILE (JSON, every key optional):
  {
    "title": "חתימת נבדק",
    "id_field": "num",
    "columns": [
      {"field": "block/payment_phone.text1", "label": "שם",    "kind": "text"},
      {"field": "sign",                      "label": "חתימה", "kind": "image"}
    ],
    "image_size":         {"width_in": 4.0, "height_in": 4.0},
    "summary_image_size": {"width_in": 2.0, "height_in": 2.0}
  }

Image fields may hold bare base64 or a data-URI (data:image/png;base64,…).
Fields that cannot be decoded are written as "label: value" instead.
"#;

/// Turn CSV rows into Word documents with embedded signature images.
#[derive(Parser, Debug)]
#[command(
    name = "csv2docx",
    version,
    about = "Turn CSV rows into Word documents with embedded signature images",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input CSV file.
    #[arg(default_value = DEFAULT_INPUT, env = "CSV2DOCX_INPUT")]
    input: PathBuf,

    /// Directory receiving the documents (created if missing).
    #[arg(short, long, env = "CSV2DOCX_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Which documents to produce.
    #[arg(short, long, env = "CSV2DOCX_MODE", value_enum, default_value = "per-row")]
    mode: ModeArg,

    /// JSON layout file overriding title, columns, id field and image sizes.
    #[arg(long, env = "CSV2DOCX_LAYOUT")]
    layout: Option<PathBuf>,

    /// Field delimiter: a single character, or "tab".
    #[arg(short, long, env = "CSV2DOCX_DELIMITER", default_value = ",")]
    delimiter: String,

    /// Print run statistics as JSON on stdout.
    #[arg(long, env = "CSV2DOCX_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "CSV2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CSV2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CSV2DOCX_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    PerRow,
    Summary,
    Both,
}

impl From<ModeArg> for ExportMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::PerRow => ExportMode::PerRow,
            ModeArg::Summary => ExportMode::Summary,
            ModeArg::Both => ExportMode::Both,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The bar covers routine feedback; fallbacks are printed through it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExportProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run export ───────────────────────────────────────────────────────
    let stats = export(&cli.input, &config)
        .with_context(|| format!("Export of {} failed", cli.input.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
        );
    } else if !cli.quiet {
        let mut parts = Vec::new();
        if config.mode.writes_per_row() {
            parts.push(format!("{} documents", stats.documents_written));
        }
        if stats.summary_written {
            parts.push("summary".to_string());
        }
        eprintln!(
            "{} {} from {} rows  {}ms  →  {}",
            green("✔"),
            bold(&parts.join(" + ")),
            stats.total_rows,
            stats.total_duration_ms,
            bold(&config.output_dir.display().to_string()),
        );
        eprintln!(
            "   {} images embedded  /  {} rendered as text",
            dim(&stats.images_embedded.to_string()),
            if stats.image_fallbacks == 0 {
                dim("0")
            } else {
                yellow(&stats.image_fallbacks.to_string())
            },
        );
        if !stats.duplicate_ids.is_empty() {
            eprintln!(
                "   {} duplicate identifiers overwritten: {}",
                cyan("ℹ"),
                stats.duplicate_ids.join(", ")
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExportConfig> {
    let layout = match cli.layout {
        Some(ref path) => Layout::from_json_file(path)
            .with_context(|| format!("Failed to load layout from {:?}", path))?,
        None => Layout::default(),
    };

    let mut builder = ExportConfig::builder()
        .layout(layout)
        .output_dir(&cli.output_dir)
        .mode(cli.mode.into())
        .delimiter(parse_delimiter(&cli.delimiter)?);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--delimiter` into a single byte.
fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "tab" | "\\t" => Ok(b'\t'),
        _ => {
            let bytes = s.as_bytes();
            if bytes.len() != 1 {
                anyhow::bail!("Delimiter must be a single ASCII character or 'tab' (got {s:?})");
            }
            Ok(bytes[0])
        }
    }
}
