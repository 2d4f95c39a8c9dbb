mod render;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use file_scan_core::{
    scan_folder_best_effort, write_csv, FileKind, FileScanner, MatchResult, OcrConfig, Query,
    TextExtractor, Upload, DEFAULT_EXPORT_FILE_NAME,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const FOLDER_PREVIEW_ROWS: usize = 5;

#[derive(Parser)]
#[command(name = "file-scan", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// OCR backend used for image files
    #[arg(long, value_enum, env = "FILE_SCAN_OCR_BACKEND", default_value = "tesseract")]
    ocr_backend: OcrBackendArg,

    /// Path to the Tesseract executable
    #[arg(long, env = "TESSERACT_PATH", default_value = "tesseract")]
    tesseract_path: PathBuf,

    /// Endpoint of the neural OCR service
    #[arg(long, env = "OCR_ENDPOINT")]
    ocr_endpoint: Option<String>,

    /// Bearer token for the neural OCR service
    #[arg(long, env = "OCR_API_KEY", hide_env_values = true)]
    ocr_api_key: Option<String>,

    /// Comma-separated OCR language codes
    #[arg(long, env = "OCR_LANGUAGES", value_delimiter = ',', default_value = "en")]
    ocr_languages: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OcrBackendArg {
    /// Local Tesseract executable.
    Tesseract,
    /// HTTP service running a neural OCR model.
    Neural,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Text,
    Csv,
    Spreadsheet,
    Image,
}

impl From<KindArg> for FileKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Text => FileKind::PlainText,
            KindArg::Csv => FileKind::Csv,
            KindArg::Spreadsheet => FileKind::Spreadsheet,
            KindArg::Image => FileKind::Image,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Search one file for a text fragment.
    Scan {
        /// File to search (text, csv, spreadsheet, or image).
        #[arg(long)]
        file: PathBuf,
        /// Text to search for, case-insensitive.
        #[arg(long)]
        query: String,
        /// Override the file kind inferred from the extension.
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Write matched rows as CSV (tables only).
        #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_EXPORT_FILE_NAME)]
        export: Option<PathBuf>,
        /// Number of table rows to preview.
        #[arg(long, default_value = "5")]
        preview_rows: usize,
        /// Print the scan report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Search every supported file in a folder, recursively.
    ScanFolder {
        #[arg(long)]
        folder: PathBuf,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the text recognized in an image.
    Extract {
        #[arg(long)]
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "file-scan boot"
    );

    let scanner = build_scanner(&cli)?;

    match cli.command {
        Command::Scan {
            file,
            query,
            kind,
            export,
            preview_rows,
            json,
        } => run_scan(
            &scanner,
            &file,
            &query,
            kind,
            export.as_deref(),
            preview_rows,
            json,
        ),
        Command::ScanFolder {
            folder,
            query,
            json,
        } => run_scan_folder(&scanner, &folder, &query, json),
        Command::Extract { file } => run_extract(&scanner, &file),
    }
}

fn ocr_config(cli: &Cli) -> Option<OcrConfig> {
    let languages = cli
        .ocr_languages
        .iter()
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .collect::<Vec<_>>();

    match cli.ocr_backend {
        OcrBackendArg::Tesseract => Some(OcrConfig::LocalExecutable {
            executable: cli.tesseract_path.clone(),
            languages,
        }),
        OcrBackendArg::Neural => {
            let endpoint = cli.ocr_endpoint.clone()?;
            Some(OcrConfig::NeuralModel {
                endpoint,
                api_key: cli.ocr_api_key.clone(),
                languages,
            })
        }
    }
}

fn build_scanner(cli: &Cli) -> anyhow::Result<FileScanner> {
    match ocr_config(cli) {
        Some(config) => {
            let extractor = config.build().context("invalid ocr configuration")?;
            info!(backend = extractor.backend_name(), "ocr backend ready");
            Ok(FileScanner::with_extractor(extractor))
        }
        None => {
            warn!("neural ocr selected without --ocr-endpoint; image files will be rejected");
            Ok(FileScanner::new())
        }
    }
}

fn parse_query(raw: &str) -> anyhow::Result<Query> {
    Query::parse(raw).map_err(|error| anyhow::anyhow!(render::failure_message(&error)))
}

fn load_upload(file: &Path, kind: Option<KindArg>) -> anyhow::Result<Upload> {
    let loaded = match kind {
        Some(kind) => Upload::from_path_with_kind(file, kind.into()),
        None => Upload::from_path(file),
    };
    loaded.map_err(|error| anyhow::anyhow!(render::failure_message(&error)))
}

fn run_scan(
    scanner: &FileScanner,
    file: &Path,
    query: &str,
    kind: Option<KindArg>,
    export: Option<&Path>,
    preview_rows: usize,
    json: bool,
) -> anyhow::Result<()> {
    let query = parse_query(query)?;
    let upload = load_upload(file, kind)?;

    let report = scanner
        .scan(&upload, &query)
        .map_err(|error| anyhow::anyhow!(render::failure_message(&error)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_report(&report, preview_rows));
    }

    if let Some(path) = export {
        match &report.matches {
            MatchResult::Rows(rows) if !rows.is_empty() => {
                write_csv(rows, path)
                    .map_err(|error| anyhow::anyhow!(render::failure_message(&error)))?;
                info!(path = %path.display(), row_count = rows.len(), "exported matches");
                if !json {
                    println!("Results exported to {}", path.display());
                }
            }
            MatchResult::Rows(_) => warn!("no matching rows to export"),
            MatchResult::Lines(_) => warn!("export is only available for tabular files"),
        }
    }

    Ok(())
}

fn run_scan_folder(
    scanner: &FileScanner,
    folder: &Path,
    query: &str,
    json: bool,
) -> anyhow::Result<()> {
    let query = parse_query(query)?;
    let report = scan_folder_best_effort(scanner, folder, &query)
        .map_err(|error| anyhow::anyhow!(render::failure_message(&error)))?;

    if !report.skipped_files.is_empty() {
        warn!(
            "skipped_files={} for folder={}",
            report.skipped_files.len(),
            folder.display()
        );
    }

    if json {
        let skipped = report
            .skipped_files
            .iter()
            .map(|skipped| {
                serde_json::json!({
                    "path": skipped.path.display().to_string(),
                    "reason": skipped.reason,
                })
            })
            .collect::<Vec<_>>();
        let payload = serde_json::json!({
            "reports": report.reports,
            "skipped_files": skipped,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for scan in &report.reports {
        print!("{}", render::render_report(scan, FOLDER_PREVIEW_ROWS));
        println!();
    }
    for skipped in &report.skipped_files {
        println!("skipped: {} ({})", skipped.path.display(), skipped.reason);
    }
    println!(
        "{} file(s) scanned, {} skipped",
        report.reports.len(),
        report.skipped_files.len()
    );

    Ok(())
}

fn run_extract(scanner: &FileScanner, file: &Path) -> anyhow::Result<()> {
    let upload = load_upload(file, Some(KindArg::Image))?;
    let (document, backend) = scanner
        .extract_image_text(&upload)
        .map_err(|error| anyhow::anyhow!(render::failure_message(&error)))?;

    info!(backend, line_count = document.lines.len(), "extracted text");
    println!("{}", document.text());
    Ok(())
}
