use crate::decode::{decode_text, ensure_image, parse_csv, parse_spreadsheet};
use crate::extractor::TextExtractor;
use crate::ingest::{discover_supported_files, Upload};
use crate::matcher::{match_document_lines, match_rows};
use crate::models::{Document, FileKind, MatchResult, Query, ScanReport, TextDocument, TextSource};
use crate::ScanError;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Runs one search pass over one upload: decode, optional OCR, match.
#[derive(Default)]
pub struct FileScanner {
    extractor: Option<Box<dyn TextExtractor>>,
}

impl FileScanner {
    /// A scanner without OCR; image uploads fail with a configuration error.
    pub fn new() -> Self {
        Self { extractor: None }
    }

    pub fn with_extractor(extractor: Box<dyn TextExtractor>) -> Self {
        Self {
            extractor: Some(extractor),
        }
    }

    pub fn scan(&self, upload: &Upload, query: &Query) -> Result<ScanReport, ScanError> {
        let scan_id = Uuid::new_v4();
        let details = upload.details();
        debug!(%scan_id, file = %details.file_name, kind = %details.kind, "scan started");

        let (document, text_source, matches) = match upload.kind {
            FileKind::PlainText => {
                let text = decode_text(&upload.bytes)?;
                let matches = match_document_lines(&text, query);
                (Document::Text(text), Some(TextSource::Plain), MatchResult::Lines(matches))
            }
            FileKind::Image => {
                let (text, backend) = self.extract_image_text(upload)?;
                let matches = match_document_lines(&text, query);
                (
                    Document::Text(text),
                    Some(TextSource::Ocr {
                        backend: backend.to_string(),
                    }),
                    MatchResult::Lines(matches),
                )
            }
            FileKind::Csv => {
                let table = parse_csv(&upload.bytes)?;
                let matches = match_rows(&table, query);
                (Document::Table(table), None, MatchResult::Rows(matches))
            }
            FileKind::Spreadsheet => {
                let table = parse_spreadsheet(&upload.bytes)?;
                let matches = match_rows(&table, query);
                (Document::Table(table), None, MatchResult::Rows(matches))
            }
        };

        info!(
            %scan_id,
            file = %details.file_name,
            match_count = matches.len(),
            "scan finished"
        );

        Ok(ScanReport {
            scan_id,
            scanned_at: Utc::now(),
            details,
            query: query.as_str().to_string(),
            text_source,
            document,
            matches,
        })
    }

    /// Runs OCR only. An image that yields no text is an error so callers
    /// never search an empty document.
    pub fn extract_image_text(
        &self,
        upload: &Upload,
    ) -> Result<(TextDocument, &'static str), ScanError> {
        let extractor = self.extractor.as_ref().ok_or_else(|| {
            ScanError::InvalidConfig("no ocr backend configured for image files".to_string())
        })?;

        ensure_image(&upload.bytes)?;
        let lines = extractor.extract_lines(&upload.bytes)?;
        if lines.is_empty() {
            return Err(ScanError::NoTextExtracted(upload.name.clone()));
        }

        debug!(
            backend = extractor.backend_name(),
            line_count = lines.len(),
            "ocr produced text"
        );
        Ok((TextDocument::from_lines(lines), extractor.backend_name()))
    }
}

pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct FolderScanReport {
    pub reports: Vec<ScanReport>,
    pub skipped_files: Vec<SkippedFile>,
}

/// Scans every supported file under `folder`; files that fail are recorded as
/// skipped instead of aborting the pass.
pub fn scan_folder_best_effort(
    scanner: &FileScanner,
    folder: &Path,
    query: &Query,
) -> Result<FolderScanReport, ScanError> {
    let files = discover_supported_files(folder);

    if files.is_empty() {
        return Err(ScanError::InvalidArgument(format!(
            "no supported files found in {}",
            folder.display()
        )));
    }

    let mut reports = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        let outcome = Upload::from_path(&path).and_then(|upload| scanner.scan(&upload, query));

        match outcome {
            Ok(report) => reports.push(report),
            Err(error) => {
                warn!(path = %path.display(), reason = %error, "skipped file");
                skipped_files.push(SkippedFile {
                    path,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(FolderScanReport {
        reports,
        skipped_files,
    })
}
