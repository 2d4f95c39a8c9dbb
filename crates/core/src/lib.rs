pub mod decode;
pub mod error;
pub mod export;
pub mod extractor;
pub mod ingest;
pub mod matcher;
pub mod models;
pub mod scanner;

pub use decode::{
    decode_text, ensure_image, parse_csv, parse_spreadsheet, sniff_image_format, ImageFormat,
};
pub use error::{ExtractError, FailureKind, ScanError};
pub use export::{rows_to_csv, write_csv, DEFAULT_EXPORT_FILE_NAME};
pub use extractor::{
    NeuralOcrExtractor, OcrConfig, TesseractExtractor, TextExtractor, NEURAL_BACKEND,
    TESSERACT_BACKEND,
};
pub use ingest::{digest_bytes, digest_file, discover_supported_files, Upload};
pub use matcher::{match_document_lines, match_lines, match_rows};
pub use models::{
    CellValue, Document, FileDetails, FileKind, MatchResult, Query, Row, ScanReport,
    Table, TextDocument, TextSource,
};
pub use scanner::{scan_folder_best_effort, FileScanner, FolderScanReport, SkippedFile};
