use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ocr executable {executable} could not be started: {reason}")]
    Spawn { executable: String, reason: String },

    #[error("ocr executable exited with {status}: {stderr}")]
    ProcessFailed { status: String, stderr: String },

    #[error("ocr output is not valid utf-8: {0}")]
    InvalidOutput(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("query is empty")]
    EmptyQuery,

    #[error("unsupported file type: {0}")]
    UnsupportedKind(String),

    #[error("could not decode file: {0}")]
    Decode(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("error extracting text from image: {0}")]
    Extraction(#[from] ExtractError),

    #[error("no text extracted from the image: {0}")]
    NoTextExtracted(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("export failed: {0}")]
    Export(String),
}

/// Coarse failure class a caller can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Extraction,
    Unsupported,
    Decoding,
    Query,
    Config,
    Io,
    Export,
}

impl ScanError {
    pub fn category(&self) -> FailureKind {
        match self {
            ScanError::Extraction(_) | ScanError::NoTextExtracted(_) => FailureKind::Extraction,
            ScanError::UnsupportedKind(_) => FailureKind::Unsupported,
            ScanError::Decode(_) | ScanError::Csv(_) | ScanError::Spreadsheet(_) => {
                FailureKind::Decoding
            }
            ScanError::EmptyQuery => FailureKind::Query,
            ScanError::InvalidConfig(_) | ScanError::Url(_) | ScanError::InvalidArgument(_) => {
                FailureKind::Config
            }
            ScanError::Io(_) => FailureKind::Io,
            ScanError::Export(_) => FailureKind::Export,
        }
    }
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;
