use crate::error::ScanError;
use crate::models::{FileDetails, FileKind};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One file handed to the scanner: its name, raw bytes, and kind.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
    pub kind: FileKind,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            bytes,
            kind,
        }
    }

    /// Reads a file, inferring its kind from the extension.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let kind = FileKind::from_path(path)?;
        Self::from_path_with_kind(path, kind)
    }

    pub fn from_path_with_kind(path: &Path, kind: FileKind) -> Result<Self, ScanError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ScanError::InvalidArgument(format!("path has no file name: {}", path.display()))
            })?;

        let bytes = fs::read(path)?;
        Ok(Self::new(name, bytes, kind))
    }

    pub fn details(&self) -> FileDetails {
        FileDetails {
            file_name: self.name.clone(),
            size_bytes: self.bytes.len() as u64,
            kind: self.kind,
            checksum: digest_bytes(&self.bytes),
            loaded_at: Utc::now(),
        }
    }
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn digest_file(path: &Path) -> Result<String, ScanError> {
    let bytes = fs::read(path)?;
    Ok(digest_bytes(&bytes))
}

/// Recursively lists files whose extension maps to a supported kind, sorted.
pub fn discover_supported_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FileKind::from_extension)
            .is_some();

        if supported {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}
