use crate::error::ScanError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// A literal, case-insensitive search fragment.
///
/// Empty and whitespace-only fragments are rejected at construction, so a
/// `Query` always narrows the result instead of matching everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    text: String,
    folded: String,
}

impl Query {
    pub fn parse(raw: impl Into<String>) -> Result<Self, ScanError> {
        let text = raw.into();
        if text.trim().is_empty() {
            return Err(ScanError::EmptyQuery);
        }

        let folded = text.to_lowercase();
        Ok(Self { text, folded })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn is_found_in(&self, candidate: &str) -> bool {
        candidate.to_lowercase().contains(&self.folded)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocument {
    pub lines: Vec<String>,
}

impl TextDocument {
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }

        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Self { lines }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Infers a typed value from a raw field the way a header-driven table
    /// reader would: blank is null, then integer, float, boolean, text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return CellValue::Int(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            if value.is_finite() {
                return CellValue::Float(value);
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        CellValue::Text(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// String form used for matching and export. `None` for null cells.
    pub fn as_search_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(value) => Some(value.to_string()),
            CellValue::Int(value) => Some(value.to_string()),
            CellValue::Float(value) => Some(format_float(*value)),
            CellValue::Text(value) => Some(value.clone()),
            CellValue::DateTime(value) => Some(value.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_search_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Zero-based position of the row in the source table.
    pub index: usize,
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding missing trailing cells with nulls.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) -> Result<(), ScanError> {
        if cells.len() > self.columns.len() {
            return Err(ScanError::Decode(format!(
                "row {} has {} fields, expected {}",
                self.rows.len() + 1,
                cells.len(),
                self.columns.len()
            )));
        }
        cells.resize(self.columns.len(), CellValue::Null);

        let index = self.rows.len();
        self.rows.push(Row { index, cells });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn cell<'a>(&self, row: &'a Row, column: &str) -> Option<&'a CellValue> {
        self.column_index(column).and_then(|index| row.cells.get(index))
    }

    pub fn head(&self, count: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(count).cloned().collect(),
        }
    }

    /// Same columns, only the given rows (indices preserved).
    pub fn with_rows(&self, rows: Vec<Row>) -> Table {
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum MatchResult {
    Lines(Vec<String>),
    Rows(Table),
}

impl MatchResult {
    pub fn len(&self) -> usize {
        match self {
            MatchResult::Lines(lines) => lines.len(),
            MatchResult::Rows(table) => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    PlainText,
    Csv,
    Spreadsheet,
    Image,
}

impl FileKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        let lowered = extension.to_ascii_lowercase();
        match lowered.as_str() {
            "txt" | "text" | "log" | "md" => Some(FileKind::PlainText),
            "csv" => Some(FileKind::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(FileKind::Spreadsheet),
            "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff" | "gif" | "webp" => {
                Some(FileKind::Image)
            }
            _ => None,
        }
    }

    /// Files without an extension are treated as a generic text stream.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            None => Ok(FileKind::PlainText),
            Some(extension) => Self::from_extension(extension)
                .ok_or_else(|| ScanError::UnsupportedKind(path.display().to_string())),
        }
    }

    pub fn from_mime(mime: &str) -> Result<Self, ScanError> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" | "application/octet-stream" => Ok(FileKind::PlainText),
            "text/csv" => Ok(FileKind::Csv),
            "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.oasis.opendocument.spreadsheet" => Ok(FileKind::Spreadsheet),
            other if other.starts_with("image/") => Ok(FileKind::Image),
            _ => Err(ScanError::UnsupportedKind(mime.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::PlainText => "text",
            FileKind::Csv => "csv",
            FileKind::Spreadsheet => "spreadsheet",
            FileKind::Image => "image",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDetails {
    pub file_name: String,
    pub size_bytes: u64,
    pub kind: FileKind,
    pub checksum: String,
    pub loaded_at: DateTime<Utc>,
}

impl FileDetails {
    pub fn size_kb(&self) -> String {
        format!("{:.2} KB", self.size_bytes as f64 / 1024.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Document {
    Text(TextDocument),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Plain,
    Ocr { backend: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub scanned_at: DateTime<Utc>,
    pub details: FileDetails,
    pub query: String,
    pub text_source: Option<TextSource>,
    pub document: Document,
    pub matches: MatchResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_rejects_blank_input() {
        assert!(matches!(Query::parse(""), Err(ScanError::EmptyQuery)));
        assert!(matches!(Query::parse("  \t"), Err(ScanError::EmptyQuery)));
    }

    #[test]
    fn query_keeps_literal_text_and_folds_case() -> Result<(), ScanError> {
        let query = Query::parse("Bob ")?;
        assert_eq!(query.as_str(), "Bob ");
        assert_eq!(query.folded(), "bob ");
        assert!(query.is_found_in("BOB JONES"));
        assert!(!query.is_found_in("Bobby"));
        Ok(())
    }

    #[test]
    fn text_document_keeps_blank_lines_for_display() {
        let document = TextDocument::from_text("one\r\n\ntwo");
        assert_eq!(document.lines, vec!["one", "", "two"]);
        assert_eq!(document.text(), "one\n\ntwo");
        assert!(TextDocument::from_text("").lines.is_empty());
    }

    #[test]
    fn cell_inference_prefers_numbers() {
        assert_eq!(CellValue::infer(""), CellValue::Null);
        assert_eq!(CellValue::infer("70"), CellValue::Int(70));
        assert_eq!(CellValue::infer("2.5"), CellValue::Float(2.5));
        assert_eq!(CellValue::infer("TRUE"), CellValue::Bool(true));
        assert_eq!(CellValue::infer("nan"), CellValue::Text("nan".to_string()));
        assert_eq!(CellValue::infer("Bob"), CellValue::Text("Bob".to_string()));
    }

    #[test]
    fn integral_floats_render_with_decimal_place() {
        assert_eq!(CellValue::Float(90.0).as_search_text().as_deref(), Some("90.0"));
        assert_eq!(CellValue::Float(0.25).as_search_text().as_deref(), Some("0.25"));
        assert_eq!(CellValue::Null.as_search_text(), None);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_rejected() {
        let mut table = Table::new(vec!["name".to_string(), "score".to_string()]);
        table
            .push_row(vec![CellValue::Text("Alice".to_string())])
            .expect("short row should be padded");
        assert_eq!(table.rows[0].cells[1], CellValue::Null);

        let long = table.push_row(vec![CellValue::Int(1), CellValue::Int(2), CellValue::Int(3)]);
        assert!(matches!(long, Err(ScanError::Decode(_))));
    }

    #[test]
    fn file_kind_follows_extension_and_mime() -> Result<(), ScanError> {
        assert_eq!(FileKind::from_path(Path::new("list.CSV"))?, FileKind::Csv);
        assert_eq!(FileKind::from_path(Path::new("scan.jpeg"))?, FileKind::Image);
        assert_eq!(FileKind::from_path(Path::new("README"))?, FileKind::PlainText);
        assert!(matches!(
            FileKind::from_path(Path::new("report.pdf")),
            Err(ScanError::UnsupportedKind(_))
        ));

        assert_eq!(FileKind::from_mime("image/png")?, FileKind::Image);
        assert_eq!(
            FileKind::from_mime("text/plain; charset=utf-8")?,
            FileKind::PlainText
        );
        assert!(FileKind::from_mime("application/pdf").is_err());
        Ok(())
    }
}
