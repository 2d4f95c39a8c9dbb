use crate::error::ScanError;
use crate::models::{CellValue, Table, TextDocument};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashMap;
use std::io::Cursor;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub fn decode_text(bytes: &[u8]) -> Result<TextDocument, ScanError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|error| ScanError::Decode(format!("text is not valid utf-8: {error}")))?;
    Ok(TextDocument::from_text(text))
}

/// Parses comma-separated bytes with a header row into a typed table.
pub fn parse_csv(bytes: &[u8]) -> Result<Table, ScanError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.is_empty() {
        return Err(ScanError::Decode("no columns to parse from file".to_string()));
    }

    let mut table = Table::new(normalize_headers(headers));
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(CellValue::infer).collect())?;
    }

    Ok(table)
}

/// Reads the first worksheet of an xlsx/xls/xlsb/ods workbook. The first row
/// is the header.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Table, ScanError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|error| ScanError::Spreadsheet(error.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ScanError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|error| ScanError::Spreadsheet(error.to_string()))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| ScanError::Decode("worksheet is empty".to_string()))?;

    let headers = header
        .iter()
        .map(|cell| cell_from_data(cell).as_search_text().unwrap_or_default())
        .collect();
    let mut table = Table::new(normalize_headers(headers));

    for row in rows {
        let cells = row.iter().map(cell_from_data).collect::<Vec<_>>();
        if cells.iter().all(CellValue::is_null) {
            continue;
        }
        table.push_row(cells)?;
    }

    Ok(table)
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(value) => CellValue::Int(*value),
        Data::Float(value) => CellValue::Float(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::String(value) if value.trim().is_empty() => CellValue::Null,
        Data::String(value) => CellValue::Text(value.clone()),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Float(value.as_f64()),
        },
        Data::DateTimeIso(value) | Data::DurationIso(value) => CellValue::Text(value.clone()),
        Data::Error(error) => CellValue::Text(error.to_string()),
    }
}

/// Blank names become `Unnamed: <i>`; repeated names get `.1`, `.2`, ...
fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {index}")
            } else {
                name
            };

            let count = seen.entry(base.clone()).or_insert(0);
            let unique = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    WebP,
}

pub fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else if bytes.starts_with(b"BM") {
        Some(ImageFormat::Bmp)
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some(ImageFormat::Tiff)
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some(ImageFormat::WebP)
    } else {
        None
    }
}

pub fn ensure_image(bytes: &[u8]) -> Result<ImageFormat, ScanError> {
    sniff_image_format(bytes)
        .ok_or_else(|| ScanError::Decode("file is not a recognized image".to_string()))
}
