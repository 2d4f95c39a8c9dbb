use crate::error::ScanError;
use crate::models::Table;
use std::fs;
use std::path::Path;

pub const DEFAULT_EXPORT_FILE_NAME: &str = "search_results.csv";

/// Serializes the table as CSV: header first, columns in table order, no row
/// index, nulls as empty fields.
pub fn rows_to_csv(table: &Table) -> Result<String, ScanError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;

    for row in &table.rows {
        writer.write_record(row.cells.iter().map(|cell| cell.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| ScanError::Export(error.to_string()))?;
    String::from_utf8(bytes).map_err(|error| ScanError::Export(error.to_string()))
}

pub fn write_csv(table: &Table, path: &Path) -> Result<(), ScanError> {
    let serialized = rows_to_csv(table)?;
    fs::write(path, serialized)?;
    Ok(())
}
