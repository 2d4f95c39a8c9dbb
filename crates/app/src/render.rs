use file_scan_core::{
    Document, FailureKind, FileDetails, MatchResult, ScanError, ScanReport, Table, TextSource,
};
use std::fmt::Write;

/// User-facing message for a failed scan, worded by failure class.
pub fn failure_message(error: &ScanError) -> String {
    match (error.category(), error) {
        (_, ScanError::NoTextExtracted(_)) => "No text extracted from the image.".to_string(),
        (FailureKind::Extraction, _) => error.to_string(),
        (FailureKind::Unsupported, _) => format!("Unsupported file type. {error}"),
        (FailureKind::Query, _) => "Enter text to search for.".to_string(),
        _ => format!("Error processing file: {error}"),
    }
}

pub fn render_details(details: &FileDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File details:");
    let _ = writeln!(out, "  Filename: {}", details.file_name);
    let _ = writeln!(out, "  Size: {}", details.size_kb());
    let _ = writeln!(out, "  Type: {}", details.kind);
    let _ = writeln!(out, "  SHA-256: {}", details.checksum);
    out
}

pub fn render_line_matches(lines: &[String]) -> String {
    if lines.is_empty() {
        return "No matches found.\n".to_string();
    }

    let mut out = format!("Found {} match(es):\n", lines.len());
    for (position, line) in lines.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", position + 1, line);
    }
    out
}

pub fn render_row_matches(table: &Table) -> String {
    if table.is_empty() {
        return "No matches found in the data.\n".to_string();
    }

    format!("Found {} row(s)!\n{}", table.len(), render_table(table))
}

/// Fixed-width grid with the source row index in the first column.
pub fn render_table(table: &Table) -> String {
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.len() + 1);
    let mut header = vec![String::new()];
    header.extend(table.columns.iter().cloned());
    grid.push(header);

    for row in &table.rows {
        let mut line = vec![row.index.to_string()];
        line.extend(row.cells.iter().map(|cell| cell.to_string()));
        grid.push(line);
    }

    let column_count = grid.iter().map(Vec::len).max().unwrap_or(0);
    let widths = (0..column_count)
        .map(|column| {
            grid.iter()
                .filter_map(|line| line.get(column))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();

    let mut out = String::new();
    for line in grid {
        let padded = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", padded.trim_end());
    }
    out
}

pub fn render_report(report: &ScanReport, preview_rows: usize) -> String {
    let mut out = render_details(&report.details);
    let _ = writeln!(out, "Query: {}", report.query);
    out.push('\n');

    match &report.document {
        Document::Text(document) => {
            let heading = match &report.text_source {
                Some(TextSource::Ocr { backend }) => format!("Extracted text ({backend}):"),
                _ => "File content:".to_string(),
            };
            let _ = writeln!(out, "{heading}");
            let _ = writeln!(out, "{}", document.text());
        }
        Document::Table(table) => {
            let _ = writeln!(
                out,
                "Preview ({} of {} row(s)):",
                table.len().min(preview_rows),
                table.len()
            );
            out.push_str(&render_table(&table.head(preview_rows)));
        }
    }
    out.push('\n');

    match &report.matches {
        MatchResult::Lines(lines) => out.push_str(&render_line_matches(lines)),
        MatchResult::Rows(rows) => out.push_str(&render_row_matches(rows)),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use file_scan_core::{CellValue, ExtractError};

    fn roster() -> Table {
        let mut table = Table::new(vec!["name".to_string(), "score".to_string()]);
        table
            .push_row(vec![CellValue::Text("Alice".to_string()), CellValue::Int(90)])
            .expect("row fits header");
        table
            .push_row(vec![CellValue::Text("bob".to_string()), CellValue::Int(70)])
            .expect("row fits header");
        table
    }

    #[test]
    fn line_matches_are_numbered() {
        let rendered = render_line_matches(&["Bob Jones".to_string(), "bob ray".to_string()]);
        assert_eq!(rendered, "Found 2 match(es):\n1. Bob Jones\n2. bob ray\n");
        assert_eq!(render_line_matches(&[]), "No matches found.\n");
    }

    #[test]
    fn table_columns_are_aligned() {
        let rendered = render_table(&roster());
        assert_eq!(rendered, "   name   score\n0  Alice  90\n1  bob    70\n");
    }

    #[test]
    fn empty_row_matches_have_a_message() {
        let empty = roster().with_rows(Vec::new());
        assert_eq!(render_row_matches(&empty), "No matches found in the data.\n");
        assert!(render_row_matches(&roster()).starts_with("Found 2 row(s)!\n"));
    }

    #[test]
    fn blank_query_asks_for_search_text() {
        assert_eq!(
            failure_message(&ScanError::EmptyQuery),
            "Enter text to search for."
        );
    }

    #[test]
    fn failure_messages_follow_category() {
        assert_eq!(
            failure_message(&ScanError::NoTextExtracted("a.png".to_string())),
            "No text extracted from the image."
        );
        assert!(failure_message(&ScanError::UnsupportedKind("a.pdf".to_string()))
            .starts_with("Unsupported file type."));
        assert!(failure_message(&ScanError::Decode("bad".to_string()))
            .starts_with("Error processing file:"));
        assert!(failure_message(&ScanError::Extraction(ExtractError::InvalidOutput(
            "bad".to_string()
        )))
        .starts_with("error extracting text from image"));
    }
}
