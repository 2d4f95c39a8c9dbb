use crate::models::{Query, Row, Table, TextDocument};

/// Returns the trimmed, non-empty lines of `text` that contain `query`,
/// ignoring case, in document order.
pub fn match_lines(text: &str, query: &Query) -> Vec<String> {
    filter_lines(text.split('\n'), query)
}

pub fn match_document_lines(document: &TextDocument, query: &Query) -> Vec<String> {
    filter_lines(document.lines.iter().map(String::as_str), query)
}

fn filter_lines<'a>(lines: impl Iterator<Item = &'a str>, query: &Query) -> Vec<String> {
    lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| query.is_found_in(line))
        .map(str::to_string)
        .collect()
}

/// Returns the rows where at least one non-null cell contains `query`,
/// ignoring case. Columns, values, and original row indices are kept.
pub fn match_rows(table: &Table, query: &Query) -> Table {
    let rows = table
        .rows
        .iter()
        .filter(|row| row_contains(row, query))
        .cloned()
        .collect();

    table.with_rows(rows)
}

fn row_contains(row: &Row, query: &Query) -> bool {
    row.cells
        .iter()
        .filter_map(|cell| cell.as_search_text())
        .any(|text| query.is_found_in(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;
    use crate::ScanError;

    fn scores_table() -> Table {
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
    fn matching_lines_are_trimmed_and_ordered() -> Result<(), ScanError> {
        let text = "Alice Smith\nBob Jones\n\nCarol Ray";
        assert_eq!(match_lines(text, &Query::parse("bob")?), vec!["Bob Jones"]);

        let text = "  bob one  \nnothing\n\tBOB two\r\n";
        assert_eq!(
            match_lines(text, &Query::parse("Bob")?),
            vec!["bob one", "BOB two"]
        );
        Ok(())
    }

    #[test]
    fn blank_lines_never_match() -> Result<(), ScanError> {
        let matches = match_lines("\n   \n\t\n", &Query::parse("a")?);
        assert!(matches.is_empty());
        assert!(match_lines("", &Query::parse("a")?).is_empty());
        Ok(())
    }

    #[test]
    fn duplicate_lines_are_kept() -> Result<(), ScanError> {
        let matches = match_lines("pass\nfail\npass", &Query::parse("PASS")?);
        assert_eq!(matches, vec!["pass", "pass"]);
        Ok(())
    }

    #[test]
    fn document_lines_match_like_raw_text() -> Result<(), ScanError> {
        let query = Query::parse("ray")?;
        let text = "Alice Smith\nBob Jones\n\nCarol Ray";
        let document = TextDocument::from_text(text);
        assert_eq!(match_document_lines(&document, &query), match_lines(text, &query));
        Ok(())
    }

    #[test]
    fn rows_match_on_any_cell_ignoring_case() -> Result<(), ScanError> {
        let table = scores_table();
        let matches = match_rows(&table, &Query::parse("BOB")?);

        assert_eq!(matches.columns, table.columns);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches.rows[0].index, 1);
        assert_eq!(
            matches.cell(&matches.rows[0], "score"),
            Some(&CellValue::Int(70))
        );
        Ok(())
    }

    #[test]
    fn numeric_cells_match_on_their_string_form() -> Result<(), ScanError> {
        let table = scores_table();
        let matches = match_rows(&table, &Query::parse("9")?);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches.rows[0].index, 0);
        Ok(())
    }

    #[test]
    fn null_cells_never_match() -> Result<(), ScanError> {
        let mut table = Table::new(vec!["name".to_string(), "note".to_string()]);
        table.push_row(vec![CellValue::Text("Dana".to_string())])?;

        assert!(match_rows(&table, &Query::parse("null")?).is_empty());
        assert!(match_rows(&table, &Query::parse("nan")?).is_empty());
        assert_eq!(match_rows(&table, &Query::parse("dan")?).len(), 1);
        Ok(())
    }

    #[test]
    fn absent_query_yields_empty_results() -> Result<(), ScanError> {
        let query = Query::parse("zzz")?;
        assert!(match_rows(&scores_table(), &query).is_empty());
        assert!(match_lines("Alice\nBob", &query).is_empty());
        Ok(())
    }

    #[test]
    fn row_order_is_preserved() -> Result<(), ScanError> {
        let mut table = Table::new(vec!["city".to_string()]);
        for city in ["Oslo", "Lima", "Osaka", "Bern", "Oxford"] {
            table.push_row(vec![CellValue::Text(city.to_string())])?;
        }

        let matches = match_rows(&table, &Query::parse("o")?);
        let indices: Vec<usize> = matches.rows.iter().map(|row| row.index).collect();
        assert_eq!(indices, vec![0, 2, 4]);
        Ok(())
    }
}
