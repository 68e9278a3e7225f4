use std::io::Read;

use serde::Serialize;

use super::normalizer::normalize_header;
use super::row::{RawRow, RawValue};

/// Decoded upload: normalized header order plus one raw row per data record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedUpload {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<ParsedUpload, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut columns = Vec::with_capacity(headers.len());
    for header in headers.iter() {
        let column = normalize_header(header);
        if !column.is_empty() && !columns.contains(&column) {
            columns.push(column);
        }
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut row = RawRow::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            row.insert(header, RawValue::from_cell(cell));
        }
        rows.push(row);
    }

    Ok(ParsedUpload { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_rows_normalizes_headers_and_blank_cells() {
        let upload = parse_rows(Cursor::new(
            "\u{feff}Code, Year ,Full Name,Communication Req,Resilience\nE001,2025,Ana Lee,4,\n",
        ))
        .expect("parse");

        assert_eq!(
            upload.columns,
            vec!["code", "year", "full_name", "communication_req", "resilience"]
        );
        let row = &upload.rows[0];
        assert_eq!(row.text("full_name").as_deref(), Some("Ana Lee"));
        assert_eq!(row.text("communication_req").as_deref(), Some("4"));
        assert_eq!(row.get("resilience"), Some(&RawValue::Blank));
    }

    #[test]
    fn short_rows_leave_trailing_columns_absent() {
        let upload = parse_rows(Cursor::new("code,year,title\nE001,2025\n")).expect("parse");
        assert_eq!(upload.rows.len(), 1);
        assert!(upload.rows[0].get("title").is_none());
    }
}
