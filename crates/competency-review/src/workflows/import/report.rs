use std::io::Write;

use super::pipeline::RejectedRow;

/// Writes rejected rows for download: the upload's columns, then `row` and `reasons`.
///
/// An appended column whose name the upload already uses is prefixed with `rejected_`
/// until it is unique.
pub fn write_rejected_csv<W: Write>(
    writer: W,
    columns: &[String],
    rejected: &[RejectedRow],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = columns.to_vec();
    for appended in ["row", "reasons"] {
        let name = free_column_name(appended, &header);
        header.push(name);
    }
    csv_writer.write_record(&header)?;

    for rejected_row in rejected {
        let mut record: Vec<String> = columns
            .iter()
            .map(|column| {
                rejected_row
                    .row
                    .get(column)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            })
            .collect();
        record.push(rejected_row.position.to_string());
        record.push(rejected_row.reasons.join("; "));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn free_column_name(base: &str, taken: &[String]) -> String {
    let mut name = base.to_string();
    while taken.iter().any(|column| *column == name) {
        name = format!("rejected_{name}");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::import::{RawRow, RawValue};

    #[test]
    fn rejected_csv_keeps_original_cells_and_reasons() {
        let rejected = vec![RejectedRow {
            position: 3,
            row: RawRow::new()
                .with("code", RawValue::from_cell("E009"))
                .with("year", RawValue::Number(2025.0)),
            reasons: vec![
                "Missing value for title".to_string(),
                "Missing value for communication (core competency)".to_string(),
            ],
        }];
        let columns = vec!["code".to_string(), "year".to_string(), "title".to_string()];

        let mut buffer = Vec::new();
        write_rejected_csv(&mut buffer, &columns, &rejected).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8");

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("code,year,title,row,reasons"));
        assert_eq!(
            lines.next(),
            Some("E009,2025,,3,Missing value for title; Missing value for communication (core competency)")
        );
    }

    #[test]
    fn appended_columns_do_not_collide_with_upload_columns() {
        let rejected = vec![RejectedRow {
            position: 1,
            row: RawRow::new()
                .with("code", RawValue::from_cell("E010"))
                .with("row", RawValue::from_cell("A"))
                .with("reasons", RawValue::from_cell("promotion"))
                .with("rejected_row", RawValue::from_cell("x")),
            reasons: vec!["Missing value for year".to_string()],
        }];
        let columns = vec![
            "code".to_string(),
            "row".to_string(),
            "reasons".to_string(),
            "rejected_row".to_string(),
        ];

        let mut buffer = Vec::new();
        write_rejected_csv(&mut buffer, &columns, &rejected).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8");

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("code,row,reasons,rejected_row,rejected_rejected_row,rejected_reasons")
        );
        assert_eq!(lines.next(), Some("E010,A,promotion,x,1,Missing value for year"));
    }
}
