use std::io::Write;

use super::domain::{CompetencyKey, EmployeeRecord};

const IDENTITY_COLUMNS: [&str; 7] = [
    "id",
    "year",
    "code",
    "full_name",
    "title",
    "department",
    "division",
];

/// Full employee table as CSV, one row per record in the given order.
pub fn write_employees_csv<W: Write>(
    writer: W,
    records: &[EmployeeRecord],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = IDENTITY_COLUMNS.to_vec();
    header.extend(CompetencyKey::ALL.iter().map(|key| key.column()));
    header.extend(CompetencyKey::ALL.iter().map(|key| key.requirement_column()));
    header.extend(["classification_core", "classification_new", "created_at"]);
    csv_writer.write_record(&header)?;

    for record in records {
        let profile = &record.profile;
        let mut row = vec![
            record.id.to_string(),
            profile.year.clone(),
            profile.code.clone(),
            profile.full_name.clone().unwrap_or_default(),
            profile.title.to_string(),
            profile.department.clone().unwrap_or_default(),
            profile.division.clone().unwrap_or_default(),
        ];
        row.extend(CompetencyKey::ALL.iter().map(|key| {
            profile
                .competencies
                .score(*key)
                .map(|score| score.value().to_string())
                .unwrap_or_default()
        }));
        row.extend(CompetencyKey::ALL.iter().map(|key| {
            profile
                .competencies
                .requirement(*key)
                .map(|score| score.value().to_string())
                .unwrap_or_default()
        }));
        row.push(record.classification.core.as_str().to_string());
        row.push(record.classification.new.as_str().to_string());
        row.push(record.created_at.to_rfc3339());
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}
