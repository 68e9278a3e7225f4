use std::collections::HashSet;

use serde::Serialize;

use super::row::RawRow;
use crate::workflows::assessment::domain::{
    CandidateRecord, CompetencyKey, CompetencyScores, EmployeeKey, EmployeeProfile, Title,
};
use crate::workflows::assessment::duplicates::DuplicateDetector;
use crate::workflows::assessment::rules::CompetencyRuleSet;
use crate::workflows::assessment::scoring::{Score, ScoreValidator};

/// A row that failed validation, with every reason collected for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    /// 1-based position among the data rows of the upload.
    pub position: usize,
    pub row: RawRow,
    pub reasons: Vec<String>,
}

/// Partition of an upload into accepted candidates and rejected rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidatedBatch {
    pub accepted: Vec<CandidateRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// Validates rows without touching storage; persistence is a separate confirm step.
pub struct ImportPipeline;

impl ImportPipeline {
    pub fn validate_batch(rows: &[RawRow], existing: &HashSet<EmployeeKey>) -> ValidatedBatch {
        let keys: Vec<Option<EmployeeKey>> = rows.iter().map(identity_key).collect();
        let batch_counts = DuplicateDetector::batch_counts(keys.iter().flatten());

        let mut batch = ValidatedBatch::default();
        for (index, (row, key)) in rows.iter().zip(&keys).enumerate() {
            let mut reasons = Vec::new();
            if let Some(key) = key {
                reasons.extend(DuplicateDetector::check(key, existing, &batch_counts));
            }

            match validate_row(row, reasons) {
                Ok(profile) => {
                    batch
                        .accepted
                        .push(CandidateRecord::pending(index + 1, row.clone(), profile))
                }
                Err(reasons) => batch.rejected.push(RejectedRow {
                    position: index + 1,
                    row: row.clone(),
                    reasons,
                }),
            }
        }

        batch
    }
}

fn identity_key(row: &RawRow) -> Option<EmployeeKey> {
    let code = row.text("code")?;
    let year = row.text("year")?;
    Some(EmployeeKey::new(&code, &year))
}

/// Runs every per-row rule, appending to `reasons`. Any reason rejects the row.
fn validate_row(row: &RawRow, mut reasons: Vec<String>) -> Result<EmployeeProfile, Vec<String>> {
    let code = row.text("code");
    let year = row.text("year");
    let title = row.text("title").and_then(|raw| Title::parse(&raw));

    // Duplicate reasons only exist when both identity fields are present.
    if code.is_none() {
        reasons.push("Missing value for code".to_string());
    }
    if year.is_none() {
        reasons.push("Missing value for year".to_string());
    }
    if title.is_none() {
        reasons.push("Missing value for title".to_string());
    }

    let mut competencies = CompetencyScores::default();
    for key in CompetencyKey::ALL {
        if let Some(score) = normalize_field(row, key.column(), &mut reasons) {
            competencies.set_score(key, score);
        }
        if let Some(requirement) = normalize_field(row, key.requirement_column(), &mut reasons) {
            competencies.set_requirement(key, requirement);
        }
    }

    let required: &[CompetencyKey] = match &title {
        Some(title) => {
            reasons.extend(CompetencyRuleSet::validate_forbidden(title, row));
            CompetencyRuleSet::active_core_keys(title.tier())
        }
        None => &CompetencyKey::BASE_CORE,
    };

    for key in required {
        for column in key.columns() {
            if !row.is_filled(column) {
                reasons.push(format!("Missing value for {} (core competency)", column));
            }
        }
    }

    match (code, year, title) {
        (Some(code), Some(year), Some(title)) if reasons.is_empty() => Ok(EmployeeProfile {
            code,
            year,
            full_name: row.text("full_name"),
            title,
            department: row.text("department"),
            division: row.text("division"),
            competencies,
        }),
        _ => Err(reasons),
    }
}

fn normalize_field(row: &RawRow, column: &str, reasons: &mut Vec<String>) -> Option<Score> {
    let raw = row.get(column)?;
    match ScoreValidator::normalize(raw) {
        Ok(score) => score,
        Err(err) => {
            reasons.push(format!("Invalid value for {}: {}", column, err));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::import::RawValue;

    fn assessed_row(code: &str, title: &str) -> RawRow {
        let mut row = RawRow::new()
            .with("code", RawValue::from_cell(code))
            .with("year", RawValue::from_cell("2025"))
            .with("full_name", RawValue::from_cell("Mai Tran"))
            .with("title", RawValue::from_cell(title));
        for key in CompetencyKey::BASE_CORE {
            row.insert(key.column(), RawValue::Number(4.0));
            row.insert(key.requirement_column(), RawValue::Number(4.0));
        }
        row
    }

    fn junior_row(code: &str) -> RawRow {
        assessed_row(code, "Officer")
    }

    #[test]
    fn accepted_rows_carry_pending_labels() {
        let batch = ImportPipeline::validate_batch(&[junior_row("E001")], &HashSet::new());
        assert_eq!(batch.rejected, Vec::new());
        let candidate = &batch.accepted[0];
        assert_eq!(candidate.profile.full_name.as_deref(), Some("Mai Tran"));
        assert_eq!(
            candidate.classification,
            crate::workflows::assessment::Classification::pending()
        );
    }

    #[test]
    fn missing_identity_and_title_are_reported_first() {
        let row = RawRow::new().with("department", RawValue::from_cell("Ops"));
        let batch = ImportPipeline::validate_batch(&[row], &HashSet::new());
        let reasons = &batch.rejected[0].reasons;
        assert_eq!(reasons[0], "Missing value for code");
        assert_eq!(reasons[1], "Missing value for year");
        assert_eq!(reasons[2], "Missing value for title");
        assert!(reasons
            .iter()
            .any(|reason| reason == "Missing value for communication (core competency)"));
    }

    #[test]
    fn invalid_emerging_value_rejects_but_absent_one_does_not() {
        let absent = junior_row("E001");
        let invalid = junior_row("E002").with("resilience", RawValue::from_cell("7"));
        let batch = ImportPipeline::validate_batch(&[absent, invalid], &HashSet::new());

        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].position, 2);
        assert_eq!(
            batch.rejected[0].reasons,
            vec!["Invalid value for resilience: 7 is outside the allowed range 1-5".to_string()]
        );
    }

    #[test]
    fn standard_title_requires_leadership_keys() {
        let row = assessed_row("E003", "Manager");
        let batch = ImportPipeline::validate_batch(&[row], &HashSet::new());

        let reasons = &batch.rejected[0].reasons;
        assert_eq!(reasons.len(), 6);
        assert!(reasons
            .contains(&"Missing value for strategic_thinking (core competency)".to_string()));
        assert!(reasons
            .contains(&"Missing value for teamwork_leadership_req (core competency)".to_string()));
    }

    #[test]
    fn junior_row_reports_forbidden_leadership_values() {
        let row = junior_row("E004").with("talent_management", RawValue::from_cell("3"));
        let batch = ImportPipeline::validate_batch(&[row], &HashSet::new());
        assert_eq!(
            batch.rejected[0].reasons,
            vec!["Officer not allowed to fill talent_management".to_string()]
        );
    }
}
