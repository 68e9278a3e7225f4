use std::collections::HashSet;
use std::sync::Arc;

use competency_review::config::AssessmentConfig;
use competency_review::workflows::assessment::{
    AssessmentService, AssessmentServiceError, ClassificationMode, EmployeeRepository,
    InMemoryEmployeeRepository, Label,
};
use competency_review::workflows::import::{BulkImporter, ImportPipeline, StagingError};

const HEADER: &str = "Code,Year,Full Name,Title,Department,\
Communication,Communication Req,Continuous Learning,Continuous Learning Req,\
Critical Thinking,Critical Thinking Req,Data Analysis,Data Analysis Req,\
Digital Literacy,Digital Literacy Req,Problem Solving,Problem Solving Req,\
Strategic Thinking,Strategic Thinking Req,Talent Management,Talent Management Req,\
Teamwork Leadership,Teamwork Leadership Req";

fn upload(rows: &[&str]) -> String {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text
}

fn service() -> (
    AssessmentService<InMemoryEmployeeRepository>,
    Arc<InMemoryEmployeeRepository>,
) {
    let repository = Arc::new(InMemoryEmployeeRepository::default());
    let service = AssessmentService::new(
        repository.clone(),
        AssessmentConfig {
            classification_mode: ClassificationMode::Population,
            import_ttl_minutes: 30,
        },
    );
    (service, repository)
}

#[test]
fn junior_batch_with_missing_core_value_splits_into_accepted_and_rejected() {
    let csv = upload(&[
        "E001,2025,Ana Lee,Officer,Finance,4,4,4,4,4,4,4,4,4,4,4,4,,,,,,",
        "E002,2025,Bao Tran,Officer,Finance,4,4,4,4,,4,4,4,4,4,4,4,,,,,,",
    ]);
    let parsed = BulkImporter::from_reader(csv.as_bytes()).expect("csv decodes");

    let batch = ImportPipeline::validate_batch(&parsed.rows, &HashSet::new());

    assert_eq!(batch.accepted.len(), 1);
    assert_eq!(batch.rejected.len(), 1);
    assert_eq!(batch.accepted[0].profile.code, "E001");
    assert!(batch.rejected[0]
        .reasons
        .iter()
        .any(|reason| reason.contains("critical_thinking")));
}

#[test]
fn duplicates_are_reported_against_storage_and_within_the_file() {
    let (service, _) = service();
    let existing = upload(&["E001,2025,Ana Lee,Officer,Finance,4,4,4,4,4,4,4,4,4,4,4,4,,,,,,"]);
    let first = service.stage_csv(existing.as_bytes()).expect("stage");
    service.confirm_import(first.batch_id).expect("confirm");

    let preview = service
        .stage_csv(
            upload(&[
                "e001,2025,Ana Lee,Officer,Finance,4,4,4,4,4,4,4,4,4,4,4,4,,,,,,",
                "E009,2025,Cam Vu,Senior,Finance,4,4,4,4,4,4,4,4,4,4,4,4,,,,,,",
                "e009,2025,Cam Vu,Senior,Finance,4,4,4,4,4,4,4,4,4,4,4,4,,,,,,",
            ])
            .as_bytes(),
        )
        .expect("stage");

    assert_eq!(preview.accepted_count, 0);
    assert!(preview.rejected[0].reasons[0].contains("already exists"));
    assert!(preview.rejected[1].reasons[0].starts_with("Duplicate"));
    assert!(preview.rejected[2].reasons[0].starts_with("Duplicate"));
}

#[test]
fn confirmed_batches_are_classified_and_cannot_be_replayed() {
    let (service, repository) = service();
    let csv = upload(&[
        "M001,2025,Chi Do,Manager,Sales,4,4,4,4,4,4,4,4,4,4,4,4,4,4,4,4,4,4",
        "M002,2025,Duc Ha,Director,Sales,3,4,3,4,3,4,3,4,3,4,3,4,3,4,3,4,3,4",
        "M003,2025,Em Vo,Director,Sales,5,4,5,4,5,4,5,4,5,4,5,4,5,4,5,4,5,4",
    ]);

    let preview = service.stage_csv(csv.as_bytes()).expect("stage");
    assert_eq!(preview.accepted_count, 3);
    assert!(repository.is_empty());

    let outcome = service.confirm_import(preview.batch_id).expect("confirm");
    assert_eq!(outcome.inserted, 3);

    let mut labels: Vec<(String, Label)> = repository
        .all()
        .expect("all")
        .into_iter()
        .map(|record| (record.profile.code, record.classification.core))
        .collect();
    labels.sort_by(|left, right| left.0.cmp(&right.0));
    assert_eq!(
        labels,
        vec![
            ("M001".to_string(), Label::Medium),
            ("M002".to_string(), Label::Low),
            ("M003".to_string(), Label::High),
        ]
    );

    match service.confirm_import(preview.batch_id) {
        Err(AssessmentServiceError::Staging(StagingError::NotFound(_))) => {}
        other => panic!("expected consumed batch, got {other:?}"),
    }
}

#[test]
fn uploads_can_be_read_from_disk() {
    let path = std::env::temp_dir().join(format!(
        "competency-review-upload-{}.csv",
        std::process::id()
    ));
    std::fs::write(
        &path,
        upload(&["E001,2025,Ana Lee,Officer,Finance,4,4,4,4,4,4,4,4,4,4,4,4,,,,,,"]),
    )
    .expect("write fixture");

    let parsed = BulkImporter::from_path(&path).expect("file decodes");
    std::fs::remove_file(&path).ok();

    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.columns[2], "full_name");
    assert_eq!(parsed.rows[0].text("title").as_deref(), Some("Officer"));
}
