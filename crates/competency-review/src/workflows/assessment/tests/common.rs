use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::AssessmentConfig;
use crate::workflows::assessment::classification::{Classification, ClassificationUpdate};
use crate::workflows::assessment::domain::{
    CompetencyKey, EmployeeId, EmployeeKey, EmployeeProfile, EmployeeRecord,
};
use crate::workflows::assessment::repository::{
    EmployeeRepository, InMemoryEmployeeRepository, RepositoryError,
};
use crate::workflows::assessment::{assessment_router, AssessmentService, ClassificationMode};
use crate::workflows::import::{RawRow, RawValue};

pub(super) fn assessment_config(mode: ClassificationMode) -> AssessmentConfig {
    AssessmentConfig {
        classification_mode: mode,
        import_ttl_minutes: 30,
    }
}

pub(super) fn build_service(
    mode: ClassificationMode,
) -> (
    AssessmentService<InMemoryEmployeeRepository>,
    Arc<InMemoryEmployeeRepository>,
) {
    let repository = Arc::new(InMemoryEmployeeRepository::default());
    let service = AssessmentService::new(repository.clone(), assessment_config(mode));
    (service, repository)
}

/// Row with every base core key scored 4 against a requirement of 4.
pub(super) fn assessed_row(code: &str, title: &str) -> RawRow {
    let mut row = RawRow::new()
        .with("code", RawValue::from_cell(code))
        .with("year", RawValue::from_cell("2025"))
        .with("full_name", RawValue::from_cell("Linh Pham"))
        .with("title", RawValue::from_cell(title))
        .with("department", RawValue::from_cell("Finance"));
    for key in CompetencyKey::BASE_CORE {
        row.insert(key.column(), RawValue::Number(4.0));
        row.insert(key.requirement_column(), RawValue::Number(4.0));
    }
    row
}

pub(super) fn officer_row(code: &str) -> RawRow {
    assessed_row(code, "Officer")
}

/// Standard row carrying the leadership keys as well.
pub(super) fn manager_row(code: &str) -> RawRow {
    let mut row = assessed_row(code, "Manager");
    for key in CompetencyKey::LEADERSHIP {
        row.insert(key.column(), RawValue::Number(2.0));
        row.insert(key.requirement_column(), RawValue::Number(4.0));
    }
    row
}

/// Adds all four emerging keys against a requirement of 5 each.
pub(super) fn with_emerging(mut row: RawRow, scores: [f64; 4]) -> RawRow {
    for (key, score) in CompetencyKey::EMERGING.iter().zip(scores) {
        row.insert(key.column(), RawValue::Number(score));
        row.insert(key.requirement_column(), RawValue::Number(5.0));
    }
    row
}

/// Emerging percentages of 60, 70, 80, 90, and 100 for codes P1..P5.
pub(super) fn emerging_population() -> Vec<RawRow> {
    [
        [3.0, 3.0, 3.0, 3.0],
        [4.0, 4.0, 3.0, 3.0],
        [4.0, 4.0, 4.0, 4.0],
        [5.0, 5.0, 4.0, 4.0],
        [5.0, 5.0, 5.0, 5.0],
    ]
    .into_iter()
    .enumerate()
    .map(|(index, scores)| with_emerging(officer_row(&format!("P{}", index + 1)), scores))
    .collect()
}

/// Labels keyed by employee code, for comparisons independent of ids.
pub(super) fn labels_by_code(records: &[EmployeeRecord]) -> BTreeMap<String, Classification> {
    records
        .iter()
        .map(|record| (record.profile.code.clone(), record.classification))
        .collect()
}

pub(super) fn assessment_router_with_service(
    service: AssessmentService<InMemoryEmployeeRepository>,
) -> axum::Router {
    assessment_router(Arc::new(service))
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}

/// Storage that reports every key as free but refuses every insert as a conflict.
pub(super) struct ConflictRepository;

impl EmployeeRepository for ConflictRepository {
    fn insert(
        &self,
        profile: EmployeeProfile,
        _classification: Classification,
    ) -> Result<EmployeeRecord, RepositoryError> {
        Err(RepositoryError::Conflict(profile.key()))
    }

    fn delete(&self, _ids: &[EmployeeId]) -> Result<usize, RepositoryError> {
        Ok(0)
    }

    fn all(&self) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        Ok(Vec::new())
    }

    fn existing_keys(&self) -> Result<HashSet<EmployeeKey>, RepositoryError> {
        Ok(HashSet::new())
    }

    fn update_classifications(
        &self,
        _updates: &[ClassificationUpdate],
    ) -> Result<(), RepositoryError> {
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl EmployeeRepository for UnavailableRepository {
    fn insert(
        &self,
        _profile: EmployeeProfile,
        _classification: Classification,
    ) -> Result<EmployeeRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn delete(&self, _ids: &[EmployeeId]) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn all(&self) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn existing_keys(&self) -> Result<HashSet<EmployeeKey>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn update_classifications(
        &self,
        _updates: &[ClassificationUpdate],
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

/// In-memory storage that starts failing inserts once its budget is spent.
pub(super) struct InsertBudgetRepository {
    pub(super) inner: InMemoryEmployeeRepository,
    remaining: Mutex<usize>,
}

impl InsertBudgetRepository {
    pub(super) fn new(budget: usize) -> Self {
        Self {
            inner: InMemoryEmployeeRepository::default(),
            remaining: Mutex::new(budget),
        }
    }
}

impl EmployeeRepository for InsertBudgetRepository {
    fn insert(
        &self,
        profile: EmployeeProfile,
        classification: Classification,
    ) -> Result<EmployeeRecord, RepositoryError> {
        let mut remaining = self.remaining.lock().expect("budget lock");
        if *remaining == 0 {
            return Err(RepositoryError::Unavailable("disk full".to_string()));
        }
        *remaining -= 1;
        self.inner.insert(profile, classification)
    }

    fn delete(&self, ids: &[EmployeeId]) -> Result<usize, RepositoryError> {
        self.inner.delete(ids)
    }

    fn all(&self) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        self.inner.all()
    }

    fn existing_keys(&self) -> Result<HashSet<EmployeeKey>, RepositoryError> {
        self.inner.existing_keys()
    }

    fn update_classifications(
        &self,
        updates: &[ClassificationUpdate],
    ) -> Result<(), RepositoryError> {
        self.inner.update_classifications(updates)
    }
}
