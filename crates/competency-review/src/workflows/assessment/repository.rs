use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::classification::{Classification, ClassificationUpdate};
use super::domain::{EmployeeId, EmployeeKey, EmployeeProfile, EmployeeRecord};

/// Storage port for employee assessments. Implementations enforce `(code, year)` uniqueness.
pub trait EmployeeRepository: Send + Sync {
    fn insert(
        &self,
        profile: EmployeeProfile,
        classification: Classification,
    ) -> Result<EmployeeRecord, RepositoryError>;
    /// Removes the given ids, ignoring unknown ones, and returns how many were deleted.
    fn delete(&self, ids: &[EmployeeId]) -> Result<usize, RepositoryError>;
    fn all(&self) -> Result<Vec<EmployeeRecord>, RepositoryError>;
    fn existing_keys(&self) -> Result<HashSet<EmployeeKey>, RepositoryError>;
    fn update_classifications(
        &self,
        updates: &[ClassificationUpdate],
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("employee {0} already exists in database")]
    Conflict(EmployeeKey),
    #[error("employee {0} not found")]
    NotFound(EmployeeId),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store used by the CLI, the demo server, and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEmployeeRepository {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    records: BTreeMap<EmployeeId, EmployeeRecord>,
}

impl InMemoryEmployeeRepository {
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EmployeeRepository for InMemoryEmployeeRepository {
    fn insert(
        &self,
        profile: EmployeeProfile,
        classification: Classification,
    ) -> Result<EmployeeRecord, RepositoryError> {
        let mut state = self.state();
        let key = profile.key();
        if state
            .records
            .values()
            .any(|record| record.profile.key() == key)
        {
            return Err(RepositoryError::Conflict(key));
        }

        state.next_id += 1;
        let record = EmployeeRecord {
            id: EmployeeId(state.next_id),
            profile,
            classification,
            created_at: Utc::now(),
        };
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn delete(&self, ids: &[EmployeeId]) -> Result<usize, RepositoryError> {
        let mut state = self.state();
        Ok(ids
            .iter()
            .filter(|id| state.records.remove(*id).is_some())
            .count())
    }

    fn all(&self) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        Ok(self.state().records.values().rev().cloned().collect())
    }

    fn existing_keys(&self) -> Result<HashSet<EmployeeKey>, RepositoryError> {
        Ok(self
            .state()
            .records
            .values()
            .map(|record| record.profile.key())
            .collect())
    }

    fn update_classifications(
        &self,
        updates: &[ClassificationUpdate],
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        if let Some(missing) = updates
            .iter()
            .find(|update| !state.records.contains_key(&update.id))
        {
            return Err(RepositoryError::NotFound(missing.id));
        }

        for update in updates {
            if let Some(record) = state.records.get_mut(&update.id) {
                record.classification = update.classification;
            }
        }
        Ok(())
    }
}
