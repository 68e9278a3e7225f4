use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::pipeline::{RejectedRow, ValidatedBatch};
use crate::workflows::assessment::domain::CandidateRecord;

/// Opaque handle returned to the uploader and presented again on confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportBatchId(pub Uuid);

impl ImportBatchId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ImportBatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ImportBatchId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// Validated upload held between the upload and confirm actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedImport {
    pub batch_id: ImportBatchId,
    pub columns: Vec<String>,
    pub accepted: Vec<CandidateRecord>,
    pub rejected: Vec<RejectedRow>,
    pub staged_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StagedImport {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StagingError {
    #[error("import batch {0} not found")]
    NotFound(ImportBatchId),
    #[error("import batch {0} expired; upload the file again")]
    Expired(ImportBatchId),
}

/// Expiring staging entries keyed by batch id. Nothing here touches persisted storage.
#[derive(Debug)]
pub struct StagingStore {
    ttl: Duration,
    entries: Mutex<HashMap<ImportBatchId, StagedImport>>,
}

impl StagingStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ImportBatchId, StagedImport>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stage(&self, batch: ValidatedBatch, columns: Vec<String>) -> StagedImport {
        self.stage_at(batch, columns, Utc::now())
    }

    pub fn stage_at(
        &self,
        batch: ValidatedBatch,
        columns: Vec<String>,
        now: DateTime<Utc>,
    ) -> StagedImport {
        let staged = StagedImport {
            batch_id: ImportBatchId::generate(),
            columns,
            accepted: batch.accepted,
            rejected: batch.rejected,
            staged_at: now,
            expires_at: now + self.ttl,
        };

        let mut entries = self.entries();
        Self::purge(&mut entries, now);
        entries.insert(staged.batch_id, staged.clone());
        staged
    }

    pub fn get(&self, batch_id: ImportBatchId) -> Result<StagedImport, StagingError> {
        self.get_at(batch_id, Utc::now())
    }

    pub fn get_at(
        &self,
        batch_id: ImportBatchId,
        now: DateTime<Utc>,
    ) -> Result<StagedImport, StagingError> {
        let mut entries = self.entries();
        Self::live_entry(&mut entries, batch_id, now).cloned()
    }

    /// Removes and returns a live batch; used by the confirm step.
    pub fn take(&self, batch_id: ImportBatchId) -> Result<StagedImport, StagingError> {
        self.take_at(batch_id, Utc::now())
    }

    pub fn take_at(
        &self,
        batch_id: ImportBatchId,
        now: DateTime<Utc>,
    ) -> Result<StagedImport, StagingError> {
        let mut entries = self.entries();
        Self::live_entry(&mut entries, batch_id, now)?;
        entries
            .remove(&batch_id)
            .ok_or(StagingError::NotFound(batch_id))
    }

    pub fn discard(&self, batch_id: ImportBatchId) -> Result<(), StagingError> {
        self.take(batch_id).map(|_| ())
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        Self::purge(&mut self.entries(), now)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_entry<'a>(
        entries: &'a mut HashMap<ImportBatchId, StagedImport>,
        batch_id: ImportBatchId,
        now: DateTime<Utc>,
    ) -> Result<&'a StagedImport, StagingError> {
        let expired = entries
            .get(&batch_id)
            .ok_or(StagingError::NotFound(batch_id))?
            .is_expired_at(now);

        if expired {
            entries.remove(&batch_id);
            debug!(%batch_id, "staged import expired");
            return Err(StagingError::Expired(batch_id));
        }

        entries
            .get(&batch_id)
            .ok_or(StagingError::NotFound(batch_id))
    }

    fn purge(entries: &mut HashMap<ImportBatchId, StagedImport>, now: DateTime<Utc>) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }
}
