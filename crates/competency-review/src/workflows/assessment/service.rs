use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::classification::{
    Classification, ClassificationEngine, ClassificationMode, ClassificationUpdate,
    GroupReclassification, ReclassificationSummary,
};
use super::domain::{
    CandidateRecord, CompetencyFamily, EmployeeId, EmployeeKey, EmployeeRecord,
};
use super::duplicates::DuplicateDetector;
use super::export::write_employees_csv;
use super::repository::{EmployeeRepository, RepositoryError};
use crate::config::AssessmentConfig;
use crate::workflows::import::{
    write_rejected_csv, BulkImporter, ImportBatchId, ImportError, ImportPipeline, ParsedUpload,
    RawRow, RejectedRow, StagedImport, StagingError, StagingStore, ValidatedBatch,
};

/// Service composing validation, classification, staging, and the storage port.
///
/// Every mutation of the employee table and the population reclassification that follows
/// it run under one writer lock, so no reader of the repository observes half-applied
/// labels produced by this service.
pub struct AssessmentService<R> {
    repository: Arc<R>,
    staging: Arc<StagingStore>,
    mode: ClassificationMode,
    writer: Mutex<()>,
}

impl<R> AssessmentService<R>
where
    R: EmployeeRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: AssessmentConfig) -> Self {
        let staging = Arc::new(StagingStore::new(config.import_ttl()));
        Self::with_staging(repository, staging, config.classification_mode)
    }

    pub fn with_staging(
        repository: Arc<R>,
        staging: Arc<StagingStore>,
        mode: ClassificationMode,
    ) -> Self {
        Self {
            repository,
            staging,
            mode,
            writer: Mutex::new(()),
        }
    }

    pub fn mode(&self) -> ClassificationMode {
        self.mode
    }

    pub fn staging(&self) -> &StagingStore {
        &self.staging
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Isolated-mode labels for a row that has not been persisted.
    pub fn preview(&self, row: &RawRow) -> Result<Classification, AssessmentServiceError> {
        let batch = ImportPipeline::validate_batch(std::slice::from_ref(row), &HashSet::new());
        let candidate = single_candidate(batch)?;
        Ok(ClassificationEngine::classify(&candidate.profile))
    }

    /// Validate and persist a single form submission, then reclassify the population.
    pub fn submit(&self, row: RawRow) -> Result<SubmitOutcome, AssessmentServiceError> {
        let _writer = self.write_lock();

        let existing = self
            .repository
            .existing_keys()
            .map_err(persistence("load existing employee keys"))?;
        let batch = ImportPipeline::validate_batch(std::slice::from_ref(&row), &existing);
        let candidate = single_candidate(batch)?;

        let classification = ClassificationEngine::classify(&candidate.profile);
        let record = self
            .repository
            .insert(candidate.profile, classification)
            .map_err(persistence("insert employee"))?;
        info!(id = %record.id, key = %record.profile.key(), "employee assessment recorded");

        let (reclassification, table) = self.reclassify_locked()?;
        let record = table
            .into_iter()
            .find(|stored| stored.id == record.id)
            .unwrap_or(record);

        Ok(SubmitOutcome {
            record,
            reclassification,
        })
    }

    /// Newest first.
    pub fn list(&self) -> Result<Vec<EmployeeRecord>, AssessmentServiceError> {
        let mut records = self
            .repository
            .all()
            .map_err(persistence("load employees"))?;
        records.sort_by(|left, right| right.id.cmp(&left.id));
        Ok(records)
    }

    /// Remove the selected employees and relabel whoever remains.
    pub fn delete(&self, ids: &[EmployeeId]) -> Result<DeleteOutcome, AssessmentServiceError> {
        if ids.is_empty() {
            return Ok(DeleteOutcome {
                deleted: 0,
                reclassification: None,
            });
        }

        let _writer = self.write_lock();
        let deleted = self
            .repository
            .delete(ids)
            .map_err(persistence("delete employees"))?;
        info!(requested = ids.len(), deleted, "employees deleted");

        let reclassification = if deleted > 0 {
            Some(self.reclassify_locked()?.0)
        } else {
            None
        };

        Ok(DeleteOutcome {
            deleted,
            reclassification,
        })
    }

    pub fn reclassify(&self) -> Result<ReclassificationSummary, AssessmentServiceError> {
        let _writer = self.write_lock();
        Ok(self.reclassify_locked()?.0)
    }

    /// Decode a CSV upload and stage it.
    pub fn stage_csv<Rd: Read>(&self, reader: Rd) -> Result<ImportPreview, AssessmentServiceError> {
        let upload = BulkImporter::from_reader(reader)?;
        self.stage_import(upload)
    }

    /// Validate an upload against current storage and park it for confirmation.
    pub fn stage_import(
        &self,
        upload: ParsedUpload,
    ) -> Result<ImportPreview, AssessmentServiceError> {
        let existing = self
            .repository
            .existing_keys()
            .map_err(persistence("load existing employee keys"))?;
        let batch = ImportPipeline::validate_batch(&upload.rows, &existing);
        let staged = self.staging.stage(batch, upload.columns);

        info!(
            batch_id = %staged.batch_id,
            accepted = staged.accepted.len(),
            rejected = staged.rejected.len(),
            "import staged"
        );

        Ok(ImportPreview::from(staged))
    }

    pub fn staged(&self, batch_id: ImportBatchId) -> Result<ImportPreview, AssessmentServiceError> {
        Ok(ImportPreview::from(self.staging.get(batch_id)?))
    }

    pub fn write_rejected_csv<W: Write>(
        &self,
        batch_id: ImportBatchId,
        writer: W,
    ) -> Result<(), AssessmentServiceError> {
        let staged = self.staging.get(batch_id)?;
        write_rejected_csv(writer, &staged.columns, &staged.rejected)?;
        Ok(())
    }

    /// Persist the accepted rows of a staged batch, then reclassify the population.
    ///
    /// Keys persisted since staging are checked again first; those candidates are returned
    /// as rejected rows instead of being inserted. The batch is consumed even if a write
    /// fails part way; rows inserted before the failure stay persisted and are reclassified.
    pub fn confirm_import(
        &self,
        batch_id: ImportBatchId,
    ) -> Result<CommitOutcome, AssessmentServiceError> {
        let _writer = self.write_lock();
        let existing = self
            .repository
            .existing_keys()
            .map_err(persistence("load existing employee keys"))?;
        let staged = self.staging.take(batch_id)?;

        let (accepted, conflicts) = recheck_duplicates(staged.accepted, &existing);
        if !conflicts.is_empty() {
            warn!(
                %batch_id,
                conflicts = conflicts.len(),
                "staged employees were recorded after upload"
            );
        }
        let rejected = staged.rejected.len() + conflicts.len();

        let mut inserted = 0;
        for candidate in accepted {
            let classification = ClassificationEngine::classify(&candidate.profile);
            if let Err(source) = self.repository.insert(candidate.profile, classification) {
                warn!(%batch_id, inserted, error = %source, "import commit stopped");
                if inserted > 0 {
                    if let Err(err) = self.reclassify_locked() {
                        warn!(%batch_id, error = %err, "reclassification after partial commit failed");
                    }
                }
                return Err(AssessmentServiceError::Persistence {
                    operation: "insert imported employee",
                    source,
                });
            }
            inserted += 1;
        }

        let reclassification = if inserted > 0 {
            Some(self.reclassify_locked()?.0)
        } else {
            None
        };
        info!(%batch_id, inserted, rejected, "import committed");

        Ok(CommitOutcome {
            batch_id,
            inserted,
            rejected,
            conflicts,
            reclassification,
        })
    }

    pub fn discard_import(&self, batch_id: ImportBatchId) -> Result<(), AssessmentServiceError> {
        self.staging.discard(batch_id)?;
        info!(%batch_id, "import discarded");
        Ok(())
    }

    pub fn export_csv<W: Write>(&self, writer: W) -> Result<(), AssessmentServiceError> {
        let records = self.list()?;
        write_employees_csv(writer, &records)?;
        Ok(())
    }

    /// Read all, compute both groups, write changed labels. Callers hold the writer lock.
    fn reclassify_locked(
        &self,
    ) -> Result<(ReclassificationSummary, Vec<EmployeeRecord>), AssessmentServiceError> {
        let mut table = self
            .repository
            .all()
            .map_err(persistence("load employees for reclassification"))?;

        let core = ClassificationEngine::reclassify_all(&table, CompetencyFamily::Core, self.mode);
        let new =
            ClassificationEngine::reclassify_all(&table, CompetencyFamily::Emerging, self.mode);

        let updates = apply_labels(&mut table, [&core, &new]);
        if !updates.is_empty() {
            self.repository
                .update_classifications(&updates)
                .map_err(persistence("update classifications"))?;
        }

        debug!(
            mode = ?self.mode,
            population = table.len(),
            changed = updates.len(),
            core = ?core.outcome,
            emerging = ?new.outcome,
            "population reclassified"
        );

        Ok((
            ReclassificationSummary {
                mode: self.mode,
                core: core.outcome,
                new: new.outcome,
            },
            table,
        ))
    }
}

/// Splits staged candidates into those still free in storage and those now taken.
fn recheck_duplicates(
    candidates: Vec<CandidateRecord>,
    existing: &HashSet<EmployeeKey>,
) -> (Vec<CandidateRecord>, Vec<RejectedRow>) {
    let no_batch = HashMap::new();
    let mut free = Vec::with_capacity(candidates.len());
    let mut conflicts = Vec::new();
    for candidate in candidates {
        let reasons = DuplicateDetector::check(&candidate.profile.key(), existing, &no_batch);
        if reasons.is_empty() {
            free.push(candidate);
        } else {
            conflicts.push(RejectedRow {
                position: candidate.position,
                row: candidate.row,
                reasons,
            });
        }
    }
    (free, conflicts)
}

/// Writes group labels into `table` and returns one update per record whose labels changed.
fn apply_labels<const N: usize>(
    table: &mut [EmployeeRecord],
    groups: [&GroupReclassification; N],
) -> Vec<ClassificationUpdate> {
    let positions: HashMap<EmployeeId, usize> = table
        .iter()
        .enumerate()
        .map(|(index, record)| (record.id, index))
        .collect();

    let mut changed: BTreeMap<EmployeeId, Classification> = BTreeMap::new();
    for group in groups {
        for (id, label) in &group.labels {
            let Some(&index) = positions.get(id) else {
                continue;
            };
            let record = &mut table[index];
            if record.classification.get(group.family) != *label {
                record.classification.set(group.family, *label);
                changed.insert(*id, record.classification);
            }
        }
    }

    changed
        .into_iter()
        .map(|(id, classification)| ClassificationUpdate { id, classification })
        .collect()
}

fn single_candidate(batch: ValidatedBatch) -> Result<CandidateRecord, AssessmentServiceError> {
    let ValidatedBatch { accepted, rejected } = batch;
    if let Some(row) = rejected.into_iter().next() {
        return Err(AssessmentServiceError::Rejected {
            reasons: row.reasons,
        });
    }
    accepted
        .into_iter()
        .next()
        .ok_or_else(|| AssessmentServiceError::Rejected {
            reasons: vec!["empty submission".to_string()],
        })
}

fn persistence(operation: &'static str) -> impl FnOnce(RepositoryError) -> AssessmentServiceError {
    move |source| AssessmentServiceError::Persistence { operation, source }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub record: EmployeeRecord,
    pub reclassification: ReclassificationSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub deleted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reclassification: Option<ReclassificationSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    pub batch_id: ImportBatchId,
    pub inserted: usize,
    pub rejected: usize,
    /// Accepted at staging but already recorded by the time of confirm.
    pub conflicts: Vec<RejectedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reclassification: Option<ReclassificationSummary>,
}

/// Review payload for a staged upload.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPreview {
    pub batch_id: ImportBatchId,
    pub staged_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub accepted: Vec<CandidateRecord>,
    pub rejected: Vec<RejectedRow>,
}

impl From<StagedImport> for ImportPreview {
    fn from(staged: StagedImport) -> Self {
        Self {
            batch_id: staged.batch_id,
            staged_at: staged.staged_at,
            expires_at: staged.expires_at,
            accepted_count: staged.accepted.len(),
            rejected_count: staged.rejected.len(),
            accepted: staged.accepted,
            rejected: staged.rejected,
        }
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error("submission rejected: {}", .reasons.join("; "))]
    Rejected { reasons: Vec<String> },
    #[error("{operation} failed: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: RepositoryError,
    },
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("failed to write CSV: {0}")]
    Export(#[from] csv::Error),
}
