//! Employee competency assessment: validation rules, classification, storage, and HTTP.
//!
//! Records enter either through a single form submission or a confirmed bulk import. Every
//! change to the persisted population triggers a reclassification of both competency groups
//! so labels always reflect the current table.

pub mod classification;
pub mod domain;
pub mod duplicates;
pub mod export;
pub mod repository;
pub mod router;
pub mod rules;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use classification::{
    Classification, ClassificationEngine, ClassificationMode, ClassificationUpdate, GroupOutcome,
    Label, PopulationThresholds, ReclassificationSummary,
};
pub use domain::{
    CandidateRecord, CompetencyFamily, CompetencyKey, CompetencyScores, EmployeeId, EmployeeKey,
    EmployeeProfile, EmployeeRecord, Title, TitleTier,
};
pub use export::write_employees_csv;
pub use repository::{EmployeeRepository, InMemoryEmployeeRepository, RepositoryError};
pub use router::assessment_router;
pub use scoring::{Score, ScoreError, ScoreValidator};
pub use service::{
    AssessmentService, AssessmentServiceError, CommitOutcome, DeleteOutcome, ImportPreview,
    SubmitOutcome,
};
