//! Bulk upload decoding, validation, and staging.
//!
//! Uploads are decoded into raw rows, partitioned by [`ImportPipeline`] into accepted
//! candidates and rejected rows, and parked in a [`StagingStore`] until someone confirms
//! them. Nothing in this module writes to employee storage.

mod normalizer;
mod parser;
pub mod pipeline;
pub mod report;
mod row;
pub mod staging;

pub use parser::ParsedUpload;
pub use pipeline::{ImportPipeline, RejectedRow, ValidatedBatch};
pub use report::write_rejected_csv;
pub use row::{RawRow, RawValue};
pub use staging::{ImportBatchId, StagedImport, StagingError, StagingStore};

use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read upload: {}", err),
            ImportError::Csv(err) => write!(f, "invalid CSV upload: {}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Decodes tabular uploads into raw rows.
pub struct BulkImporter;

impl BulkImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ParsedUpload, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ParsedUpload, ImportError> {
        Ok(parser::parse_rows(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Cursor;

    #[test]
    fn importer_from_path_propagates_io_errors() {
        let error = BulkImporter::from_path("./does-not-exist.csv").expect_err("expected io error");

        match error {
            ImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn importer_rejects_invalid_utf8() {
        let bytes: &[u8] = b"code,year\n\xff\xfe,2025\n";
        match BulkImporter::from_reader(bytes) {
            Err(ImportError::Csv(_)) => {}
            other => panic!("expected csv error, got {other:?}"),
        }
    }

    #[test]
    fn decoded_rows_flow_through_the_pipeline() {
        let csv = "Code,Year,Title,Communication,Communication Req\nE001,2025,Officer,4,5\n";
        let upload = BulkImporter::from_reader(Cursor::new(csv)).expect("decodes");
        let batch = ImportPipeline::validate_batch(&upload.rows, &HashSet::new());

        assert!(batch.accepted.is_empty());
        let reasons = &batch.rejected[0].reasons;
        assert!(reasons
            .iter()
            .any(|reason| reason == "Missing value for problem_solving (core competency)"));
        assert!(!reasons
            .iter()
            .any(|reason| reason.contains("communication ")));
    }
}
