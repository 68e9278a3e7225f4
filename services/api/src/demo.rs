use crate::infra::{build_assessment_service, SAMPLE_UPLOAD};
use chrono::Utc;
use clap::Args;
use competency_review::config::AssessmentConfig;
use competency_review::error::AppError;
use competency_review::workflows::assessment::{
    ClassificationMode, EmployeeRecord, GroupOutcome, ReclassificationSummary,
};
use competency_review::workflows::import::{
    BulkImporter, ImportPipeline, ParsedUpload, RejectedRow,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ImportCheckArgs {
    /// CSV upload to validate
    pub(crate) file: PathBuf,
    /// Print the validation result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// CSV upload to stage. Defaults to a built-in sample.
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Classification mode: population (default) or percentage
    #[arg(long, value_parser = parse_mode)]
    pub(crate) mode: Option<ClassificationMode>,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    file: String,
    accepted: usize,
    rejected: &'a [RejectedRow],
}

fn parse_mode(raw: &str) -> Result<ClassificationMode, String> {
    ClassificationMode::parse(raw)
        .ok_or_else(|| format!("unknown classification mode '{raw}' (population|percentage)"))
}

/// Offline validation only; storage is empty so no database duplicates are reported.
pub(crate) fn run_import_check(args: ImportCheckArgs) -> Result<(), AppError> {
    let ImportCheckArgs { file, json } = args;
    let upload = BulkImporter::from_path(&file)?;
    let batch = ImportPipeline::validate_batch(&upload.rows, &HashSet::new());

    if json {
        let report = CheckReport {
            file: file.display().to_string(),
            accepted: batch.accepted.len(),
            rejected: &batch.rejected,
        };
        let rendered = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "{}: {} rows | {} accepted | {} rejected",
        file.display(),
        upload.rows.len(),
        batch.accepted.len(),
        batch.rejected.len()
    );
    for candidate in &batch.accepted {
        println!(
            "  + {} / {} ({})",
            candidate.profile.code, candidate.profile.year, candidate.profile.title
        );
    }
    render_rejected(&batch.rejected);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { csv, mode } = args;

    let config = AssessmentConfig {
        classification_mode: mode.unwrap_or(ClassificationMode::Population),
        ..AssessmentConfig::default()
    };
    let (service, _) = build_assessment_service(config);

    let (source, upload) = match csv {
        Some(path) => {
            let upload = BulkImporter::from_path(&path)?;
            (path.display().to_string(), upload)
        }
        None => (
            "built-in sample".to_string(),
            BulkImporter::from_reader(SAMPLE_UPLOAD.as_bytes())?,
        ),
    };

    println!("Competency review demo ({})", Utc::now().format("%Y-%m-%d %H:%M UTC"));
    stage_and_confirm(&service, &source, upload)
}

fn stage_and_confirm(
    service: &crate::infra::MemoryAssessmentService,
    source: &str,
    upload: ParsedUpload,
) -> Result<(), AppError> {
    let preview = service.stage_import(upload)?;
    println!(
        "\nStaged {} as batch {} (expires {})",
        source,
        preview.batch_id,
        preview.expires_at.format("%H:%M UTC")
    );
    println!(
        "- {} accepted | {} rejected",
        preview.accepted_count, preview.rejected_count
    );
    render_rejected(&preview.rejected);

    let outcome = service.confirm_import(preview.batch_id)?;
    println!("\nCommitted {} employees", outcome.inserted);
    render_rejected(&outcome.conflicts);
    if let Some(summary) = &outcome.reclassification {
        render_summary(summary);
    }

    println!("\nEmployees (newest first)");
    for record in service.list()? {
        render_record(&record);
    }
    Ok(())
}

fn render_rejected(rejected: &[RejectedRow]) {
    for row in rejected {
        println!("  - row {}: {}", row.position, row.reasons.join("; "));
    }
}

fn render_summary(summary: &ReclassificationSummary) {
    println!("Reclassification ({:?} mode)", summary.mode);
    for (group, outcome) in [("core", &summary.core), ("emerging", &summary.new)] {
        match outcome {
            GroupOutcome::Applied {
                qualifying,
                updated,
            } => println!("  - {group}: {updated} labelled from {qualifying} qualifying records"),
            GroupOutcome::Skipped { qualifying } => println!(
                "  - {group}: skipped, {qualifying} qualifying record(s) is not enough for a spread"
            ),
        }
    }
}

fn render_record(record: &EmployeeRecord) {
    let profile = &record.profile;
    println!(
        "  #{} {} {} ({}) core {} | emerging {}",
        record.id,
        profile.code,
        profile.full_name.as_deref().unwrap_or("-"),
        profile.title,
        record.classification.core.as_str(),
        record.classification.new.as_str()
    );
}
