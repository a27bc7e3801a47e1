// src/pipeline/pipeline.rs

//! Job orchestration and the file-level entry points used by the CLI.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{
    ArtifactPaths, Config, DocumentMetadata, InventoryRecord, JobOptions, JobResponse,
    PathsConfig, Section, sort_inventory,
};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::coverage::{CoverageMetrics, CoverageReconciler, SectionRef};
use crate::pipeline::enhance::{fill_content_gaps, log_outcome};
use crate::pipeline::hierarchy::{detect_doc_title, extract_body, extract_toc};
use crate::pipeline::report::{ReportInputs, ValidationReport, compose};
use crate::pipeline::schema::validate_schema;
use crate::pipeline::validate::validate_file;
use crate::source::TextSource;
use crate::storage::{JobStore, LocalStorage};
use crate::utils::log;

/// Derive a job id from the source name and start time.
pub fn job_id(source_name: &str, started: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_name.as_bytes());
    hasher.update(started.to_rfc3339().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

fn to_records(sections: Vec<Section>) -> Vec<InventoryRecord> {
    let mut records: Vec<InventoryRecord> = sections.into_iter().map(Into::into).collect();
    sort_inventory(&mut records);
    records
}

fn to_refs(records: &[InventoryRecord]) -> Vec<SectionRef> {
    records.iter().map(SectionRef::from).collect()
}

/// Run a full parse job over one document.
///
/// Artifacts go to `{output_dir}/{jobs_dir}/{job_id}/` and are mirrored to
/// `{output_dir}/`. Only a failure to write output aborts the job; unreadable
/// pages are logged and skipped.
pub fn run_job(
    source: &dyn TextSource,
    options: &JobOptions,
    config: &Config,
) -> Result<JobResponse> {
    let started = Utc::now();
    let mut ctx = PipelineContext::new(config.clone())?;
    let paths = &config.paths;

    let id = job_id(source.name(), started);
    let store = JobStore::new(paths);
    let job = store.job_storage(&id)?;

    log::header(&format!("Parsing {} (job {})", source.name(), id));
    let total_steps =
        4 + usize::from(options.enhance_content) + usize::from(options.generate_report);
    let mut step = 1;

    log::step(step, total_steps, "Detecting document title");
    let doc_title = detect_doc_title(&mut ctx, source);
    log::sub_item(&doc_title);
    step += 1;

    log::step(step, total_steps, "Extracting table of contents");
    let toc = if options.extract_toc {
        to_records(extract_toc(&mut ctx, source, &doc_title))
    } else {
        log::sub_item("skipped");
        Vec::new()
    };
    step += 1;

    log::step(step, total_steps, "Extracting body sections");
    let mut spec = if options.extract_sections {
        to_records(extract_body(&mut ctx, source, &doc_title))
    } else {
        log::sub_item("skipped");
        Vec::new()
    };
    step += 1;

    let mut files = ArtifactPaths {
        source: source.name().into(),
        ..ArtifactPaths::default()
    };
    if options.extract_toc {
        files.toc = Some(job.write_jsonl(&paths.toc_file, &toc)?);
    }
    if options.extract_sections {
        files.spec = Some(job.write_jsonl(&paths.spec_file, &spec)?);
    }

    if options.enhance_content {
        log::step(step, total_steps, "Filling coverage gaps");
        if options.extract_sections {
            let result = fill_content_gaps(&mut ctx, source, &toc, &spec);
            if !result.added.is_empty() {
                job.append_jsonl(&paths.spec_file, &result.added)?;
                spec.extend(result.added.iter().cloned());
            }
            log_outcome(&result);
        } else {
            log::sub_item("skipped: no body inventory");
        }
        step += 1;
    }

    log::step(step, total_steps, "Writing metadata");
    let metadata = DocumentMetadata::new(&doc_title, toc.len(), spec.len(), source.name());
    files.metadata = Some(job.write_jsonl(&paths.metadata_file, std::slice::from_ref(&metadata))?);
    step += 1;

    let comparison = CoverageReconciler::new().compare(&to_refs(&toc), &to_refs(&spec));

    if options.generate_report {
        log::step(step, total_steps, "Generating validation report");
        let report = build_report(&job, paths, &toc, &spec)?;
        files.report = Some(job.write_json(&paths.report_file, &report)?);
    }

    mirror_to_default(&job, &store.default_storage(), paths)?;

    if !ctx.diagnostics.is_empty() {
        ::log::warn!("{} page reads failed during the job", ctx.diagnostics.len());
    }

    log_coverage(&comparison.metrics);
    log::summary(
        "Job",
        &[
            ("Job id", id.clone()),
            ("Document", doc_title.clone()),
            ("ToC sections", toc.len().to_string()),
            ("Body sections", spec.len().to_string()),
            ("Failed pages", ctx.diagnostics.len().to_string()),
            (
                "Elapsed",
                format!("{}ms", (Utc::now() - started).num_milliseconds()),
            ),
        ],
    );

    Ok(JobResponse {
        job_id: id,
        metadata,
        toc_count: toc.len(),
        sections_count: spec.len(),
        coverage: comparison.metrics,
        files,
    })
}

/// Copy a job's artifacts to the shared default location.
fn mirror_to_default(job: &LocalStorage, shared: &LocalStorage, paths: &PathsConfig) -> Result<()> {
    for key in [
        &paths.toc_file,
        &paths.spec_file,
        &paths.metadata_file,
        &paths.report_file,
    ] {
        if let Some(bytes) = job.read_bytes(key)? {
            shared.write_bytes(key, &bytes)?;
        }
    }
    ::log::debug!("Artifacts mirrored to {}", shared.root().display());
    Ok(())
}

/// Read an inventory for reporting. Problems are logged and yield an empty
/// list; the validators report them in detail.
fn load_for_report(storage: &LocalStorage, key: &str) -> Vec<InventoryRecord> {
    match storage.read_jsonl(key) {
        Ok(Some(records)) => records,
        Ok(None) => Vec::new(),
        Err(e) => {
            ::log::warn!("Cannot load {} for the report: {}", key, e);
            Vec::new()
        }
    }
}

/// Validate both persisted inventories and compose the report.
fn build_report(
    storage: &LocalStorage,
    paths: &PathsConfig,
    toc: &[InventoryRecord],
    spec: &[InventoryRecord],
) -> Result<ValidationReport> {
    let toc_path = storage.path(&paths.toc_file);
    let spec_path = storage.path(&paths.spec_file);

    let toc_schema = validate_schema(&toc_path);
    let spec_schema = validate_schema(&spec_path);
    let toc_hierarchy = validate_file(&toc_path);
    let spec_hierarchy = validate_file(&spec_path);
    let comparison = CoverageReconciler::new().compare(&to_refs(toc), &to_refs(spec));

    for (schema, hierarchy) in [(&toc_schema, &toc_hierarchy), (&spec_schema, &spec_hierarchy)] {
        log::sub_item(&format!(
            "{}: {}/{} valid records, {} structural defects",
            crate::utils::file_name(&schema.file),
            schema.valid_records,
            schema.total_records,
            hierarchy.defect_count()
        ));
    }

    Ok(compose(&ReportInputs {
        toc_schema: &toc_schema,
        spec_schema: &spec_schema,
        toc_hierarchy: &toc_hierarchy,
        spec_hierarchy: &spec_hierarchy,
        comparison: &comparison,
        toc_sections: toc,
        spec_sections: spec,
    }))
}

/// Validate the inventories in `storage` and write the report next to them.
pub fn run_validate(storage: &LocalStorage, paths: &PathsConfig) -> Result<ValidationReport> {
    log::header("Validating inventories");

    let toc = load_for_report(storage, &paths.toc_file);
    let spec = load_for_report(storage, &paths.spec_file);
    let report = build_report(storage, paths, &toc, &spec)?;
    let written = storage.write_json(&paths.report_file, &report)?;

    ::log::info!("Validation report saved to {}", written.display());
    Ok(report)
}

/// Compare the two inventories in `storage`.
pub fn run_coverage(storage: &LocalStorage, paths: &PathsConfig) -> Result<CoverageMetrics> {
    log::header("Analyzing parsing coverage");

    let load = |key: &str| -> Result<Vec<SectionRef>> {
        storage.read_jsonl(key)?.ok_or_else(|| {
            AppError::storage(format!("{} not found", storage.path(key).display()))
        })
    };
    let toc = load(&paths.toc_file)?;
    let spec = load(&paths.spec_file)?;

    let metrics = CoverageReconciler::new().metrics(&toc, &spec);
    log_coverage(&metrics);
    Ok(metrics)
}

fn log_coverage(metrics: &CoverageMetrics) {
    log::summary(
        "Coverage",
        &[
            ("ToC sections", metrics.total_reference.to_string()),
            ("Parsed sections", metrics.total_candidate.to_string()),
            ("Common sections", metrics.common.to_string()),
            ("ToC only", metrics.reference_only.to_string()),
            ("Parsed only", metrics.candidate_only.to_string()),
            ("Coverage", log::percent(metrics.coverage_percentage)),
        ],
    );

    if metrics.reference_only > 0 {
        ::log::warn!(
            "{} sections found in ToC but not in full document parsing",
            metrics.reference_only
        );
    }
    if metrics.candidate_only > 0 {
        ::log::warn!(
            "{} sections found in full document but not in ToC",
            metrics.candidate_only
        );
    }
}
