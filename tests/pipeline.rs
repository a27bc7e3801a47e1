//! End-to-end runs over a small in-memory document.

use serde_json::json;
use tempfile::TempDir;

use sectionizer::error::AppError;
use sectionizer::models::{
    Artifact, Config, DocumentMetadata, EnhanceMode, InventoryRecord, JobOptions,
};
use sectionizer::pipeline::{
    PipelineContext, ValidationReport, run_coverage, run_enhance, run_job, run_validate,
};
use sectionizer::source::{PagedText, TextSource};
use sectionizer::storage::JobStore;
use sectionizer::storage::job::FALLBACK_NOTE;

const TOC_PAGE: &str = "USB Power Delivery Specification
Table of Contents
1 Introduction ... 2
1.1 Overview ... 2
2 Power Delivery ... 3
3 cable assemblies ... 4";

const INTRO_PAGE: &str = "1 Introduction
This chapter introduces the power delivery specification in some detail.";

const SOURCE_PAGE: &str = "2.2 Source Behavior
A source shall advertise its capabilities.";

const CABLE_PAGE: &str = "CABLE ASSEMBLIES
Cable assemblies carry VBUS and the configuration channel between port partners.";

fn document() -> PagedText {
    PagedText::new(
        "usb_pd.txt",
        [TOC_PAGE, INTRO_PAGE, SOURCE_PAGE, CABLE_PAGE]
            .iter()
            .map(|p| p.to_string())
            .collect(),
    )
}

fn config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.paths.output_dir = tmp.path().display().to_string();
    config
}

fn ids(records: &[InventoryRecord]) -> Vec<&str> {
    records.iter().map(|r| r.section_id()).collect()
}

#[test]
fn test_job_writes_and_mirrors_artifacts() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);

    let response = run_job(&document(), &JobOptions::default(), &config).unwrap();

    assert_eq!(response.job_id.len(), 16);
    assert_eq!(response.metadata.doc_title, "USB Power Delivery Specification");
    assert_eq!(response.toc_count, 4);
    assert_eq!(response.sections_count, 4);
    assert_eq!(response.coverage.common, 3);
    assert_eq!(response.coverage.reference_only, 1);
    assert_eq!(response.coverage.candidate_only, 1);
    assert_eq!(response.coverage.coverage_percentage, 75.0);

    let job_dir = tmp.path().join("jobs").join(&response.job_id);
    assert_eq!(response.files.toc.as_deref(), Some(job_dir.join("usb_pd_toc.jsonl").as_path()));
    for name in [
        "usb_pd_toc.jsonl",
        "usb_pd_spec.jsonl",
        "usb_pd_metadata.jsonl",
        "usb_pd_validation_report.json",
    ] {
        assert!(job_dir.join(name).is_file(), "{name} missing in job dir");
        assert!(tmp.path().join(name).is_file(), "{name} not mirrored");
    }

    let store = JobStore::new(&config.paths);
    let shared = store.default_storage();

    let toc: Vec<InventoryRecord> = shared.read_jsonl("usb_pd_toc.jsonl").unwrap().unwrap();
    assert_eq!(ids(&toc), vec!["1", "1.1", "2", "3"]);
    assert_eq!(toc[1].page(), 2);
    assert_eq!(toc[3].title(), "cable assemblies");

    let spec: Vec<InventoryRecord> = shared.read_jsonl("usb_pd_spec.jsonl").unwrap().unwrap();
    assert_eq!(ids(&spec), vec!["1", "1.1", "2", "2.2"]);
    assert_eq!(spec[3].page(), 3);

    let metadata: Vec<DocumentMetadata> =
        shared.read_jsonl("usb_pd_metadata.jsonl").unwrap().unwrap();
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata[0].total_toc_sections, 4);
    assert_eq!(metadata[0].source_file, "usb_pd.txt");

    let report: ValidationReport = shared
        .read_json("usb_pd_validation_report.json")
        .unwrap()
        .unwrap();
    let mismatches = report.sheet("Mismatches").unwrap();
    assert_eq!(mismatches.rows.len(), 2);
    assert_eq!(mismatches.cell(0, "Section ID"), Some(&json!("3")));
    assert_eq!(mismatches.cell(1, "Section ID"), Some(&json!("2.2")));
}

#[test]
fn test_job_options_skip_passes() {
    let tmp = TempDir::new().unwrap();
    let options = JobOptions {
        extract_toc: false,
        generate_report: false,
        ..JobOptions::default()
    };

    let response = run_job(&document(), &options, &config(&tmp)).unwrap();

    assert_eq!(response.toc_count, 0);
    assert_eq!(response.sections_count, 4);
    assert!(response.files.toc.is_none());
    assert!(response.files.report.is_none());
    assert!(response.files.spec.is_some());
    assert_eq!(response.coverage.coverage_percentage, 0.0);
}

#[test]
fn test_job_with_content_enhancement() {
    let tmp = TempDir::new().unwrap();
    let options = JobOptions {
        enhance_content: true,
        ..JobOptions::default()
    };

    let response = run_job(&document(), &options, &config(&tmp)).unwrap();

    // Pages 2 and 4 are uncovered and both carry enough text
    assert_eq!(response.sections_count, 6);
    assert_eq!(response.metadata.total_sections, 6);
    assert_eq!(response.coverage.reference_only, 0);
    assert_eq!(response.coverage.coverage_percentage, 100.0);
}

#[test]
fn test_status_and_fetch() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let response = run_job(&document(), &JobOptions::default(), &config).unwrap();
    let store = JobStore::new(&config.paths);

    let status = store.status(&response.job_id).unwrap();
    assert_eq!(status.status, "completed");
    assert_eq!(status.files.len(), 4);
    assert!(status.note.is_none());

    let spec = store.artifact(&response.job_id, Artifact::Spec).unwrap();
    assert!(spec.starts_with(tmp.path().join("jobs")));

    let fallback = store.status("0123456789abcdef").unwrap();
    assert_eq!(fallback.note.as_deref(), Some(FALLBACK_NOTE));
    let report = store.artifact("0123456789abcdef", Artifact::Report).unwrap();
    assert_eq!(report, tmp.path().join("usb_pd_validation_report.json"));

    assert!(matches!(
        store.status("../etc"),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn test_status_unknown_job_without_defaults() {
    let tmp = TempDir::new().unwrap();
    let store = JobStore::new(&config(&tmp).paths);

    assert!(matches!(
        store.status("0123456789abcdef"),
        Err(AppError::JobNotFound(_))
    ));
    assert!(matches!(
        store.artifact("0123456789abcdef", Artifact::Toc),
        Err(AppError::JobNotFound(_))
    ));
}

#[test]
fn test_validate_and_coverage_on_default_location() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let options = JobOptions {
        generate_report: false,
        ..JobOptions::default()
    };
    run_job(&document(), &options, &config).unwrap();
    assert!(!tmp.path().join("usb_pd_validation_report.json").exists());

    let shared = JobStore::new(&config.paths).default_storage();
    let report = run_validate(&shared, &config.paths).unwrap();
    assert!(tmp.path().join("usb_pd_validation_report.json").is_file());

    let hierarchy = report.sheet("Hierarchy Validation").unwrap();
    assert_eq!(hierarchy.rows.len(), 2);
    assert_eq!(hierarchy.cell(1, "Total Sections"), Some(&json!(4)));
    assert_eq!(hierarchy.cell(1, "Orphaned Sections"), Some(&json!(0)));

    let metrics = run_coverage(&shared, &config.paths).unwrap();
    assert_eq!(metrics.total_reference, 4);
    assert_eq!(metrics.total_candidate, 4);
    assert_eq!(metrics.coverage_percentage, 75.0);
}

#[test]
fn test_coverage_requires_both_inventories() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let shared = JobStore::new(&config.paths).default_storage();

    assert!(matches!(
        run_coverage(&shared, &config.paths),
        Err(AppError::Storage(_))
    ));
}

#[test]
fn test_content_enhance_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    run_job(&document(), &JobOptions::default(), &config).unwrap();
    let shared = JobStore::new(&config.paths).default_storage();

    let mut ctx = PipelineContext::new(config.clone()).unwrap();
    let first = run_enhance(&mut ctx, &document(), &shared).unwrap();
    assert_eq!(first.mode, EnhanceMode::Content);
    assert_eq!(first.missing_pages, vec![2, 4]);
    assert_eq!(ids(&first.added), vec!["1", "3"]);
    assert!(first.added.iter().all(InventoryRecord::is_enhanced));
    assert_eq!(first.initial_page_coverage, 50.0);
    assert_eq!(first.final_page_coverage, 100.0);

    let second = run_enhance(&mut ctx, &document(), &shared).unwrap();
    assert!(second.added.is_empty());

    let spec: Vec<InventoryRecord> = shared.read_jsonl("usb_pd_spec.jsonl").unwrap().unwrap();
    assert_eq!(ids(&spec), vec!["1", "1.1", "2", "2.2", "1", "3"]);
}

#[test]
fn test_header_enhance_merges_in_natural_order() {
    let tmp = TempDir::new().unwrap();
    let mut config = config(&tmp);
    run_job(&document(), &JobOptions::default(), &config).unwrap();
    let shared = JobStore::new(&config.paths).default_storage();

    config.enhance.mode = EnhanceMode::Headers;
    let mut ctx = PipelineContext::new(config).unwrap();
    let result = run_enhance(&mut ctx, &document(), &shared).unwrap();

    assert_eq!(result.missing_pages, vec![2, 4]);
    assert_eq!(ids(&result.added), vec!["3"]);
    assert_eq!(result.added[0].title(), "CABLE ASSEMBLIES");
    assert_eq!(result.added[0].page(), 4);

    let spec: Vec<InventoryRecord> = shared.read_jsonl("usb_pd_spec.jsonl").unwrap().unwrap();
    assert_eq!(ids(&spec), vec!["1", "1.1", "2", "2.2", "3"]);
    let InventoryRecord::Standard(minted) = &spec[4] else {
        panic!("expected a standard record");
    };
    assert_eq!(minted.doc_title, "USB Power Delivery Specification");
    assert_eq!(minted.full_path, "3 CABLE ASSEMBLIES");

    let again = run_enhance(&mut ctx, &document(), &shared).unwrap();
    assert!(again.added.is_empty());
}

#[test]
fn test_enhance_without_inventories_fails() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let shared = JobStore::new(&config.paths).default_storage();
    let mut ctx = PipelineContext::new(config).unwrap();

    assert!(matches!(
        run_enhance(&mut ctx, &document(), &shared),
        Err(AppError::Storage(_))
    ));
}

#[test]
fn test_unreadable_pages_are_skipped() {
    struct Flaky(PagedText);

    impl TextSource for Flaky {
        fn page_count(&self) -> usize {
            self.0.page_count()
        }
        fn page_text(&self, page: u32) -> sectionizer::error::Result<String> {
            if page == 3 {
                return Err(AppError::source_unavailable(page, "damaged"));
            }
            self.0.page_text(page)
        }
        fn name(&self) -> &str {
            self.0.name()
        }
    }

    let tmp = TempDir::new().unwrap();
    let response = run_job(&Flaky(document()), &JobOptions::default(), &config(&tmp)).unwrap();

    assert_eq!(response.toc_count, 4);
    assert_eq!(response.sections_count, 3);
    assert_eq!(response.coverage.candidate_only, 0);
}
