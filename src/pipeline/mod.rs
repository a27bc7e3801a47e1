//! Extraction, reconciliation and validation stages.
//!
//! - `hierarchy`: ToC and full-body passes over a [`TextSource`](crate::source::TextSource)
//! - `coverage`: overlap metrics between the two inventories
//! - `enhance`: gap filling for uncovered pages
//! - `validate` / `schema`: structural and record-level validation
//! - `report`: tabular report built from the above
//! - `pipeline`: job orchestration tying the stages together

pub mod context;
pub mod coverage;
pub mod enhance;
pub mod hierarchy;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod recognize;
pub mod report;
pub mod sample;
pub mod schema;
pub mod tags;
pub mod validate;

pub use context::{Diagnostics, Pass, PipelineContext};
pub use coverage::{Comparison, CoverageMetrics, CoverageReconciler, SectionRef};
pub use enhance::{EnhanceOutcome, run_enhance};
pub use pipeline::{job_id, run_coverage, run_job, run_validate};
pub use recognize::{Heading, SectionRecognizer};
pub use report::{Sheet, ValidationReport};
pub use sample::write_sample;
pub use schema::{SchemaReport, SchemaValidator};
pub use tags::TagClassifier;
pub use validate::{HierarchyReport, StructuralValidator};
