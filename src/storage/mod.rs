//! Persistence of inventories, metadata and reports.
//!
//! ## Directory Structure
//!
//! ```text
//! {output_dir}/
//! ├── usb_pd_toc.jsonl                 # latest ToC inventory (shared default location)
//! ├── usb_pd_spec.jsonl                # latest full-body inventory
//! ├── usb_pd_metadata.jsonl            # latest metadata record
//! ├── usb_pd_validation_report.json    # latest report
//! └── jobs/
//!     └── {job_id}/                    # same four files, scoped to one job
//! ```
//!
//! The shared default location always mirrors the most recent job. Lookups by
//! job id fall back to it when the job directory has no such file, which
//! assumes at most one active result at a time.

pub mod job;
pub mod local;

// Re-export for convenience
pub use job::JobStore;
pub use local::LocalStorage;
