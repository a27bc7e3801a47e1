// src/models/mod.rs

//! Domain models for the section extraction pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod job;
mod metadata;
mod section;

// Re-export all public types
pub use config::{Config, EnhanceConfig, EnhanceMode, ExtractionConfig, PathsConfig, TagMapping};
pub use job::{Artifact, ArtifactPaths, JobOptions, JobResponse, JobStatus};
pub use metadata::DocumentMetadata;
pub use section::{
    EnhancedSection, InventoryRecord, KeyPart, Section, SectionKey, dotted_level,
    is_dotted_numeric, parent_of, sort_inventory,
};

pub use crate::pipeline::coverage::CoverageMetrics;
