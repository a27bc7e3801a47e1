//! Job request/response payloads for the upload boundary.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{CoverageMetrics, DocumentMetadata, PathsConfig};

/// Which stages a job runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobOptions {
    #[serde(default = "enabled")]
    pub extract_toc: bool,

    #[serde(default = "enabled")]
    pub extract_sections: bool,

    #[serde(default = "enabled")]
    pub generate_report: bool,

    #[serde(default)]
    pub enhance_content: bool,
}

fn enabled() -> bool {
    true
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            extract_toc: true,
            extract_sections: true,
            generate_report: true,
            enhance_content: false,
        }
    }
}

/// One of the four files a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Artifact {
    Toc,
    Spec,
    Metadata,
    Report,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [Self::Toc, Self::Spec, Self::Metadata, Self::Report];

    /// File name of this artifact under the configured layout.
    pub fn file_name<'a>(&self, paths: &'a PathsConfig) -> &'a str {
        match self {
            Self::Toc => &paths.toc_file,
            Self::Spec => &paths.spec_file,
            Self::Metadata => &paths.metadata_file,
            Self::Report => &paths.report_file,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Toc => "toc",
            Self::Spec => "spec",
            Self::Metadata => "metadata",
            Self::Report => "report",
        };
        f.write_str(name)
    }
}

impl FromStr for Artifact {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "toc" => Ok(Self::Toc),
            "spec" => Ok(Self::Spec),
            "metadata" => Ok(Self::Metadata),
            "report" => Ok(Self::Report),
            other => Err(AppError::validation(format!("Invalid file type: {other}"))),
        }
    }
}

/// Locations of the artifacts written for a job.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArtifactPaths {
    pub source: PathBuf,
    pub toc: Option<PathBuf>,
    pub spec: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

/// Result of a parse job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub job_id: String,
    pub metadata: DocumentMetadata,
    pub toc_count: usize,
    pub sections_count: usize,
    pub coverage: CoverageMetrics,
    pub files: ArtifactPaths,
}

/// Answer to a job status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: String,
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
