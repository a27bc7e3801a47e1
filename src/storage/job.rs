//! Per-job artifact lookup.

use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::models::{Artifact, JobStatus, PathsConfig};
use crate::storage::LocalStorage;
use crate::utils::is_plain_component;

/// Note attached to status answers served from the shared default location.
pub const FALLBACK_NOTE: &str = "Using default location files";

/// Resolves job-scoped artifacts under `{output_dir}/{jobs_dir}/{job_id}`.
#[derive(Debug, Clone)]
pub struct JobStore {
    paths: PathsConfig,
}

impl JobStore {
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            paths: paths.clone(),
        }
    }

    /// Storage rooted at the shared default location.
    pub fn default_storage(&self) -> LocalStorage {
        LocalStorage::new(self.paths.output_path())
    }

    pub fn job_dir(&self, job_id: &str) -> Result<PathBuf> {
        if !is_plain_component(job_id) {
            return Err(AppError::validation(format!("Invalid job id: {job_id:?}")));
        }
        Ok(self
            .paths
            .output_path()
            .join(&self.paths.jobs_dir)
            .join(job_id))
    }

    /// Storage rooted at one job's directory.
    pub fn job_storage(&self, job_id: &str) -> Result<LocalStorage> {
        Ok(LocalStorage::new(self.job_dir(job_id)?))
    }

    /// Path of a job's artifact, falling back to the shared default file.
    pub fn artifact(&self, job_id: &str, artifact: Artifact) -> Result<PathBuf> {
        let name = artifact.file_name(&self.paths);

        let scoped = self.job_storage(job_id)?;
        if scoped.exists(name) {
            return Ok(scoped.path(name));
        }

        let shared = self.default_storage();
        if shared.exists(name) {
            log::warn!(
                "Job {} has no {} file, serving {}",
                job_id,
                artifact,
                shared.path(name).display()
            );
            return Ok(shared.path(name));
        }

        Err(AppError::JobNotFound(format!("{job_id} ({artifact})")))
    }

    /// Which artifacts exist for a job.
    pub fn status(&self, job_id: &str) -> Result<JobStatus> {
        let dir = self.job_dir(job_id)?;
        let present = |storage: &LocalStorage| -> Vec<String> {
            Artifact::ALL
                .iter()
                .map(|a| a.file_name(&self.paths))
                .filter(|name| storage.exists(name))
                .map(str::to_string)
                .collect()
        };

        if dir.is_dir() {
            return Ok(JobStatus {
                job_id: job_id.to_string(),
                status: "completed".into(),
                files: present(&LocalStorage::new(dir)),
                note: None,
            });
        }

        let files = present(&self.default_storage());
        if files.is_empty() {
            return Err(AppError::JobNotFound(job_id.to_string()));
        }

        Ok(JobStatus {
            job_id: job_id.to_string(),
            status: "completed".into(),
            files,
            note: Some(FALLBACK_NOTE.into()),
        })
    }
}
