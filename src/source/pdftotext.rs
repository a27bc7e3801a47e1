// src/source/pdftotext.rs

//! Poppler command-line backend.
//!
//! Requires `pdfinfo` and `pdftotext` on `PATH`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{AppError, Result};
use crate::source::TextSource;
use crate::utils::file_name;

/// Extracts page text by invoking `pdftotext` once per page.
#[derive(Debug, Clone)]
pub struct Pdftotext {
    path: PathBuf,
    name: String,
    pages: usize,
}

impl Pdftotext {
    /// Open a PDF, reading its page count with `pdfinfo`.
    ///
    /// Any failure here is fatal for the document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        if !path.exists() {
            return Err(AppError::source_open(display, "file not found"));
        }

        let out = Command::new("pdfinfo")
            .arg(path)
            .output()
            .map_err(|e| AppError::source_open(&display, format!("pdfinfo: {e}")))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(AppError::source_open(display, stderr.trim()));
        }

        let pages = parse_page_count(&String::from_utf8_lossy(&out.stdout))
            .ok_or_else(|| AppError::source_open(&display, "pdfinfo reported no page count"))?;

        log::debug!("Opened {} ({} pages)", display, pages);

        Ok(Self {
            name: file_name(path),
            path: path.to_path_buf(),
            pages,
        })
    }
}

/// Read the `Pages:` line of `pdfinfo` output.
fn parse_page_count(info: &str) -> Option<usize> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

impl TextSource for Pdftotext {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_text(&self, page: u32) -> Result<String> {
        if page == 0 || page as usize > self.pages {
            return Err(AppError::source_unavailable(
                page,
                format!("page out of range (1..={})", self.pages),
            ));
        }

        let out = Command::new("pdftotext")
            .arg("-q")
            .arg("-layout")
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg(&self.path)
            .arg("-")
            .output()
            .map_err(|e| AppError::source_unavailable(page, e))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(AppError::source_unavailable(page, stderr.trim()));
        }

        // pdftotext terminates every page with a form feed
        let text = String::from_utf8_lossy(&out.stdout);
        Ok(text.trim_end_matches('\u{000C}').to_string())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
