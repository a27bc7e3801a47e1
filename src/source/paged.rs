// src/source/paged.rs

//! In-memory page text.

use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::source::TextSource;
use crate::utils::file_name;

/// Page separator emitted by `pdftotext`.
const FORM_FEED: char = '\u{000C}';

/// A document whose pages are already available as text.
#[derive(Debug, Clone, Default)]
pub struct PagedText {
    name: String,
    pages: Vec<String>,
}

impl PagedText {
    /// Create a source from a list of page texts, page 1 first.
    pub fn new(name: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    /// Split form-feed separated text into pages.
    ///
    /// A trailing empty page (the separator after the last page) is dropped.
    pub fn from_form_feed(name: impl Into<String>, text: &str) -> Self {
        let mut pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();
        while matches!(pages.last(), Some(last) if last.trim().is_empty()) {
            pages.pop();
        }
        Self::new(name, pages)
    }

    /// Load a form-feed separated text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::source_open(path.display().to_string(), e))?;
        Ok(Self::from_form_feed(file_name(path), &text))
    }
}

impl TextSource for PagedText {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: u32) -> Result<String> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .cloned()
            .ok_or_else(|| {
                AppError::source_unavailable(
                    page,
                    format!("page out of range (1..={})", self.pages.len()),
                )
            })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
