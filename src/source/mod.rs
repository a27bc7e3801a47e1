// src/source/mod.rs

//! Page text providers.
//!
//! The extraction passes only ever ask for "the text of page N". Two
//! backends are provided:
//!
//! - [`PagedText`]: pages held in memory, loaded from form-feed separated text
//! - [`Pdftotext`]: Poppler's `pdfinfo`/`pdftotext` tools, one call per page

pub mod paged;
pub mod pdftotext;

use std::path::Path;

use crate::error::Result;

pub use paged::PagedText;
pub use pdftotext::Pdftotext;

/// A document that can produce the plain text of each page.
pub trait TextSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Text of a 1-based page.
    ///
    /// Out-of-range pages and backend failures return
    /// [`AppError::SourceUnavailable`](crate::error::AppError::SourceUnavailable).
    fn page_text(&self, page: u32) -> Result<String>;

    /// Display name of the backing document.
    fn name(&self) -> &str;
}

/// Open a document, choosing the backend by file extension.
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn TextSource>> {
    let path = path.as_ref();
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        Ok(Box::new(Pdftotext::open(path)?))
    } else {
        Ok(Box::new(PagedText::load(path)?))
    }
}
