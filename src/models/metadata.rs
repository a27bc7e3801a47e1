//! Side-channel document metadata record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary written next to the two inventories after an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub doc_title: String,
    pub total_toc_sections: usize,
    pub total_sections: usize,
    pub processing_date: DateTime<Utc>,
    pub source_file: String,
}

impl DocumentMetadata {
    pub fn new(
        doc_title: impl Into<String>,
        total_toc_sections: usize,
        total_sections: usize,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            doc_title: doc_title.into(),
            total_toc_sections,
            total_sections,
            processing_date: Utc::now(),
            source_file: source_file.into(),
        }
    }
}
