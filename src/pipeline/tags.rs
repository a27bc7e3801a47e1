// src/pipeline/tags.rs

//! Title keyword tagging.

use std::collections::BTreeSet;

use crate::models::TagMapping;

/// Maps section titles to topical tags using an ordered keyword table.
#[derive(Debug, Clone)]
pub struct TagClassifier {
    table: Vec<(String, Vec<String>)>,
}

impl TagClassifier {
    pub fn new(mappings: &[TagMapping]) -> Self {
        Self {
            table: mappings
                .iter()
                .map(|m| (m.keyword.to_lowercase(), m.tags.clone()))
                .collect(),
        }
    }

    /// Tags for a title: sorted, lower-case, without duplicates.
    pub fn classify(&self, title: &str) -> Vec<String> {
        let title = title.to_lowercase();
        let tags: BTreeSet<String> = self
            .table
            .iter()
            .filter(|(keyword, _)| title.contains(keyword.as_str()))
            .flat_map(|(_, tags)| tags.iter().map(|t| t.to_lowercase()))
            .collect();
        tags.into_iter().collect()
    }
}
