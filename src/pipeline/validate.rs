// src/pipeline/validate.rs

//! Structural validation of a single inventory.
//!
//! Three independent checks run for every section against one id lookup:
//! orphaned parents, level/id disagreement, and parent level mismatch. A
//! section can land in more than one list. Roots (no `parent_id`) are exempt
//! from the two parent checks.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{InventoryRecord, dotted_level};
use crate::storage::local::non_blank_lines;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedSection {
    pub section_id: String,
    pub title: String,
    pub missing_parent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInconsistency {
    pub section_id: String,
    pub title: String,
    pub actual_level: u32,
    pub expected_level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentChildMismatch {
    pub section_id: String,
    pub parent_id: String,
    pub section_level: u32,
    pub parent_level: u32,
    pub expected_parent_level: u32,
}

/// Structural defects of one inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HierarchyReport {
    pub file: String,
    pub total_sections: usize,
    pub orphaned_sections: Vec<OrphanedSection>,
    pub level_inconsistencies: Vec<LevelInconsistency>,
    pub parent_child_mismatches: Vec<ParentChildMismatch>,
    /// Set when the inventory could not be fully read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HierarchyReport {
    pub fn defect_count(&self) -> usize {
        self.orphaned_sections.len()
            + self.level_inconsistencies.len()
            + self.parent_child_mismatches.len()
    }

    pub fn is_clean(&self) -> bool {
        self.defect_count() == 0 && self.error.is_none()
    }
}

/// Fields the structural checks read from a persisted record.
#[derive(Debug, Clone, Deserialize)]
struct HierarchyRecord {
    section_id: String,
    #[serde(default)]
    title: String,
    level: u32,
    #[serde(default)]
    parent_id: Option<String>,
}

/// Borrowed view of one section.
#[derive(Debug, Clone, Copy)]
struct Node<'a> {
    section_id: &'a str,
    title: &'a str,
    level: u32,
    parent_id: Option<&'a str>,
}

impl<'a> From<&'a InventoryRecord> for Node<'a> {
    fn from(r: &'a InventoryRecord) -> Self {
        Self {
            section_id: r.section_id(),
            title: r.title(),
            level: r.level(),
            parent_id: r.parent_id(),
        }
    }
}

impl<'a> From<&'a HierarchyRecord> for Node<'a> {
    fn from(r: &'a HierarchyRecord) -> Self {
        Self {
            section_id: &r.section_id,
            title: &r.title,
            level: r.level,
            parent_id: r.parent_id.as_deref(),
        }
    }
}

/// Runs the structural checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate in-memory records.
    pub fn validate_records(&self, file: &str, records: &[InventoryRecord]) -> HierarchyReport {
        let nodes: Vec<Node<'_>> = records.iter().map(Node::from).collect();
        check(file, &nodes, &HashSet::new())
    }

    /// Validate a JSON Lines inventory.
    ///
    /// Unreadable files and malformed records never fail the call: the first
    /// problem is stored in `error` and the readable records are still checked.
    pub fn validate_file(&self, path: &Path) -> HierarchyReport {
        let file = path.display().to_string();
        let read = read_records(path);
        let nodes: Vec<Node<'_>> = read.records.iter().map(Node::from).collect();
        let unparsed: HashSet<&str> = read.unparsed_ids.iter().map(String::as_str).collect();

        let mut report = check(&file, &nodes, &unparsed);
        if let Some(error) = read.error {
            log::warn!("Hierarchy validation of {}: {}", file, error);
            report.error = Some(error);
        }
        report
    }
}

/// What could be read from an inventory file.
#[derive(Debug, Default)]
struct ReadRecords {
    records: Vec<HierarchyRecord>,
    /// Ids of records that failed to parse but still name a `section_id`
    unparsed_ids: Vec<String>,
    /// First problem encountered
    error: Option<String>,
}

fn read_records(path: &Path) -> ReadRecords {
    let mut read = ReadRecords::default();
    let handle = match File::open(path) {
        Ok(handle) => handle,
        Err(e) => {
            read.error = Some(e.to_string());
            return read;
        }
    };

    for (index, line) in non_blank_lines(BufReader::new(handle)).enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                read.error.get_or_insert_with(|| format!("Record {}: {}", index + 1, e));
                continue;
            }
        };
        match serde_json::from_str::<HierarchyRecord>(&line) {
            Ok(record) => read.records.push(record),
            Err(e) => {
                if let Some(id) = lenient_section_id(&line) {
                    read.unparsed_ids.push(id);
                }
                read.error.get_or_insert_with(|| format!("Record {}: {}", index + 1, e));
            }
        }
    }
    read
}

/// `section_id` of a record the typed parse rejected, if it has one.
fn lenient_section_id(line: &str) -> Option<String> {
    let value: Value = serde_json::from_str(line).ok()?;
    value.get("section_id")?.as_str().map(str::to_string)
}

/// `unparsed` holds ids known to exist whose records could not be read; they
/// satisfy the orphan check but take no part in the level checks.
fn check(file: &str, nodes: &[Node<'_>], unparsed: &HashSet<&str>) -> HierarchyReport {
    // Later duplicates replace earlier ones
    let lookup: HashMap<&str, &Node<'_>> = nodes.iter().map(|n| (n.section_id, n)).collect();

    let mut report = HierarchyReport {
        file: file.to_string(),
        total_sections: nodes.len(),
        ..HierarchyReport::default()
    };

    for node in nodes {
        let parent = node.parent_id.filter(|p| !p.is_empty());

        if let Some(parent_id) = parent {
            match lookup.get(parent_id) {
                None if unparsed.contains(parent_id) => {}
                None => report.orphaned_sections.push(OrphanedSection {
                    section_id: node.section_id.to_string(),
                    title: node.title.to_string(),
                    missing_parent: parent_id.to_string(),
                }),
                Some(parent_node) => {
                    let expected_parent_level = node.level.saturating_sub(1);
                    if parent_node.level != expected_parent_level {
                        report.parent_child_mismatches.push(ParentChildMismatch {
                            section_id: node.section_id.to_string(),
                            parent_id: parent_id.to_string(),
                            section_level: node.level,
                            parent_level: parent_node.level,
                            expected_parent_level,
                        });
                    }
                }
            }
        }

        let expected_level = dotted_level(node.section_id);
        if node.level != expected_level {
            report.level_inconsistencies.push(LevelInconsistency {
                section_id: node.section_id.to_string(),
                title: node.title.to_string(),
                actual_level: node.level,
                expected_level,
            });
        }
    }

    report
}

/// Convenience wrapper over [`StructuralValidator::validate_records`].
pub fn validate_records(file: &str, records: &[InventoryRecord]) -> HierarchyReport {
    StructuralValidator::new().validate_records(file, records)
}

/// Convenience wrapper over [`StructuralValidator::validate_file`].
pub fn validate_file(path: impl AsRef<Path>) -> HierarchyReport {
    StructuralValidator::new().validate_file(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Section;
    use std::fs;
    use tempfile::TempDir;

    fn record(id: &str, level: u32, parent: Option<&str>) -> InventoryRecord {
        let mut s = Section::new(id, format!("Title {id}"), 1, "Doc", vec![]);
        s.level = level;
        s.parent_id = parent.map(str::to_string);
        s.into()
    }

    fn well_formed() -> Vec<InventoryRecord> {
        vec![
            record("1", 1, None),
            record("1.1", 2, Some("1")),
            record("1.1.1", 3, Some("1.1")),
            record("2", 1, None),
            record("2.1", 2, Some("2")),
        ]
    }

    #[test]
    fn test_well_formed_inventory_is_clean() {
        let report = validate_records("t", &well_formed());
        assert_eq!(report.total_sections, 5);
        assert!(report.is_clean());
    }

    #[test]
    fn test_missing_parent_is_orphan() {
        let records: Vec<_> = well_formed()
            .into_iter()
            .filter(|r| r.section_id() != "2")
            .collect();
        let report = validate_records("t", &records);

        assert_eq!(
            report.orphaned_sections,
            vec![OrphanedSection {
                section_id: "2.1".into(),
                title: "Title 2.1".into(),
                missing_parent: "2".into(),
            }]
        );
        assert!(report.level_inconsistencies.is_empty());
        assert!(report.parent_child_mismatches.is_empty());
    }

    #[test]
    fn test_level_inconsistency() {
        let records = vec![
            record("3", 1, None),
            record("3.1", 2, Some("3")),
            record("3.1.1", 2, Some("3.1")),
        ];
        let report = validate_records("t", &records);

        assert_eq!(report.level_inconsistencies.len(), 1);
        let entry = &report.level_inconsistencies[0];
        assert_eq!(entry.section_id, "3.1.1");
        assert_eq!(entry.actual_level, 2);
        assert_eq!(entry.expected_level, 3);
        // parent "3.1" has level 2, child claims level 2 -> also a mismatch
        assert_eq!(report.parent_child_mismatches.len(), 1);
        assert_eq!(report.parent_child_mismatches[0].expected_parent_level, 1);
    }

    #[test]
    fn test_orphan_still_checked_for_level() {
        let report = validate_records("t", &[record("4.1", 3, Some("4"))]);
        assert_eq!(report.orphaned_sections.len(), 1);
        assert_eq!(report.level_inconsistencies.len(), 1);
        assert_eq!(report.defect_count(), 2);
    }

    #[test]
    fn test_enhanced_records_are_checked() {
        let enhanced: InventoryRecord = crate::models::EnhancedSection {
            section_id: "enhanced_9".into(),
            title: "Page 9 Content".into(),
            page: 9,
            level: 1,
            parent_id: None,
            content: "text".into(),
            enhanced: true,
        }
        .into();
        assert!(validate_records("t", &[enhanced]).is_clean());
    }

    #[test]
    fn test_idempotent() {
        let records = vec![record("1.2.1", 3, Some("1.2")), record("2", 3, None)];
        assert_eq!(
            validate_records("t", &records),
            validate_records("t", &records)
        );
    }

    #[test]
    fn test_duplicate_ids_last_wins_in_lookup() {
        let records = vec![
            record("5", 1, None),
            record("5", 2, None),
            record("5.1", 2, Some("5")),
        ];
        let report = validate_records("t", &records);
        assert_eq!(report.parent_child_mismatches.len(), 1);
        assert_eq!(report.parent_child_mismatches[0].parent_level, 2);
    }

    #[test]
    fn test_validate_file_with_bad_record() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inv.jsonl");
        fs::write(
            &path,
            "{\"section_id\":\"1\",\"title\":\"A\",\"level\":1,\"parent_id\":null}\n\
             {\"section_id\":\"1.1\",\"title\":\"B\"}\n\
             {\"section_id\":\"2.1\",\"title\":\"C\",\"level\":2,\"parent_id\":\"2\"}\n",
        )
        .unwrap();

        let report = validate_file(&path);
        assert_eq!(report.total_sections, 2);
        assert_eq!(report.orphaned_sections.len(), 1);
        assert!(report.error.as_deref().unwrap().starts_with("Record 2:"));
    }

    #[test]
    fn test_unparsable_parent_still_resolves_children() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inv.jsonl");
        fs::write(
            &path,
            "{\"section_id\":\"3\",\"title\":\"Parent\",\"level\":\"one\"}\n\
             {\"section_id\":\"3.1\",\"title\":\"Child\",\"level\":2,\"parent_id\":\"3\"}\n\
             not json at all\n\
             {\"section_id\":\"4.1\",\"title\":\"Lost\",\"level\":2,\"parent_id\":\"4\"}\n",
        )
        .unwrap();

        let report = validate_file(&path);
        assert_eq!(report.total_sections, 2);
        assert_eq!(report.orphaned_sections.len(), 1);
        assert_eq!(report.orphaned_sections[0].section_id, "4.1");
        assert!(report.parent_child_mismatches.is_empty());
        assert!(report.error.as_deref().unwrap().starts_with("Record 1:"));
    }

    #[test]
    fn test_validate_missing_file() {
        let report = validate_file("/no/such/inventory.jsonl");
        assert_eq!(report.total_sections, 0);
        assert!(report.error.is_some());
    }
}
