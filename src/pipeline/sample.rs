// src/pipeline/sample.rs

//! Sample inventory with deliberate structural defects, for trying out the
//! validators.

use std::path::Path;

use crate::error::Result;
use crate::models::{InventoryRecord, Section};
use crate::storage::LocalStorage;

/// Four records: two well-formed, one orphan, one with a wrong level.
pub fn sample_records() -> Vec<InventoryRecord> {
    let doc = "Test Document";

    let mut orphan = Section::new("1.2.1", "Orphaned Section", 15, doc, vec![]);
    orphan.parent_id = Some("1.2".into());

    let mut wrong_level = Section::new("2", "Wrong Level Section", 20, doc, vec![]);
    wrong_level.level = 3;

    vec![
        Section::new("1", "Introduction", 10, doc, vec!["intro".into()]).into(),
        Section::new("1.1", "Overview", 11, doc, vec!["overview".into()]).into(),
        orphan.into(),
        wrong_level.into(),
    ]
}

/// Write the sample inventory as JSON Lines.
pub fn write_sample(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "test_data.jsonl".into());

    let written = LocalStorage::new(dir).write_jsonl(&name, &sample_records())?;
    log::info!("Sample test data created: {}", written.display());
    Ok(())
}
