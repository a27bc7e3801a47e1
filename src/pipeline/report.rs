// src/pipeline/report.rs

//! Tabular validation report.
//!
//! The report is a list of named sheets, each a header row plus data rows,
//! persisted as pretty JSON. Sheets appear in a fixed order; the optional
//! ones are left out when they would be empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::models::InventoryRecord;
use crate::pipeline::coverage::{Comparison, SectionRef};
use crate::pipeline::schema::SchemaReport;
use crate::pipeline::validate::HierarchyReport;
use crate::utils::file_name;

/// One table of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col)
    }
}

/// The complete report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    pub sheets: Vec<Sheet>,
}

impl ValidationReport {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Everything the report is built from.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub toc_schema: &'a SchemaReport,
    pub spec_schema: &'a SchemaReport,
    pub toc_hierarchy: &'a HierarchyReport,
    pub spec_hierarchy: &'a HierarchyReport,
    pub comparison: &'a Comparison,
    pub toc_sections: &'a [InventoryRecord],
    pub spec_sections: &'a [InventoryRecord],
}

const SECTION_COLUMNS: [&str; 8] = [
    "section_id",
    "title",
    "page",
    "level",
    "parent_id",
    "full_path",
    "doc_title",
    "tags",
];

/// Build all sheets.
pub fn compose(inputs: &ReportInputs<'_>) -> ValidationReport {
    let mut sheets = vec![schema_sheet(inputs), hierarchy_sheet(inputs)];

    let errors = errors_sheet(inputs);
    if !errors.rows.is_empty() {
        sheets.push(errors);
    }

    sheets.push(summary_sheet(inputs.comparison));

    for (name, records) in [
        ("ToC Sections", inputs.toc_sections),
        ("All Sections", inputs.spec_sections),
    ] {
        if !records.is_empty() {
            sheets.push(sections_sheet(name, records));
        }
    }

    let mismatches = mismatch_sheet(inputs.comparison);
    if !mismatches.rows.is_empty() {
        sheets.push(mismatches);
    }

    ValidationReport {
        generated_at: Utc::now(),
        sheets,
    }
}

fn schema_sheet(inputs: &ReportInputs<'_>) -> Sheet {
    let mut sheet = Sheet::new(
        "Schema Validation",
        &[
            "File",
            "Total Records",
            "Valid Records",
            "Invalid Records",
            "Field Types Valid",
            "Error Count",
        ],
    );
    for report in [inputs.toc_schema, inputs.spec_schema] {
        sheet.push(vec![
            json!(file_name(&report.file)),
            json!(report.total_records),
            json!(report.valid_records),
            json!(report.invalid_records),
            json!(report.field_types_valid),
            json!(report.errors.len()),
        ]);
    }
    sheet
}

fn hierarchy_sheet(inputs: &ReportInputs<'_>) -> Sheet {
    let mut sheet = Sheet::new(
        "Hierarchy Validation",
        &[
            "File",
            "Total Sections",
            "Orphaned Sections",
            "Level Inconsistencies",
            "Parent-Child Mismatches",
        ],
    );
    for report in [inputs.toc_hierarchy, inputs.spec_hierarchy] {
        sheet.push(vec![
            json!(file_name(&report.file)),
            json!(report.total_sections),
            json!(report.orphaned_sections.len()),
            json!(report.level_inconsistencies.len()),
            json!(report.parent_child_mismatches.len()),
        ]);
    }
    sheet
}

fn errors_sheet(inputs: &ReportInputs<'_>) -> Sheet {
    let mut sheet = Sheet::new("Detailed Errors", &["File", "Error"]);
    for report in [inputs.toc_schema, inputs.spec_schema] {
        for error in &report.errors {
            sheet.push(vec![json!(file_name(&report.file)), json!(error)]);
        }
    }
    for report in [inputs.toc_hierarchy, inputs.spec_hierarchy] {
        if let Some(error) = &report.error {
            sheet.push(vec![json!(file_name(&report.file)), json!(error)]);
        }
    }
    sheet
}

fn summary_sheet(comparison: &Comparison) -> Sheet {
    let m = &comparison.metrics;
    let levels = &comparison.reference_levels;
    let mut sheet = Sheet::new("Summary", &["Metric", "Count"]);

    for (metric, count) in [
        ("Total ToC Sections", comparison.reference_records),
        ("Total Parsed Sections", comparison.candidate_records),
        ("Sections in Both", m.common),
        ("ToC Only", m.reference_only),
        ("Parsed Only", m.candidate_only),
        ("Level 1 Sections (ToC)", levels.level_1),
        ("Level 2 Sections (ToC)", levels.level_2),
        ("Level 3+ Sections (ToC)", levels.level_3_plus),
    ] {
        sheet.push(vec![json!(metric), json!(count)]);
    }
    sheet
}

fn sections_sheet(name: &str, records: &[InventoryRecord]) -> Sheet {
    let mut sheet = Sheet::new(name, &SECTION_COLUMNS);
    for record in records {
        let row = match record {
            InventoryRecord::Standard(s) => vec![
                json!(s.section_id),
                json!(s.title),
                json!(s.page),
                json!(s.level),
                json!(s.parent_id),
                json!(s.full_path),
                json!(s.doc_title),
                json!(s.tags.join(", ")),
            ],
            InventoryRecord::Enhanced(e) => vec![
                json!(e.section_id),
                json!(e.title),
                json!(e.page),
                json!(e.level),
                json!(e.parent_id),
                json!(""),
                json!(""),
                json!(""),
            ],
        };
        sheet.push(row);
    }
    sheet
}

fn page_cell(section: &SectionRef) -> Value {
    section.page.map_or_else(|| json!("N/A"), |p| json!(p))
}

fn mismatch_sheet(comparison: &Comparison) -> Sheet {
    let mut sheet = Sheet::new(
        "Mismatches",
        &["Section ID", "Title", "Issue", "ToC Page", "Parsed Page"],
    );
    for s in &comparison.reference_only {
        sheet.push(vec![
            json!(s.section_id),
            json!(s.title),
            json!("Missing in parsed sections"),
            page_cell(s),
            json!("N/A"),
        ]);
    }
    for s in &comparison.candidate_only {
        sheet.push(vec![
            json!(s.section_id),
            json!(s.title),
            json!("Extra in parsed sections"),
            json!("N/A"),
            page_cell(s),
        ]);
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Section;
    use crate::pipeline::coverage::compare;
    use crate::pipeline::validate::validate_records;

    fn sections(ids: &[(&str, u32)]) -> Vec<InventoryRecord> {
        ids.iter()
            .map(|(id, page)| Section::new(*id, format!("T{id}"), *page, "Doc", vec!["power".into()]).into())
            .collect()
    }

    fn schema(file: &str, errors: &[&str]) -> SchemaReport {
        SchemaReport {
            file: file.into(),
            field_types_valid: true,
            errors: errors.iter().map(|e| e.to_string()).collect(),
            ..SchemaReport::default()
        }
    }

    fn build(toc: &[InventoryRecord], spec: &[InventoryRecord], errors: &[&str]) -> ValidationReport {
        let toc_refs: Vec<SectionRef> = toc.iter().map(SectionRef::from).collect();
        let spec_refs: Vec<SectionRef> = spec.iter().map(SectionRef::from).collect();
        let comparison = compare(&toc_refs, &spec_refs);
        let toc_schema = schema("out/usb_pd_toc.jsonl", errors);
        let spec_schema = schema("out/usb_pd_spec.jsonl", &[]);
        let toc_h = validate_records("out/usb_pd_toc.jsonl", toc);
        let spec_h = validate_records("out/usb_pd_spec.jsonl", spec);

        compose(&ReportInputs {
            toc_schema: &toc_schema,
            spec_schema: &spec_schema,
            toc_hierarchy: &toc_h,
            spec_hierarchy: &spec_h,
            comparison: &comparison,
            toc_sections: toc,
            spec_sections: spec,
        })
    }

    #[test]
    fn test_full_sheet_order() {
        let toc = sections(&[("1", 3), ("1.1", 4), ("2", 9)]);
        let spec = sections(&[("1", 3), ("7", 12)]);
        let report = build(&toc, &spec, &["Record 1: Missing fields [\"tags\"]"]);

        assert_eq!(
            report.sheet_names(),
            vec![
                "Schema Validation",
                "Hierarchy Validation",
                "Detailed Errors",
                "Summary",
                "ToC Sections",
                "All Sections",
                "Mismatches"
            ]
        );

        let schema = report.sheet("Schema Validation").unwrap();
        assert_eq!(schema.cell(0, "File"), Some(&json!("usb_pd_toc.jsonl")));
        assert_eq!(schema.cell(0, "Error Count"), Some(&json!(1)));

        let summary = report.sheet("Summary").unwrap();
        assert_eq!(summary.rows[2], vec![json!("Sections in Both"), json!(1)]);
        assert_eq!(summary.rows[5], vec![json!("Level 1 Sections (ToC)"), json!(2)]);

        let mismatches = report.sheet("Mismatches").unwrap();
        assert_eq!(mismatches.rows.len(), 3);
        assert_eq!(mismatches.cell(0, "Section ID"), Some(&json!("1.1")));
        assert_eq!(mismatches.cell(0, "Parsed Page"), Some(&json!("N/A")));
        assert_eq!(mismatches.cell(2, "Issue"), Some(&json!("Extra in parsed sections")));
        assert_eq!(mismatches.cell(2, "Parsed Page"), Some(&json!(12)));
    }

    #[test]
    fn test_optional_sheets_omitted() {
        let report = build(&[], &[], &[]);
        assert_eq!(
            report.sheet_names(),
            vec!["Schema Validation", "Hierarchy Validation", "Summary"]
        );
    }

    #[test]
    fn test_section_rows() {
        let toc = sections(&[("2.1", 5)]);
        let report = build(&toc, &toc, &[]);
        let sheet = report.sheet("ToC Sections").unwrap();

        assert_eq!(sheet.columns.len(), 8);
        assert_eq!(sheet.cell(0, "parent_id"), Some(&json!("2")));
        assert_eq!(sheet.cell(0, "full_path"), Some(&json!("2.1 T2.1")));
        assert_eq!(sheet.cell(0, "tags"), Some(&json!("power")));
        assert!(report.sheet("Mismatches").is_none());
    }
}
