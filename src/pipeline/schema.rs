// src/pipeline/schema.rs

//! Record-level schema validation of persisted inventories.
//!
//! Works on raw JSON so that records the typed model would reject can still
//! be counted and described.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::local::non_blank_lines;

/// Fields every standard record must carry.
const STANDARD_FIELDS: [&str; 7] = [
    "section_id",
    "title",
    "page",
    "level",
    "full_path",
    "doc_title",
    "tags",
];

/// Fields every enhanced record must carry.
const ENHANCED_FIELDS: [&str; 5] = ["section_id", "title", "page", "level", "content"];

/// Schema validation result for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SchemaReport {
    pub file: String,
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    /// Every missing field, once per record it is missing from
    pub missing_fields: Vec<String>,
    pub field_types_valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Str,
    UInt,
    StrList,
}

impl Kind {
    fn name(&self) -> &'static str {
        match self {
            Kind::Str => "string",
            Kind::UInt => "non-negative integer",
            Kind::StrList => "list of strings",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Kind::Str => value.is_string(),
            Kind::UInt => value.is_u64(),
            Kind::StrList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

const STANDARD_TYPES: [(&str, Kind); 7] = [
    ("section_id", Kind::Str),
    ("title", Kind::Str),
    ("page", Kind::UInt),
    ("level", Kind::UInt),
    ("full_path", Kind::Str),
    ("doc_title", Kind::Str),
    ("tags", Kind::StrList),
];

const ENHANCED_TYPES: [(&str, Kind); 5] = [
    ("section_id", Kind::Str),
    ("title", Kind::Str),
    ("page", Kind::UInt),
    ("level", Kind::UInt),
    ("content", Kind::Str),
];

/// Outcome of checking a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordCheck {
    Valid,
    MissingFields(Vec<String>),
    TypeErrors(Vec<String>),
}

/// Check one record object.
pub fn check_record(record: &Map<String, Value>) -> RecordCheck {
    let enhanced = record.get("enhanced").and_then(Value::as_bool) == Some(true);
    let (required, types): (&[&str], &[(&str, Kind)]) = if enhanced {
        (&ENHANCED_FIELDS[..], &ENHANCED_TYPES[..])
    } else {
        (&STANDARD_FIELDS[..], &STANDARD_TYPES[..])
    };

    let missing: Vec<String> = required
        .iter()
        .filter(|f| !record.contains_key(**f))
        .map(|f| f.to_string())
        .collect();
    if !missing.is_empty() {
        return RecordCheck::MissingFields(missing);
    }

    let mut errors: Vec<String> = types
        .iter()
        .filter_map(|(field, kind)| {
            let value = &record[*field];
            (!kind.accepts(value))
                .then(|| format!("{}: expected {}, got {}", field, kind.name(), kind_of(value)))
        })
        .collect();

    match record.get("parent_id") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(other) => errors.push(format!(
            "parent_id: expected string or null, got {}",
            kind_of(other)
        )),
    }

    if errors.is_empty() {
        RecordCheck::Valid
    } else {
        RecordCheck::TypeErrors(errors)
    }
}

/// Validates JSON Lines inventories record by record.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate every non-blank line of a file. Never fails; problems are
    /// collected in `errors`.
    pub fn validate_file(&self, path: &Path) -> SchemaReport {
        let mut report = SchemaReport {
            file: path.display().to_string(),
            field_types_valid: true,
            ..SchemaReport::default()
        };

        let handle = match File::open(path) {
            Ok(handle) => handle,
            Err(e) => {
                report.errors.push(format!("File reading error: {e}"));
                return report;
            }
        };

        for (index, line) in non_blank_lines(BufReader::new(handle)).enumerate() {
            let n = index + 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    report.errors.push(format!("File reading error: {e}"));
                    break;
                }
            };
            report.total_records += 1;

            let record = match serde_json::from_str::<Value>(&line) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    report.invalid_records += 1;
                    report.errors.push(format!(
                        "Record {n}: Invalid JSON: expected object, got {}",
                        kind_of(&other)
                    ));
                    continue;
                }
                Err(e) => {
                    report.invalid_records += 1;
                    report.errors.push(format!("Record {n}: Invalid JSON: {e}"));
                    continue;
                }
            };

            match check_record(&record) {
                RecordCheck::Valid => report.valid_records += 1,
                RecordCheck::MissingFields(fields) => {
                    report.invalid_records += 1;
                    report
                        .errors
                        .push(format!("Record {n}: Missing fields {:?}", fields));
                    report.missing_fields.extend(fields);
                }
                RecordCheck::TypeErrors(errors) => {
                    report.invalid_records += 1;
                    report.field_types_valid = false;
                    report
                        .errors
                        .push(format!("Record {n}: Type errors: {}", errors.join(", ")));
                }
            }
        }

        if report.invalid_records > 0 {
            log::warn!(
                "Schema validation of {}: {} of {} records invalid",
                report.file,
                report.invalid_records,
                report.total_records
            );
        }
        report
    }
}

/// Convenience wrapper over [`SchemaValidator::validate_file`].
pub fn validate_schema(path: impl AsRef<Path>) -> SchemaReport {
    SchemaValidator::new().validate_file(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn object(json: &str) -> Map<String, Value> {
        match serde_json::from_str(json).unwrap() {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_valid_standard_record() {
        let r = object(
            r#"{"section_id":"1","title":"A","page":3,"level":1,"parent_id":null,"full_path":"1 A","doc_title":"D","tags":["x"]}"#,
        );
        assert_eq!(check_record(&r), RecordCheck::Valid);
    }

    #[test]
    fn test_parent_id_may_be_absent() {
        let r = object(
            r#"{"section_id":"1","title":"A","page":3,"level":1,"full_path":"1 A","doc_title":"D","tags":[]}"#,
        );
        assert_eq!(check_record(&r), RecordCheck::Valid);
    }

    #[test]
    fn test_missing_fields() {
        let r = object(r#"{"section_id":"1","title":"A","page":3,"content":"x"}"#);
        assert_eq!(
            check_record(&r),
            RecordCheck::MissingFields(vec![
                "level".into(),
                "full_path".into(),
                "doc_title".into(),
                "tags".into()
            ])
        );
    }

    #[test]
    fn test_type_errors() {
        let r = object(
            r#"{"section_id":1,"title":"A","page":-2,"level":1,"parent_id":5,"full_path":"1 A","doc_title":"D","tags":[1]}"#,
        );
        let RecordCheck::TypeErrors(errors) = check_record(&r) else {
            panic!("expected type errors");
        };
        assert_eq!(
            errors,
            vec![
                "section_id: expected string, got integer",
                "page: expected non-negative integer, got integer",
                "tags: expected list of strings, got list",
                "parent_id: expected string or null, got integer",
            ]
        );
    }

    #[test]
    fn test_enhanced_record_shape() {
        let r = object(
            r#"{"section_id":"enhanced_4","title":"Page 4 Content","page":4,"level":1,"content":"text","enhanced":true}"#,
        );
        assert_eq!(check_record(&r), RecordCheck::Valid);

        let r = object(r#"{"section_id":"enhanced_4","title":"T","page":4,"level":1,"enhanced":true}"#);
        assert_eq!(
            check_record(&r),
            RecordCheck::MissingFields(vec!["content".into()])
        );
    }

    #[test]
    fn test_validate_file_continues_past_bad_records() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inv.jsonl");
        fs::write(
            &path,
            concat!(
                r#"{"section_id":"1","title":"A","page":3,"level":1,"parent_id":null,"full_path":"1 A","doc_title":"D","tags":[]}"#,
                "\n",
                r#"{"section_id":"2"}"#,
                "\n\n",
                "not json\n",
                r#"{"section_id":"3","title":"C","page":"x","level":1,"full_path":"3 C","doc_title":"D","tags":[]}"#,
                "\n",
            ),
        )
        .unwrap();

        let report = validate_schema(&path);
        assert_eq!(report.total_records, 4);
        assert_eq!(report.valid_records, 1);
        assert_eq!(report.invalid_records, 3);
        assert!(!report.field_types_valid);
        assert_eq!(report.missing_fields.len(), 6);
        assert!(report.errors[0].starts_with("Record 2: Missing fields"));
        assert!(report.errors[1].starts_with("Record 3: Invalid JSON"));
        assert!(report.errors[2].starts_with("Record 4: Type errors: page"));
    }

    #[test]
    fn test_unreadable_file() {
        let report = validate_schema("/no/such/file.jsonl");
        assert_eq!(report.total_records, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("File reading error:"));
    }
}
