// src/pipeline/coverage.rs

//! Coverage reconciliation between two section inventories.
//!
//! The reference inventory is the table of contents, the candidate is the
//! full-body inventory. Comparison is over distinct ids and is read-only:
//! gaps are reported here and filled by [`crate::pipeline::enhance`].

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{InventoryRecord, Section, SectionKey};

/// Minimal view of a persisted record: enough to compare inventories.
///
/// Deserializes from any record shape that carries a `section_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRef {
    pub section_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub page: Option<u32>,

    #[serde(default)]
    pub level: Option<u32>,
}

impl From<&Section> for SectionRef {
    fn from(s: &Section) -> Self {
        Self {
            section_id: s.section_id.clone(),
            title: s.title.clone(),
            page: Some(s.page),
            level: Some(s.level),
        }
    }
}

impl From<&InventoryRecord> for SectionRef {
    fn from(r: &InventoryRecord) -> Self {
        Self {
            section_id: r.section_id().to_string(),
            title: r.title().to_string(),
            page: Some(r.page()),
            level: Some(r.level()),
        }
    }
}

/// Set-overlap metrics between a reference and a candidate inventory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CoverageMetrics {
    pub total_reference: usize,
    pub total_candidate: usize,
    pub common: usize,
    pub reference_only: usize,
    pub candidate_only: usize,
    /// `common / total_reference * 100`, 0 for an empty reference
    pub coverage_percentage: f64,
}

/// Reference section counts by level: 1, 2, and 3 or deeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LevelCounts {
    pub level_1: usize,
    pub level_2: usize,
    pub level_3_plus: usize,
}

/// Full comparison result, with the differing records for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Comparison {
    pub metrics: CoverageMetrics,
    /// Record counts before de-duplication
    pub reference_records: usize,
    pub candidate_records: usize,
    pub reference_levels: LevelCounts,
    /// Ids present in both, in natural order
    pub common_ids: Vec<String>,
    /// First reference record of each id missing from the candidate
    pub reference_only: Vec<SectionRef>,
    /// First candidate record of each id missing from the reference
    pub candidate_only: Vec<SectionRef>,
}

impl Comparison {
    pub fn has_gaps(&self) -> bool {
        !self.reference_only.is_empty() || !self.candidate_only.is_empty()
    }
}

/// Compares inventories by section id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageReconciler;

impl CoverageReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Compute the overlap metrics only.
    pub fn metrics(&self, reference: &[SectionRef], candidate: &[SectionRef]) -> CoverageMetrics {
        let ref_ids: HashSet<&str> = reference.iter().map(|s| s.section_id.as_str()).collect();
        let cand_ids: HashSet<&str> = candidate.iter().map(|s| s.section_id.as_str()).collect();
        metrics_of(&ref_ids, &cand_ids)
    }

    /// Compute metrics plus the id lists and level counts used by reports.
    pub fn compare(&self, reference: &[SectionRef], candidate: &[SectionRef]) -> Comparison {
        let ref_map = first_by_id(reference);
        let cand_map = first_by_id(candidate);

        let ref_ids: HashSet<&str> = ref_map.keys().copied().collect();
        let cand_ids: HashSet<&str> = cand_map.keys().copied().collect();

        let common_ids = natural_order(ref_ids.intersection(&cand_ids).copied())
            .into_iter()
            .map(str::to_string)
            .collect();

        let reference_only = natural_order(ref_ids.difference(&cand_ids).copied())
            .into_iter()
            .filter_map(|id| ref_map.get(id).map(|s| (*s).clone()))
            .collect();

        let candidate_only = natural_order(cand_ids.difference(&ref_ids).copied())
            .into_iter()
            .filter_map(|id| cand_map.get(id).map(|s| (*s).clone()))
            .collect();

        let mut levels = LevelCounts::default();
        for s in reference {
            match s.level {
                Some(1) => levels.level_1 += 1,
                Some(2) => levels.level_2 += 1,
                Some(l) if l >= 3 => levels.level_3_plus += 1,
                _ => {}
            }
        }

        Comparison {
            metrics: metrics_of(&ref_ids, &cand_ids),
            reference_records: reference.len(),
            candidate_records: candidate.len(),
            reference_levels: levels,
            common_ids,
            reference_only,
            candidate_only,
        }
    }
}

fn metrics_of(reference: &HashSet<&str>, candidate: &HashSet<&str>) -> CoverageMetrics {
    let common = reference.intersection(candidate).count();
    let total_reference = reference.len();

    CoverageMetrics {
        total_reference,
        total_candidate: candidate.len(),
        common,
        reference_only: reference.difference(candidate).count(),
        candidate_only: candidate.difference(reference).count(),
        coverage_percentage: if total_reference > 0 {
            common as f64 / total_reference as f64 * 100.0
        } else {
            0.0
        },
    }
}

fn first_by_id(records: &[SectionRef]) -> HashMap<&str, &SectionRef> {
    let mut map = HashMap::new();
    for record in records {
        map.entry(record.section_id.as_str()).or_insert(record);
    }
    map
}

fn natural_order<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut ids: Vec<&str> = ids.collect();
    ids.sort_by_cached_key(|id| SectionKey::parse(id));
    ids
}

/// Convenience wrapper over [`CoverageReconciler::compare`].
pub fn compare(reference: &[SectionRef], candidate: &[SectionRef]) -> Comparison {
    CoverageReconciler::new().compare(reference, candidate)
}

/// Pages in `[1, max_page]` not covered by the candidate, where `max_page`
/// is the highest page seen in either inventory, capped at `page_limit`.
/// Ascending.
pub fn missing_pages(
    reference: &[SectionRef],
    candidate: &[SectionRef],
    page_limit: u32,
) -> Vec<u32> {
    let max_page = reference
        .iter()
        .chain(candidate)
        .filter_map(|s| s.page)
        .max()
        .unwrap_or(0)
        .min(page_limit);
    let covered = covered_pages(candidate);

    (1..=max_page).filter(|p| !covered.contains(p)).collect()
}

/// Distinct pages referenced by an inventory.
pub fn covered_pages(records: &[SectionRef]) -> BTreeSet<u32> {
    records.iter().filter_map(|s| s.page).collect()
}

/// Share of `1..=total_pages` present in `covered`, as a percentage.
pub fn page_coverage(covered: &BTreeSet<u32>, total_pages: usize) -> f64 {
    if total_pages == 0 {
        return 0.0;
    }
    let hits = covered
        .iter()
        .filter(|p| **p >= 1 && **p as usize <= total_pages)
        .count();
    hits as f64 / total_pages as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(ids: &[&str]) -> Vec<SectionRef> {
        ids.iter()
            .map(|id| SectionRef {
                section_id: id.to_string(),
                title: format!("Title {id}"),
                page: Some(1),
                level: Some(crate::models::dotted_level(id)),
            })
            .collect()
    }

    fn paged(pages: &[u32]) -> Vec<SectionRef> {
        pages
            .iter()
            .map(|p| SectionRef {
                section_id: format!("s{p}"),
                title: String::new(),
                page: Some(*p),
                level: None,
            })
            .collect()
    }

    #[test]
    fn test_one_reference_only_id() {
        let reference = refs(&["1", "1.1", "2", "2.1"]);
        let candidate = refs(&["1", "1.1", "2"]);

        let m = CoverageReconciler::new().metrics(&reference, &candidate);
        assert_eq!(m.coverage_percentage, 75.0);
        assert_eq!(m.common, 3);
        assert_eq!(m.reference_only, 1);
        assert_eq!(m.candidate_only, 0);
    }

    #[test]
    fn test_empty_reference_is_zero() {
        let m = CoverageReconciler::new().metrics(&[], &refs(&["1"]));
        assert_eq!(m.coverage_percentage, 0.0);
        assert_eq!(m.candidate_only, 1);
    }

    #[test]
    fn test_self_coverage_and_asymmetry() {
        let a = refs(&["1", "2"]);
        let b = refs(&["1", "2", "3", "4"]);
        let r = CoverageReconciler::new();

        assert_eq!(r.metrics(&a, &a).coverage_percentage, 100.0);
        assert_eq!(r.metrics(&a, &b).coverage_percentage, 100.0);
        assert_eq!(r.metrics(&b, &a).coverage_percentage, 50.0);
    }

    #[test]
    fn test_duplicates_counted_once() {
        let reference = refs(&["1", "1", "2"]);
        let m = CoverageReconciler::new().metrics(&reference, &refs(&["1"]));
        assert_eq!(m.total_reference, 2);
        assert_eq!(m.coverage_percentage, 50.0);
    }

    #[test]
    fn test_compare_lists_in_natural_order() {
        let reference = refs(&["2.10", "1", "2.9", "3.1.1"]);
        let candidate = refs(&["1", "10", "4"]);
        let c = compare(&reference, &candidate);

        let ref_only: Vec<&str> = c.reference_only.iter().map(|s| s.section_id.as_str()).collect();
        let cand_only: Vec<&str> = c.candidate_only.iter().map(|s| s.section_id.as_str()).collect();
        assert_eq!(ref_only, vec!["2.9", "2.10", "3.1.1"]);
        assert_eq!(cand_only, vec!["4", "10"]);
        assert_eq!(c.common_ids, vec!["1"]);
        assert_eq!(c.reference_levels.level_1, 1);
        assert_eq!(c.reference_levels.level_2, 2);
        assert_eq!(c.reference_levels.level_3_plus, 1);
        assert!(c.has_gaps());
    }

    #[test]
    fn test_lenient_record_parsing() {
        let r: SectionRef = serde_json::from_str(r#"{"section_id":"4.1","extra":true}"#).unwrap();
        assert_eq!(r.section_id, "4.1");
        assert!(r.page.is_none());
        assert!(r.title.is_empty());
    }

    #[test]
    fn test_missing_pages_span_both_inventories() {
        let reference = paged(&[2, 9]);
        let candidate = paged(&[1, 2, 5]);
        assert_eq!(missing_pages(&reference, &candidate, 100), vec![3, 4, 6, 7, 8, 9]);
        assert!(missing_pages(&[], &[], 100).is_empty());
    }

    #[test]
    fn test_missing_pages_capped_at_limit() {
        let reference = paged(&[2, u32::MAX]);
        let candidate = paged(&[1]);
        assert_eq!(missing_pages(&reference, &candidate, 4), vec![2, 3, 4]);
        assert!(missing_pages(&reference, &candidate, 0).is_empty());
    }

    #[test]
    fn test_page_coverage() {
        let covered = covered_pages(&paged(&[1, 2, 2, 40]));
        assert_eq!(page_coverage(&covered, 4), 50.0);
        assert_eq!(page_coverage(&covered, 0), 0.0);
    }
}
