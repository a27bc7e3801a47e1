// src/pipeline/enhance.rs

//! Coverage gap filling.
//!
//! Two strategies for pages the full-body inventory does not cover:
//!
//! - **content**: synthesize one enhanced record per uncovered page that has
//!   enough text, borrowing identity from the ToC entry on that page when
//!   there is one. Records are only ever appended.
//! - **headers**: re-scan uncovered pages with the relaxed recognizer and
//!   merge newly found sections, minting top-level ids for unnumbered
//!   headers. The inventory is re-sorted and rewritten.
//!
//! Pages are processed in ascending order; a page that is already covered is
//! never touched, so running either strategy twice adds nothing the second
//! time.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::models::{
    EnhanceMode, EnhancedSection, InventoryRecord, Section, is_dotted_numeric, sort_inventory,
};
use crate::pipeline::context::{Pass, PipelineContext};
use crate::pipeline::coverage::{SectionRef, covered_pages, missing_pages, page_coverage};
use crate::source::TextSource;
use crate::storage::LocalStorage;
use crate::utils::log;

/// What a gap-filling run did.
#[derive(Debug, Clone, Serialize)]
pub struct EnhanceOutcome {
    pub mode: EnhanceMode,
    pub total_pages: usize,
    pub initial_page_coverage: f64,
    pub final_page_coverage: f64,
    /// Uncovered pages considered, ascending
    pub missing_pages: Vec<u32>,
    /// New records, in page order
    pub added: Vec<InventoryRecord>,
}

fn refs(records: &[InventoryRecord]) -> Vec<SectionRef> {
    records.iter().map(SectionRef::from).collect()
}

/// Grapheme count of the trimmed text.
fn meaningful_len(text: &str) -> usize {
    text.trim().graphemes(true).count()
}

fn outcome(
    mode: EnhanceMode,
    total_pages: usize,
    candidate: &[InventoryRecord],
    missing_pages: Vec<u32>,
    added: Vec<InventoryRecord>,
) -> EnhanceOutcome {
    let mut covered = covered_pages(&refs(candidate));
    let initial_page_coverage = page_coverage(&covered, total_pages);
    covered.extend(added.iter().map(InventoryRecord::page));

    EnhanceOutcome {
        mode,
        total_pages,
        initial_page_coverage,
        final_page_coverage: page_coverage(&covered, total_pages),
        missing_pages,
        added,
    }
}

/// Content strategy: one enhanced record per uncovered page with text.
///
/// Missing pages span `[1, max_page]` over both inventories, stopping at the
/// last page of the source.
pub fn fill_content_gaps(
    ctx: &mut PipelineContext,
    source: &dyn TextSource,
    reference: &[InventoryRecord],
    candidate: &[InventoryRecord],
) -> EnhanceOutcome {
    let page_count = source.page_count();
    let page_limit = u32::try_from(page_count).unwrap_or(u32::MAX);
    let missing = missing_pages(&refs(reference), &refs(candidate), page_limit);
    let min_chars = ctx.config.enhance.min_content_chars;
    let mut added = Vec::new();

    log::sub_item(&format!("{} uncovered pages to inspect", missing.len()));

    for &page in &missing {
        let Some(text) = ctx.page_text(source, page, Pass::Enhance) else {
            continue;
        };
        if meaningful_len(&text) <= min_chars {
            ::log::debug!("Page {} has too little text", page);
            continue;
        }

        // Shallowest ToC entry on the page, first one on ties
        let anchor = reference
            .iter()
            .filter(|r| r.page() == page)
            .min_by_key(|r| r.level());

        let section = match anchor {
            Some(r) => EnhancedSection {
                section_id: r.section_id().to_string(),
                title: r.title().to_string(),
                page,
                level: r.level(),
                parent_id: r.parent_id().map(str::to_string),
                content: text,
                enhanced: true,
            },
            None => EnhancedSection {
                section_id: format!("enhanced_{page}"),
                title: format!("Page {page} Content"),
                page,
                level: 1,
                parent_id: None,
                content: text,
                enhanced: true,
            },
        };
        added.push(InventoryRecord::from(section));
    }

    outcome(EnhanceMode::Content, page_count, candidate, missing, added)
}

/// Next synthetic top-level id: one past the largest all-digit level-1 id.
fn next_top_level_id<'a>(records: impl Iterator<Item = &'a InventoryRecord>) -> u64 {
    records
        .filter(|r| r.level() == 1)
        .filter(|r| is_dotted_numeric(r.section_id()) && !r.section_id().contains('.'))
        .filter_map(|r| r.section_id().parse::<u64>().ok())
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Header strategy: relaxed re-scan of pages the candidate does not cover.
///
/// Missing pages are `[1, page_count]` minus the candidate's pages. Ids
/// minted for unnumbered headers account for sections minted earlier in the
/// same run.
pub fn fill_header_gaps(
    ctx: &mut PipelineContext,
    source: &dyn TextSource,
    candidate: &[InventoryRecord],
    doc_title: &str,
) -> EnhanceOutcome {
    let page_count = source.page_count();
    let covered = covered_pages(&refs(candidate));
    let missing: Vec<u32> = (1..=page_count as u32)
        .filter(|p| !covered.contains(p))
        .collect();

    let mut existing: HashSet<String> = candidate
        .iter()
        .map(|r| r.section_id().to_string())
        .collect();
    let mut added: Vec<InventoryRecord> = Vec::new();

    log::sub_item(&format!("{} uncovered pages to re-scan", missing.len()));

    for &page in &missing {
        let Some(text) = ctx.page_text(source, page, Pass::Enhance) else {
            continue;
        };

        for line in text.lines() {
            let Some(heading) = ctx.recognizer.recognize_relaxed_line(line, page) else {
                continue;
            };

            let section: Section = match heading.section_id.clone() {
                Some(id) if existing.contains(&id) => continue,
                Some(_) => match heading.into_section(doc_title, &ctx.tagger) {
                    Some(section) => section,
                    None => continue,
                },
                None => {
                    let id = next_top_level_id(candidate.iter().chain(added.iter())).to_string();
                    if existing.contains(&id) {
                        continue;
                    }
                    heading.with_id(id, doc_title, &ctx.tagger)
                }
            };

            existing.insert(section.section_id.clone());
            added.push(section.into());
        }
    }

    outcome(EnhanceMode::Headers, page_count, candidate, missing, added)
}

/// Document title to stamp on sections found by the header strategy.
fn inventory_doc_title(ctx: &PipelineContext, records: &[InventoryRecord]) -> String {
    records
        .iter()
        .find_map(|r| match r {
            InventoryRecord::Standard(s) => Some(s.doc_title.clone()),
            InventoryRecord::Enhanced(_) => None,
        })
        .unwrap_or_else(|| ctx.config.extraction.default_doc_title.clone())
}

fn load_required(storage: &LocalStorage, key: &str) -> Result<Vec<InventoryRecord>> {
    storage.read_jsonl(key)?.ok_or_else(|| {
        AppError::storage(format!("{} not found", storage.path(key).display()))
    })
}

/// Gap-fill the inventories held in `storage`.
///
/// Content mode appends to the full-body file; header mode rewrites it in
/// natural id order.
pub fn run_enhance(
    ctx: &mut PipelineContext,
    source: &dyn TextSource,
    storage: &LocalStorage,
) -> Result<EnhanceOutcome> {
    let mode = ctx.config.enhance.mode;
    let paths = ctx.config.paths.clone();

    log::header(&format!("Enhancing coverage ({:?} mode)", mode));

    let candidate = load_required(storage, &paths.spec_file)?;

    let result = match mode {
        EnhanceMode::Content => {
            let reference = load_required(storage, &paths.toc_file)?;
            let result = fill_content_gaps(ctx, source, &reference, &candidate);
            if !result.added.is_empty() {
                storage.append_jsonl(&paths.spec_file, &result.added)?;
            }
            result
        }
        EnhanceMode::Headers => {
            let doc_title = inventory_doc_title(ctx, &candidate);
            let result = fill_header_gaps(ctx, source, &candidate, &doc_title);
            if !result.added.is_empty() {
                let mut merged = candidate;
                merged.extend(result.added.iter().cloned());
                sort_inventory(&mut merged);
                storage.write_jsonl(&paths.spec_file, &merged)?;
            }
            result
        }
    };

    log_outcome(&result);
    Ok(result)
}

pub fn log_outcome(result: &EnhanceOutcome) {
    let pages: BTreeSet<u32> = result.added.iter().map(InventoryRecord::page).collect();
    log::summary(
        "Enhancement",
        &[
            ("Total pages", result.total_pages.to_string()),
            ("Missing pages", result.missing_pages.len().to_string()),
            ("Sections added", result.added.len().to_string()),
            ("Pages gained", pages.len().to_string()),
            ("Initial coverage", log::percent(result.initial_page_coverage)),
            ("Final coverage", log::percent(result.final_page_coverage)),
        ],
    );
}
