// src/pipeline/hierarchy.rs

//! Extraction passes that turn page text into section inventories.
//!
//! - Title detection over the first few pages
//! - ToC pass over a leading window of pages that look like a contents listing
//! - Full-body pass over every page
//!
//! Pages are visited in ascending order. A page the source cannot deliver
//! contributes nothing and is recorded in the context's diagnostics.

use std::collections::HashSet;

use crate::models::Section;
use crate::pipeline::context::{Pass, PipelineContext};
use crate::pipeline::recognize::Heading;
use crate::source::TextSource;

/// Accumulates sections in discovery order, keeping the first of each id.
#[derive(Debug, Default)]
pub struct InventoryBuilder {
    sections: Vec<Section>,
    seen: HashSet<String>,
    skipped: usize,
}

impl InventoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section unless its id was already seen. Returns whether it was added.
    pub fn push(&mut self, section: Section) -> bool {
        if !self.seen.insert(section.section_id.clone()) {
            log::debug!(
                "Duplicate section {} on page {} skipped",
                section.section_id,
                section.page
            );
            self.skipped += 1;
            return false;
        }
        self.sections.push(section);
        true
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn finish(self) -> Vec<Section> {
        self.sections
    }
}

/// Find the document title in the leading pages, or fall back to the default.
pub fn detect_doc_title(ctx: &mut PipelineContext, source: &dyn TextSource) -> String {
    let scan = ctx
        .config
        .extraction
        .title_scan_pages
        .min(source.page_count());
    let groups: Vec<Vec<String>> = ctx
        .config
        .extraction
        .title_keyword_groups
        .iter()
        .map(|g| g.iter().map(|k| k.to_lowercase()).collect())
        .collect();

    for page in 1..=scan as u32 {
        let Some(text) = ctx.page_text(source, page, Pass::Title) else {
            continue;
        };
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let lower = line.to_lowercase();
            let is_title = groups
                .iter()
                .all(|group| group.iter().any(|k| lower.contains(k.as_str())));
            if is_title {
                log::debug!("Document title found on page {}", page);
                return line.to_string();
            }
        }
    }

    log::debug!("No title line found, using default");
    ctx.config.extraction.default_doc_title.clone()
}

/// Whether a page looks like part of the table of contents: a "contents"
/// marker near the top, or enough numbered lines.
pub fn is_toc_page(ctx: &PipelineContext, text: &str) -> bool {
    let ex = &ctx.config.extraction;
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let marked = lines
        .iter()
        .take(ex.toc_marker_lines)
        .any(|l| l.to_lowercase().contains("contents"));
    if marked {
        return true;
    }

    let numbered = lines
        .iter()
        .filter(|l| ctx.recognizer.is_numbered_line(l))
        .count();
    numbered >= ex.toc_min_numbered_lines
}

/// ToC pass over the leading page window.
pub fn extract_toc(
    ctx: &mut PipelineContext,
    source: &dyn TextSource,
    doc_title: &str,
) -> Vec<Section> {
    let window = ctx
        .config
        .extraction
        .toc_page_window
        .min(source.page_count());
    let mut inventory = InventoryBuilder::new();
    let mut toc_pages = 0usize;

    for page in 1..=window as u32 {
        let Some(text) = ctx.page_text(source, page, Pass::Toc) else {
            continue;
        };
        if !is_toc_page(ctx, &text) {
            continue;
        }
        toc_pages += 1;

        let headings: Vec<Heading> = text
            .lines()
            .filter_map(|line| ctx.recognizer.recognize_toc_line(line, page))
            .collect();
        for heading in headings {
            if let Some(section) = heading.into_section(doc_title, &ctx.tagger) {
                inventory.push(section);
            }
        }
    }

    log::info!(
        "ToC pass: {} sections from {} of {} leading pages",
        inventory.len(),
        toc_pages,
        window
    );
    if inventory.skipped() > 0 {
        log::warn!("ToC pass: {} duplicate ids skipped", inventory.skipped());
    }

    inventory.finish()
}

/// Full-body pass over every page.
pub fn extract_body(
    ctx: &mut PipelineContext,
    source: &dyn TextSource,
    doc_title: &str,
) -> Vec<Section> {
    let pages = source.page_count();
    let mut inventory = InventoryBuilder::new();

    for page in 1..=pages as u32 {
        let Some(text) = ctx.page_text(source, page, Pass::Body) else {
            continue;
        };

        let headings: Vec<Heading> = text
            .lines()
            .filter_map(|line| ctx.recognizer.recognize_body_line(line, page))
            .collect();
        for heading in headings {
            if let Some(section) = heading.into_section(doc_title, &ctx.tagger) {
                inventory.push(section);
            }
        }
    }

    log::info!("Body pass: {} sections from {} pages", inventory.len(), pages);
    if inventory.skipped() > 0 {
        log::warn!("Body pass: {} duplicate ids skipped", inventory.skipped());
    }

    inventory.finish()
}
