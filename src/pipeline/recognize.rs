// src/pipeline/recognize.rs

//! Line-level section recognition.
//!
//! Each recognizer is an ordered list of rules. The first rule whose pattern
//! matches a line decides the outcome: if the extracted id then fails the
//! strict dotted-numeric check the line yields nothing, and later rules are
//! not consulted.
//!
//! | Rule set | Rules, in priority order |
//! |----------|--------------------------|
//! | ToC      | dot leader, trailing page number, tab separated |
//! | Body     | numbered header (after the header-candidate test) |
//! | Relaxed  | numbered capitalized title, ALL-CAPS header, appendix |

use regex::{Captures, Regex};

use crate::error::Result;
use crate::models::{ExtractionConfig, Section, is_dotted_numeric};
use crate::pipeline::tags::TagClassifier;

/// A recognized header line, before tagging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Dotted numeric id, or `None` when the caller has to mint one
    pub section_id: Option<String>,
    pub title: String,
    pub page: u32,
}

impl Heading {
    /// Turn a numbered heading into a section. Unnumbered headings yield `None`.
    pub fn into_section(self, doc_title: &str, tagger: &TagClassifier) -> Option<Section> {
        let section_id = self.section_id?;
        let tags = tagger.classify(&self.title);
        Some(Section::new(section_id, self.title, self.page, doc_title, tags))
    }

    /// Build a section under an id chosen by the caller.
    pub fn with_id(self, section_id: String, doc_title: &str, tagger: &TagClassifier) -> Section {
        let tags = tagger.classify(&self.title);
        Section::new(section_id, self.title, self.page, doc_title, tags)
    }
}

/// What a rule's capture groups mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// id, title, page reference
    IdTitlePage,
    /// id, title; page is the scanned page
    IdTitle,
    /// whole line is the title, id to be minted
    Unnumbered,
    /// appendix letter, title; id to be minted
    Appendix,
}

#[derive(Debug, Clone)]
struct Rule {
    name: &'static str,
    pattern: Regex,
    shape: Shape,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, shape: Shape) -> Result<Self> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            shape,
        })
    }

    fn extract(&self, caps: &Captures<'_>, page: u32) -> Option<Heading> {
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();

        match self.shape {
            Shape::IdTitlePage | Shape::IdTitle => {
                let section_id = group(1);
                if !is_dotted_numeric(section_id) {
                    log::debug!("[{}] rejected id {:?}", self.name, section_id);
                    return None;
                }
                let page = match self.shape {
                    // ToC lines point at another page; trust the printed number
                    Shape::IdTitlePage => group(3)
                        .parse::<u32>()
                        .ok()
                        .filter(|p| *p > 0)
                        .unwrap_or(page),
                    _ => page,
                };
                Some(Heading {
                    section_id: Some(section_id.to_string()),
                    title: group(2).trim().to_string(),
                    page,
                })
            }
            Shape::Unnumbered => Some(Heading {
                section_id: None,
                title: group(1).trim().to_string(),
                page,
            }),
            Shape::Appendix => Some(Heading {
                section_id: None,
                title: format!("Appendix {}: {}", group(1), group(2).trim()),
                page,
            }),
        }
    }
}

/// First-match-wins evaluation over an ordered rule list.
fn first_match(rules: &[Rule], line: &str, page: u32) -> Option<Heading> {
    rules
        .iter()
        .find_map(|rule| rule.pattern.captures(line).map(|caps| (rule, caps)))
        .and_then(|(rule, caps)| rule.extract(&caps, page))
}

/// Compiled header patterns for all extraction passes.
#[derive(Debug, Clone)]
pub struct SectionRecognizer {
    toc_rules: Vec<Rule>,
    body_rules: Vec<Rule>,
    relaxed_rules: Vec<Rule>,
    numbered_prefix: Regex,
    numbered_header: Regex,
    header_max_words: usize,
    header_min_chars: usize,
}

impl SectionRecognizer {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let toc_rules = vec![
            Rule::new(
                "dot-leader",
                r"^(\d+(?:\.\d+)*)\s+([^.]+?)\s*\.{2,}\s*(\d+)$",
                Shape::IdTitlePage,
            )?,
            Rule::new(
                "trailing-page",
                r"^(\d+(?:\.\d+)*)\s+([^0-9]+?)\s+(\d+)$",
                Shape::IdTitlePage,
            )?,
            Rule::new(
                "tabbed",
                r"^(\d+(?:\.\d+)*)\s*\t+([^\t]+?)\t+(\d+)$",
                Shape::IdTitlePage,
            )?,
        ];

        let body_rules = vec![Rule::new(
            "body-header",
            r"^(\d+(?:\.\d+)*)\s+(.+)$",
            Shape::IdTitle,
        )?];

        let relaxed_rules = vec![
            Rule::new(
                "numbered-title",
                r#"^(\d+(?:\.\d+)*)\s+([A-Z][\w\s\-–,:;/&()'"]+)$"#,
                Shape::IdTitle,
            )?,
            Rule::new(
                "all-caps",
                r"^([A-Z]{2,}[\s\-]*[A-Z\s\-]+)$",
                Shape::Unnumbered,
            )?,
            Rule::new(
                "appendix",
                r"^Appendix\s+([A-Z])\s*[:\-]?\s*(.+)$",
                Shape::Appendix,
            )?,
        ];

        Ok(Self {
            toc_rules,
            body_rules,
            relaxed_rules,
            numbered_prefix: Regex::new(r"^\d+(?:\.\d+)*\s+")?,
            numbered_header: Regex::new(r"^\d+(?:\.\d+)*\s+[A-Z]")?,
            header_max_words: config.body_header_max_words,
            header_min_chars: config.body_header_min_chars,
        })
    }

    /// Recognize a table-of-contents entry. The page is the one the entry
    /// points at when the line carries a usable page number.
    pub fn recognize_toc_line(&self, line: &str, page: u32) -> Option<Heading> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        first_match(&self.toc_rules, line, page)
    }

    /// Recognize a header in running body text. Always uses the scanned page.
    pub fn recognize_body_line(&self, line: &str, page: u32) -> Option<Heading> {
        let line = line.trim();
        if !self.is_body_header(line) {
            return None;
        }
        first_match(&self.body_rules, line, page)
    }

    /// Relaxed recognition used when re-scanning uncovered pages.
    pub fn recognize_relaxed_line(&self, line: &str, page: u32) -> Option<Heading> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        first_match(&self.relaxed_rules, line, page)
    }

    /// Header-candidate test for body lines: a numbered line starting with a
    /// capital, or a short line written entirely in upper case.
    pub fn is_body_header(&self, line: &str) -> bool {
        let line = line.trim();
        if self.numbered_header.is_match(line) {
            return true;
        }

        is_upper_case(line)
            && line.split_whitespace().count() <= self.header_max_words
            && line.chars().count() > self.header_min_chars
    }

    /// True when the line starts with a dotted number followed by whitespace.
    pub fn is_numbered_line(&self, line: &str) -> bool {
        self.numbered_prefix.is_match(line.trim())
    }
}

/// At least one cased character and no lower-case ones.
fn is_upper_case(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}
