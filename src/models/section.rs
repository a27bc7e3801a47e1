//! Section records and the natural ordering of dotted ids.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A section recognized from exactly one line of page text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    /// Dotted numeric id, e.g. "2.1.2"
    pub section_id: String,

    /// Section title as printed
    pub title: String,

    /// 1-based page number
    pub page: u32,

    /// Hierarchy depth, dots in the id plus one
    pub level: u32,

    /// Id of the enclosing section, absent for top-level sections
    #[serde(default)]
    pub parent_id: Option<String>,

    /// "{section_id} {title}"
    pub full_path: String,

    /// Document title, constant per document
    pub doc_title: String,

    /// Topical keywords derived from the title
    pub tags: Vec<String>,
}

impl Section {
    /// Build a section, deriving level, parent and full path from the id.
    pub fn new(
        section_id: impl Into<String>,
        title: impl Into<String>,
        page: u32,
        doc_title: impl Into<String>,
        mut tags: Vec<String>,
    ) -> Self {
        let section_id = section_id.into();
        let title = title.into();
        tags.sort();
        tags.dedup();

        Self {
            level: dotted_level(&section_id),
            parent_id: parent_of(&section_id),
            full_path: format!("{} {}", section_id, title),
            doc_title: doc_title.into(),
            section_id,
            title,
            page,
            tags,
        }
    }
}

/// A section synthesized to fill a coverage gap, carrying raw page text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnhancedSection {
    pub section_id: String,
    pub title: String,
    pub page: u32,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub content: String,
    pub enhanced: bool,
}

/// One persisted inventory line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum InventoryRecord {
    Enhanced(EnhancedSection),
    Standard(Section),
}

impl InventoryRecord {
    pub fn section_id(&self) -> &str {
        match self {
            Self::Enhanced(s) => &s.section_id,
            Self::Standard(s) => &s.section_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Enhanced(s) => &s.title,
            Self::Standard(s) => &s.title,
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            Self::Enhanced(s) => s.page,
            Self::Standard(s) => s.page,
        }
    }

    pub fn level(&self) -> u32 {
        match self {
            Self::Enhanced(s) => s.level,
            Self::Standard(s) => s.level,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Enhanced(s) => s.parent_id.as_deref(),
            Self::Standard(s) => s.parent_id.as_deref(),
        }
    }

    pub fn is_enhanced(&self) -> bool {
        matches!(self, Self::Enhanced(_))
    }
}

impl From<Section> for InventoryRecord {
    fn from(section: Section) -> Self {
        Self::Standard(section)
    }
}

impl From<EnhancedSection> for InventoryRecord {
    fn from(section: EnhancedSection) -> Self {
        Self::Enhanced(section)
    }
}

/// Level implied by a dotted id: number of dots plus one.
pub fn dotted_level(section_id: &str) -> u32 {
    section_id.matches('.').count() as u32 + 1
}

/// Id with its last dot-component removed, `None` for top-level ids.
pub fn parent_of(section_id: &str) -> Option<String> {
    section_id
        .rsplit_once('.')
        .map(|(parent, _)| parent.to_string())
}

/// True when the id fully matches `N(.N)*`.
pub fn is_dotted_numeric(section_id: &str) -> bool {
    !section_id.is_empty()
        && section_id
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// One component of a [`SectionKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Num(u64),
    Text(String),
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Num(a), KeyPart::Num(b)) => a.cmp(b),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            (KeyPart::Num(_), KeyPart::Text(_)) => Ordering::Less,
            (KeyPart::Text(_), KeyPart::Num(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Natural ordering key for dotted ids ("2.10" sorts after "2.9").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SectionKey(Vec<KeyPart>);

impl SectionKey {
    pub fn parse(section_id: &str) -> Self {
        Self(
            section_id
                .split('.')
                .map(|part| match part.parse::<u64>() {
                    Ok(n) if part.bytes().all(|b| b.is_ascii_digit()) => KeyPart::Num(n),
                    _ => KeyPart::Text(part.to_string()),
                })
                .collect(),
        )
    }
}

/// Stable sort of an inventory by natural id order.
pub fn sort_inventory(records: &mut [InventoryRecord]) {
    records.sort_by_cached_key(|r| SectionKey::parse(r.section_id()));
}
