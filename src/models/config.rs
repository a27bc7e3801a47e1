//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Page windows and header heuristics for the extraction passes
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Coverage gap-filling settings
    #[serde(default)]
    pub enhance: EnhanceConfig,

    /// Output file layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Title keyword to tag mappings, scanned in order
    #[serde(default = "defaults::tag_table")]
    pub tags: Vec<TagMapping>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Serialize the effective configuration back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let ex = &self.extraction;
        if ex.toc_page_window == 0 {
            return Err(AppError::validation("extraction.toc_page_window must be > 0"));
        }
        if ex.title_scan_pages == 0 {
            return Err(AppError::validation("extraction.title_scan_pages must be > 0"));
        }
        if ex.body_header_max_words == 0 {
            return Err(AppError::validation(
                "extraction.body_header_max_words must be > 0",
            ));
        }
        if ex.default_doc_title.trim().is_empty() {
            return Err(AppError::validation("extraction.default_doc_title is empty"));
        }
        if ex
            .title_keyword_groups
            .iter()
            .any(|group| group.is_empty() || group.iter().any(|k| k.trim().is_empty()))
        {
            return Err(AppError::validation(
                "extraction.title_keyword_groups contains an empty group or keyword",
            ));
        }
        if self.tags.iter().any(|m| m.keyword.trim().is_empty()) {
            return Err(AppError::validation("tags contains an empty keyword"));
        }
        for (name, value) in [
            ("paths.toc_file", &self.paths.toc_file),
            ("paths.spec_file", &self.paths.spec_file),
            ("paths.metadata_file", &self.paths.metadata_file),
            ("paths.report_file", &self.paths.report_file),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            enhance: EnhanceConfig::default(),
            paths: PathsConfig::default(),
            tags: defaults::tag_table(),
        }
    }
}

/// Extraction pass settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Leading pages searched for the table of contents
    #[serde(default = "defaults::toc_page_window")]
    pub toc_page_window: usize,

    /// Lines at the top of a page checked for a "contents" marker
    #[serde(default = "defaults::toc_marker_lines")]
    pub toc_marker_lines: usize,

    /// Numbered lines that make an unmarked page count as a ToC page
    #[serde(default = "defaults::toc_min_numbered_lines")]
    pub toc_min_numbered_lines: usize,

    /// Leading pages searched for the document title
    #[serde(default = "defaults::title_scan_pages")]
    pub title_scan_pages: usize,

    /// Title used when no title line is found
    #[serde(default = "defaults::default_doc_title")]
    pub default_doc_title: String,

    /// Every group needs one case-folded member in a line for it to be the title
    #[serde(default = "defaults::title_keyword_groups")]
    pub title_keyword_groups: Vec<Vec<String>>,

    /// Upper bound on words in an unnumbered ALL-CAPS body header
    #[serde(default = "defaults::body_header_max_words")]
    pub body_header_max_words: usize,

    /// ALL-CAPS body headers must be longer than this many characters
    #[serde(default = "defaults::body_header_min_chars")]
    pub body_header_min_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            toc_page_window: defaults::toc_page_window(),
            toc_marker_lines: defaults::toc_marker_lines(),
            toc_min_numbered_lines: defaults::toc_min_numbered_lines(),
            title_scan_pages: defaults::title_scan_pages(),
            default_doc_title: defaults::default_doc_title(),
            title_keyword_groups: defaults::title_keyword_groups(),
            body_header_max_words: defaults::body_header_max_words(),
            body_header_min_chars: defaults::body_header_min_chars(),
        }
    }
}

/// How coverage gaps are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnhanceMode {
    /// Synthesize content-carrying sections for uncovered pages
    #[default]
    Content,
    /// Re-scan uncovered pages with the relaxed header recognizer
    Headers,
}

/// Gap-filling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceConfig {
    /// Trimmed page text must exceed this many characters to be kept
    #[serde(default = "defaults::min_content_chars")]
    pub min_content_chars: usize,

    #[serde(default)]
    pub mode: EnhanceMode,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            min_content_chars: defaults::min_content_chars(),
            mode: EnhanceMode::default(),
        }
    }
}

/// Output file names and directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Shared default location for artifacts
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,

    /// Directory under `output_dir` holding one folder per job
    #[serde(default = "defaults::jobs_dir")]
    pub jobs_dir: String,

    #[serde(default = "defaults::toc_file")]
    pub toc_file: String,

    #[serde(default = "defaults::spec_file")]
    pub spec_file: String,

    #[serde(default = "defaults::metadata_file")]
    pub metadata_file: String,

    #[serde(default = "defaults::report_file")]
    pub report_file: String,
}

impl PathsConfig {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            jobs_dir: defaults::jobs_dir(),
            toc_file: defaults::toc_file(),
            spec_file: defaults::spec_file(),
            metadata_file: defaults::metadata_file(),
            report_file: defaults::report_file(),
        }
    }
}

/// Mapping from a title keyword to one or more tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagMapping {
    /// Substring searched for in the case-folded title
    pub keyword: String,

    /// Tags added when the keyword matches
    pub tags: Vec<String>,
}

mod defaults {
    use super::TagMapping;

    // Extraction defaults
    pub fn toc_page_window() -> usize {
        20
    }
    pub fn toc_marker_lines() -> usize {
        5
    }
    pub fn toc_min_numbered_lines() -> usize {
        3
    }
    pub fn title_scan_pages() -> usize {
        3
    }
    pub fn default_doc_title() -> String {
        "USB Power Delivery Specification".into()
    }
    pub fn title_keyword_groups() -> Vec<Vec<String>> {
        vec![
            vec!["usb".into()],
            vec!["power delivery".into(), "pd".into()],
            vec!["specification".into(), "spec".into()],
        ]
    }
    pub fn body_header_max_words() -> usize {
        8
    }
    pub fn body_header_min_chars() -> usize {
        5
    }

    // Enhance defaults
    pub fn min_content_chars() -> usize {
        50
    }

    // Path defaults
    pub fn output_dir() -> String {
        "output".into()
    }
    pub fn jobs_dir() -> String {
        "jobs".into()
    }
    pub fn toc_file() -> String {
        "usb_pd_toc.jsonl".into()
    }
    pub fn spec_file() -> String {
        "usb_pd_spec.jsonl".into()
    }
    pub fn metadata_file() -> String {
        "usb_pd_metadata.jsonl".into()
    }
    pub fn report_file() -> String {
        "usb_pd_validation_report.json".into()
    }

    // Tag defaults
    const TAG_TABLE: &[(&str, &[&str])] = &[
        ("power", &["power"]),
        ("contract", &["contracts"]),
        ("negotiation", &["negotiation"]),
        ("communication", &["communication"]),
        ("cable", &["cable"]),
        ("device", &["devices"]),
        ("protocol", &["protocol"]),
        ("state", &["state-machine"]),
        ("message", &["messaging"]),
        ("data", &["data"]),
        ("control", &["control"]),
        ("source", &["source"]),
        ("sink", &["sink"]),
        ("vbus", &["vbus"]),
        ("cc", &["cc-line"]),
        ("sop", &["sop"]),
        ("collision", &["collision", "avoidance"]),
        ("revision", &["revision"]),
        ("compatibility", &["compatibility"]),
        ("introduction", &["intro"]),
        ("overview", &["overview"]),
        ("appendix", &["appendix"]),
        ("requirements", &["requirements"]),
        ("table", &["table"]),
        ("figure", &["figure"]),
        ("diagram", &["diagram"]),
    ];

    pub fn tag_table() -> Vec<TagMapping> {
        TAG_TABLE
            .iter()
            .map(|(keyword, tags)| TagMapping {
                keyword: keyword.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            })
            .collect()
    }
}
