// src/pipeline/context.rs

//! Per-run pipeline state.
//!
//! Everything a stage needs is carried here and passed down explicitly:
//! the configuration, the compiled recognizer, the tag classifier and the
//! diagnostics collected while reading pages.

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::recognize::SectionRecognizer;
use crate::pipeline::tags::TagClassifier;
use crate::source::TextSource;

/// Which stage asked for page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Title,
    Toc,
    Body,
    Enhance,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pass::Title => "title",
            Pass::Toc => "toc",
            Pass::Body => "body",
            Pass::Enhance => "enhance",
        };
        f.write_str(name)
    }
}

/// A page the text source could not deliver.
#[derive(Debug, Clone, Serialize)]
pub struct PageFailure {
    pub pass: Pass,
    pub page: u32,
    pub message: String,
}

/// Failures recorded during a run. Never fatal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    failures: Vec<PageFailure>,
}

impl Diagnostics {
    pub fn record(&mut self, pass: Pass, page: u32, message: impl Into<String>) {
        self.failures.push(PageFailure {
            pass,
            page,
            message: message.into(),
        });
    }

    pub fn failures(&self) -> &[PageFailure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Failed pages for one pass, in the order they were recorded.
    pub fn pages(&self, pass: Pass) -> Vec<u32> {
        self.failures
            .iter()
            .filter(|f| f.pass == pass)
            .map(|f| f.page)
            .collect()
    }
}

/// State shared by all stages of one run.
#[derive(Debug)]
pub struct PipelineContext {
    pub config: Config,
    pub recognizer: SectionRecognizer,
    pub tagger: TagClassifier,
    pub diagnostics: Diagnostics,
}

impl PipelineContext {
    /// Validate the configuration and compile the recognizer.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let recognizer = SectionRecognizer::new(&config.extraction)?;
        let tagger = TagClassifier::new(&config.tags);

        Ok(Self {
            config,
            recognizer,
            tagger,
            diagnostics: Diagnostics::default(),
        })
    }

    /// Fetch page text, downgrading a failure to `None`.
    pub fn page_text(&mut self, source: &dyn TextSource, page: u32, pass: Pass) -> Option<String> {
        match source.page_text(page) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("[{}] page {} skipped: {}", pass, page, e);
                self.diagnostics.record(pass, page, e.to_string());
                None
            }
        }
    }
}
