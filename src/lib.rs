// src/lib.rs

//! Sectionizer Library
//!
//! Reconstructs the section hierarchy of a long specification document from
//! its page text, reconciles the table of contents against the body, and
//! reports structural defects.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod utils;
