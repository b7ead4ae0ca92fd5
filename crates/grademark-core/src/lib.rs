//! grademark-core: Data model, scoring and statistics.
//!
//! This crate defines the gradebook records, the text normalization and
//! scoring logic, and the aggregate statistics the rest of grademark builds on.

pub mod config;
pub mod error;
pub mod gradebook;
pub mod lemma;
pub mod model;
pub mod parser;
pub mod scoring;
pub mod similarity;
pub mod statistics;
pub mod text;
pub mod traits;
