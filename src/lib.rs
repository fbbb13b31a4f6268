//! Ask questions about a PDF by text or voice.
//!
//! The document is split into paragraphs and headings, questions are matched
//! to the closest paragraph with sentence embeddings, and answers are shown
//! and spoken back.

pub mod config;
pub mod console;
pub mod controller;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod json;
pub mod mindmap;
pub mod models;
pub mod ranker;
pub mod session;
pub mod viewer;
pub mod voice;

pub use error::{AssistantError, Result};
pub use extract::{extract, extract_headings, extract_text};
pub use mindmap::{generate_mindmap, MindMap};
pub use models::{Extraction, RankOutcome, RankedParagraph};
pub use ranker::SimilarityRanker;
