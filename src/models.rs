use serde::Serialize;

use crate::mindmap::MindMap;

/// Everything pulled out of one PDF in a single parse.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Extraction {
    pub paragraphs: Vec<String>,
    pub headings: Vec<String>,
    pub mind_map: MindMap,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RankedParagraph {
    pub index: usize,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankOutcome {
    Match(RankedParagraph),
    NoMatch,
}

pub const NO_MATCH_MESSAGE: &str = "No relevant paragraph found.";

impl RankOutcome {
    pub fn best(&self) -> Option<&RankedParagraph> {
        match self {
            RankOutcome::Match(hit) => Some(hit),
            RankOutcome::NoMatch => None,
        }
    }

    /// Text shown in the dialog and spoken back.
    pub fn answer_text(&self) -> &str {
        match self {
            RankOutcome::Match(hit) => &hit.text,
            RankOutcome::NoMatch => NO_MATCH_MESSAGE,
        }
    }
}
