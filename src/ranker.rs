use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::config::RankSettings;
use crate::embedding::{cosine_similarity, Embedder};
use crate::error::Result;
use crate::models::{RankOutcome, RankedParagraph};

/// Picks the paragraph closest to a query in embedding space.
pub struct SimilarityRanker {
    embedder: Arc<dyn Embedder>,
    min_paragraph_chars: usize,
}

impl SimilarityRanker {
    pub fn new(embedder: Arc<dyn Embedder>, settings: &RankSettings) -> Self {
        Self {
            embedder,
            min_paragraph_chars: settings.min_paragraph_chars,
        }
    }

    /// Score every candidate paragraph, best first.
    ///
    /// Candidates are paragraphs longer than the minimum length; indices
    /// refer to positions in `paragraphs`. Ordering is by `(score, index)`
    /// descending.
    pub fn score_all(&self, query: &str, paragraphs: &[String]) -> Result<Vec<RankedParagraph>> {
        let candidates: Vec<(usize, &String)> = paragraphs
            .iter()
            .enumerate()
            .filter(|(_, p)| p.chars().count() > self.min_paragraph_chars)
            .collect();
        if candidates.is_empty() || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query)?;
        let texts: Vec<String> = candidates.iter().map(|(_, p)| p.to_string()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        let mut results: Vec<RankedParagraph> = candidates
            .into_iter()
            .zip(embeddings.iter())
            .map(|((index, text), embedding)| RankedParagraph {
                index,
                text: text.trim().to_string(),
                score: cosine_similarity(&query_embedding, embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(b.index.cmp(&a.index))
        });

        debug!(
            "Ranked {} paragraphs for {:?} with {}",
            results.len(),
            query,
            self.embedder.model_name()
        );
        Ok(results)
    }

    pub fn rank(&self, query: &str, paragraphs: &[String]) -> Result<RankOutcome> {
        Ok(self
            .score_all(query, paragraphs)?
            .into_iter()
            .next()
            .map_or(RankOutcome::NoMatch, RankOutcome::Match))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{FastEmbedder, HashingEmbedder};
    use crate::config::EmbeddingSettings;

    fn hashing_ranker() -> SimilarityRanker {
        SimilarityRanker::new(Arc::new(HashingEmbedder::new(384)), &RankSettings::default())
    }

    fn paragraphs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_identical_text_scores_one() {
        let ranker = hashing_ranker();
        let paras = paragraphs(&[
            "Rust guarantees memory safety without a garbage collector.",
            "The weather is nice today and birds are singing in the trees.",
        ]);
        let outcome = ranker.rank(&paras[1], &paras).unwrap();
        let best = outcome.best().expect("match");
        assert_eq!(best.index, 1);
        assert!((best.score - 1.0).abs() < 1e-5, "score={}", best.score);
    }

    #[test]
    fn test_short_paragraphs_are_not_candidates() {
        let ranker = hashing_ranker();
        let paras = paragraphs(&["too short", "exactly twenty chars", "a paragraph that is long enough to rank"]);
        let scored = ranker.score_all("paragraph", &paras).unwrap();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].index, 2);
    }

    #[test]
    fn test_no_candidates_is_no_match() {
        let ranker = hashing_ranker();
        assert_eq!(ranker.rank("anything", &[]).unwrap(), RankOutcome::NoMatch);
        let short = paragraphs(&["tiny", "also tiny"]);
        let outcome = ranker.rank("tiny", &short).unwrap();
        assert_eq!(outcome, RankOutcome::NoMatch);
        assert_eq!(outcome.answer_text(), "No relevant paragraph found.");
    }

    #[test]
    fn test_blank_query_is_no_match() {
        let ranker = hashing_ranker();
        let paras = paragraphs(&["a paragraph that is long enough to rank"]);
        assert_eq!(ranker.rank("   ", &paras).unwrap(), RankOutcome::NoMatch);
    }

    #[test]
    fn test_equal_scores_prefer_higher_index() {
        let ranker = hashing_ranker();
        let text = "duplicated paragraph text for tie breaking";
        let paras = paragraphs(&[text, text]);
        let best = ranker.rank(text, &paras).unwrap();
        assert_eq!(best.best().map(|b| b.index), Some(1));
    }

    #[test]
    #[ignore = "downloads the all-MiniLM-L6-v2 model"]
    fn test_semantic_match_prefers_cat_paragraph() {
        let embedder = FastEmbedder::new(&EmbeddingSettings::default()).unwrap();
        let ranker = SimilarityRanker::new(Arc::new(embedder), &RankSettings::default());
        let paras = paragraphs(&[
            "The cat sat on the mat and stayed there all afternoon quietly.",
            "Quantum entanglement describes correlated particle states across distance.",
        ]);
        let outcome = ranker.rank("feline resting on a rug", &paras).unwrap();
        assert_eq!(outcome.best().map(|b| b.index), Some(0));
    }
}
