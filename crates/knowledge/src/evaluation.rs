//! Keyword-based retrieval evaluation.

use crate::types::SearchHit;
use serde::{Deserialize, Serialize};

/// Result of evaluating one query against an expected keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalEvaluation {
    pub query: String,
    pub ground_truth: String,

    /// Fraction of retrieved chunks that contain the keyword
    #[serde(rename = "recall@k")]
    pub recall_at_k: f64,

    pub docs_retrieved: usize,
}

/// Score `hits` by how many contain `ground_truth` (case-insensitive).
///
/// No hits scores 0.
pub fn evaluate_retrieval(query: &str, hits: &[SearchHit], ground_truth: &str) -> RetrievalEvaluation {
    let needle = ground_truth.to_lowercase();
    let matching = hits
        .iter()
        .filter(|hit| hit.text.to_lowercase().contains(&needle))
        .count();

    let recall_at_k = if hits.is_empty() {
        0.0
    } else {
        matching as f64 / hits.len() as f64
    };

    RetrievalEvaluation {
        query: query.to_string(),
        ground_truth: ground_truth.to_string(),
        recall_at_k,
        docs_retrieved: hits.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;

    fn hits(texts: &[&str]) -> Vec<SearchHit> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| SearchHit {
                rank: i + 1,
                score: 0.5,
                text: text.to_string(),
                metadata: ChunkMetadata::new("a.txt"),
            })
            .collect()
    }

    #[test]
    fn test_partial_recall() {
        let result = evaluate_retrieval(
            "sky color",
            &hits(&["The sky is BLUE", "grass is green", "blue whales", "sand"]),
            "blue",
        );

        assert_eq!(result.docs_retrieved, 4);
        assert!((result.recall_at_k - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_hits_scores_zero() {
        let result = evaluate_retrieval("anything", &[], "blue");
        assert_eq!(result.recall_at_k, 0.0);
        assert_eq!(result.docs_retrieved, 0);
    }

    #[test]
    fn test_json_uses_recall_at_k_key() {
        let result = evaluate_retrieval("q", &hits(&["blue"]), "blue");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["recall@k"], 1.0);
    }
}
