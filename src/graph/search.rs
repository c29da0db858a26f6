// search.rs — Nearest-Evidence lookup through the store's vector index.
//
// The store does the distance computation; this layer validates the request and normalizes
// the ordering contract (best first, at most top_k).

use crate::error::IngestError;
use crate::graph::{GraphStore, SimilarEvidence};

/// Convert cosine distance to 0..1 score.
/// distance=0 → 1.0 (identical vectors), distance=1 → 0.0 (orthogonal).
pub fn cosine_distance_to_score(distance: f64) -> f64 {
    (1.0 - distance).max(0.0)
}

pub struct SimilaritySearch;

impl SimilaritySearch {
    /// Evidence chunks nearest to `application_number`'s own first chunk,
    /// descending by score. A patent without Evidence yields an empty list.
    pub fn find_similar_evidence(
        store: &mut dyn GraphStore,
        application_number: &str,
        top_k: i64,
    ) -> Result<Vec<SimilarEvidence>, IngestError> {
        if top_k <= 0 {
            return Err(IngestError::Config(format!("top_k must be positive, got {top_k}")));
        }
        let top_k = top_k as usize;

        let mut hits = store.nearest_evidence(application_number, top_k)?;
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);

        log::info!("Similarity search for {}: {} hits (top_k={})", application_number, hits.len(), top_k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::graph::{GraphOp, GraphStats};

    struct CannedStore(Vec<SimilarEvidence>);

    impl GraphStore for CannedStore {
        fn backend(&self) -> &'static str {
            "canned"
        }
        fn ensure_schema(&mut self, _dims: usize) -> Result<(), StoreError> {
            Ok(())
        }
        fn apply(&mut self, _ops: &[GraphOp]) -> Result<(), StoreError> {
            Ok(())
        }
        fn nearest_evidence(&mut self, _app: &str, _top_k: usize) -> Result<Vec<SimilarEvidence>, StoreError> {
            Ok(self.0.clone())
        }
        fn stats(&mut self) -> Result<GraphStats, StoreError> {
            Ok(GraphStats::default())
        }
        fn close(self: Box<Self>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn hit(id: &str, score: f64) -> SimilarEvidence {
        SimilarEvidence { chunk_id: id.into(), content: String::new(), score }
    }

    #[test]
    fn test_cosine_distance_to_score() {
        assert!((cosine_distance_to_score(0.0) - 1.0).abs() < 1e-10);
        assert!((cosine_distance_to_score(1.0) - 0.0).abs() < 1e-10);
        assert!((cosine_distance_to_score(0.5) - 0.5).abs() < 1e-10);
        // Opposite vectors clamp to zero.
        assert!((cosine_distance_to_score(1.5) - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_top_k_must_be_positive() {
        let mut store = CannedStore(vec![]);
        assert!(matches!(
            SimilaritySearch::find_similar_evidence(&mut store, "1", 0),
            Err(IngestError::Config(_))
        ));
        assert!(matches!(
            SimilaritySearch::find_similar_evidence(&mut store, "1", -3),
            Err(IngestError::Config(_))
        ));
    }

    #[test]
    fn test_results_sorted_and_truncated() {
        let mut store = CannedStore(vec![hit("b", 0.2), hit("a", 0.9), hit("c", 0.5), hit("d", 0.1)]);
        let hits = SimilaritySearch::find_similar_evidence(&mut store, "1", 3).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_no_evidence_is_empty() {
        let mut store = CannedStore(vec![]);
        assert!(SimilaritySearch::find_similar_evidence(&mut store, "1", 5).unwrap().is_empty());
    }
}
