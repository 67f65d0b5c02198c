//! Relevance filtering over the search collaborator.

use std::sync::Arc;

use tracing::{debug, warn};

use parley_core::config::RetrievalConfig;
use parley_core::types::OfferRecord;

use crate::backend::SearchBackend;
use crate::offer::faq_query;

/// Thin policy wrapper around a `SearchBackend`.
///
/// Applies the distance threshold, the single-best fallback, and the top-k
/// truncation. Collaborator failures are demoted to empty results: a search
/// outage and a genuine no-match both drive the same human-handoff path
/// downstream.
pub struct RetrievalAdapter {
    backend: Arc<dyn SearchBackend>,
    config: RetrievalConfig,
}

impl RetrievalAdapter {
    pub fn new(backend: Arc<dyn SearchBackend>, config: RetrievalConfig) -> Self {
        Self { backend, config }
    }

    /// Retrieve up to `top_k` snippets grounding an answer to `message`.
    ///
    /// The query is the free-text message plus a status-tuned FAQ hint when
    /// an offer is in context.
    pub async fn search(&self, message: &str, offer: Option<&OfferRecord>) -> Vec<String> {
        let query = match offer {
            Some(offer) => format!("{} {}", message, faq_query(offer)),
            None => message.to_string(),
        };
        let query = query.trim().to_string();

        let candidates = match self.backend.search(&query, self.config.max_candidates).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "context search failed; continuing with no results");
                return Vec::new();
            }
        };

        let mut relevant: Vec<_> = candidates
            .iter()
            .filter(|c| c.distance <= self.config.distance_threshold)
            .cloned()
            .collect();

        // The backend did find something; surface the best candidate rather
        // than spuriously answering "no relevant information".
        if relevant.is_empty() {
            if let Some(best) = candidates
                .iter()
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
            {
                relevant.push(best.clone());
            }
        }

        relevant.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        relevant.truncate(self.config.top_k);

        debug!(
            query_len = query.len(),
            kept = relevant.len(),
            "retrieval complete"
        );

        relevant.into_iter().map(|c| c.text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_core::error::ParleyError;
    use parley_core::types::{OfferStatus, VerificationStatus};

    use crate::backend::ScoredSnippet;

    /// Backend returning a fixed candidate list, or an error.
    struct FixedBackend {
        candidates: Vec<ScoredSnippet>,
        fail: bool,
    }

    impl FixedBackend {
        fn with_distances(distances: &[f64]) -> Self {
            Self {
                candidates: distances
                    .iter()
                    .enumerate()
                    .map(|(i, &d)| ScoredSnippet {
                        text: format!("snippet-{i}"),
                        distance: d,
                    })
                    .collect(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                candidates: vec![],
                fail: true,
            }
        }
    }

    #[async_trait]
    impl SearchBackend for FixedBackend {
        async fn search(&self, _query: &str, limit: usize) -> parley_core::Result<Vec<ScoredSnippet>> {
            if self.fail {
                return Err(ParleyError::Retrieval("backend down".to_string()));
            }
            Ok(self.candidates.iter().take(limit).cloned().collect())
        }
    }

    fn adapter(backend: FixedBackend) -> RetrievalAdapter {
        RetrievalAdapter::new(Arc::new(backend), RetrievalConfig::default())
    }

    // ---- Threshold filtering ----

    #[tokio::test]
    async fn test_only_candidates_under_threshold_kept() {
        let a = adapter(FixedBackend::with_distances(&[0.1, 0.4, 0.5]));
        let results = a.search("query", None).await;
        assert_eq!(results, vec!["snippet-0".to_string()]);
    }

    #[tokio::test]
    async fn test_truncates_to_top_two() {
        let a = adapter(FixedBackend::with_distances(&[0.05, 0.1, 0.2, 0.3]));
        let results = a.search("query", None).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], "snippet-0");
        assert_eq!(results[1], "snippet-1");
    }

    #[tokio::test]
    async fn test_threshold_boundary_inclusive() {
        let a = adapter(FixedBackend::with_distances(&[0.35]));
        let results = a.search("query", None).await;
        assert_eq!(results.len(), 1);
    }

    // ---- Best-candidate fallback ----

    #[tokio::test]
    async fn test_falls_back_to_single_best_when_none_pass() {
        let a = adapter(FixedBackend::with_distances(&[0.6, 0.4, 0.9]));
        let results = a.search("query", None).await;
        // 0.4 is the lowest distance even though none pass the threshold.
        assert_eq!(results, vec!["snippet-1".to_string()]);
    }

    #[tokio::test]
    async fn test_no_candidates_yields_empty() {
        let a = adapter(FixedBackend::with_distances(&[]));
        let results = a.search("query", None).await;
        assert!(results.is_empty());
    }

    // ---- Failure demotion ----

    #[tokio::test]
    async fn test_backend_failure_yields_empty() {
        let a = adapter(FixedBackend::failing());
        let results = a.search("query", None).await;
        assert!(results.is_empty());
    }

    // ---- Offer biasing ----

    #[tokio::test]
    async fn test_offer_context_appended_to_query() {
        /// Backend that records the query it was asked.
        struct Recording {
            seen: std::sync::Mutex<Vec<String>>,
        }

        #[async_trait]
        impl SearchBackend for Recording {
            async fn search(
                &self,
                query: &str,
                _limit: usize,
            ) -> parley_core::Result<Vec<ScoredSnippet>> {
                self.seen.lock().unwrap().push(query.to_string());
                Ok(vec![])
            }
        }

        let backend = Arc::new(Recording {
            seen: std::sync::Mutex::new(vec![]),
        });
        let a = RetrievalAdapter::new(Arc::clone(&backend) as Arc<dyn SearchBackend>, RetrievalConfig::default());

        let offer = OfferRecord {
            offer_id: 925599,
            title: "Netclan Explorer".to_string(),
            user_status: OfferStatus::Completed,
            verification_status: Some(VerificationStatus::UnderVerification),
        };
        let _ = a.search("where is my reward", Some(&offer)).await;

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("where is my reward"));
        assert!(seen[0].contains("under verification?"));
    }
}
