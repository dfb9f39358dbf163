//! Hybrid retrieval with rank fusion
//!
//! Two signals feed every request:
//! - dense: semantic similarity search against the episode corpus
//! - lexical: BM25 over the full (capped) episode listing
//!
//! The signals have no data dependency and run concurrently. Either may fail
//! independently; fusion proceeds with whatever succeeded, and both failing
//! degrades to an empty result rather than an error.

mod bm25;
mod fusion;

pub use bm25::Bm25Index;
pub use fusion::{FusedResult, RrfFusion};

use kochi_common::config::RetrievalConfig;
use kochi_common::corpus::CorpusStore;
use kochi_common::models::Chunk;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Runs both retrieval signals and merges them into a ranked, deduplicated,
/// citation-annotated chunk list.
pub struct RetrievalFusionEngine {
    corpus: Arc<dyn CorpusStore>,
    config: RetrievalConfig,
    fusion: RrfFusion,
}

impl RetrievalFusionEngine {
    pub fn new(corpus: Arc<dyn CorpusStore>, config: RetrievalConfig) -> Self {
        let fusion = RrfFusion {
            k: config.rrf_k,
            priority_boost: config.priority_boost,
        };
        Self {
            corpus,
            config,
            fusion,
        }
    }

    /// Retrieve up to `k` fused results for the query.
    pub async fn retrieve(&self, episode_id: &str, query: &str, k: usize) -> Vec<FusedResult> {
        let start = Instant::now();
        let candidate_pool = k * 3;

        let (dense, listing) = tokio::join!(
            self.corpus.similarity_search(episode_id, query, candidate_pool),
            self.corpus.list_all(episode_id, self.config.corpus_cap),
        );

        let dense_results = match dense {
            Ok(results) => results,
            Err(e) => {
                warn!(episode_id, error = %e, "Dense retrieval failed, continuing without it");
                vec![]
            }
        };

        let lexical_results = match listing {
            Ok(chunks) => Self::lexical_top_n(&chunks, query, candidate_pool),
            Err(e) => {
                warn!(episode_id, error = %e, "Episode listing failed, continuing without BM25");
                vec![]
            }
        };

        let mut fused = self.fusion.fuse(dense_results, lexical_results, k);
        for result in &mut fused {
            result.inject_citation_header();
        }

        kochi_common::metrics::record_retrieval(start.elapsed().as_secs_f64(), fused.len());
        fused
    }

    /// BM25 over the episode listing; empty corpus yields an empty signal
    fn lexical_top_n(chunks: &[Chunk], query: &str, n: usize) -> Vec<Chunk> {
        if chunks.is_empty() {
            return vec![];
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let index = Bm25Index::build(&texts);

        index
            .top_n(query, n)
            .into_iter()
            .map(|i| chunks[i].clone())
            .collect()
    }
}
