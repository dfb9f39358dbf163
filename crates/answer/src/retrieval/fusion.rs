//! Reciprocal Rank Fusion for combining retrieval signals
//!
//! RRF is rank-based rather than score-based, so the dense and lexical
//! signals can be combined without calibrating their incomparable score
//! scales. A small per-signal priority boost lets ingestion-time curation
//! influence ranking without overwhelming relevance.

use kochi_common::models::{Chunk, ChunkKey};
use std::collections::HashMap;

/// RRF fusion parameters
#[derive(Debug, Clone)]
pub struct RrfFusion {
    /// Rank constant k (typically 60)
    pub k: f32,

    /// Per-signal score boost per unit of chunk priority
    pub priority_boost: f32,
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self {
            k: 60.0,
            priority_boost: 0.005,
        }
    }
}

/// A chunk surviving fusion, carrying its accumulated score and the display
/// text that receives the citation header.
#[derive(Debug, Clone)]
pub struct FusedResult {
    pub chunk: Chunk,
    pub score: f32,
    text: String,
}

impl FusedResult {
    fn new(chunk: Chunk, score: f32) -> Self {
        let text = chunk.text.clone();
        Self { chunk, score, text }
    }

    /// Display text, citation header included once injected
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Prepend the citation header unless the text already starts with the
    /// bracketed title. Idempotent.
    pub fn inject_citation_header(&mut self) {
        let title = self.chunk.citation_title();
        let marker = format!("[{}]", title);
        if !self.text.trim_start().starts_with(&marker) {
            self.text = format!("[{}] (source)\n{}", title, self.text);
        }
    }
}

/// Request-scoped accumulator entry; discarded with the request
struct FusionEntry {
    chunk: Chunk,
    score: f32,
    order: usize,
}

impl RrfFusion {
    /// Fuse the dense and lexical candidate lists.
    ///
    /// Each signal contributes `1/(rank + k)` plus the priority boost per
    /// occurrence; scores for the same logical chunk accumulate across
    /// signals. Output is sorted descending by score, ties broken by
    /// first-seen insertion order, deduplicated by chunk identity, and
    /// truncated to `limit`.
    pub fn fuse(
        &self,
        dense_results: Vec<(Chunk, f32)>,
        lexical_results: Vec<Chunk>,
        limit: usize,
    ) -> Vec<FusedResult> {
        let mut entries: HashMap<ChunkKey, FusionEntry> = HashMap::new();
        let mut next_order = 0usize;

        let dense_chunks = dense_results.into_iter().map(|(chunk, _score)| chunk);
        for ranked in [
            dense_chunks.collect::<Vec<_>>(),
            lexical_results,
        ] {
            for (rank, chunk) in ranked.into_iter().enumerate() {
                let contribution =
                    1.0 / (rank as f32 + self.k) + chunk.priority as f32 * self.priority_boost;

                let entry = entries.entry(chunk.key()).or_insert_with(|| {
                    let order = next_order;
                    next_order += 1;
                    FusionEntry {
                        chunk,
                        score: 0.0,
                        order,
                    }
                });
                entry.score += contribution;
            }
        }

        let mut ranked: Vec<FusionEntry> = entries.into_values().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.order.cmp(&b.order))
        });
        ranked.truncate(limit);

        ranked
            .into_iter()
            .map(|e| FusedResult::new(e.chunk, e.score))
            .collect()
    }
}
