//! Corpus access abstraction
//!
//! The episode corpus is ingested and stored by an external collaborator;
//! this core only reads it. `CorpusStore` is the seam: a dense similarity
//! search, an exhaustive per-episode listing (the corpus for the lexical
//! signal), and stored report summaries for cross-episode comparison.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::Result;
use crate::models::Chunk;

/// Read-only access to the episode corpus.
///
/// Absence of a match returns an empty list, never an error.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Semantic similarity search over one episode's chunks
    async fn similarity_search(
        &self,
        episode_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Chunk, f32)>>;

    /// Exhaustive listing of one episode's chunks, capped
    async fn list_all(&self, episode_id: &str, cap: usize) -> Result<Vec<Chunk>>;

    /// Stored report summary for an episode, if one exists
    async fn report_summary(&self, episode_id: &str) -> Result<Option<String>>;
}

/// JSON snapshot layout for the in-memory store
#[derive(Debug, Deserialize)]
struct CorpusSnapshot {
    chunks: Vec<Chunk>,
    #[serde(default)]
    summaries: HashMap<String, String>,
}

/// In-memory corpus used by tests and local development.
///
/// Similarity is a term-overlap score; good enough to exercise the pipeline
/// without an embedding service behind it.
#[derive(Debug, Default)]
pub struct InMemoryCorpus {
    chunks: Vec<Chunk>,
    summaries: HashMap<String, String>,
}

impl InMemoryCorpus {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            summaries: HashMap::new(),
        }
    }

    /// Load a snapshot written by the ingestion pipeline
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: CorpusSnapshot = serde_json::from_str(&raw)?;
        Ok(Self {
            chunks: snapshot.chunks,
            summaries: snapshot.summaries,
        })
    }

    pub fn with_summary(mut self, episode_id: &str, summary: &str) -> Self {
        self.summaries.insert(episode_id.to_string(), summary.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn overlap_score(query_terms: &[String], text: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let text_lower = text.to_lowercase();
        let hits = query_terms
            .iter()
            .filter(|t| text_lower.contains(t.as_str()))
            .count();
        hits as f32 / query_terms.len() as f32
    }
}

#[async_trait]
impl CorpusStore for InMemoryCorpus {
    async fn similarity_search(
        &self,
        episode_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Chunk, f32)>> {
        let query_terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() > 2)
            .map(String::from)
            .collect();

        let mut scored: Vec<(Chunk, f32)> = self
            .chunks
            .iter()
            .filter(|c| c.episode_id == episode_id)
            .map(|c| {
                let score = Self::overlap_score(&query_terms, &c.text);
                (c.clone(), score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn list_all(&self, episode_id: &str, cap: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .chunks
            .iter()
            .filter(|c| c.episode_id == episode_id)
            .take(cap)
            .cloned()
            .collect())
    }

    async fn report_summary(&self, episode_id: &str) -> Result<Option<String>> {
        Ok(self.summaries.get(episode_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;

    fn chunk(episode: &str, text: &str) -> Chunk {
        Chunk {
            episode_id: episode.into(),
            text: text.into(),
            source_type: SourceType::Report,
            paper_title: None,
            priority: 1,
            sequence_index: 0,
            time_start: None,
            time_end: None,
        }
    }

    #[tokio::test]
    async fn test_similarity_search_filters_by_episode() {
        let corpus = InMemoryCorpus::new(vec![
            chunk("ep-1", "diffusion models generate images"),
            chunk("ep-2", "diffusion models in another episode"),
        ]);

        let results = corpus
            .similarity_search("ep-1", "diffusion images", 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.episode_id, "ep-1");
    }

    #[tokio::test]
    async fn test_missing_episode_returns_empty() {
        let corpus = InMemoryCorpus::new(vec![chunk("ep-1", "text")]);
        let results = corpus.similarity_search("ep-404", "query", 5).await.unwrap();
        assert!(results.is_empty());
        let listed = corpus.list_all("ep-404", 200).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_list_all_respects_cap() {
        let chunks: Vec<Chunk> = (0..10).map(|i| chunk("ep-1", &format!("chunk {}", i))).collect();
        let corpus = InMemoryCorpus::new(chunks);
        let listed = corpus.list_all("ep-1", 3).await.unwrap();
        assert_eq!(listed.len(), 3);
    }

    #[tokio::test]
    async fn test_report_summary_lookup() {
        let corpus = InMemoryCorpus::default().with_summary("ep-1", "Today we covered diffusion.");
        assert!(corpus.report_summary("ep-1").await.unwrap().is_some());
        assert!(corpus.report_summary("ep-2").await.unwrap().is_none());
    }
}
