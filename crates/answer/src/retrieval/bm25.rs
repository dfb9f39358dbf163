//! Okapi BM25 lexical ranking
//!
//! The lexical retrieval signal: a request-scoped index built over the
//! episode's full chunk listing. Scores are only compared within one request,
//! so no normalization is applied.

const K1: f32 = 1.5;
const B: f32 = 0.75;

/// Request-scoped BM25 index over one episode's chunk texts
pub struct Bm25Index {
    docs: Vec<Vec<String>>,
    avg_doc_len: f32,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

impl Bm25Index {
    /// Build an index from the raw chunk texts
    pub fn build<S: AsRef<str>>(texts: &[S]) -> Self {
        let docs: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t.as_ref())).collect();
        let total_len: usize = docs.iter().map(|d| d.len()).sum();
        let avg_doc_len = if docs.is_empty() {
            0.0
        } else {
            total_len as f32 / docs.len() as f32
        };

        Self { docs, avg_doc_len }
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.docs.len() as f32;
        let df = self.docs.iter().filter(|d| d.iter().any(|t| t == term)).count() as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    fn score(&self, query_terms: &[String], doc_idx: usize) -> f32 {
        let doc = &self.docs[doc_idx];
        if doc.is_empty() || self.avg_doc_len == 0.0 {
            return 0.0;
        }

        let mut score = 0.0;
        for term in query_terms {
            let tf = doc.iter().filter(|t| *t == term).count() as f32;
            if tf == 0.0 {
                continue;
            }
            let idf = self.idf(term);
            let norm = K1 * (1.0 - B + B * doc.len() as f32 / self.avg_doc_len);
            score += idf * tf * (K1 + 1.0) / (tf + norm);
        }
        score
    }

    /// Indices of the top `n` documents for the query, best first.
    ///
    /// Zero-scoring documents are excluded; an empty query returns nothing.
    pub fn top_n(&self, query: &str, n: usize) -> Vec<usize> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return vec![];
        }

        let mut scored: Vec<(usize, f32)> = (0..self.docs.len())
            .map(|i| (i, self.score(&query_terms, i)))
            .filter(|(_, s)| *s > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n);
        scored.into_iter().map(|(i, _)| i).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_matching_docs_first() {
        let index = Bm25Index::build(&[
            "diffusion models generate images from noise",
            "transformers use attention for sequence modeling",
            "diffusion in latent space cuts compute costs",
        ]);

        let top = index.top_n("latent diffusion", 3);
        assert_eq!(top.first(), Some(&2));
        assert!(top.contains(&0));
        assert!(!top.contains(&1));
    }

    #[test]
    fn test_rare_terms_outweigh_common_ones() {
        let index = Bm25Index::build(&[
            "attention attention attention models",
            "sparse mixture of experts routing",
            "models with attention layers",
        ]);

        // "sparse" appears in one doc; that doc must win for a sparse query
        let top = index.top_n("sparse routing", 3);
        assert_eq!(top.first(), Some(&1));
    }

    #[test]
    fn test_empty_query_and_empty_corpus() {
        let index = Bm25Index::build(&["some text"]);
        assert!(index.top_n("", 5).is_empty());

        let empty = Bm25Index::build::<&str>(&[]);
        assert!(empty.is_empty());
        assert!(empty.top_n("anything", 5).is_empty());
    }

    #[test]
    fn test_punctuation_is_stripped() {
        let index = Bm25Index::build(&["Kandinsky 5.0 renders quickly."]);
        let top = index.top_n("kandinsky", 1);
        assert_eq!(top, vec![0]);
    }
}
