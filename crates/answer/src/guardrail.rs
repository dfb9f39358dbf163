//! Lexical anti-hallucination guardrail
//!
//! A zero-cost pre-check run before any model call. Users routinely ask an
//! episode about well-known systems it never covered; left unchecked, the
//! model happily invents technical content about them. The guardrail keeps a
//! fixed list of such terms and blocks generation when a term appears in the
//! query but neither in the fused context nor in any retrieved paper title.
//! It only ever blocks, never force-allows.

/// Canonical insufficient-context message, enforced verbatim in
/// post-processing.
pub const INSUFFICIENT_MSG: &str =
    "This episode excerpt does not give enough detail to answer that.";

/// Systems and technologies commonly asked about when absent from an episode
const GUARDED_TERMS: &[&str] = &[
    "sdxl",
    "stable diffusion",
    "gpt-4o",
    "gpt4o",
    "gpt-4",
    "chatgpt",
    "claude",
    "gemini",
    "llama",
    "mistral",
    "midjourney",
    "dall-e",
    "jvm",
    "java virtual machine",
    "garbage collector",
    "kubernetes",
];

/// Short-circuits generation for queries about content provably absent from
/// the corpus.
pub struct GuardrailFilter {
    terms: Vec<String>,
}

impl Default for GuardrailFilter {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl GuardrailFilter {
    /// Build the filter with optional deployment-specific extra terms
    pub fn new(extra_terms: &[String]) -> Self {
        let mut terms: Vec<String> = GUARDED_TERMS.iter().map(|t| t.to_string()).collect();
        terms.extend(extra_terms.iter().map(|t| t.to_lowercase()));
        Self { terms }
    }

    /// Returns the first guarded term mentioned in the query but present in
    /// neither the retrieved context nor any retrieved paper title.
    pub fn check(&self, query: &str, context_text: &str, titles: &[String]) -> Option<&str> {
        let query_lower = query.to_lowercase();
        let context_lower = context_text.to_lowercase();
        let titles_lower: Vec<String> = titles.iter().map(|t| t.to_lowercase()).collect();

        self.terms
            .iter()
            .find(|term| {
                query_lower.contains(term.as_str())
                    && !context_lower.contains(term.as_str())
                    && !titles_lower.iter().any(|t| t.contains(term.as_str()))
            })
            .map(String::as_str)
    }
}
