//! Response envelope and metadata
//!
//! The caller always receives a well-formed envelope; failures surface as
//! quality flags or canonical fallback text, never as a raised error.

use kochi_common::models::PersonaMode;
use serde::Serialize;

/// Per-stage latency breakdown in milliseconds
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageLatency {
    pub retrieval_ms: f64,
    pub llm_ms: f64,
    pub critic_ms: f64,
}

/// Deterministic and model-assisted quality signals for one answer
#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityChecks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_substance: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_deflecting: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cites_papers: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_ok: Option<bool>,

    /// Final critic grounding verdict, when a critique ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounded: Option<bool>,

    /// The lexical guardrail refused the query before generation
    pub hallucination_guardrail_triggered: bool,

    /// Both critique attempts failed grounding; answer was replaced
    pub grounding_failed: bool,

    /// Generation ended in a fallback; full validation skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Human-readable reason for a refusal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Metadata envelope attached to every answer
#[derive(Debug, Clone, Serialize)]
pub struct AnswerMetadata {
    pub trace_id: String,
    pub latency_ms: f64,
    pub stage_latency: StageLatency,
    pub used_chunks: usize,
    pub quality_checks: QualityChecks,
    pub source_papers: Vec<String>,
    pub tokens_in: usize,
    pub tokens_out: usize,
    pub model: String,
    pub question_type: String,
    pub suggested_followups: Vec<String>,
}

/// The final response: constructed once per request, returned, never
/// persisted by this core.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerEnvelope {
    pub episode_id: String,
    pub mode: PersonaMode,
    pub answer: String,
    pub metadata: AnswerMetadata,
}

/// Token-count estimate: character count / 4. A documented approximation,
/// not a real tokenizer.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}
