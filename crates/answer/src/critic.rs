//! Model-assisted answer critique
//!
//! A second, independently prompted model call acting as a strict reviewer.
//! The reply is untrusted input: the JSON verdict is scraped defensively, and
//! anything that cannot be understood counts as a failed critique — the
//! pipeline biases toward refusal over fabrication, so an unreadable critic
//! must never pass an answer by default.

use kochi_common::llm::LanguageModel;
use kochi_common::models::PersonaMode;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use crate::intent::Intent;
use crate::policy::ReviewRigor;
use crate::prompts;

/// Structured verdict from the reviewer call
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Critique {
    #[serde(default)]
    pub grounded: bool,

    #[serde(default)]
    pub structure_ok: bool,

    #[serde(default)]
    pub has_citation: bool,

    #[serde(default)]
    pub issues: Vec<String>,
}

impl Critique {
    /// The conservative verdict used whenever the critic cannot be trusted
    pub fn failed(issue: &str) -> Self {
        Self {
            grounded: false,
            structure_ok: false,
            has_citation: false,
            issues: vec![issue.to_string()],
        }
    }
}

/// Outcome of extracting a critique from a raw model reply
#[derive(Debug, Clone, PartialEq)]
pub enum CritiqueOutcome {
    Parsed(Critique),
    /// The reply carried no decodable JSON object; kept for logging
    Malformed(String),
}

impl CritiqueOutcome {
    /// Collapse to a critique, mapping `Malformed` to the conservative
    /// not-grounded verdict.
    pub fn into_critique(self) -> Critique {
        match self {
            CritiqueOutcome::Parsed(c) => c,
            CritiqueOutcome::Malformed(_) => Critique::failed("parse_error"),
        }
    }
}

/// Locate the first `{` and last `}` in the raw reply and attempt structured
/// decoding of the span between them.
pub fn parse_critique(raw: &str) -> CritiqueOutcome {
    let start = raw.find('{');
    let end = raw.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => match serde_json::from_str::<Critique>(&raw[s..=e]) {
            Ok(critique) => CritiqueOutcome::Parsed(critique),
            Err(_) => CritiqueOutcome::Malformed(raw.to_string()),
        },
        _ => CritiqueOutcome::Malformed(raw.to_string()),
    }
}

/// Issues the reviewer call and maps every failure to the conservative
/// verdict.
pub struct CriticValidator {
    llm: Arc<dyn LanguageModel>,
}

impl CriticValidator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Review an answer for grounding, structure, and citations.
    pub async fn critique(
        &self,
        mode: PersonaMode,
        rigor: ReviewRigor,
        context: &str,
        question: &str,
        answer: &str,
        intent: Intent,
    ) -> Critique {
        let prompt = prompts::build_critic_prompt(mode, rigor, context, question, answer);

        let raw = match self.llm.invoke(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, intent = intent.as_str(), "Critic generation failed");
                return Critique::failed("critic_failed");
            }
        };

        match parse_critique(&raw) {
            CritiqueOutcome::Parsed(critique) => critique,
            CritiqueOutcome::Malformed(raw) => {
                let reply_prefix: String = raw.chars().take(120).collect();
                error!(reply_prefix, "Failed to parse critic JSON");
                Critique::failed("parse_error")
            }
        }
    }
}
