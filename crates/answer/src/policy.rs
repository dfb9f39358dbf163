//! Answer policy derivation
//!
//! A pure decision table keyed by `(persona, intent)` producing length,
//! section, and tone constraints. The same table drives both the prompt
//! instructions and the post-hoc structure validation, so the two can never
//! drift apart.

use kochi_common::models::PersonaMode;
use serde::Serialize;

use crate::intent::Intent;

/// How strictly the critic reviews an answer for this `(persona, intent)`.
///
/// Explanatory and open-ended intents are reviewed leniently: the critic is
/// skipped and structure validation only asks for good organization, because
/// rigid section enforcement on conversational answers produces false
/// negatives and unhelpful retries.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewRigor {
    Strict,
    Relaxed,
}

/// Length/section/tone constraints for one request.
///
/// Pure value object, recomputed per request, never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerPolicy {
    pub min_words: usize,
    pub max_words: usize,
    pub required_sections: Vec<&'static str>,
    pub tone_instruction: &'static str,
    pub add_commentary: bool,
    pub rigor: ReviewRigor,
}

impl AnswerPolicy {
    /// Prompt fragment for the length constraint
    pub fn length_instruction(&self) -> String {
        format!(
            "- Keep the answer between {} and {} words.",
            self.min_words, self.max_words
        )
    }

    /// Prompt fragment for the section constraint; empty when unstructured
    pub fn sections_instruction(&self) -> String {
        if self.required_sections.is_empty() {
            String::new()
        } else {
            format!(
                "- Include these sections: {}.",
                self.required_sections.join(", ")
            )
        }
    }
}

fn relaxed(intent: Intent) -> bool {
    matches!(
        intent,
        Intent::WhyHow
            | Intent::Summary
            | Intent::General
            | Intent::Brainstorm
            | Intent::Tldr
            | Intent::CoreIdea
            | Intent::Relevance
            | Intent::EpisodeBuilderInsight
            | Intent::EpisodeHalfAttention
            | Intent::EpisodeSideProject
            | Intent::EpisodeAging
            | Intent::QuizMe
            | Intent::SelfExplain
    )
}

/// Derive the answer policy for a `(persona, intent)` pair.
///
/// Invariant: `min_words <= max_words` for every pair.
pub fn derive(mode: PersonaMode, intent: Intent) -> AnswerPolicy {
    let rigor = if relaxed(intent) {
        ReviewRigor::Relaxed
    } else {
        ReviewRigor::Strict
    };

    // Baseline policy; persona blocks override below
    let mut policy = AnswerPolicy {
        min_words: 50,
        max_words: 300,
        required_sections: vec![],
        tone_instruction: "Helpful and concise.",
        add_commentary: false,
        rigor,
    };

    match mode {
        PersonaMode::PlainEnglish => {
            policy.tone_instruction = "Simple, accessible, radio-host style.";
            policy.required_sections = vec!["TL;DR", "Key Ideas", "Why this matters"];
            match intent {
                Intent::WhyHow => {
                    policy.required_sections = vec!["Explanation", "Analogy"];
                    policy.max_words = 300;
                }
                Intent::Brainstorm => {
                    policy.required_sections = vec!["Explanation", "Ideas"];
                    policy.max_words = 400;
                }
                // Conversational formats carry no rigid sections
                Intent::Tldr | Intent::CoreIdea | Intent::Relevance | Intent::General => {
                    policy.required_sections = vec![];
                }
                _ => {}
            }
        }
        PersonaMode::FounderTakeaway => {
            policy.tone_instruction = "Strategic, business-focused, visionary.";
            policy.add_commentary = true;
            policy.required_sections = vec![
                "Big Idea",
                "Product Directions",
                "Why this paper",
                "Risks & Unknowns",
            ];
            if intent == Intent::Brainstorm {
                policy.max_words = 500;
            }
        }
        PersonaMode::EngineerAngle => {
            policy.tone_instruction = "Technical, precise, implementation-focused.";
            policy.required_sections = vec![
                "Core Principle",
                "Architecture",
                "Training Setup",
                "Inference Pipeline",
                "Integration Tips",
                "Trade-offs",
            ];
            match intent {
                Intent::Compare => policy.required_sections.push("Performance"),
                Intent::Brainstorm => policy.max_words = 500,
                _ => {}
            }
        }
    }

    debug_assert!(policy.min_words <= policy.max_words);
    policy
}
