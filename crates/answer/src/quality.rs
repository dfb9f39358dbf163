//! Post-processing and deterministic quality checks
//!
//! Post-processing enforces the canonical insufficient-context phrase: when
//! the model pads a refusal with invented commentary, the answer collapses to
//! exactly the canonical phrase. Validation consults the same policy table
//! that produced the prompt instructions, so prompt and check cannot drift.

use regex_lite::Regex;

use crate::envelope::QualityChecks;
use crate::generate::{ERROR_FALLBACK_MARKER, TIMEOUT_FALLBACK_MARKER};
use crate::guardrail::INSUFFICIENT_MSG;
use crate::policy::{AnswerPolicy, ReviewRigor};

/// Collapse padded refusals to the canonical phrase.
///
/// Applies only when the answer is not substantially longer than the phrase
/// (<= 1.5x its length); a long answer that merely quotes the phrase is left
/// alone.
pub fn post_process(answer: String) -> String {
    let contains_phrase = answer
        .to_lowercase()
        .contains(&INSUFFICIENT_MSG.to_lowercase());

    let limit = INSUFFICIENT_MSG.chars().count() * 3 / 2;
    if contains_phrase && answer.chars().count() <= limit {
        INSUFFICIENT_MSG.to_string()
    } else {
        answer
    }
}

/// Did generation end in one of the two fixed fallbacks?
pub fn is_generation_fallback(answer: &str) -> bool {
    answer.contains(TIMEOUT_FALLBACK_MARKER) || answer.contains(ERROR_FALLBACK_MARKER)
}

/// Deterministic post-hoc checks over the final answer text
pub fn validate(answer: &str, policy: &AnswerPolicy) -> QualityChecks {
    let lower = answer.to_lowercase();

    let citation_re = Regex::new(r"\[[^\[\]]+\]").expect("static citation pattern");

    QualityChecks {
        has_substance: Some(answer.chars().count() > 120),
        not_deflecting: Some(
            !lower.contains("does not give enough detail")
                && !lower.contains("i don't have that information"),
        ),
        cites_papers: Some(citation_re.is_match(answer)),
        structure_ok: Some(structure_ok(answer, policy)),
        ..Default::default()
    }
}

/// Structure check: every policy-required section label appears in the
/// answer. Relaxed-rigor policies with no required sections trivially pass.
fn structure_ok(answer: &str, policy: &AnswerPolicy) -> bool {
    if policy.rigor == ReviewRigor::Relaxed || policy.required_sections.is_empty() {
        return true;
    }
    let lower = answer.to_lowercase();
    policy
        .required_sections
        .iter()
        .all(|section| lower.contains(&section.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use crate::policy;
    use kochi_common::models::PersonaMode;

    #[test]
    fn test_collapse_exact_phrase() {
        assert_eq!(post_process(INSUFFICIENT_MSG.to_string()), INSUFFICIENT_MSG);
    }

    #[test]
    fn test_collapse_padded_refusal() {
        let padded = format!("{} Sorry about that!", INSUFFICIENT_MSG);
        assert!(padded.chars().count() <= INSUFFICIENT_MSG.chars().count() * 3 / 2);
        assert_eq!(post_process(padded), INSUFFICIENT_MSG);
    }

    #[test]
    fn test_long_answer_quoting_phrase_is_kept() {
        let long = format!(
            "{} However, the surrounding report does cover related work in depth, \
             including several sections on retrieval-augmented generation, evaluation \
             setups, and deployment considerations that partially address the question.",
            INSUFFICIENT_MSG
        );
        assert!(long.chars().count() > INSUFFICIENT_MSG.chars().count() * 3 / 2);
        assert_eq!(post_process(long.clone()), long);
    }

    #[test]
    fn test_collapse_is_case_insensitive() {
        let shouty = INSUFFICIENT_MSG.to_uppercase();
        assert_eq!(post_process(shouty), INSUFFICIENT_MSG);
    }

    #[test]
    fn test_fallback_markers_detected() {
        assert!(is_generation_fallback(
            "I apologize, but I'm experiencing high response times right now."
        ));
        assert!(is_generation_fallback("I'm having trouble generating a response."));
        assert!(!is_generation_fallback("A perfectly fine answer [Paper A]."));
    }

    #[test]
    fn test_validate_substantive_cited_answer() {
        let policy = policy::derive(PersonaMode::FounderTakeaway, Intent::Moat);
        let answer = "## Big Idea\nA real moat. [Paper A]\n\n## Types of Moat\n...\n\n\
                      ## Where the Real Moat Is\n...\n\n## Product Directions\n...\n\n\
                      ## Why this paper\n...\n\n## Risks & Unknowns\n...";
        let checks = validate(answer, &policy);
        assert_eq!(checks.has_substance, Some(true));
        assert_eq!(checks.cites_papers, Some(true));
        assert_eq!(checks.structure_ok, Some(true));
    }

    #[test]
    fn test_validate_flags_missing_sections() {
        let policy = policy::derive(PersonaMode::EngineerAngle, Intent::Architecture);
        let answer = "Just a short unstructured reply with a citation [Paper A] but \
                      none of the required engineering sections present at all here.";
        let checks = validate(answer, &policy);
        assert_eq!(checks.structure_ok, Some(false));
    }

    #[test]
    fn test_relaxed_policy_skips_structure_enforcement() {
        let policy = policy::derive(PersonaMode::PlainEnglish, Intent::WhyHow);
        let answer = "Today on Kochi we talked about three themes, no headings anywhere, \
                      told conversationally with one analogy about reading teams in a library.";
        let checks = validate(answer, &policy);
        assert_eq!(checks.structure_ok, Some(true));
    }

    #[test]
    fn test_validate_detects_deflection() {
        let policy = policy::derive(PersonaMode::PlainEnglish, Intent::Summary);
        let checks = validate(INSUFFICIENT_MSG, &policy);
        assert_eq!(checks.not_deflecting, Some(false));
    }
}
