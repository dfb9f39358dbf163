//! Prompt assembly for the answer pipeline
//!
//! Three persona templates, intent-specific hints, learning-mode prompts,
//! and the critic prompt. The shared skeleton keeps the grounding rules in
//! one place; personas differ in voice, example structure, and formatting
//! contract.

use kochi_common::models::PersonaMode;

use crate::intent::Intent;
use crate::policy::{AnswerPolicy, ReviewRigor};

/// Everything a persona template needs to produce the final prompt
pub struct PromptInputs<'a> {
    pub context: &'a str,
    pub question: &'a str,
    pub conversation_history: &'a str,
    pub user_profile_context: &'a str,
    pub policy: &'a AnswerPolicy,
    pub intent_hint: Option<&'static str>,
}

const PLAIN_ENGLISH_VOICE: &str = "You are Kochi, an AI research radio host. Your goal is to \
explain complex AI topics in simple, plain English. You are talking to a listener who just \
heard today's short episode. Write like you speak on air: warm, concrete, no academic tone. \
Do NOT repeat the user's question in your answer.";

const FOUNDER_VOICE: &str = "You are Kochi, a startup strategist helping founders turn AI \
papers from today's episode into products. Focus on 1-3 concrete product ideas, not generic \
advice. Separate what's in the context from your own inferences.";

const ENGINEER_VOICE: &str = "You are Kochi, a senior ML engineer explaining how to build with \
the papers from this episode. Include technical detail: architecture, training, inference. \
Separate what's in the context from your own inferences.";

fn persona_voice(mode: PersonaMode) -> &'static str {
    match mode {
        PersonaMode::PlainEnglish => PLAIN_ENGLISH_VOICE,
        PersonaMode::FounderTakeaway => FOUNDER_VOICE,
        PersonaMode::EngineerAngle => ENGINEER_VOICE,
    }
}

/// Build the full generation prompt for a persona
pub fn build_answer_prompt(mode: PersonaMode, inputs: &PromptInputs<'_>) -> String {
    let mut prompt = String::new();
    prompt.push_str(persona_voice(mode));
    prompt.push_str("\n\nFORMATTING RULES:\n");
    prompt.push_str(
        "- Use markdown headers (##, ###) for structure\n\
         - Use bullet points (-) for lists and **bold** for key terms\n\
         - DO NOT use *** or --- separators\n\
         - Cite papers inline as [Paper Name]\n\
         - Add blank lines between sections\n",
    );

    if !inputs.user_profile_context.is_empty() {
        prompt.push('\n');
        prompt.push_str(inputs.user_profile_context);
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\nContext from the episode:\n{}\n\nConversation so far (if any):\n{}\n\nUser Question: {}\n",
        inputs.context, inputs.conversation_history, inputs.question
    ));

    prompt.push_str("\nFORMATTING REQUIREMENTS:\n");
    prompt.push_str(&inputs.policy.length_instruction());
    prompt.push('\n');
    let sections = inputs.policy.sections_instruction();
    if !sections.is_empty() {
        prompt.push_str(&sections);
        prompt.push('\n');
    }
    prompt.push_str(&format!("- Tone: {}\n", inputs.policy.tone_instruction));

    if let Some(hint) = inputs.intent_hint {
        prompt.push('\n');
        prompt.push_str(hint);
        prompt.push('\n');
    }

    prompt.push_str(
        "\nCONTENT REQUIREMENTS:\n\
         - Answer based ONLY on the context provided\n\
         - Ground all claims in the context\n\
         - Do NOT invent paper names or metrics\n",
    );
    prompt.push_str(&format!(
        "- If the context is insufficient, say: \"{}\"\n",
        crate::guardrail::INSUFFICIENT_MSG
    ));

    prompt
}

/// Question-specific hints that sharpen the persona templates for the
/// canonical question types.
pub fn intent_hint(mode: PersonaMode, intent: Intent) -> Option<&'static str> {
    match (mode, intent) {
        (PersonaMode::PlainEnglish, Intent::Tldr) => Some(
            "Your ENTIRE answer must be EXACTLY 3 bullet points and nothing else. \
             No headings, no paragraphs before or after. Each bullet: one sentence, up to \
             ~20 words, covering one main theme, like a radio host giving three quick \
             highlights from today's show.",
        ),
        (PersonaMode::PlainEnglish, Intent::WhyHow) => Some(
            "Do NOT use any headings for this question. Write 2-3 short paragraphs in a \
             conversational, spoken style with exactly ONE simple analogy tying the themes \
             together. Mention \"today on Kochi\" or \"this episode of Kochi\" at least once.",
        ),
        (PersonaMode::PlainEnglish, Intent::CoreIdea | Intent::General) => Some(
            "Pick ONE core idea from ONE paper in the episode; do NOT summarize all papers. \
             First line: \"Big idea: ...\" in plain English, then one short real-world story \
             showing that idea. 2-4 short paragraphs, max ~220 words, no headings.",
        ),
        (PersonaMode::PlainEnglish, Intent::Relevance) => Some(
            "1 to 3 sentences total, starting with: \"If you remember one thing from this \
             episode, it's that...\". No headings, no bullets, like a closing line at the \
             end of a radio segment.",
        ),
        (PersonaMode::PlainEnglish, Intent::EpisodeHalfAttention) => Some(
            "Structure your answer like this:\n\
             If you only catch 10%:\n- One sentence with the single thing not to miss.\n\
             Don't miss:\n- 2-3 bullets with specific concepts, papers, or moments.",
        ),
        (PersonaMode::PlainEnglish, Intent::EpisodeSideProject) => Some(
            "Structure your answer like this:\n\
             Crazy but plausible side-project:\n- 1-2 sentences describing the idea.\n\
             Why it's interesting:\n- 2-3 bullets on why it's non-obvious but useful.\n\
             First 3 steps:\n- Step 1... - Step 2... - Step 3...",
        ),
        (PersonaMode::PlainEnglish, Intent::EpisodeAging) => Some(
            "Structure your answer like this:\n\
             Will age well:\n- 2-3 bullets about ideas likely to hold up, with [paper] tags.\n\
             Might look silly in 2 years:\n- 2-3 bullets about fragile assumptions or hype.",
        ),
        (PersonaMode::FounderTakeaway, Intent::Mvp) => Some(
            "Use exactly these headings: \"Big Idea\", \"Weekend MVP Scope\", \"Why this \
             Paper\". Assume one solo builder, 2 days. Under \"Weekend MVP Scope\": 3-5 \
             bullets, each one concrete thing shipped by Sunday night. Be brutally \
             realistic; if it would slip to week 2, do NOT include it. Max ~220 words.",
        ),
        (PersonaMode::FounderTakeaway, Intent::PaidProduct) => Some(
            "Use exactly these headings: \"Big Idea\", \"Who Pays Now\", \"Pricing & \
             Packaging\", \"Go-to-Market\", \"Why this Paper\". Name 1-2 very specific \
             customer profiles and ONE pricing model with example price points. \
             Founder-to-founder tone, focused on money and urgency.",
        ),
        (PersonaMode::FounderTakeaway, Intent::Moat) => Some(
            "Use exactly these headings: \"Big Idea\", \"Types of Moat\", \"Where the Real \
             Moat Is\", \"Why this Paper Helps\". Discuss at least 3 moat types and pick ONE \
             that is realistic for a small team. Honest and slightly skeptical; no hand-wavy \
             moats.",
        ),
        (PersonaMode::FounderTakeaway, Intent::Risks) => Some(
            "Use exactly these headings: \"Big Idea\", \"Top 3 Risks\", \"Scrappy Tests\". \
             List exactly three risks: one technical, one market, one execution. For each, \
             propose one extremely scrappy test runnable in under a week. Max ~220 words.",
        ),
        (PersonaMode::FounderTakeaway, Intent::OverhypeFailure) => Some(
            "Use exactly these headings: \"Big Idea in the Paper\", \"Where It Fails in \
             Reality\", \"What Still Survives\". Call out 2-3 realistic production failure \
             modes, then 3 bullets on what remains useful even if over-hyped.",
        ),
        (PersonaMode::EngineerAngle, Intent::Prototype) => Some(
            "Focus on a minimal, buildable prototype: ONE end-to-end flow (input to output), \
             a single engineer over a weekend, no extra infrastructure.",
        ),
        (PersonaMode::EngineerAngle, Intent::Pipeline) => Some(
            "Emphasize the data + model pipeline: list each stage as a numbered step, call \
             out where data is stored and retrieved, and note where monitoring hooks plug in.",
        ),
        (PersonaMode::EngineerAngle, Intent::Api) => Some(
            "Shape the answer as an API designer: show 1-2 HTTP endpoints with method, path, \
             and JSON request/response shapes, conceptually language-agnostic.",
        ),
        (PersonaMode::EngineerAngle, Intent::Metrics) => Some(
            "Prioritize observability: separate business metrics, ML quality metrics, and \
             reliability metrics. Suggest at most 3-5 metrics total so it feels realistic.",
        ),
        (PersonaMode::EngineerAngle, Intent::Tradeoffs) => Some(
            "Lean into skeptic mode: at least two advantages and two drawbacks, tied back to \
             latency, cost, complexity, or safety constraints.",
        ),
        (PersonaMode::EngineerAngle, Intent::Limitations) => Some(
            "Be explicit about where this breaks: data regimes, scale limits, or weak \
             domains, with concrete failure examples rather than vague caveats.",
        ),
        _ => None,
    }
}

/// Quiz-generation prompt for the `quiz_me` learning mode
pub fn build_quiz_prompt(context: &str, question: &str) -> String {
    format!(
        "You are Kochi, quizzing a listener on today's episode.\n\
         Write 5 questions that test understanding of the episode content below.\n\
         - Mix difficulty: mark each question [Easy] or [Hard]\n\
         - Use multiple-choice format with options A) B) C) D) where it fits\n\
         - Every question must be answerable from the context alone\n\
         - After the questions, list the answers under an \"Answers\" line\n\n\
         Context from the episode:\n{context}\n\n\
         Listener request: {question}\n",
        context = context,
        question = question
    )
}

/// Explanation-feedback prompt for the `self_explain` learning mode
pub fn build_self_explain_prompt(context: &str, question: &str) -> String {
    format!(
        "You are Kochi, reviewing a listener's own explanation of today's episode.\n\
         The listener's message contains their attempt. Using ONLY the episode context:\n\
         - Under \"What you got right\": 2-3 bullets\n\
         - Under \"What you missed\": 2-3 bullets\n\
         - Give \"Score: X/10\" on its own line\n\
         - Finish with an improved explanation in 2-3 short paragraphs\n\
         Do not invent content that is not in the context.\n\n\
         Context from the episode:\n{context}\n\n\
         Listener's explanation: {question}\n",
        context = context,
        question = question
    )
}

/// Cross-episode comparison prompt built from stored report summaries
pub fn build_compare_prompt(mode: PersonaMode, summaries: &str, question: &str) -> String {
    format!(
        "{voice}\n\n\
         You are comparing several episodes using their stored summaries below. \
         Point out what changed, what recurred, and what is genuinely new. \
         Cite episodes by their dates or titles as they appear in the summaries. \
         Answer based ONLY on the summaries; do not invent papers or results.\n\n\
         Episode summaries:\n{summaries}\n\n\
         User Question: {question}\n",
        voice = persona_voice(mode),
        summaries = summaries,
        question = question
    )
}

/// Strict-reviewer prompt for the critic pass
pub fn build_critic_prompt(
    mode: PersonaMode,
    rigor: ReviewRigor,
    context: &str,
    question: &str,
    answer: &str,
) -> String {
    let structure_rule = match rigor {
        ReviewRigor::Strict => format!(
            "2. Verify it follows the required structure for mode `{}`.",
            mode.as_str()
        ),
        ReviewRigor::Relaxed => {
            "2. Verify it is well-organized; conversational structure is acceptable.".to_string()
        }
    };

    format!(
        "You are a strict reviewer.\n\
         You receive:\n\
         - Context (episode chunks)\n\
         - User question\n\
         - Model answer\n\
         Your job:\n\
         1. Verify the answer is grounded in the context.\n\
         {structure_rule}\n\
         3. Verify it contains at least one citation in square brackets.\n\
         Return a JSON object ONLY with keys:\n\
         {{\n\
           \"grounded\": true/false,\n\
           \"structure_ok\": true/false,\n\
           \"has_citation\": true/false,\n\
           \"issues\": [list of strings]\n\
         }}\n\
         Context:\n{context}\n\n\
         Question:\n{question}\n\n\
         Answer:\n{answer}\n",
        structure_rule = structure_rule,
        context = context,
        question = question,
        answer = answer
    )
}

/// Persona-specific follow-up suggestions attached to every envelope
pub fn suggested_followups(mode: PersonaMode) -> &'static [&'static str] {
    match mode {
        PersonaMode::PlainEnglish => &[
            "Give me a 3-bullet TL;DR of this episode.",
            "Quiz me on this episode.",
            "If I only remember one thing from this episode, what should it be?",
        ],
        PersonaMode::FounderTakeaway => &[
            "If I only had a weekend, what MVP should I build from this?",
            "What's a realistic moat here?",
            "What are the top 3 risks and unknowns?",
        ],
        PersonaMode::EngineerAngle => &[
            "Describe a minimal data pipeline for this.",
            "What metrics and logs should I track?",
            "What are the trade-offs between this approach and the obvious baseline?",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy;

    fn inputs<'a>(policy: &'a AnswerPolicy) -> PromptInputs<'a> {
        PromptInputs {
            context: "[Paper A] (source)\nSome grounded context.",
            question: "What is the big idea?",
            conversation_history: "",
            user_profile_context: "",
            policy,
            intent_hint: None,
        }
    }

    #[test]
    fn test_answer_prompt_carries_policy_instructions() {
        let policy = policy::derive(PersonaMode::FounderTakeaway, Intent::PaidProduct);
        let prompt = build_answer_prompt(PersonaMode::FounderTakeaway, &inputs(&policy));

        assert!(prompt.contains("startup strategist"));
        assert!(prompt.contains("between 50 and 300 words"));
        assert!(prompt.contains("Big Idea"));
        assert!(prompt.contains(crate::guardrail::INSUFFICIENT_MSG));
        assert!(prompt.contains("What is the big idea?"));
    }

    #[test]
    fn test_profile_hint_included_when_present() {
        let policy = policy::derive(PersonaMode::EngineerAngle, Intent::Architecture);
        let mut i = inputs(&policy);
        i.user_profile_context = "Listener profile (role: backend engineer).";
        let prompt = build_answer_prompt(PersonaMode::EngineerAngle, &i);
        assert!(prompt.contains("backend engineer"));
    }

    #[test]
    fn test_intent_hints_exist_for_canonical_questions() {
        assert!(intent_hint(PersonaMode::FounderTakeaway, Intent::Mvp).is_some());
        assert!(intent_hint(PersonaMode::EngineerAngle, Intent::Pipeline).is_some());
        assert!(intent_hint(PersonaMode::PlainEnglish, Intent::Tldr).is_some());
        assert!(intent_hint(PersonaMode::EngineerAngle, Intent::Mvp).is_none());
    }

    #[test]
    fn test_critic_prompt_relaxed_structure_wording() {
        let strict = build_critic_prompt(
            PersonaMode::EngineerAngle,
            ReviewRigor::Strict,
            "ctx",
            "q",
            "a",
        );
        assert!(strict.contains("required structure for mode `engineer_angle`"));

        let relaxed = build_critic_prompt(
            PersonaMode::EngineerAngle,
            ReviewRigor::Relaxed,
            "ctx",
            "q",
            "a",
        );
        assert!(relaxed.contains("well-organized"));
        assert!(!relaxed.contains("required structure"));
    }

    #[test]
    fn test_followups_are_nonempty_per_persona() {
        for mode in PersonaMode::ALL {
            assert!(!suggested_followups(mode).is_empty());
        }
    }

    #[test]
    fn test_learning_prompts_embed_context() {
        let quiz = build_quiz_prompt("episode ctx", "quiz me");
        assert!(quiz.contains("episode ctx"));
        assert!(quiz.contains("[Easy]"));

        let explain = build_self_explain_prompt("episode ctx", "my attempt");
        assert!(explain.contains("Score: X/10"));
        assert!(explain.contains("my attempt"));
    }
}
