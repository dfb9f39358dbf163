//! Question intent classification
//!
//! Maps free text onto a closed taxonomy of question intents with
//! priority-ordered keyword matching over the lower-cased query. Pure and
//! total: identical input always yields the same intent, and anything
//! unmatched falls back to `Intent::General`.

use kochi_common::models::PersonaMode;
use serde::{Deserialize, Serialize};

/// The classified purpose of a user's question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    // Learning modes
    QuizMe,
    SelfExplain,

    // Episode-native flavors
    Tldr,
    EpisodeBuilderInsight,
    EpisodeHalfAttention,
    EpisodeSideProject,
    EpisodeAging,
    CoreIdea,

    // Founder-mode canonical questions
    Mvp,
    Month,
    PaidProduct,
    Moat,
    Risks,
    OverhypeFailure,
    RoleSoloIndie,
    RolePmFintech,

    // Engineer-mode canonical questions
    Prototype,
    Pipeline,
    Api,
    Architecture,
    Integration,
    Metrics,
    Experiment,
    Tradeoffs,
    Limitations,
    RoleBackend,
    RoleHealthcare,

    // Generic buckets
    Brainstorm,
    Summary,
    WhyHow,
    BuildImplement,
    Compare,
    Relevance,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::QuizMe => "quiz_me",
            Intent::SelfExplain => "self_explain",
            Intent::Tldr => "tldr",
            Intent::EpisodeBuilderInsight => "episode_builder_insight",
            Intent::EpisodeHalfAttention => "episode_half_attention",
            Intent::EpisodeSideProject => "episode_side_project",
            Intent::EpisodeAging => "episode_aging",
            Intent::CoreIdea => "core_idea",
            Intent::Mvp => "mvp",
            Intent::Month => "month",
            Intent::PaidProduct => "paid_product",
            Intent::Moat => "moat",
            Intent::Risks => "risks",
            Intent::OverhypeFailure => "overhype_failure",
            Intent::RoleSoloIndie => "role_solo_indie",
            Intent::RolePmFintech => "role_pm_fintech",
            Intent::Prototype => "prototype",
            Intent::Pipeline => "pipeline",
            Intent::Api => "api",
            Intent::Architecture => "architecture",
            Intent::Integration => "integration",
            Intent::Metrics => "metrics",
            Intent::Experiment => "experiment",
            Intent::Tradeoffs => "tradeoffs",
            Intent::Limitations => "limitations",
            Intent::RoleBackend => "role_backend",
            Intent::RoleHealthcare => "role_healthcare",
            Intent::Brainstorm => "brainstorm",
            Intent::Summary => "summary",
            Intent::WhyHow => "why_how",
            Intent::BuildImplement => "build_implement",
            Intent::Compare => "compare",
            Intent::Relevance => "relevance",
            Intent::General => "general",
        }
    }

    /// Learning-mode intents bypass the generate/critique loop entirely
    pub fn is_learning_mode(&self) -> bool {
        matches!(self, Intent::QuizMe | Intent::SelfExplain)
    }
}

fn any(q: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| q.contains(n))
}

/// Classify the user query into an intent. First matching rule wins.
pub fn classify(query: &str) -> Intent {
    let q = query.to_lowercase();

    // Learning modes
    let quiz_triggers = [
        "quiz me",
        "test me",
        "ask me questions",
        "questions to test if i understood",
        "multiple-choice questions",
        "multiple choice questions",
        "mcq",
        "spaced-repetition",
        "spaced repetition",
        "mix easy and hard questions",
    ];
    if any(&q, &quiz_triggers) {
        return Intent::QuizMe;
    }

    let self_explain_triggers = [
        "let me explain",
        "did i get this right",
        "tell me if i understood",
        "grade my explanation",
        "give me feedback on my explanation",
        "what i got right and wrong",
        "rewrite it and highlight what i missed",
        "highlight what i missed",
        "give me feedback and a better version",
    ];
    if any(&q, &self_explain_triggers) {
        return Intent::SelfExplain;
    }

    // TL;DR requests (before generic summary)
    if q.contains("tldr") || q.contains("tl;dr") || (q.contains('3') && q.contains("bullet")) {
        return Intent::Tldr;
    }

    // Episode-native flavor questions
    if q.contains("builder-friendly insight") {
        return Intent::EpisodeBuilderInsight;
    }
    if q.contains("half paying attention") {
        return Intent::EpisodeHalfAttention;
    }
    if q.contains("crazy but plausible side-project") || q.contains("crazy but plausible side project") {
        return Intent::EpisodeSideProject;
    }
    if q.contains("age the best") || q.contains("look silly in 2 years") {
        return Intent::EpisodeAging;
    }

    // Core idea with example
    if q.contains("core idea") && q.contains("example") {
        return Intent::CoreIdea;
    }

    // Founder-mode canonical questions
    if q.contains("if i only had a weekend") && q.contains("mvp") {
        return Intent::Mvp;
    }
    if q.contains("one 4-hour project") || q.contains("one 4 hour project") || q.contains("one simple prototype") {
        return Intent::Prototype;
    }
    if q.contains("build in a month") {
        return Intent::Month;
    }
    if q.contains("paid product")
        || q.contains("customer segment would pay right now")
        || (q.contains("pricing model") && q.contains("go-to-market"))
    {
        return Intent::PaidProduct;
    }
    if q.contains("realistic moat")
        || q.contains("closest existing products")
        || q.contains("differentiate using this research")
    {
        return Intent::Moat;
    }
    if q.contains("top 3 risks") || q.contains("top three risks") || q.contains("unknowns") {
        return Intent::Risks;
    }
    if q.contains("over-hyped") || q.contains("overhyped") {
        return Intent::OverhypeFailure;
    }
    if q.contains("solo indie dev") {
        return Intent::RoleSoloIndie;
    }
    if q.contains("pm at a saas startup in fintech") {
        return Intent::RolePmFintech;
    }

    // Engineer-mode canonical questions
    if q.contains("minimal data pipeline") {
        return Intent::Pipeline;
    }
    if q.contains("sketch a minimal api") {
        return Intent::Api;
    }
    if q.contains("implement this with") {
        return Intent::Architecture;
    }
    if q.contains("existing microservice") {
        return Intent::Integration;
    }
    if q.contains("metrics and logs") {
        return Intent::Metrics;
    }
    if q.contains("bottlenecks or failure modes") {
        return Intent::Risks;
    }
    if q.contains("small-scale experiment") {
        return Intent::Experiment;
    }
    if q.contains("trade-offs between") {
        return Intent::Tradeoffs;
    }
    if q.contains("limitations or weak points") {
        return Intent::Limitations;
    }
    if q.contains("backend engineer working mostly with") {
        return Intent::RoleBackend;
    }
    if q.contains("healthcare startup") {
        return Intent::RoleHealthcare;
    }

    // Brainstorm / ideation
    if any(&q, &["brainstorm", "idea", "project", "prototype", "4 hour", "4-hour"]) {
        return Intent::Brainstorm;
    }

    // Summary requests
    if any(&q, &["summary", "summarize", "overview", "what is"]) {
        return Intent::Summary;
    }

    // Why/how explanations
    if any(&q, &["why", "how", "explain", "reason"]) {
        return Intent::WhyHow;
    }

    // Build/implement queries
    if any(&q, &["build", "implement", "code", "stack", "architecture"]) {
        return Intent::BuildImplement;
    }

    // Comparison queries
    if any(&q, &["compare", "difference", "versus", "vs"]) {
        return Intent::Compare;
    }

    // Relevance / one thing to remember
    if any(&q, &["relevance", "matter", "care", "impact", "remember one thing"]) {
        return Intent::Relevance;
    }

    Intent::General
}

/// Infer the natural persona for an intent, for callers that pass
/// `mode: "auto"` instead of an explicit persona.
pub fn infer_persona(intent: Intent) -> PersonaMode {
    match intent {
        Intent::Mvp
        | Intent::Month
        | Intent::PaidProduct
        | Intent::Moat
        | Intent::Risks
        | Intent::OverhypeFailure
        | Intent::RoleSoloIndie
        | Intent::RolePmFintech => PersonaMode::FounderTakeaway,

        Intent::Prototype
        | Intent::Pipeline
        | Intent::Api
        | Intent::Architecture
        | Intent::Integration
        | Intent::Metrics
        | Intent::Experiment
        | Intent::Tradeoffs
        | Intent::Limitations
        | Intent::RoleBackend
        | Intent::RoleHealthcare
        | Intent::BuildImplement => PersonaMode::EngineerAngle,

        _ => PersonaMode::PlainEnglish,
    }
}
