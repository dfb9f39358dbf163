//! Answer orchestration state machine
//!
//! Sequences classification, guardrail, retrieval, generation, critique, the
//! single wider-context retry, post-processing, and envelope assembly. Worst
//! case is four model invocations per request (generate, critique, retry
//! generate, retry critique); the guardrail path uses zero.

use kochi_common::config::AppConfig;
use kochi_common::corpus::CorpusStore;
use kochi_common::llm::LanguageModel;
use kochi_common::metrics;
use kochi_common::models::{PersonaMode, UserProfile};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::critic::CriticValidator;
use crate::envelope::{
    estimate_tokens, AnswerEnvelope, AnswerMetadata, QualityChecks, StageLatency,
};
use crate::generate::GenerationStage;
use crate::guardrail::{GuardrailFilter, INSUFFICIENT_MSG};
use crate::intent::{self, Intent};
use crate::policy::{self, AnswerPolicy, ReviewRigor};
use crate::prompts::{self, PromptInputs};
use crate::quality;
use crate::retrieval::{FusedResult, RetrievalFusionEngine};

/// One answer request; per-request state is fully local and discarded at the
/// end of the request.
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    pub episode_id: String,
    pub mode: PersonaMode,
    pub query: String,
    pub conversation_history: Option<String>,
    pub user_profile: Option<UserProfile>,
}

/// The pipeline entry point exposed to the HTTP layer and CLI callers.
pub struct AnswerOrchestrator {
    corpus: Arc<dyn CorpusStore>,
    retrieval: RetrievalFusionEngine,
    generation: GenerationStage,
    critic: CriticValidator,
    guardrail: GuardrailFilter,
    top_k: usize,
    retry_top_k: usize,
}

fn ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl AnswerOrchestrator {
    pub fn new(
        corpus: Arc<dyn CorpusStore>,
        llm: Arc<dyn LanguageModel>,
        config: &AppConfig,
    ) -> Self {
        let retrieval = RetrievalFusionEngine::new(corpus.clone(), config.retrieval.clone());
        let generation = GenerationStage::new(llm.clone(), config.generation_timeout());
        let critic = CriticValidator::new(llm);
        let guardrail = GuardrailFilter::new(&config.guardrail.extra_terms);

        Self {
            corpus,
            retrieval,
            generation,
            critic,
            guardrail,
            top_k: config.retrieval.top_k,
            retry_top_k: config.retrieval.retry_top_k,
        }
    }

    /// Answer a question about a single episode.
    pub async fn answer(&self, request: AnswerRequest) -> AnswerEnvelope {
        let trace_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let intent = intent::classify(&request.query);
        let policy = policy::derive(request.mode, intent);

        info!(
            trace_id,
            episode_id = %request.episode_id,
            mode = %request.mode,
            intent = intent.as_str(),
            "Answer request"
        );

        // First-pass retrieval feeds both the guardrail and generation
        let retrieval_start = Instant::now();
        let results = self
            .retrieval
            .retrieve(&request.episode_id, &request.query, self.top_k)
            .await;
        let mut retrieval_ms = ms(retrieval_start);

        let mut context = Self::context_text(&results);
        let source_papers = Self::source_papers(&results);

        // Guardrail: deterministic refusal, zero model calls
        if let Some(term) = self.guardrail.check(&request.query, &context, &source_papers) {
            info!(trace_id, term, "Hallucination guardrail triggered");
            metrics::record_guardrail_trigger(term);

            let checks = QualityChecks {
                grounded: Some(false),
                hallucination_guardrail_triggered: true,
                reason: Some(format!("{} not in episode papers", term)),
                ..Default::default()
            };
            return self.assemble(
                &request.episode_id,
                request.mode,
                INSUFFICIENT_MSG.to_string(),
                trace_id,
                start,
                StageLatency {
                    retrieval_ms,
                    ..Default::default()
                },
                results.len(),
                checks,
                source_papers,
                &context,
                intent,
            );
        }

        // Learning modes share retrieval and post-processing but make a
        // single differently-prompted call with no critic-retry loop.
        if intent.is_learning_mode() {
            let prompt = match intent {
                Intent::QuizMe => prompts::build_quiz_prompt(&context, &request.query),
                _ => prompts::build_self_explain_prompt(&context, &request.query),
            };

            metrics::record_llm_invocation("learning");
            let llm_start = Instant::now();
            let answer = self.generation.generate(&prompt, &context).await;
            let llm_ms = ms(llm_start);

            let answer = quality::post_process(answer);
            let checks = self.final_checks(&answer, &policy, None, false);
            return self.assemble(
                &request.episode_id,
                request.mode,
                answer,
                trace_id,
                start,
                StageLatency {
                    retrieval_ms,
                    llm_ms,
                    critic_ms: 0.0,
                },
                results.len(),
                checks,
                source_papers,
                &context,
                intent,
            );
        }

        // Primary generation
        let prompt = self.build_prompt(&request, &policy, intent, &context);

        metrics::record_llm_invocation("generate");
        let llm_start = Instant::now();
        let mut answer = self.generation.generate(&prompt, &context).await;
        let mut llm_ms = ms(llm_start);

        let mut critic_ms = 0.0;
        let mut grounded = None;
        let mut grounding_failed = false;
        let mut used_chunks = results.len();

        // Relaxed intents skip the critic entirely: critic models are
        // unreliable for open-ended explanatory answers, and strict
        // enforcement there produces excessive, unhelpful retries.
        if policy.rigor == ReviewRigor::Strict {
            metrics::record_llm_invocation("critic");
            let critic_start = Instant::now();
            let critique = self
                .critic
                .critique(request.mode, policy.rigor, &context, &request.query, &answer, intent)
                .await;
            critic_ms += ms(critic_start);
            grounded = Some(critique.grounded);

            if !critique.grounded {
                info!(trace_id, issues = ?critique.issues, "Critique failed grounding, retrying with wider context");
                metrics::record_grounding_retry(request.mode.as_str());

                let retry_start = Instant::now();
                let wider = self
                    .retrieval
                    .retrieve(&request.episode_id, &request.query, self.retry_top_k)
                    .await;
                retrieval_ms += ms(retry_start);

                context = Self::context_text(&wider);
                used_chunks = wider.len();

                let retry_prompt = self.build_prompt(&request, &policy, intent, &context);

                metrics::record_llm_invocation("generate");
                let llm_start = Instant::now();
                answer = self.generation.generate(&retry_prompt, &context).await;
                llm_ms += ms(llm_start);

                metrics::record_llm_invocation("critic");
                let critic_start = Instant::now();
                let second = self
                    .critic
                    .critique(request.mode, policy.rigor, &context, &request.query, &answer, intent)
                    .await;
                critic_ms += ms(critic_start);
                grounded = Some(second.grounded);

                // At most one retry; a second failure means refusal, not
                // another loop.
                if !second.grounded {
                    warn!(trace_id, issues = ?second.issues, "Second critique failed grounding, refusing");
                    answer = INSUFFICIENT_MSG.to_string();
                    grounding_failed = true;
                }
            }
        }

        let answer = quality::post_process(answer);
        let checks = self.final_checks(&answer, &policy, grounded, grounding_failed);

        self.assemble(
            &request.episode_id,
            request.mode,
            answer,
            trace_id,
            start,
            StageLatency {
                retrieval_ms,
                llm_ms,
                critic_ms,
            },
            used_chunks,
            checks,
            source_papers,
            &context,
            intent,
        )
    }

    /// Compare several episodes using their stored report summaries.
    ///
    /// Single-pass generation only: cross-episode comparison has no
    /// grounding oracle, so the guardrail and critic are skipped.
    pub async fn compare(
        &self,
        episode_ids: &[String],
        mode: PersonaMode,
        query: &str,
    ) -> AnswerEnvelope {
        let trace_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let intent = intent::classify(query);
        let joined_ids = episode_ids.join(",");

        info!(trace_id, episodes = %joined_ids, mode = %mode, "Compare request");

        let retrieval_start = Instant::now();
        let mut summaries = Vec::new();
        for id in episode_ids {
            match self.corpus.report_summary(id).await {
                Ok(Some(summary)) => summaries.push(format!("[{}]\n{}", id, summary)),
                Ok(None) => warn!(trace_id, episode_id = %id, "No stored summary for episode"),
                Err(e) => warn!(trace_id, episode_id = %id, error = %e, "Summary lookup failed"),
            }
        }
        let retrieval_ms = ms(retrieval_start);

        if summaries.is_empty() {
            let checks = QualityChecks {
                error: Some("no_recent_episodes".to_string()),
                ..Default::default()
            };
            return self.assemble(
                &joined_ids,
                mode,
                "I don't have enough past episodes stored to answer that yet.".to_string(),
                trace_id,
                start,
                StageLatency {
                    retrieval_ms,
                    ..Default::default()
                },
                0,
                checks,
                vec![],
                "",
                intent,
            );
        }

        let used_chunks = summaries.len();
        let context = summaries.join("\n\n---\n\n");
        let prompt = prompts::build_compare_prompt(mode, &context, query);

        metrics::record_llm_invocation("compare");
        let llm_start = Instant::now();
        let answer = self.generation.generate(&prompt, &context).await;
        let llm_ms = ms(llm_start);

        let answer = quality::post_process(answer);
        let policy = policy::derive(mode, intent);
        let mut checks = self.final_checks(&answer, &policy, None, false);
        // Summaries carry no persona template; structure is not enforced here
        checks.structure_ok = None;

        self.assemble(
            &joined_ids,
            mode,
            answer,
            trace_id,
            start,
            StageLatency {
                retrieval_ms,
                llm_ms,
                critic_ms: 0.0,
            },
            used_chunks,
            checks,
            vec![],
            &context,
            intent,
        )
    }

    fn build_prompt(
        &self,
        request: &AnswerRequest,
        policy: &AnswerPolicy,
        intent: Intent,
        context: &str,
    ) -> String {
        let profile_context = request
            .user_profile
            .as_ref()
            .map(UserProfile::prompt_context)
            .unwrap_or_default();

        let inputs = PromptInputs {
            context,
            question: &request.query,
            conversation_history: request.conversation_history.as_deref().unwrap_or(""),
            user_profile_context: &profile_context,
            policy,
            intent_hint: prompts::intent_hint(request.mode, intent),
        };

        prompts::build_answer_prompt(request.mode, &inputs)
    }

    fn final_checks(
        &self,
        answer: &str,
        policy: &AnswerPolicy,
        grounded: Option<bool>,
        grounding_failed: bool,
    ) -> QualityChecks {
        let mut checks = if quality::is_generation_fallback(answer) {
            QualityChecks {
                error: Some("Timeout or generation error, returned fallback".to_string()),
                ..Default::default()
            }
        } else {
            quality::validate(answer, policy)
        };
        checks.grounded = grounded;
        checks.grounding_failed = grounding_failed;
        checks
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        episode_id: &str,
        mode: PersonaMode,
        answer: String,
        trace_id: String,
        start: Instant,
        stage_latency: StageLatency,
        used_chunks: usize,
        quality_checks: QualityChecks,
        source_papers: Vec<String>,
        context: &str,
        intent: Intent,
    ) -> AnswerEnvelope {
        let latency_ms = ms(start);
        metrics::record_answer(start.elapsed().as_secs_f64(), mode.as_str(), intent.as_str());

        info!(
            trace_id,
            latency_ms,
            used_chunks,
            intent = intent.as_str(),
            "Answer assembled"
        );

        AnswerEnvelope {
            episode_id: episode_id.to_string(),
            mode,
            metadata: AnswerMetadata {
                trace_id,
                latency_ms,
                stage_latency,
                used_chunks,
                quality_checks,
                source_papers,
                tokens_in: estimate_tokens(context),
                tokens_out: estimate_tokens(&answer),
                model: self.generation.model_name().to_string(),
                question_type: intent.as_str().to_string(),
                suggested_followups: prompts::suggested_followups(mode)
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            answer,
        }
    }

    fn context_text(results: &[FusedResult]) -> String {
        results
            .iter()
            .map(FusedResult::text)
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    /// Distinct source paper titles in first-seen order
    fn source_papers(results: &[FusedResult]) -> Vec<String> {
        let mut papers: Vec<String> = Vec::new();
        for result in results {
            let title = result.chunk.citation_title().to_string();
            if !papers.contains(&title) {
                papers.push(title);
            }
        }
        papers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kochi_common::corpus::InMemoryCorpus;
    use kochi_common::errors::Result;
    use kochi_common::models::{Chunk, SourceType};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns scripted replies in order; repeats the last one when the
    /// script runs dry. Counts invocations for the retry-bound property.
    struct ScriptedLlm {
        replies: Mutex<VecDeque<String>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedLlm {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                replies: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
                delay: Some(delay),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedLlm {
        async fn invoke(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let mut replies = self.replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap_or_default()
            };
            Ok(reply)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn chunk(title: Option<&str>, seq: i32, text: &str) -> Chunk {
        Chunk {
            episode_id: "ep-1".into(),
            text: text.into(),
            source_type: SourceType::PaperSection,
            paper_title: title.map(String::from),
            priority: 1,
            sequence_index: seq,
            time_start: None,
            time_end: None,
        }
    }

    fn corpus() -> Arc<InMemoryCorpus> {
        Arc::new(
            InMemoryCorpus::new(vec![
                chunk(Some("Kandinsky 5.0"), 0, "Kandinsky 5.0 renders images in real time."),
                chunk(Some("Kandinsky 5.0"), 1, "The model uses a distilled latent decoder."),
                chunk(None, 0, "Today's episode covers fast image generation."),
            ])
            .with_summary("ep-1", "Fast image generation day.")
            .with_summary("ep-2", "Retrieval quality day."),
        )
    }

    fn orchestrator(llm: Arc<ScriptedLlm>) -> AnswerOrchestrator {
        AnswerOrchestrator::new(corpus(), llm, &AppConfig::default())
    }

    fn request(query: &str, mode: PersonaMode) -> AnswerRequest {
        AnswerRequest {
            episode_id: "ep-1".into(),
            mode,
            query: query.into(),
            conversation_history: None,
            user_profile: None,
        }
    }

    const GROUNDED: &str =
        r#"{"grounded": true, "structure_ok": true, "has_citation": true, "issues": []}"#;
    const NOT_GROUNDED: &str =
        r#"{"grounded": false, "structure_ok": true, "has_citation": true, "issues": ["invented claim"]}"#;

    #[tokio::test]
    async fn test_guardrail_refuses_without_model_call() {
        let llm = Arc::new(ScriptedLlm::new(&["should never be used"]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request(
                "How do I implement SDXL from this episode?",
                PersonaMode::EngineerAngle,
            ))
            .await;

        assert_eq!(envelope.answer, INSUFFICIENT_MSG);
        assert!(envelope.metadata.quality_checks.hallucination_guardrail_triggered);
        assert_eq!(envelope.metadata.quality_checks.grounded, Some(false));
        assert_eq!(
            envelope.metadata.quality_checks.reason.as_deref(),
            Some("sdxl not in episode papers")
        );
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_guardrail_allows_on_episode_topics() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "## Core Principle\nKandinsky renders in real time. [Kandinsky 5.0]",
            GROUNDED,
        ]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request(
                "Compare Kandinsky 5.0 to the baseline in the episode",
                PersonaMode::EngineerAngle,
            ))
            .await;

        assert_ne!(envelope.answer, INSUFFICIENT_MSG);
        assert!(!envelope.metadata.quality_checks.hallucination_guardrail_triggered);
    }

    #[tokio::test]
    async fn test_relaxed_intent_skips_critic() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "Today on Kochi we looked at fast image generation. Think of it like a \
             sketch artist who already knows the scene by heart and only fills in details.",
        ]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request(
                "why does this matter? explain it simply",
                PersonaMode::PlainEnglish,
            ))
            .await;

        // Only the generation call; no critic for relaxed intents
        assert_eq!(llm.call_count(), 1);
        assert!(envelope.answer.contains("Today on Kochi"));
        assert!(envelope.metadata.quality_checks.grounded.is_none());
    }

    #[tokio::test]
    async fn test_relaxed_intent_accepts_even_if_critic_would_fail() {
        // The scripted critique would say not grounded; it must never run
        let llm = Arc::new(ScriptedLlm::new(&["A conversational answer.", NOT_GROUNDED]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request("explain why this works", PersonaMode::PlainEnglish))
            .await;

        assert_eq!(envelope.answer, "A conversational answer.");
        assert_eq!(llm.call_count(), 1);
        assert!(!envelope.metadata.quality_checks.grounding_failed);
    }

    #[tokio::test]
    async fn test_strict_intent_accepts_grounded_answer() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "## Core Principle\nGrounded answer. [Kandinsky 5.0]",
            GROUNDED,
        ]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request(
                "compare the decoder against the baseline",
                PersonaMode::EngineerAngle,
            ))
            .await;

        assert_eq!(llm.call_count(), 2);
        assert_eq!(envelope.metadata.quality_checks.grounded, Some(true));
        assert!(!envelope.metadata.quality_checks.grounding_failed);
    }

    #[tokio::test]
    async fn test_double_grounding_failure_collapses_to_refusal() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "First answer with invented claims. [Kandinsky 5.0]",
            NOT_GROUNDED,
            "Retry answer, still invented. [Kandinsky 5.0]",
            NOT_GROUNDED,
        ]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request(
                "compare the decoder against the baseline",
                PersonaMode::EngineerAngle,
            ))
            .await;

        assert_eq!(envelope.answer, INSUFFICIENT_MSG);
        assert!(envelope.metadata.quality_checks.grounding_failed);
        assert_eq!(envelope.metadata.quality_checks.grounded, Some(false));
        // Retry bound: never more than four model invocations
        assert_eq!(llm.call_count(), 4);
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_second_critique() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "First answer. [Kandinsky 5.0]",
            NOT_GROUNDED,
            "Wider-context answer. [Kandinsky 5.0]",
            GROUNDED,
        ]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request(
                "compare the decoder against the baseline",
                PersonaMode::EngineerAngle,
            ))
            .await;

        assert_eq!(envelope.answer, "Wider-context answer. [Kandinsky 5.0]");
        assert!(!envelope.metadata.quality_checks.grounding_failed);
        assert_eq!(llm.call_count(), 4);
    }

    #[tokio::test]
    async fn test_malformed_critique_counts_as_not_grounded() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "First answer. [Kandinsky 5.0]",
            "I think it looks fine!",
            "Retry answer. [Kandinsky 5.0]",
            "Still no JSON from me.",
        ]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request(
                "compare the decoder against the baseline",
                PersonaMode::EngineerAngle,
            ))
            .await;

        assert_eq!(envelope.answer, INSUFFICIENT_MSG);
        assert!(envelope.metadata.quality_checks.grounding_failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_timeout_marks_error_state() {
        let llm = Arc::new(ScriptedLlm::slow(Duration::from_secs(120)));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request("give me a summary of the episode", PersonaMode::PlainEnglish))
            .await;

        assert!(envelope.answer.starts_with("I apologize"));
        assert!(envelope.metadata.quality_checks.error.is_some());
        assert!(envelope.metadata.quality_checks.has_substance.is_none());
    }

    #[tokio::test]
    async fn test_learning_mode_single_call() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "[Easy] 1. What does Kandinsky 5.0 do? A) renders images B) plays chess",
        ]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .answer(request("Quiz me on this episode.", PersonaMode::PlainEnglish))
            .await;

        assert_eq!(llm.call_count(), 1);
        assert_eq!(envelope.metadata.question_type, "quiz_me");
        assert!(envelope.answer.contains("[Easy]"));
    }

    #[tokio::test]
    async fn test_compare_is_single_pass_over_summaries() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "Across the two days the focus shifted from generation speed to retrieval quality.",
        ]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .compare(
                &["ep-1".to_string(), "ep-2".to_string()],
                PersonaMode::PlainEnglish,
                "what changed between these episodes?",
            )
            .await;

        assert_eq!(llm.call_count(), 1);
        assert_eq!(envelope.episode_id, "ep-1,ep-2");
        assert_eq!(envelope.metadata.used_chunks, 2);
        assert!(envelope.metadata.quality_checks.structure_ok.is_none());
    }

    #[tokio::test]
    async fn test_compare_without_summaries_refuses() {
        let llm = Arc::new(ScriptedLlm::new(&["unused"]));
        let orch = orchestrator(llm.clone());

        let envelope = orch
            .compare(
                &["missing-1".to_string(), "missing-2".to_string()],
                PersonaMode::PlainEnglish,
                "what changed?",
            )
            .await;

        assert_eq!(llm.call_count(), 0);
        assert!(envelope.answer.contains("don't have enough past episodes"));
        assert_eq!(
            envelope.metadata.quality_checks.error.as_deref(),
            Some("no_recent_episodes")
        );
    }

    #[tokio::test]
    async fn test_envelope_metadata_is_complete() {
        let llm = Arc::new(ScriptedLlm::new(&["An answer. [Kandinsky 5.0]", GROUNDED]));
        let orch = orchestrator(llm);

        let envelope = orch
            .answer(request(
                "compare the decoder against the baseline",
                PersonaMode::EngineerAngle,
            ))
            .await;

        assert_eq!(envelope.episode_id, "ep-1");
        assert_eq!(envelope.mode, PersonaMode::EngineerAngle);
        assert!(!envelope.metadata.trace_id.is_empty());
        assert_eq!(envelope.metadata.model, "scripted");
        assert_eq!(envelope.metadata.question_type, "compare");
        assert!(!envelope.metadata.suggested_followups.is_empty());
        assert!(envelope.metadata.used_chunks > 0);
        assert!(envelope.metadata.tokens_out > 0);
        assert!(envelope
            .metadata
            .source_papers
            .contains(&"Kandinsky 5.0".to_string()));
    }

    #[tokio::test]
    async fn test_padded_refusal_collapses_in_post_process() {
        let padded = format!("{} Sorry!", INSUFFICIENT_MSG);
        let llm = Arc::new(ScriptedLlm::new(&[padded.as_str()]));
        let orch = orchestrator(llm);

        let envelope = orch
            .answer(request("give me a summary of the episode", PersonaMode::PlainEnglish))
            .await;

        assert_eq!(envelope.answer, INSUFFICIENT_MSG);
    }
}
