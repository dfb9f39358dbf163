//! Bounded-time answer generation
//!
//! Wraps every answer-producing model call in a hard wall-clock timeout and
//! converts timeout/error outcomes into fixed fallback strings embedding a
//! prefix of the raw context. The orchestrator always gets *some* string to
//! post-process; neither failure class escapes this stage.

use kochi_common::llm::LanguageModel;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Marker prefix of the timeout fallback; post-processing keys on it
pub const TIMEOUT_FALLBACK_MARKER: &str = "I apologize";

/// Marker prefix of the generation-error fallback
pub const ERROR_FALLBACK_MARKER: &str = "I'm having trouble";

/// Characters of raw context embedded into a fallback reply
const FALLBACK_CONTEXT_CHARS: usize = 500;

/// Assembles nothing itself; takes a finished prompt and invokes the model
/// under a deadline.
pub struct GenerationStage {
    llm: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl GenerationStage {
    pub fn new(llm: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Model identifier for metadata
    pub fn model_name(&self) -> &str {
        self.llm.name()
    }

    /// Invoke the model with the prompt; on timeout or failure return the
    /// fixed fallback embedding a truncated prefix of `context`.
    pub async fn generate(&self, prompt: &str, context: &str) -> String {
        match tokio::time::timeout(self.timeout, self.llm.invoke(prompt)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                error!(error = %e, "LLM generation failed");
                format!(
                    "{} generating a response. Here's what I found in the episode:\n\n{}...",
                    ERROR_FALLBACK_MARKER,
                    truncate_chars(context, FALLBACK_CONTEXT_CHARS)
                )
            }
            Err(_) => {
                error!(timeout_secs = self.timeout.as_secs(), "LLM generation timed out");
                format!(
                    "{}, but I'm experiencing high response times right now. \
                     Based on the episode content, here's a brief summary:\n\n{}...",
                    TIMEOUT_FALLBACK_MARKER,
                    truncate_chars(context, FALLBACK_CONTEXT_CHARS)
                )
            }
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kochi_common::errors::{AppError, Result};

    struct SlowLlm;

    #[async_trait]
    impl LanguageModel for SlowLlm {
        async fn invoke(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LanguageModel for FailingLlm {
        async fn invoke(&self, _prompt: &str) -> Result<String> {
            Err(AppError::Llm {
                message: "boom".into(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct EchoLlm;

    #[async_trait]
    impl LanguageModel for EchoLlm {
        async fn invoke(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo: {}", prompt))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_successful_generation_passes_through() {
        let stage = GenerationStage::new(Arc::new(EchoLlm), Duration::from_secs(60));
        let answer = stage.generate("prompt body", "context").await;
        assert_eq!(answer, "echo: prompt body");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_apology_with_context_prefix() {
        let stage = GenerationStage::new(Arc::new(SlowLlm), Duration::from_millis(50));
        let context = "c".repeat(800);

        let answer = stage.generate("prompt", &context).await;
        assert!(answer.starts_with(TIMEOUT_FALLBACK_MARKER));
        // Embeds exactly the first 500 characters of context
        assert!(answer.contains(&"c".repeat(500)));
        assert!(!answer.contains(&"c".repeat(501)));
    }

    #[tokio::test]
    async fn test_error_returns_trouble_fallback() {
        let stage = GenerationStage::new(Arc::new(FailingLlm), Duration::from_secs(60));
        let answer = stage.generate("prompt", "episode context here").await;
        assert!(answer.starts_with(ERROR_FALLBACK_MARKER));
        assert!(answer.contains("episode context here"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld".repeat(100);
        let truncated = truncate_chars(&text, 500);
        assert_eq!(truncated.chars().count(), 500);
    }
}
