//! Episode companion handlers
//!
//! Thin mapping from HTTP payloads onto the answer pipeline: validation,
//! persona resolution (including `mode: "auto"`), and envelope passthrough.

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use kochi_answer::intent;
use kochi_answer::orchestrator::AnswerRequest;
use kochi_answer::AnswerEnvelope;
use kochi_common::errors::{AppError, Result};
use kochi_common::models::{PersonaMode, UserProfile};

/// Request payload for the episode companion
#[derive(Debug, Deserialize, Validate)]
pub struct CompanionQueryRequest {
    /// User's natural language query
    #[validate(length(min = 1, max = 2000))]
    pub message: String,

    /// Episode ID like "ai-research-daily-2025-11-20"
    #[validate(length(min = 1, max = 128))]
    pub episode_id: String,

    /// Persona mode, or "auto" (default) to infer from the question
    pub mode: Option<String>,

    /// Prior turns, formatted by the conversation store; opaque text here
    pub conversation_history: Option<String>,

    /// Optional listener hints (role, domain, stack)
    pub user_profile: Option<UserProfile>,
}

/// Request payload for cross-episode comparison
#[derive(Debug, Deserialize, Validate)]
pub struct CompanionCompareRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,

    /// Episodes to compare, newest first
    #[validate(length(min = 2, max = 10))]
    pub episode_ids: Vec<String>,

    pub mode: Option<String>,
}

/// Resolve an optional mode string, inferring the persona from the question
/// for `"auto"` or omission. Unknown modes are a caller-contract violation.
fn resolve_mode(mode: Option<&str>, query: &str) -> Result<PersonaMode> {
    match mode {
        None | Some("auto") => Ok(intent::infer_persona(intent::classify(query))),
        Some(explicit) => explicit.parse(),
    }
}

/// Answer a question about one episode
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<CompanionQueryRequest>,
) -> Result<Json<AnswerEnvelope>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let mode = resolve_mode(request.mode.as_deref(), &request.message)?;

    let envelope = state
        .orchestrator
        .answer(AnswerRequest {
            episode_id: request.episode_id,
            mode,
            query: request.message,
            conversation_history: request.conversation_history,
            user_profile: request.user_profile,
        })
        .await;

    Ok(Json(envelope))
}

/// Compare several episodes using stored report summaries
pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompanionCompareRequest>,
) -> Result<Json<AnswerEnvelope>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let mode = resolve_mode(request.mode.as_deref(), &request.message)?;

    let envelope = state
        .orchestrator
        .compare(&request.episode_ids, mode, &request.message)
        .await;

    Ok(Json(envelope))
}
