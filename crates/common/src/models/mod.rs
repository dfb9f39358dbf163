//! Core domain models shared across Kochi services

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// Where a chunk of episode text came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Narrative daily report text
    Report,
    /// Audio transcript segment
    Audio,
    /// A section of a covered paper
    PaperSection,
    /// A short stub for a paper mentioned but not expanded
    PaperStub,
}

/// An immutable unit of retrievable episode text.
///
/// Created once at ingestion time (external); read-only to this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Episode this chunk belongs to
    pub episode_id: String,

    /// Chunk content
    pub text: String,

    /// Source document kind
    pub source_type: SourceType,

    /// Paper title, when the chunk belongs to a specific paper
    pub paper_title: Option<String>,

    /// Ingestion-time curation weight
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Position within the source document
    pub sequence_index: i32,

    /// Seconds into the audio track, when the source is audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<f32>,
}

fn default_priority() -> i32 {
    1
}

impl Chunk {
    /// Identity used for fusion and deduplication: `(paper_title,
    /// sequence_index)` when the title is present, else the first 50
    /// characters of the text.
    pub fn key(&self) -> ChunkKey {
        match &self.paper_title {
            Some(title) => ChunkKey::Titled(title.clone(), self.sequence_index),
            None => ChunkKey::Prefix(self.text.chars().take(50).collect()),
        }
    }

    /// Display title for citations: the paper title, or the episode-level
    /// fallback for report/audio chunks.
    pub fn citation_title(&self) -> &str {
        self.paper_title.as_deref().unwrap_or("Episode Overview")
    }
}

/// Logical chunk identity for fusion and deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChunkKey {
    Titled(String, i32),
    Prefix(String),
}

/// A named answer style/tone profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PersonaMode {
    /// Warm radio-host explanations for a general listener
    PlainEnglish,
    /// Strategic, business-focused takeaways for founders
    FounderTakeaway,
    /// Technical, implementation-focused angle for engineers
    EngineerAngle,
}

impl PersonaMode {
    pub const ALL: [PersonaMode; 3] = [
        PersonaMode::PlainEnglish,
        PersonaMode::FounderTakeaway,
        PersonaMode::EngineerAngle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaMode::PlainEnglish => "plain_english",
            PersonaMode::FounderTakeaway => "founder_takeaway",
            PersonaMode::EngineerAngle => "engineer_angle",
        }
    }
}

impl fmt::Display for PersonaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaMode {
    type Err = AppError;

    /// Parsing an unknown mode is a caller-contract violation, rejected
    /// before retrieval begins.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain_english" => Ok(PersonaMode::PlainEnglish),
            "founder_takeaway" => Ok(PersonaMode::FounderTakeaway),
            "engineer_angle" => Ok(PersonaMode::EngineerAngle),
            other => Err(AppError::InvalidPersonaMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Optional caller-supplied hints woven into the prompt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl UserProfile {
    /// Render the profile as a prompt fragment; empty profiles render empty.
    pub fn prompt_context(&self) -> String {
        let mut parts = Vec::new();
        if let Some(role) = &self.role {
            parts.push(format!("role: {}", role));
        }
        if let Some(domain) = &self.domain {
            parts.push(format!("domain: {}", domain));
        }
        if let Some(stack) = &self.stack {
            parts.push(format!("stack: {}", stack));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("Listener profile ({}).", parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_chunk_key_prefers_title_and_index() {
        let a = chunk(Some("Paper A"), 3, "alpha text");
        let b = chunk(Some("Paper A"), 3, "completely different text");
        assert_eq!(a.key(), b.key());

        let c = chunk(Some("Paper A"), 4, "alpha text");
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_chunk_key_falls_back_to_text_prefix() {
        let long = "x".repeat(80);
        let a = chunk(None, 0, &long);
        match a.key() {
            ChunkKey::Prefix(p) => assert_eq!(p.len(), 50),
            other => panic!("expected prefix key, got {:?}", other),
        }
    }

    #[test]
    fn test_citation_title_fallback() {
        assert_eq!(chunk(None, 0, "report text").citation_title(), "Episode Overview");
        assert_eq!(chunk(Some("Paper A"), 0, "t").citation_title(), "Paper A");
    }

    #[test]
    fn test_persona_mode_round_trip() {
        for mode in PersonaMode::ALL {
            assert_eq!(mode.as_str().parse::<PersonaMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_unknown_persona_rejected() {
        assert!("pirate_mode".parse::<PersonaMode>().is_err());
    }

    #[test]
    fn test_user_profile_prompt_context() {
        let profile = UserProfile {
            role: Some("backend engineer".into()),
            domain: None,
            stack: Some("rust + postgres".into()),
        };
        let ctx = profile.prompt_context();
        assert!(ctx.contains("backend engineer"));
        assert!(ctx.contains("rust + postgres"));
        assert!(UserProfile::default().prompt_context().is_empty());
    }
}
