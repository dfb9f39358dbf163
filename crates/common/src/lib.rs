//! Kochi Common Library
//!
//! Shared code for the Kochi episode companion services including:
//! - Domain models (chunks, personas, user profiles)
//! - Corpus access abstraction
//! - Language model client abstraction
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod corpus;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod models;

// Re-export commonly used types
pub use config::AppConfig;
pub use corpus::CorpusStore;
pub use errors::{AppError, Result};
pub use llm::LanguageModel;
pub use models::{Chunk, ChunkKey, PersonaMode, SourceType, UserProfile};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default language model
pub const DEFAULT_LLM_MODEL: &str = "qwen2.5:7b-instruct";
