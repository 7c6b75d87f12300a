//! Error types for the FINNY agent service

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, FinnyError>;

#[derive(Error, Debug)]
pub enum FinnyError {

    // =============================
    // Collaborator Errors
    // =============================

    #[error("Voice generation error: {0}")]
    VoiceError(String),

    #[error("Email dispatch error: {0}")]
    EmailError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    // =============================
    // Request / Lookup Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FinnyError {
    /// True when the failure came from a third-party collaborator
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            FinnyError::VoiceError(_)
                | FinnyError::EmailError(_)
                | FinnyError::LlmError(_)
                | FinnyError::HttpError(_)
        )
    }
}
