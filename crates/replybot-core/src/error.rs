//! Error types for the core crate.

use thiserror::Error;

use crate::completion::GenerationError;

/// Errors raised by a content source implementation.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Credentials were rejected or could not be exchanged for a token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The platform answered with an error status or error payload.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code (0 when the error came in a 2xx payload).
        status: u16,
        /// Error message or body.
        message: String,
    },

    /// The platform's response could not be understood.
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// Errors that can occur while running the bot.
#[derive(Error, Debug)]
pub enum BotError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication or history fetch failed before monitoring began.
    #[error("startup failed: {0}")]
    Startup(String),

    /// Pulling from the live stream failed.
    #[error("stream error: {0}")]
    Source(#[from] SourceError),

    /// The text-generation call failed.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The reply could not be submitted.
    #[error("reply submission failed: {0}")]
    Submission(String),

    /// An operator prompt could not be read.
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// The operator interrupted the run.
    #[error("interrupted by operator")]
    Interrupted,
}

impl BotError {
    /// Returns true if this error is an operator interrupt rather than a failure.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, BotError::Interrupted)
    }
}

impl From<replybot_models::ConfigError> for BotError {
    fn from(e: replybot_models::ConfigError) -> Self {
        BotError::Config(e.to_string())
    }
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Result type for content source calls.
pub type SourceResult<T> = std::result::Result<T, SourceError>;
