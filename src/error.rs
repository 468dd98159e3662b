//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Step and pipeline failures have their own taxonomy in
//! [`crate::pipeline::StepError`]; this type covers infrastructure around them.

use crate::pipeline::PipelineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("AI provider returned status {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl Error {
    /// Whether a provider call that failed this way is worth repeating.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::ProviderStatus { status, .. } => *status == 429 || *status >= 500,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
