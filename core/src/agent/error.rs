use std::time::Duration;

use thiserror::Error;

/// Typed failures surfaced by capability providers.
///
/// Providers must return one of these rather than an opaque error; the
/// engine's retry policy keys off the variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("authentication required: {0}")]
    AuthRequired(String),

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Provider hint for when the next attempt may succeed.
        retry_after: Option<Duration>,
    },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("permanent failure: {0}")]
    Permanent(String),
}

impl AgentError {
    /// Transient subtypes are eligible for bounded retry with backoff;
    /// everything else fails the task on first occurrence.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient(_))
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Stable identifier for reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthRequired(_) => "auth_required",
            Self::RateLimited { .. } => "rate_limited",
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::Transient(_) => "transient",
            Self::Permanent(_) => "permanent",
        }
    }
}
