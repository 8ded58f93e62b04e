use std::time::Duration;

/// Failure of a single outbound platform call, classified for the retry wrapper.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    /// Server said "too many requests". `retry_after` is the server-directed wait, if any.
    #[error("rate limited by server (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("transient request failure: {0}")]
    Transient(String),

    #[error("permanent request failure: {0}")]
    Permanent(String),
}

impl RequestError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Permanent(_))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid snowflake '{0}': expected an unsigned 64-bit integer")]
pub struct InvalidSnowflake(pub String);
