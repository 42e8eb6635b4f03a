//! Error classification and retry policy for model calls.

use std::fmt;
use std::time::Duration;

/// Broad category of a model call failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// No API key was configured for the provider.
    NotConfigured,
    /// Connection refused, DNS failure, reset, etc.
    NetworkError,
    /// The request did not complete in time.
    Timeout,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    ServerError,
    /// HTTP 4xx other than 429.
    ClientError,
    /// The response arrived but did not carry generated text.
    MalformedResponse,
}

impl LlmErrorKind {
    /// Whether a fresh attempt could plausibly succeed.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            LlmErrorKind::NetworkError
                | LlmErrorKind::Timeout
                | LlmErrorKind::RateLimited
                | LlmErrorKind::ServerError
        )
    }
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LlmErrorKind::NotConfigured => "not_configured",
            LlmErrorKind::NetworkError => "network_error",
            LlmErrorKind::Timeout => "timeout",
            LlmErrorKind::RateLimited => "rate_limited",
            LlmErrorKind::ServerError => "server_error",
            LlmErrorKind::ClientError => "client_error",
            LlmErrorKind::MalformedResponse => "malformed_response",
        };
        f.write_str(s)
    }
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        408 => LlmErrorKind::Timeout,
        500..=599 => LlmErrorKind::ServerError,
        _ => LlmErrorKind::ClientError,
    }
}

/// A failed model call.
///
/// `message` is operator-facing and may contain the raw upstream body.
/// `status_text` holds the HTTP reason phrase when there was a response, and
/// is the only piece of upstream detail safe to echo back to callers.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
    pub status_text: Option<String>,
    pub retry_after: Option<Duration>,
}

impl LlmError {
    fn new(kind: LlmErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            status_code: None,
            status_text: None,
            retry_after: None,
        }
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::NotConfigured, message.into())
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::NetworkError, message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Timeout, message.into())
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::MalformedResponse, message.into())
    }

    /// Build an error from a non-2xx HTTP response.
    pub fn from_status(status: u16, reason: Option<&str>, body: String) -> Self {
        Self {
            kind: classify_http_status(status),
            message: body,
            status_code: Some(status),
            status_text: reason.map(str::to_string),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Delay before the next attempt. A server-provided `Retry-After` wins
    /// over exponential backoff.
    pub fn suggested_delay(&self, attempt: u32, config: &RetryConfig) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after.min(config.max_delay);
        }
        let factor = 2u32.saturating_pow(attempt);
        config.base_delay.saturating_mul(factor).min(config.max_delay)
    }
}

/// Retry policy for transient model failures.
///
/// The default performs a single attempt; retries are opt-in.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound on the time spent across all attempts.
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            max_retry_duration: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn should_retry(&self, error: &LlmError) -> bool {
        self.max_retries > 0 && error.kind.is_transient()
    }
}
