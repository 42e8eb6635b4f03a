//! Server configuration read from the environment.
//!
//! Values are read once at startup and injected into the components that
//! need them; nothing reads the environment at request time.
//!
//! - `HOST` / `PORT`: bind address (default `127.0.0.1:3000`)
//! - `GEMINI_API_KEY`: model credential; requests fail with a 500 without it
//! - `GEMINI_MODEL`: model name (default `gemini-1.5-flash-latest`)
//! - `GEMINI_API_URL`: API base URL
//! - `MODEL_TIMEOUT_SECS`: per-request HTTP timeout (default 60)
//! - `MODEL_DEADLINE_SECS`: bound on the whole model call, retries included (default 120)
//! - `MODEL_MAX_RETRIES`: retries for transient failures (default 0)
//! - `PLAN_EXTRACTION`: `brace-span` or `balanced` (default `brace-span`)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm::RetryConfig;
use crate::plan::ExtractionStrategy;

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub model: ModelConfig,
    pub extraction: ExtractionStrategy,
}

/// Settings for the model backend.
#[derive(Clone)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub request_timeout: Duration,
    pub deadline: Duration,
    pub retry: RetryConfig,
}

// Keep the API key out of logs.
impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("request_timeout", &self.request_timeout)
            .field("deadline", &self.deadline)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let deadline = Duration::from_secs(parse_or(&get, "MODEL_DEADLINE_SECS", 120u64)?);
        let retry = RetryConfig {
            max_retry_duration: deadline,
            ..RetryConfig::default()
        }
        .with_max_retries(parse_or(&get, "MODEL_MAX_RETRIES", 0u32)?);

        let extraction = match get("PLAN_EXTRACTION") {
            Some(raw) => raw
                .parse::<ExtractionStrategy>()
                .map_err(anyhow::Error::msg)
                .context("invalid PLAN_EXTRACTION")?,
            None => ExtractionStrategy::default(),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 3000u16)?,
            model: ModelConfig {
                api_key: get("GEMINI_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                api_url: get("GEMINI_API_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
                request_timeout: Duration::from_secs(parse_or(&get, "MODEL_TIMEOUT_SECS", 60u64)?),
                deadline,
                retry,
            },
            extraction,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.model.api_key.is_none());
        assert_eq!(config.model.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.model.request_timeout, Duration::from_secs(60));
        assert_eq!(config.model.retry.max_retries, 0);
        assert_eq!(config.extraction, ExtractionStrategy::BraceSpan);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("GEMINI_API_KEY", "abc"),
            ("MODEL_MAX_RETRIES", "2"),
            ("MODEL_DEADLINE_SECS", "30"),
            ("PLAN_EXTRACTION", "balanced"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.model.api_key.as_deref(), Some("abc"));
        assert_eq!(config.model.retry.max_retries, 2);
        assert_eq!(config.model.retry.max_retry_duration, Duration::from_secs(30));
        assert_eq!(config.model.deadline, Duration::from_secs(30));
        assert_eq!(config.extraction, ExtractionStrategy::Balanced);
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config = config_from(&[("GEMINI_API_KEY", "  ")]).unwrap();
        assert!(config.model.api_key.is_none());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("MODEL_TIMEOUT_SECS", "-1")]).is_err());
        assert!(config_from(&[("PLAN_EXTRACTION", "regex")]).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = config_from(&[("GEMINI_API_KEY", "super-secret")]).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
