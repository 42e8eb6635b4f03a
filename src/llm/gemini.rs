//! Gemini `generateContent` client with optional retry for transient errors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::error::{LlmError, RetryConfig};
use super::{GenerationConfig, ModelInvoker, SafetySetting};
use crate::config::ModelConfig;

/// Gemini API client.
///
/// The API key is injected at construction; a client without one answers
/// every call with a `NotConfigured` error.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
    retry_config: RetryConfig,
}

impl GeminiClient {
    /// Create a client from model configuration.
    pub fn new(config: &ModelConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.api_url.trim_end_matches('/'),
                config.model
            ),
            generation_config: GenerationConfig::default(),
            safety_settings: SafetySetting::defaults(),
            retry_config: config.retry.clone(),
        })
    }

    /// Full URL of the `generateContent` endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Parse Retry-After header if present.
    fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Execute a single request without retry.
    async fn execute_request(
        &self,
        api_key: &str,
        request: &GeminiRequest<'_>,
    ) -> Result<String, LlmError> {
        let response = match self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if e.is_timeout() {
                    return Err(LlmError::timeout(format!("Request timeout: {}", e)));
                } else if e.is_connect() {
                    return Err(LlmError::network_error(format!("Connection failed: {}", e)));
                } else {
                    return Err(LlmError::network_error(format!("Request failed: {}", e)));
                }
            }
        };

        let status = response.status();
        let retry_after = Self::parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::error!("Gemini API error ({}): {}", status, body);
            return Err(
                LlmError::from_status(status.as_u16(), status.canonical_reason(), body)
                    .with_retry_after(retry_after),
            );
        }

        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::malformed_response(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        if let Some(usage) = &parsed.usage_metadata {
            tracing::debug!(
                "Gemini usage: prompt={} candidates={} total={}",
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.total_token_count
            );
        }

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::malformed_response("No candidates in response"))?;

        let finish_reason = candidate.finish_reason.unwrap_or_default();
        candidate
            .content
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| {
                LlmError::malformed_response(format!(
                    "Candidate has no text content (finish reason: {})",
                    if finish_reason.is_empty() {
                        "none"
                    } else {
                        finish_reason.as_str()
                    }
                ))
            })
    }

    /// Execute a request, retrying transient failures per the retry policy.
    async fn execute_with_retry(
        &self,
        api_key: &str,
        request: &GeminiRequest<'_>,
    ) -> Result<String, LlmError> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            match self.execute_request(api_key, request).await {
                Ok(text) => {
                    if attempt > 0 {
                        tracing::info!(
                            "Request succeeded after {} retries (total time: {:?})",
                            attempt,
                            start.elapsed()
                        );
                    }
                    return Ok(text);
                }
                Err(error) => {
                    let should_retry = self.retry_config.should_retry(&error)
                        && attempt < self.retry_config.max_retries;

                    if !should_retry {
                        if attempt > 0 {
                            tracing::error!(
                                "Request failed after {} retries (total time: {:?}): {}",
                                attempt,
                                start.elapsed(),
                                error
                            );
                        } else {
                            tracing::error!("Request failed: {}", error);
                        }
                        return Err(error);
                    }

                    let remaining = self
                        .retry_config
                        .max_retry_duration
                        .saturating_sub(start.elapsed());
                    let delay = error
                        .suggested_delay(attempt, &self.retry_config)
                        .min(remaining);

                    if delay.is_zero() {
                        tracing::warn!(
                            "Retry attempt {} failed, no time remaining: {}",
                            attempt + 1,
                            error
                        );
                        return Err(error);
                    }

                    tracing::warn!(
                        "Retry attempt {} failed with {}, retrying in {:?}: {}",
                        attempt + 1,
                        error.kind,
                        delay,
                        error.message
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl ModelInvoker for GeminiClient {
    fn ensure_configured(&self) -> Result<(), LlmError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(LlmError::not_configured("GEMINI_API_KEY is not set")),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::not_configured("GEMINI_API_KEY is not set"))?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: &self.generation_config,
            safety_settings: &self.safety_settings,
        };

        tracing::debug!(
            "Sending request to Gemini: endpoint={} prompt_len={}",
            self.endpoint,
            prompt.len()
        );

        self.execute_with_retry(api_key, &request).await
    }
}

/// Gemini API request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: &'a GenerationConfig,
    safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}
