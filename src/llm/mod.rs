//! Model client module for generating plan text.
//!
//! This module provides a trait-based abstraction over text-generation
//! providers, with Google Gemini as the implementation used by the service.

mod error;
mod gemini;

pub use error::{classify_http_status, LlmError, LlmErrorKind, RetryConfig};
pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Decoding parameters sent with every generation request.
///
/// These are fixed for the service so the shape of model output stays
/// predictable; they are not exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 4096,
        }
    }
}

/// Content category a safety threshold applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
}

/// Blocking threshold for a harm category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockMediumAndAbove,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Block medium-and-above for harassment, hate speech, sexual and
    /// dangerous content.
    pub fn defaults() -> Vec<SafetySetting> {
        [
            HarmCategory::HarmCategoryHarassment,
            HarmCategory::HarmCategoryHateSpeech,
            HarmCategory::HarmCategorySexuallyExplicit,
            HarmCategory::HarmCategoryDangerousContent,
        ]
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: HarmBlockThreshold::BlockMediumAndAbove,
        })
        .collect()
    }
}

/// Trait for text-generation backends.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Check that the backend has the credentials it needs.
    ///
    /// Called before any prompt is built so a misconfigured server fails
    /// without doing work.
    fn ensure_configured(&self) -> Result<(), LlmError> {
        Ok(())
    }

    /// Send the instruction text and return the raw generated text.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
