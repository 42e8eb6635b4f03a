//! Mapping of pipeline failures to HTTP responses.
//!
//! Only sanitized text reaches the response body. Raw model output and
//! upstream bodies are logged where the failure happens.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::types::ErrorResponse;
use crate::plan::PlanError;

const GENERATION_FAILED: &str = "Failed to generate project plan";
const INVALID_STRUCTURE: &str = "Failed to generate valid plan structure";
const INVALID_STRUCTURE_DETAILS: &str = "The AI response could not be parsed as valid JSON";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::MissingField => ApiError::bad_request("Goal and timeline are required"),
            PlanError::UpstreamConfig(_) => ApiError::internal("Gemini API key not configured"),
            PlanError::Transport(e) => {
                let status = e
                    .status_text
                    .or_else(|| e.status_code.map(|c| c.to_string()))
                    .unwrap_or_else(|| "network error".to_string());
                ApiError::internal(GENERATION_FAILED)
                    .with_details(format!("Gemini API error: {}", status))
            }
            PlanError::Timeout(_) => {
                ApiError::internal(GENERATION_FAILED).with_details("Gemini API request timed out")
            }
            PlanError::MalformedUpstreamResponse(_) => {
                ApiError::internal(GENERATION_FAILED).with_details("Invalid response from Gemini API")
            }
            PlanError::PlanParse { .. } | PlanError::PlanStructure(_) => {
                ApiError::internal(INVALID_STRUCTURE).with_details(INVALID_STRUCTURE_DETAILS)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    #[test]
    fn test_status_classes() {
        assert_eq!(ApiError::from(PlanError::MissingField).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(PlanError::UpstreamConfig("no key".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(PlanError::PlanStructure("x".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_transport_details_use_status_text_only() {
        let err = PlanError::Transport(LlmError::from_status(
            403,
            Some("Forbidden"),
            "{\"error\":\"secret upstream detail\"}".into(),
        ));
        let api = ApiError::from(err);
        assert_eq!(api.error, GENERATION_FAILED);
        assert_eq!(api.details.as_deref(), Some("Gemini API error: Forbidden"));

        let api = ApiError::from(PlanError::Transport(LlmError::network_error("refused")));
        assert_eq!(api.details.as_deref(), Some("Gemini API error: network error"));
    }

    #[test]
    fn test_upstream_408_keeps_status_text() {
        let err = PlanError::from(LlmError::from_status(408, Some("Request Timeout"), String::new()));
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.details.as_deref(), Some("Gemini API error: Request Timeout"));

        let api = ApiError::from(PlanError::from(LlmError::timeout("deadline")));
        assert_eq!(api.details.as_deref(), Some("Gemini API request timed out"));
    }

    #[test]
    fn test_parse_details_are_sanitized() {
        let api = ApiError::from(PlanError::PlanParse {
            message: "expected value at line 1".into(),
            raw: "raw model text".into(),
        });
        assert_eq!(api.error, INVALID_STRUCTURE);
        assert_eq!(api.details.as_deref(), Some(INVALID_STRUCTURE_DETAILS));
    }
}
