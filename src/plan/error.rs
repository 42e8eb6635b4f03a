use crate::llm::{LlmError, LlmErrorKind};

/// Every way a plan generation request can fail.
///
/// All variants are terminal for the request; nothing is retried at this
/// level and no partial plan is produced.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Goal and timeline are required")]
    MissingField,

    #[error("model credential not configured: {0}")]
    UpstreamConfig(String),

    #[error("model request failed: {0}")]
    Transport(LlmError),

    #[error("model request timed out: {0}")]
    Timeout(String),

    #[error("invalid response from model: {0}")]
    MalformedUpstreamResponse(String),

    #[error("model output is not valid JSON: {message}")]
    PlanParse { message: String, raw: String },

    #[error("model output is not a valid plan: {0}")]
    PlanStructure(String),
}

impl PlanError {
    pub(crate) fn structure(message: impl Into<String>) -> Self {
        PlanError::PlanStructure(message.into())
    }
}

impl From<LlmError> for PlanError {
    fn from(err: LlmError) -> Self {
        match err.kind {
            LlmErrorKind::NotConfigured => PlanError::UpstreamConfig(err.message),
            // An HTTP 408 is an upstream status like any other non-2xx.
            LlmErrorKind::Timeout if err.status_code.is_none() => PlanError::Timeout(err.message),
            LlmErrorKind::MalformedResponse => PlanError::MalformedUpstreamResponse(err.message),
            LlmErrorKind::Timeout
            | LlmErrorKind::NetworkError
            | LlmErrorKind::RateLimited
            | LlmErrorKind::ServerError
            | LlmErrorKind::ClientError => PlanError::Transport(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_mapping() {
        assert!(matches!(
            PlanError::from(LlmError::not_configured("no key")),
            PlanError::UpstreamConfig(_)
        ));
        assert!(matches!(
            PlanError::from(LlmError::timeout("slow")),
            PlanError::Timeout(_)
        ));
        assert!(matches!(
            PlanError::from(LlmError::malformed_response("no candidates")),
            PlanError::MalformedUpstreamResponse(_)
        ));
        assert!(matches!(
            PlanError::from(LlmError::from_status(500, Some("Internal Server Error"), String::new())),
            PlanError::Transport(_)
        ));
    }

    #[test]
    fn test_upstream_408_is_transport() {
        match PlanError::from(LlmError::from_status(408, Some("Request Timeout"), String::new())) {
            PlanError::Transport(e) => assert_eq!(e.status_code, Some(408)),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
