//! Request handling for plan generation.
//!
//! ```text
//! PlanRequest ─► validate ─► build_prompt ─► ModelInvoker ─► extract ─► normalize ─► ProjectPlan
//! ```
//!
//! One pass, fail-fast: the first error ends the request.

use std::sync::Arc;
use std::time::Duration;

use super::extract::ExtractionStrategy;
use super::normalize::Normalizer;
use super::prompt::build_prompt;
use super::{PlanError, PlanRequest, ProjectPlan};
use crate::llm::ModelInvoker;

/// Upper bound on a model call when none is configured.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(120);

/// Orchestrates a single plan generation.
pub struct PlanService {
    invoker: Arc<dyn ModelInvoker>,
    normalizer: Normalizer,
    extraction: ExtractionStrategy,
    deadline: Duration,
}

impl PlanService {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self {
            invoker,
            normalizer: Normalizer::new(),
            extraction: ExtractionStrategy::default(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_extraction(mut self, extraction: ExtractionStrategy) -> Self {
        self.extraction = extraction;
        self
    }

    /// Bound the whole model invocation, retries included.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Whether the model backend has its credentials.
    pub fn is_configured(&self) -> bool {
        self.invoker.ensure_configured().is_ok()
    }

    /// Generate, validate and normalize a plan.
    pub async fn handle(&self, request: &PlanRequest) -> Result<ProjectPlan, PlanError> {
        if request.goal.trim().is_empty() || request.timeline.trim().is_empty() {
            return Err(PlanError::MissingField);
        }
        self.invoker.ensure_configured()?;

        let prompt = build_prompt(&request.goal, &request.timeline, request.detail_level);
        tracing::debug!(
            "Generating {} plan (prompt {} bytes)",
            request.detail_level,
            prompt.len()
        );

        let raw = match tokio::time::timeout(self.deadline, self.invoker.generate(&prompt)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!("Model call exceeded deadline of {:?}", self.deadline);
                return Err(PlanError::Timeout(format!(
                    "no response within {}s",
                    self.deadline.as_secs()
                )));
            }
        };

        let candidate = self.extraction.extract(&raw);
        match self.normalizer.normalize(candidate) {
            Ok(plan) => {
                tracing::info!(
                    "Generated plan {} with {} phases and {} tasks",
                    plan.id,
                    plan.phases.len(),
                    plan.task_count()
                );
                Ok(plan)
            }
            Err(e) => {
                tracing::error!("Failed to parse model response: {}", e);
                tracing::error!("Raw response: {}", raw);
                Err(e)
            }
        }
    }
}
