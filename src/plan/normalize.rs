//! Parse, validate and backfill model output into a [`ProjectPlan`].
//!
//! Validation is deliberately minimal: a plan needs a non-empty `goal` and a
//! `phases` array. Everything else is repaired or passed through:
//!
//! - plan `id` → `plan-<unix millis>`
//! - plan `createdAt` → current instant, ISO-8601 UTC
//! - phase `id` → `phase-<n>`
//! - task `id` → `task-<phase n>-<task n>`
//! - task `priority` outside high/medium/low → dropped with a warning
//!
//! Scalar text fields of the wrong JSON type (`"estimatedTime": 3`) are
//! kept as text rather than rejected.
//!
//! Positional ids only depend on ordering, so normalizing the same structure
//! twice with the same clock yields identical output. Ids supplied by the
//! model are kept even when they collide.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::{PlanError, Priority, ProjectPlan};

/// Source of the current time for backfilled ids and timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Turns extracted model text into a [`ProjectPlan`].
#[derive(Clone)]
pub struct Normalizer {
    clock: Arc<dyn Clock>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Parse `text` as JSON and normalize it.
    pub fn normalize(&self, text: &str) -> Result<ProjectPlan, PlanError> {
        let value: Value = serde_json::from_str(text).map_err(|e| PlanError::PlanParse {
            message: e.to_string(),
            raw: text.to_string(),
        })?;
        self.normalize_value(value)
    }

    /// Validate and backfill an already-parsed plan.
    pub fn normalize_value(&self, mut value: Value) -> Result<ProjectPlan, PlanError> {
        let plan = value
            .as_object_mut()
            .ok_or_else(|| PlanError::structure("plan is not a JSON object"))?;

        match plan.get("goal") {
            Some(Value::String(goal)) if !goal.is_empty() => {}
            _ => return Err(PlanError::structure("plan has no goal")),
        }
        if !plan.get("phases").is_some_and(Value::is_array) {
            return Err(PlanError::structure("plan has no phases array"));
        }

        let now = self.clock.now();
        backfill_id(plan, || format!("plan-{}", now.timestamp_millis()));
        if is_blank(plan.get("createdAt")) {
            plan.insert(
                "createdAt".to_string(),
                Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }

        let Some(phases) = plan.get_mut("phases").and_then(Value::as_array_mut) else {
            return Err(PlanError::structure("plan has no phases array"));
        };
        for (phase_index, phase) in phases.iter_mut().enumerate() {
            let phase_no = phase_index + 1;
            let phase = phase
                .as_object_mut()
                .ok_or_else(|| PlanError::structure(format!("phase {} is not an object", phase_no)))?;
            backfill_id(phase, || format!("phase-{}", phase_no));

            let tasks = phase
                .entry("tasks")
                .or_insert_with(|| Value::Array(Vec::new()));
            if tasks.is_null() {
                *tasks = Value::Array(Vec::new());
            }
            let tasks = tasks.as_array_mut().ok_or_else(|| {
                PlanError::structure(format!("tasks of phase {} is not an array", phase_no))
            })?;

            for (task_index, task) in tasks.iter_mut().enumerate() {
                let task_no = task_index + 1;
                let task = task.as_object_mut().ok_or_else(|| {
                    PlanError::structure(format!(
                        "task {} of phase {} is not an object",
                        task_no, phase_no
                    ))
                })?;
                backfill_id(task, || format!("task-{}-{}", phase_no, task_no));
                drop_unknown_priority(task, phase_no, task_no);
            }
        }

        serde_json::from_value(value).map_err(|e| PlanError::structure(e.to_string()))
    }
}

/// Missing, `null` and `""` all count as absent.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn drop_unknown_priority(task: &mut Map<String, Value>, phase_no: usize, task_no: usize) {
    let known = match task.get("priority") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.parse::<Priority>().is_ok(),
        Some(_) => false,
    };
    if !known {
        if let Some(priority) = task.remove("priority") {
            tracing::warn!(
                "Dropping unrecognized priority {} on task {} of phase {}",
                priority,
                task_no,
                phase_no
            );
        }
    }
}

/// Fill in `id` when absent; numeric ids become strings.
fn backfill_id(object: &mut Map<String, Value>, fallback: impl FnOnce() -> String) {
    let replacement = match object.get("id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        id if is_blank(id) => Some(fallback()),
        _ => None,
    };
    if let Some(id) = replacement {
        object.insert("id".to_string(), Value::String(id));
    }
}
