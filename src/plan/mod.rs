//! Plan types and the generation pipeline.
//!
//! A [`PlanRequest`] goes through [`prompt`], the model, [`extract`] and
//! [`normalize`]; [`service::PlanService`] sequences the stages.

mod error;
pub mod export;
pub mod extract;
pub mod normalize;
pub mod prompt;
pub mod service;

pub use error::PlanError;
pub use extract::{extract_balanced_json, extract_json, ExtractionStrategy};
pub use normalize::{Clock, FixedClock, Normalizer, SystemClock};
pub use prompt::build_prompt;
pub use service::PlanService;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// How much breakdown the generated plan should contain.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Basic,
    #[default]
    Detailed,
    Comprehensive,
}

impl DetailLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailLevel::Basic => "basic",
            DetailLevel::Detailed => "detailed",
            DetailLevel::Comprehensive => "comprehensive",
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to plan generation.
///
/// Missing or `null` fields deserialize to their defaults; emptiness of
/// `goal` and `timeline` is checked by [`PlanService::handle`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub goal: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timeline: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detail_level: DetailLevel,
}

impl PlanRequest {
    pub fn new(
        goal: impl Into<String>,
        timeline: impl Into<String>,
        detail_level: DetailLevel,
    ) -> Self {
        Self {
            goal: goal.into(),
            timeline: timeline.into(),
            detail_level,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Task priority.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

// Models are inconsistent about casing ("High", "HIGH"). Values outside the
// three levels are dropped by the normalizer before this runs.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A unit of work inside a phase.
///
/// Text fields accept any JSON scalar; numbers and booleans are kept as
/// their JSON text (`3` becomes `"3"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTask {
    #[serde(deserialize_with = "required_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Ids of tasks that must finish first. Not checked for existence or
    /// cycles.
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
}

/// An ordered group of tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPhase {
    #[serde(deserialize_with = "required_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,
    #[serde(default)]
    pub tasks: Vec<ProjectTask>,
}

/// A validated, normalized project plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPlan {
    #[serde(deserialize_with = "required_text")]
    pub id: String,
    pub goal: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub total_estimated_time: Option<String>,
    pub phases: Vec<ProjectPhase>,
    #[serde(deserialize_with = "required_text")]
    pub created_at: String,
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(text_of))
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// A lone scalar becomes a one-element list; `null` entries are skipped.
fn lenient_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(items.into_iter().filter_map(text_of).collect()),
        Some(other) => text_of(other).map(|item| vec![item]),
    })
}

impl ProjectPlan {
    /// Total number of tasks across all phases.
    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }
}
