//! Data shapes exchanged with the Trello export collaborator.
//!
//! Board creation itself happens outside this crate.

use serde::{Deserialize, Serialize};

use super::ProjectPlan;

/// A plan plus the Trello credentials to export it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrelloExportRequest {
    pub plan: ProjectPlan,
    pub api_key: String,
    pub token: String,
}

/// Board created by the export collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrelloBoard {
    pub id: String,
    pub name: String,
    pub url: String,
}
