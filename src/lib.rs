//! # Plan Generator
//!
//! Turns a free-text goal and timeline into a phased project plan using a
//! Gemini model, then validates and normalizes the model output.
//!
//! ## Pipeline
//!
//! ```text
//!   POST /generate-plan
//!          │
//!          ▼
//!   ┌──────────────┐   prompt   ┌──────────────┐  raw text  ┌──────────────┐
//!   │ PlanService  │ ─────────► │ ModelInvoker │ ─────────► │   extract    │
//!   └──────────────┘            │   (Gemini)   │            └──────┬───────┘
//!                               └──────────────┘                   │ JSON
//!                                                                  ▼
//!                                                           ┌──────────────┐
//!                                                           │  normalize   │ ─► ProjectPlan
//!                                                           └──────────────┘
//! ```
//!
//! ## Modules
//! - `api`: axum router, error responses, server bootstrap
//! - `config`: environment configuration
//! - `llm`: model client trait and the Gemini implementation
//! - `plan`: plan types, prompt, extraction, normalization and orchestration

pub mod api;
pub mod config;
pub mod llm;
pub mod plan;

pub use config::Config;
pub use plan::{PlanError, PlanRequest, PlanService, ProjectPlan};
