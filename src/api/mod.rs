//! HTTP API for plan generation.
//!
//! - `POST /generate-plan` (also `/functions/v1/generate-plan`)
//! - `GET /api/health`

mod error;
mod routes;
pub mod types;

pub use error::ApiError;
pub use routes::{build_router, serve, AppState};
