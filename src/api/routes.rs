//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use super::error::ApiError;
use super::types::HealthResponse;
use crate::config::Config;
use crate::llm::GeminiClient;
use crate::plan::{PlanRequest, PlanService, ProjectPlan};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub service: PlanService,
}

impl AppState {
    /// Wire the Gemini-backed pipeline from configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let client = GeminiClient::new(&config.model)?;
        let service = PlanService::new(Arc::new(client))
            .with_extraction(config.extraction)
            .with_deadline(config.model.deadline);
        Ok(Self { config, service })
    }
}

/// Build the router. Every `OPTIONS` request is answered by the CORS layer
/// with an empty body before any handler runs.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/generate-plan", post(generate_plan))
        .route("/functions/v1/generate-plan", post(generate_plan))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::from_config(config)?);

    if !state.service.is_configured() {
        tracing::warn!("GEMINI_API_KEY is not set; plan generation requests will fail");
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.model.model.clone(),
        model_configured: state.service.is_configured(),
    })
}

/// Generate a project plan.
async fn generate_plan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<ProjectPlan>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Rejected plan request body: {}", rejection.body_text());
        ApiError::bad_request("Invalid request body").with_details(rejection.body_text())
    })?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("generate_plan", %request_id, detail_level = %request.detail_level);

    async move {
        match state.service.handle(&request).await {
            Ok(plan) => Ok(Json(plan)),
            Err(e) => {
                tracing::error!("Error generating plan: {}", e);
                Err(ApiError::from(e))
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ErrorResponse;
    use crate::llm::{LlmError, ModelInvoker};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct CannedModel {
        text: String,
        configured: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelInvoker for CannedModel {
        fn ensure_configured(&self) -> Result<(), LlmError> {
            if self.configured {
                Ok(())
            } else {
                Err(LlmError::not_configured("no key"))
            }
        }

        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    fn test_config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    fn app_with(text: &str, configured: bool) -> (Router, Arc<CannedModel>) {
        let model = Arc::new(CannedModel {
            text: text.to_string(),
            configured,
            calls: AtomicUsize::new(0),
        });
        let state = Arc::new(AppState {
            config: test_config(),
            service: PlanService::new(model.clone()),
        });
        (build_router(state), model)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const PLAN_TEXT: &str = r#"Here you go:
```json
{"goal":"Build a habit tracker app","timeline":"3 months","totalEstimatedTime":"3 months","phases":[{"title":"Design","description":"d","estimatedDuration":"2 weeks","tasks":[{"title":"Wireframes","description":"d","estimatedTime":"3 days","priority":"high"}]}]}
```"#;

    #[tokio::test]
    async fn test_generate_plan_success() {
        let (app, _) = app_with(PLAN_TEXT, true);
        let response = app
            .oneshot(post_json(
                "/generate-plan",
                r#"{"goal":"Build a habit tracker app","timeline":"3 months","detailLevel":"basic"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let plan: ProjectPlan = read_json(response).await;
        assert!(plan.id.starts_with("plan-"));
        assert_eq!(plan.phases[0].id, "phase-1");
        assert_eq!(plan.phases[0].tasks[0].id, "task-1-1");
    }

    #[tokio::test]
    async fn test_missing_goal_is_400() {
        let (app, model) = app_with(PLAN_TEXT, true);
        let response = app
            .oneshot(post_json(
                "/functions/v1/generate-plan",
                r#"{"goal":"","timeline":"1 month","detailLevel":"basic"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.error, "Goal and timeline are required");
        assert_eq!(body.details, None);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_500() {
        let (app, _) = app_with(PLAN_TEXT, false);
        let response = app
            .oneshot(post_json("/generate-plan", r#"{"goal":"g","timeline":"t"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.error, "Gemini API key not configured");
    }

    #[tokio::test]
    async fn test_unparseable_model_output_is_500() {
        let (app, _) = app_with("Sorry, I can't do that.", true);
        let response = app
            .oneshot(post_json("/generate-plan", r#"{"goal":"g","timeline":"t"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.error, "Failed to generate valid plan structure");
        assert_eq!(
            body.details.as_deref(),
            Some("The AI response could not be parsed as valid JSON")
        );
    }

    #[tokio::test]
    async fn test_invalid_body_is_400() {
        let (app, _) = app_with(PLAN_TEXT, true);
        let response = app
            .oneshot(post_json("/generate-plan", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.error, "Invalid request body");
        assert!(body.details.is_some());
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (app, model) = app_with(PLAN_TEXT, true);
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/generate-plan")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,authorization")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bare_options_is_empty_200() {
        let (app, _) = app_with(PLAN_TEXT, true);
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/generate-plan")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app_with(PLAN_TEXT, false);
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = read_json(response).await;
        assert_eq!(health.status, "ok");
        assert!(!health.model_configured);
    }
}
