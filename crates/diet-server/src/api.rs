//! HTTP API: meal plan recommendations, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use diet_lib::{
    health::HealthRegistry,
    observability::{outcomes, DietMetrics, StructuredLogger},
    DietError, MealPlanner, UserQuery,
};
use prometheus::{Encoder, TextEncoder};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{error, info, warn};

/// Shared application state
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: DietMetrics,
    pub logger: StructuredLogger,
    /// `None` when the labeled dataset could not be loaded at startup
    planner: Option<MealPlanner>,
    rng: Mutex<ChaCha8Rng>,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: DietMetrics,
        logger: StructuredLogger,
        planner: Option<MealPlanner>,
        sampling_seed: Option<u64>,
    ) -> Self {
        let rng = match sampling_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            health_registry,
            metrics,
            logger,
            planner,
            rng: Mutex::new(rng),
        }
    }

    pub fn planner(&self) -> Option<&MealPlanner> {
        self.planner.as_ref()
    }
}

/// Error body for rejected requests
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Errors a handler can turn into an HTTP response
#[derive(Debug)]
pub enum ApiError {
    InvalidQuery(String),
    Unavailable(String),
    Internal { code: &'static str, message: String },
}

impl ApiError {
    fn outcome(&self) -> &'static str {
        match self {
            ApiError::InvalidQuery(_) => outcomes::INVALID_QUERY,
            ApiError::Unavailable(_) | ApiError::Internal { .. } => outcomes::UNAVAILABLE,
        }
    }
}

impl From<DietError> for ApiError {
    fn from(err: DietError) -> Self {
        match err {
            DietError::InvalidQuery(_) => ApiError::InvalidQuery(err.to_string()),
            DietError::ArtifactMissing { .. } => ApiError::Unavailable(err.to_string()),
            other => ApiError::Internal {
                code: other.code(),
                message: other.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidQuery(message) => (StatusCode::BAD_REQUEST, "invalid_query", message),
            ApiError::Unavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, "artifact_missing", message)
            }
            ApiError::Internal { code, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, code, message)
            }
        };
        (status, Json(ErrorResponse { error: message, code })).into_response()
    }
}

/// Build a meal plan for the posted user query
///
/// Insufficient matches are a normal 200 response carrying an `error` field.
async fn recommend(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UserQuery>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let result = build_recommendation(&state, body);
    state
        .metrics
        .observe_recommendation_latency(start.elapsed().as_secs_f64());

    match result {
        Ok(response) => response,
        Err(err) => {
            state.metrics.inc_recommendations(err.outcome());
            match &err {
                ApiError::InvalidQuery(message) => {
                    warn!(error = %message, "Rejected recommendation request")
                }
                ApiError::Unavailable(message) | ApiError::Internal { message, .. } => {
                    error!(error = %message, "Recommendation unavailable")
                }
            }
            err.into_response()
        }
    }
}

fn build_recommendation(
    state: &AppState,
    body: Result<Json<UserQuery>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(query) = body?;
    let planner = state
        .planner()
        .ok_or_else(|| ApiError::Unavailable("Food catalog is not loaded".to_string()))?;

    let recommendation = {
        let mut rng = state.rng.lock().map_err(|_| ApiError::Internal {
            code: "internal",
            message: "Sampling RNG lock poisoned".to_string(),
        })?;
        planner.recommend(&query, &mut *rng)?
    };

    state.logger.log_recommendation(query.age, &recommendation);
    state.metrics.inc_recommendations(if recommendation.is_plan() {
        outcomes::PLAN
    } else {
        outcomes::INSUFFICIENT_DATA
    });

    Ok((StatusCode::OK, Json(recommendation.to_response())).into_response())
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    // Degraded is still operational
    let status_code = if health.status.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/recommend", post(recommend))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
