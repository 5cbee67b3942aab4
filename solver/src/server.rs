//! Axum HTTP server: stateless endpoints over the non-crossing solvers.
//!
//! Every request carries its own boundary; the only shared state is the
//! [`ServerConfig`]. Solves run on tokio's blocking pool so that a large n
//! does not stall the async workers.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/two_sided` | Two-sided non-crossing probability |
//! | POST | `/one_sided` | One-sided (lower or upper) non-crossing probability |
//! | POST | `/poisson` | Non-crossing probability of a Poisson process |
//! | GET | `/mn_plus/cdf` | Pr[Mₙ⁺ < x] |
//! | GET | `/mn_plus/threshold` | Level-α threshold of Mₙ⁺ |

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error};

use crate::berk_jones::{mn_plus_cdf, mn_plus_threshold};
use crate::error::CrossprobError;
use crate::one_sided::{one_sided_lower, one_sided_upper};
use crate::two_sided::{poisson_noncrossing, two_sided_noncrossing};
use crate::types::{OneSidedVariant, TwoSidedAlgorithm};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Requests with a larger n are refused with 413.
    pub max_n: usize,
}

pub type AppState = Arc<ServerConfig>;

type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)>;

pub fn create_router(config: ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health_check))
        .route("/two_sided", post(handle_two_sided))
        .route("/one_sided", post(handle_one_sided))
        .route("/poisson", post(handle_poisson))
        .route("/mn_plus/cdf", get(handle_mn_plus_cdf))
        .route("/mn_plus/threshold", get(handle_mn_plus_threshold))
        .layer(cors)
        .with_state(Arc::new(config))
}

// ── Request/Response types ──────────────────────────────────────────

#[derive(Deserialize)]
struct TwoSidedRequest {
    lower: Vec<f64>,
    upper: Vec<f64>,
    #[serde(default = "default_algorithm")]
    algorithm: TwoSidedAlgorithm,
}

fn default_algorithm() -> TwoSidedAlgorithm {
    TwoSidedAlgorithm::Fft
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum Side {
    Lower,
    Upper,
}

#[derive(Deserialize)]
struct OneSidedRequest {
    bound: Vec<f64>,
    side: Side,
    #[serde(default = "default_variant")]
    variant: OneSidedVariant,
}

fn default_variant() -> OneSidedVariant {
    OneSidedVariant::New
}

#[derive(Deserialize)]
struct PoissonRequest {
    intensity: f64,
    #[serde(default)]
    lower_steps: Vec<f64>,
    #[serde(default)]
    upper_steps: Vec<f64>,
    #[serde(default = "default_algorithm")]
    algorithm: TwoSidedAlgorithm,
    #[serde(default)]
    endpoint: Option<usize>,
}

#[derive(Deserialize)]
struct MnPlusCdfQuery {
    n: usize,
    x: f64,
}

#[derive(Deserialize)]
struct MnPlusThresholdQuery {
    n: usize,
    alpha: f64,
}

fn error_response(status: StatusCode, msg: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": msg })))
}

fn check_size(config: &ServerConfig, n: usize) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    if n > config.max_n {
        return Err(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            &format!("n = {n} exceeds the server limit of {}", config.max_n),
        ));
    }
    Ok(())
}

/// Run a solve on the blocking pool and map its error to a response.
async fn run_solver<T, F>(f: F) -> Result<T, (StatusCode, Json<serde_json::Value>)>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CrossprobError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) if e.is_invalid_input() => {
            debug!(error = %e, "rejected request");
            Err(error_response(StatusCode::BAD_REQUEST, &e.to_string()))
        }
        Ok(Err(e)) => {
            error!(error = %e, "solver failed");
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))
        }
        Err(e) => {
            error!(error = %e, "solver task panicked");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "solver task failed",
            ))
        }
    }
}

// ── GET handlers ────────────────────────────────────────────────────

async fn handle_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn handle_mn_plus_cdf(
    State(config): State<AppState>,
    Query(params): Query<MnPlusCdfQuery>,
) -> ApiResult {
    check_size(&config, params.n)?;
    let MnPlusCdfQuery { n, x } = params;
    let cdf = run_solver(move || mn_plus_cdf(n, x)).await?;
    Ok(Json(serde_json::json!({ "n": n, "x": x, "cdf": cdf })))
}

async fn handle_mn_plus_threshold(
    State(config): State<AppState>,
    Query(params): Query<MnPlusThresholdQuery>,
) -> ApiResult {
    check_size(&config, params.n)?;
    let MnPlusThresholdQuery { n, alpha } = params;
    let result = run_solver(move || mn_plus_threshold(n, alpha)).await?;
    Ok(Json(serde_json::json!(result)))
}

// ── POST handlers ───────────────────────────────────────────────────

async fn handle_two_sided(
    State(config): State<AppState>,
    Json(req): Json<TwoSidedRequest>,
) -> ApiResult {
    check_size(&config, req.lower.len().max(req.upper.len()))?;
    let n = req.lower.len();
    let algorithm = req.algorithm;
    let p = run_solver(move || two_sided_noncrossing(&req.lower, &req.upper, algorithm)).await?;
    Ok(Json(serde_json::json!({
        "n": n,
        "algorithm": algorithm,
        "noncrossing_probability": p,
        "crossing_probability": 1.0 - p,
    })))
}

async fn handle_one_sided(
    State(config): State<AppState>,
    Json(req): Json<OneSidedRequest>,
) -> ApiResult {
    check_size(&config, req.bound.len())?;
    let n = req.bound.len();
    let (side, variant) = (req.side, req.variant);
    let bound = req.bound;
    let p = run_solver(move || match side {
        Side::Lower => one_sided_lower(&bound, variant),
        Side::Upper => one_sided_upper(&bound, variant),
    })
    .await?;
    let side_name = match side {
        Side::Lower => "lower",
        Side::Upper => "upper",
    };
    Ok(Json(serde_json::json!({
        "n": n,
        "side": side_name,
        "variant": variant,
        "noncrossing_probability": p,
        "crossing_probability": 1.0 - p,
    })))
}

async fn handle_poisson(
    State(config): State<AppState>,
    Json(req): Json<PoissonRequest>,
) -> ApiResult {
    check_size(&config, req.lower_steps.len().max(req.upper_steps.len()))?;
    let PoissonRequest {
        intensity,
        lower_steps,
        upper_steps,
        algorithm,
        endpoint,
    } = req;
    let p = run_solver(move || {
        poisson_noncrossing(intensity, &lower_steps, &upper_steps, algorithm, endpoint)
    })
    .await?;
    Ok(Json(serde_json::json!({
        "intensity": intensity,
        "algorithm": algorithm,
        "endpoint": endpoint,
        "noncrossing_probability": p,
        "crossing_probability": 1.0 - p,
    })))
}
