use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    EnsembleMode, EnsembleOptions, OutcomeSet, RunCount, Scenario, ScenarioBuilder,
    SimulationError, Statistics, Trajectory, first_trajectory, run_ensemble_seeded, summarize,
};
use crate::presenter::{FormattedStatistics, StatisticsPresenter, StatisticsRow};

pub mod cli;

/// Simulation request as received over HTTP or from the command line.
/// Every field is optional; absent scenario fields take the builder defaults.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatePayload {
    pub initial_balance: Option<f64>,
    pub periodic_contribution: Option<f64>,
    pub expected_return_pct: Option<f64>,
    pub volatility_pct: Option<f64>,
    pub duration_periods: Option<i64>,

    pub runs: Option<i64>,
    pub seed: Option<u64>,
    pub parallel: Option<bool>,
    pub reuse_normal_pair: Option<bool>,

    pub include_outcomes: Option<bool>,
    pub include_trajectory: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub scenario: Scenario,
    pub options: EnsembleOptions,
    pub include_outcomes: bool,
    pub include_trajectory: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub scenario: Scenario,
    pub runs: RunCount,
    pub seed: u64,
    pub mode: EnsembleMode,
    pub statistics: Statistics,
    pub formatted_statistics: FormattedStatistics,
    pub rows: Vec<StatisticsRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<OutcomeSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<Trajectory>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, SimulationError> {
    let scenario = ScenarioBuilder::new()
        .maybe_initial_balance(payload.initial_balance)
        .maybe_periodic_contribution(payload.periodic_contribution)
        .maybe_expected_return_pct(payload.expected_return_pct)
        .maybe_volatility_pct(payload.volatility_pct)
        .maybe_duration_periods(payload.duration_periods)
        .build()?;

    let runs = match payload.runs {
        Some(requested) => RunCount::new(requested)?,
        None => RunCount::default(),
    };
    let mode = if payload.parallel.unwrap_or(false) {
        EnsembleMode::Parallel
    } else {
        EnsembleMode::Sequential
    };

    Ok(ApiRequest {
        scenario,
        options: EnsembleOptions {
            runs,
            seed: payload.seed,
            mode,
            reuse_normal_pair: payload.reuse_normal_pair.unwrap_or(false),
        },
        include_outcomes: payload.include_outcomes.unwrap_or(false),
        include_trajectory: payload.include_trajectory.unwrap_or(false),
    })
}

/// Runs the ensemble for a validated request and packages every output form.
pub fn execute(request: &ApiRequest) -> SimulateResponse {
    let seed = request.options.resolved_seed();
    let outcomes = run_ensemble_seeded(&request.scenario, &request.options, seed);
    let statistics = summarize(&outcomes);
    let trajectory = request
        .include_trajectory
        .then(|| first_trajectory(&request.scenario, &request.options, seed));

    build_simulate_response(
        request,
        seed,
        statistics,
        request.include_outcomes.then_some(outcomes),
        trajectory,
    )
}

fn build_simulate_response(
    request: &ApiRequest,
    seed: u64,
    statistics: Statistics,
    outcomes: Option<OutcomeSet>,
    trajectory: Option<Trajectory>,
) -> SimulateResponse {
    let presenter = StatisticsPresenter::new();
    SimulateResponse {
        scenario: request.scenario,
        runs: request.options.runs,
        seed,
        mode: request.options.mode,
        statistics,
        formatted_statistics: presenter.formatted_statistics(&statistics),
        rows: presenter.statistics_rows(&statistics),
        outcomes,
        trajectory,
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "growthsim HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(query: Result<Query<SimulatePayload>, QueryRejection>) -> Response {
    match query {
        Ok(Query(payload)) => simulate_handler_impl(payload).await,
        Err(rejection) => malformed_payload_response(&rejection.body_text()),
    }
}

async fn simulate_post_handler(body: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    match body {
        Ok(Json(payload)) => simulate_handler_impl(payload).await,
        Err(rejection) => malformed_payload_response(&rejection.body_text()),
    }
}

/// Every extractor failure (bad syntax, wrong type, missing content type) is a 400.
fn malformed_payload_response(detail: &str) -> Response {
    warn!(%detail, "malformed simulation payload");
    error_response(StatusCode::BAD_REQUEST, detail)
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(%err, "rejected simulation request");
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string());
        }
    };

    match tokio::task::spawn_blocking(move || execute(&request)).await {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => {
            warn!(%err, "simulation task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}
