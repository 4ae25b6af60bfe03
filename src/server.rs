//! HTTP server exposing the sensor query API.
//!
//! # Endpoints
//!
//! ```text
//! GET   /health                 service status
//! GET   /ping                   "pong"
//! GET   /sensors                all sensors with their latest sample
//! GET   /sensors/:id            one sensor
//! GET   /sensors/:id/data       samples (start_date, end_date, limit, density)
//! GET   /sensors/:id/anomalies  anomaly intervals (start_date, end_date)
//! PATCH /sensors/:id            partial threshold / mesh update
//! ```

use crate::config::Config;
use crate::core::{Anomaly, AnomalyQuery, DataQuery, EngineError, QueryOptions, Sample};
use crate::service::{SensorView, TelemetryService};
use crate::store::SensorRepository;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Repository shared by all request handlers.
pub type SharedRepository = Arc<dyn SensorRepository>;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Query parsing options
    pub query_options: QueryOptions,
}

impl ServerConfig {
    /// Create a new server configuration with default query options
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            query_options: QueryOptions::default(),
        }
    }

    /// Server settings from the service configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            query_options: config.query_options(),
        }
    }
}

/// Shared server state
pub struct ServerState {
    service: TelemetryService<SharedRepository>,
    query_options: QueryOptions,
}

impl ServerState {
    /// Create new server state
    pub fn new(repository: SharedRepository, query_options: QueryOptions) -> Self {
        Self {
            service: TelemetryService::new(repository),
            query_options,
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(err: EngineError) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::debug!("Request rejected: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /ping
async fn ping() -> &'static str {
    "pong"
}

/// GET /sensors
async fn list_sensors(State(state): State<Arc<ServerState>>) -> ApiResult<Vec<SensorView>> {
    state.service.sensors().map(Json).map_err(api_error)
}

/// GET /sensors/:id
async fn get_sensor(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<SensorView> {
    state.service.sensor(&id).map(Json).map_err(api_error)
}

/// GET /sensors/:id/data
///
/// The sensor is resolved before the parameters are validated, so an unknown
/// sensor is a 404 even with malformed parameters.
async fn get_sensor_data(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Sample>> {
    state.service.sensor_config(&id).map_err(api_error)?;
    let query = DataQuery::from_params(&params, &state.query_options).map_err(api_error)?;
    state
        .service
        .query_data(&id, &query)
        .map(Json)
        .map_err(api_error)
}

/// GET /sensors/:id/anomalies
async fn get_sensor_anomalies(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Anomaly>> {
    state.service.sensor_config(&id).map_err(api_error)?;
    let query = AnomalyQuery::from_params(&params, &state.query_options).map_err(api_error)?;
    state
        .service
        .query_anomalies(&id, &query)
        .map(Json)
        .map_err(api_error)
}

/// PATCH /sensors/:id
///
/// The body is parsed by hand so that a missing or non-JSON body is reported
/// as a validation error like any other malformed payload.
async fn patch_sensor(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<SensorView> {
    state.service.sensor_config(&id).map_err(api_error)?;

    if body.is_empty() {
        return Err(api_error(EngineError::InvalidPayload(
            "request body is empty".to_string(),
        )));
    }
    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| api_error(EngineError::InvalidPayload(e.to_string())))?;

    state
        .service
        .update_sensor(&id, &payload)
        .map(Json)
        .map_err(api_error)
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
        .route("/sensors", get(list_sensors))
        .route("/sensors/:id", get(get_sensor).patch(patch_sensor))
        .route("/sensors/:id/data", get(get_sensor_data))
        .route("/sensors/:id/anomalies", get(get_sensor_anomalies))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::PATCH, Method::OPTIONS])
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    repository: SharedRepository,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(repository, config.query_options));
    let app = router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Sensor telemetry server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
