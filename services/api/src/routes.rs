use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use flood_recon::error::{AppError, InputError};
use flood_recon::oracle::VisualOracle;
use flood_recon::Document;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct ReconciliationRequest {
    pub(crate) certificate: Option<Document>,
    pub(crate) application: Option<Document>,
    #[serde(default)]
    pub(crate) images: Vec<String>,
}

pub(crate) fn reconciliation_routes(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/reconciliation/report",
            axum::routing::post(reconciliation_endpoint),
        )
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn reconciliation_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReconciliationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let certificate = payload
        .certificate
        .ok_or(InputError::MissingDocument {
            which: "certificate",
        })?;
    let application = payload
        .application
        .ok_or(InputError::MissingDocument {
            which: "application",
        })?;

    let oracle = state.oracle.as_deref().map(|o| o as &dyn VisualOracle);
    let report = state
        .engine
        .run(&certificate, &application, &payload.images, oracle)
        .await;

    Ok(Json(report.to_json()))
}
