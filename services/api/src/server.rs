use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::reconciliation_routes;
use axum_prometheus::PrometheusMetricLayer;
use flood_recon::config::AppConfig;
use flood_recon::error::AppError;
use flood_recon::oracle::HttpVisualOracle;
use flood_recon::reference::ReferenceTables;
use flood_recon::telemetry;
use flood_recon::ReconciliationEngine;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let engine = Arc::new(ReconciliationEngine::new(
        ReferenceTables::default(),
        config.oracle.retry_policy(),
    ));
    let oracle = config
        .oracle
        .endpoint
        .as_deref()
        .map(|endpoint| Arc::new(HttpVisualOracle::new(endpoint)));

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        engine,
        oracle,
    };

    let app = reconciliation_routes(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "reconciliation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
