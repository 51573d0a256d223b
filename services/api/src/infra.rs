use flood_recon::oracle::HttpVisualOracle;
use flood_recon::ReconciliationEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Shared state threaded through the router as an Extension.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engine: Arc<ReconciliationEngine>,
    pub(crate) oracle: Option<Arc<HttpVisualOracle>>,
}
