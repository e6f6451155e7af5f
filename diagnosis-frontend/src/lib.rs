pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use metrics_exporter_prometheus::PrometheusHandle;
use services::agents::DiagnosticAgent;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn DiagnosticAgent>,
    /// Width uploads are scaled to before analysis.
    pub max_width: u32,
    /// `None` when no recorder is installed (tests); `/metrics` is then empty.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(agent: Arc<dyn DiagnosticAgent>, max_width: u32) -> Self {
        Self {
            agent,
            max_width,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
