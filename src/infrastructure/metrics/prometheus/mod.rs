mod counters;
mod prometheus_metrics;
mod recorder;

pub use prometheus_metrics::PrometheusMetrics;
use std::sync::Arc;

pub(crate) use counters::{
    increment_authentication, increment_challenge_issued, increment_registration_completed,
    increment_replay_suspected, track_http_request,
};
pub(crate) use recorder::{init_metrics, render_metrics};

/// Creates the Prometheus metrics backend, installing the global
/// recorder on first use. Rendered output is served at `/metrics`.
pub fn create() -> anyhow::Result<crate::domain::MetricsPtr> {
    tracing::info!("Initializing Prometheus metrics");
    init_metrics()?;

    Ok(Arc::new(PrometheusMetrics::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_installs_recorder() {
        assert!(create().is_ok());
        // A second create must not fail on the already-installed recorder.
        assert!(create().is_ok());
    }
}
