//! `Metrics` implementation backed by the global `metrics` crate
//! registry. The actual counter and histogram calls live in
//! `counters.rs`; the installed recorder in `recorder.rs` renders them.

use crate::domain::Metrics;
use std::time::Instant;

/// Zero-sized handle; all state lives in the global metrics registry.
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    pub fn new() -> Self {
        PrometheusMetrics
    }
}

impl Metrics for PrometheusMetrics {
    // ---
    fn render(&self) -> String {
        super::render_metrics()
    }

    fn record_challenge_issued(&self, purpose: &str) {
        tracing::debug!("Recording {purpose} challenge issued");
        super::increment_challenge_issued(purpose);
    }

    fn record_registration_completed(&self) {
        tracing::debug!("Recording registration completed");
        super::increment_registration_completed();
    }

    fn record_authentication(&self, success: bool) {
        tracing::debug!("Recording authentication attempt (success: {success})");
        super::increment_authentication(success);
    }

    fn record_replay_suspected(&self) {
        tracing::debug!("Recording suspected replay");
        super::increment_replay_suspected();
    }

    fn record_http_request(&self, start: Instant, _path: &str, _method: &str, _status: u16) {
        super::track_http_request(start);
    }
}
