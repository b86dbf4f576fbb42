use std::sync::Arc;
use std::time::Instant;

/// Abstraction for application metrics (counters, histograms).
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record an issued ceremony challenge ("registration" or "authentication").
    fn record_challenge_issued(&self, purpose: &str);

    /// Record a completed registration (user + credential created).
    fn record_registration_completed(&self);

    /// Record an authentication attempt outcome.
    fn record_authentication(&self, success: bool);

    /// Record a rejected replay (counter regression).
    fn record_replay_suspected(&self);

    /// Record HTTP request duration and labels.
    fn record_http_request(&self, start: Instant, path: &str, method: &str, status: u16);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
