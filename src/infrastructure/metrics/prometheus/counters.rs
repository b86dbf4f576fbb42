use metrics::{counter, histogram};
use std::time::Instant;

/// Increment the counter for issued ceremony challenges, by purpose.
pub fn increment_challenge_issued(purpose: &str) {
    counter!("auth_challenges_issued_total", "purpose" => purpose.to_string()).increment(1);
}

/// Increment the counter for completed registrations.
pub fn increment_registration_completed() {
    counter!("auth_registrations_completed_total").increment(1);
}

/// Increment the counter for authentication attempts, by outcome.
pub fn increment_authentication(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("auth_authentications_total", "outcome" => outcome).increment(1);
}

/// Increment the counter for rejected assertions with a regressed counter.
pub fn increment_replay_suspected() {
    counter!("auth_replay_suspected_total").increment(1);
}

/// Track HTTP request latency using a histogram.
pub fn track_http_request(start: Instant) {
    let elapsed = start.elapsed();
    histogram!("http_request_duration_seconds").record(elapsed);
}
