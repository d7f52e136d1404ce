//! Service counters.
//!
//! Recorded through the `metrics` facade; they are no-ops until the binary
//! installs a recorder.

use metrics::counter;

pub fn record_slug_minted(created: bool) {
    let outcome = if created { "created" } else { "existing" };
    counter!("slugs_minted_total", "outcome" => outcome).increment(1);
}

pub fn record_slug_collision() {
    counter!("slug_collisions_total").increment(1);
}

pub fn record_rate_limited() {
    counter!("rate_limited_requests_total").increment(1);
}

pub fn record_verification_failure(reason: &'static str) {
    counter!("verification_failures_total", "reason" => reason).increment(1);
}
