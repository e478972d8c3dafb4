//! Metrics definitions for the Overlay Controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `oc_` prefix for Overlay Controller
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return its handle.
///
/// Must be called before any metrics are recorded. Event handling runs on a
/// UI-affine queue, so latency buckets are sub-frame.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("oc_event_latency".to_string()),
            &[
                0.000_1, 0.000_5, 0.001, 0.002_5, 0.005, 0.010, 0.016, 0.033, 0.100,
            ],
        )
        .map_err(|e| format!("Failed to set event latency buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Events
// ============================================================================

/// Record a handled domain event.
///
/// Metric: `oc_events_total`
/// Labels: `class` (6 values)
pub fn record_event(class: &'static str) {
    counter!("oc_events_total", "class" => class).increment(1);
}

/// Record an event dropped by the conference filter.
///
/// Metric: `oc_events_filtered_total`
pub fn record_event_filtered() {
    counter!("oc_events_filtered_total").increment(1);
}

/// Record how long handling one event took.
///
/// Metric: `oc_event_latency_seconds`
/// Labels: `class`
pub fn record_event_latency(class: &'static str, duration: Duration) {
    histogram!("oc_event_latency_seconds", "class" => class).record(duration.as_secs_f64());
}

// ============================================================================
// Surface
// ============================================================================

/// Record an attach execution.
///
/// Metric: `oc_attach_total`
/// Labels: `outcome` (attached, aborted, failed)
pub fn record_attach(outcome: &'static str) {
    counter!("oc_attach_total", "outcome" => outcome).increment(1);
}

/// Record a detach.
///
/// Metric: `oc_detach_total`
/// Labels: `reason` (event, hud, explicit), `release` (true, false)
pub fn record_detach(reason: &'static str, release: bool) {
    let release = if release { "true" } else { "false" };
    counter!("oc_detach_total", "reason" => reason, "release" => release).increment(1);
}

// ============================================================================
// State
// ============================================================================

/// Set the current roster size.
///
/// Metric: `oc_roster_size`
pub fn set_roster_size(size: usize) {
    // usize to f64 conversion is safe for conference-sized rosters
    #[allow(clippy::cast_precision_loss)]
    gauge!("oc_roster_size").set(size as f64);
}

/// Set the controller mailbox depth.
///
/// Metric: `oc_actor_mailbox_depth`
pub fn set_mailbox_depth(depth: usize) {
    // usize to f64 conversion is safe for realistic mailbox depths
    #[allow(clippy::cast_precision_loss)]
    gauge!("oc_actor_mailbox_depth").set(depth as f64);
}

/// Record a failure reported to the error sink.
///
/// Metric: `oc_collaborator_errors_total`
/// Labels: `category` (bounded by `OverlayError::category`)
pub fn record_collaborator_error(category: &'static str) {
    counter!("oc_collaborator_errors_total", "category" => category).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These run against the global no-op recorder; they only check that the
    // recording functions never panic without an installed recorder.

    #[test]
    fn test_record_event_functions() {
        record_event("creation");
        record_event("termination");
        record_event_filtered();
        record_event_latency("participant", Duration::from_micros(250));
    }

    #[test]
    fn test_record_surface_functions() {
        record_attach("attached");
        record_attach("aborted");
        record_detach("event", true);
        record_detach("hud", false);
    }

    #[test]
    fn test_state_gauges() {
        set_roster_size(0);
        set_roster_size(12);
        set_mailbox_depth(3);
        record_collaborator_error("collaborator");
    }
}
