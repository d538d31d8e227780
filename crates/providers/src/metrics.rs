// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! a text exporter for whatever surface the embedding service exposes.

use std::sync::LazyLock;

use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec, register_int_gauge_vec,
};
use shared_types::HealthState;

/// Histogram for outbound provider request durations in seconds.
pub static PROVIDER_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "fulfillment_provider_request_duration_seconds",
        "Outbound provider request durations in seconds",
        &["provider", "operation", "result"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create provider request duration histogram")
});

/// Health probe outcomes, labeled by provider and result
pub static HEALTH_PROBES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "fulfillment_health_probes_total",
        "Total number of provider health probes",
        &["provider", "result"]
    )
    .expect("Failed to create health probes counter vec")
});

/// Current health per provider: 1 healthy, 0 unhealthy, -1 unknown
pub static PROVIDER_HEALTH: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    register_int_gauge_vec!(
        "fulfillment_provider_health",
        "Current provider health (1 healthy, 0 unhealthy, -1 unknown)",
        &["provider"]
    )
    .expect("Failed to create provider health gauge vec")
});

/// Provider selection outcomes
pub static SELECTIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "fulfillment_provider_selections_total",
        "Total number of provider selections, labeled by outcome",
        &["outcome"]
    )
    .expect("Failed to create provider selections counter vec")
});

/// Observe the duration of one outbound provider request
///
/// # Arguments
/// * `provider` - Registered provider name
/// * `operation` - Adapter operation, e.g. `list_catalog`
/// * `result` - `ok` or `error`
/// * `duration_secs` - The duration of the request in seconds
pub fn observe_provider_request(provider: &str, operation: &str, result: &str, duration_secs: f64) {
    PROVIDER_REQUEST_DURATION
        .with_label_values(&[provider, operation, result])
        .observe(duration_secs);
}

/// Record a health probe outcome and update the health gauge
pub fn record_health(provider: &str, state: HealthState) {
    let (result, gauge) = match state {
        HealthState::Healthy => ("healthy", 1),
        HealthState::Unhealthy => ("unhealthy", 0),
        HealthState::Unknown => ("unknown", -1),
    };
    if state != HealthState::Unknown {
        HEALTH_PROBES.with_label_values(&[provider, result]).inc();
    }
    PROVIDER_HEALTH.with_label_values(&[provider]).set(gauge);
}

/// Record a provider selection outcome (`preferred`, `cheapest` or `none`)
pub fn record_selection(outcome: &str) {
    SELECTIONS.with_label_values(&[outcome]).inc();
}

/// Render every registered metric in Prometheus text format
///
/// # Errors
///
/// Returns an error if the metrics encoder fails or produces invalid UTF-8
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_gauge_tracks_state() {
        record_health("metrics-test", HealthState::Unknown);
        assert_eq!(
            PROVIDER_HEALTH.with_label_values(&["metrics-test"]).get(),
            -1
        );

        record_health("metrics-test", HealthState::Healthy);
        assert_eq!(PROVIDER_HEALTH.with_label_values(&["metrics-test"]).get(), 1);
        assert_eq!(
            HEALTH_PROBES
                .with_label_values(&["metrics-test", "healthy"])
                .get(),
            1
        );
    }

    #[test]
    fn render_contains_recorded_series() {
        observe_provider_request("render-test", "balance", "ok", 0.05);
        record_selection("cheapest");

        let output = render().unwrap();
        assert!(output.contains("fulfillment_provider_request_duration_seconds"));
        assert!(output.contains("fulfillment_provider_selections_total"));
    }
}
