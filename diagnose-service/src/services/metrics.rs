//! Prometheus metrics for diagnose-service.
//!
//! Generic HTTP metrics come from the `metrics` recorder installed here; the
//! diagnosis-specific counters live in a separate prometheus registry. Both
//! are rendered by [`get_metrics`].

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static DIAGNOSE_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GENAI_PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static GENAI_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Must be called once at startup.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!("Prometheus recorder not installed: {}", e),
    }

    let registry = Registry::new();

    // outcome: success, invalid_input, upstream_failure
    let requests_total = IntCounterVec::new(
        Opts::new("diagnose_requests_total", "Total diagnosis requests"),
        &["outcome"],
    )?;

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "genai_provider_latency_seconds",
            "Latency of text generation calls",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
        &["model", "status"],
    )?;

    let tokens_total = IntCounterVec::new(
        Opts::new("genai_tokens_total", "Total tokens processed"),
        &["model", "type"], // type: input, output
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(provider_latency.clone()))?;
    registry.register(Box::new(tokens_total.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = DIAGNOSE_REQUESTS_TOTAL.set(requests_total);
    let _ = GENAI_PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = GENAI_TOKENS_TOTAL.set(tokens_total);

    Ok(())
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    if let Some(registry) = REGISTRY.get() {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&registry.gather(), &mut buffer).is_ok() {
            output.push_str(&String::from_utf8_lossy(&buffer));
        }
    }

    if output.is_empty() {
        output.push_str("# Metrics not initialized\n");
    }

    output
}

pub fn record_request(outcome: &str) {
    if let Some(counter) = DIAGNOSE_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_provider_call(model: &str, status: &str, seconds: f64) {
    if let Some(histogram) = GENAI_PROVIDER_LATENCY_SECONDS.get() {
        histogram.with_label_values(&[model, status]).observe(seconds);
    }
}

pub fn record_tokens(model: &str, input: i32, output: i32) {
    if let Some(counter) = GENAI_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output.max(0) as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_before_init_is_a_no_op() {
        record_request("success");
        record_provider_call("mock", "ok", 0.1);
        record_tokens("mock", 10, 5);
    }

    #[test]
    fn uninitialized_render_has_placeholder() {
        if REGISTRY.get().is_none() && METRICS_HANDLE.get().is_none() {
            assert_eq!(get_metrics(), "# Metrics not initialized\n");
        }
    }
}
