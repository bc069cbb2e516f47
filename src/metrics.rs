//! Prometheus metrics collection for gatebot.
//!
//! Exposed on the `/metrics` HTTP endpoint (see [`crate::http`]).
//!
//! ## Dispatch Metrics
//!
//! - `bot_command_total{command}` - Commands that reached their gates
//! - `bot_command_duration_seconds{command}` - Gate and body latency histogram
//! - `bot_command_exceptions_total{class}` - Failed invocations by failure class
//! - `bot_command_errors_total{category,error}` - Failed invocations by command category
//! - `bot_gate_rejections_total{gate}` - Dispatches stopped by a gate
//! - `bot_dispatch_total{outcome}` - Every inbound message by dispatch outcome
//! - `bot_throttle_buckets` - Live throttle buckets after the last sweep

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Commands dispatched by name.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Failed invocations by failure class.
pub static COMMAND_EXCEPTIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Failed invocations by command category and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Gate rejections by gate name.
pub static GATE_REJECTIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Inbound messages by dispatch outcome.
pub static DISPATCH_OUTCOMES: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Histograms and gauges
// ========================================================================

/// Command processing latency by command name.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Live throttle buckets.
pub static THROTTLE_BUCKETS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
/// Recording before `init` is a no-op.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("bot_command_total", "Commands dispatched by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("bot_command_duration_seconds", "Command latency including gates")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["command"]));
    register!(COMMAND_EXCEPTIONS, IntCounterVec::new(Opts::new("bot_command_exceptions_total", "Failed command invocations by failure class"), &["class"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("bot_command_errors_total", "Failed command invocations by category"), &["category", "error"]));
    register!(GATE_REJECTIONS, IntCounterVec::new(Opts::new("bot_gate_rejections_total", "Dispatches stopped by a gate"), &["gate"]));
    register!(DISPATCH_OUTCOMES, IntCounterVec::new(Opts::new("bot_dispatch_total", "Inbound messages by dispatch outcome"), &["outcome"]));
    register!(THROTTLE_BUCKETS, IntGauge::new("bot_throttle_buckets", "Live throttle buckets"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recorders
// ============================================================================

fn inc(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    inc(&COMMAND_COUNTER, &[command]);
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a failed invocation under its class and the command's category.
#[inline]
pub fn record_command_failure(category: &str, class: &str) {
    inc(&COMMAND_EXCEPTIONS, &[class]);
    inc(&COMMAND_ERRORS, &[category, class]);
}

/// Record a gate rejection.
#[inline]
pub fn record_gate_rejection(gate: &str) {
    inc(&GATE_REJECTIONS, &[gate]);
}

/// Record the outcome of one dispatch.
#[inline]
pub fn record_dispatch(outcome: &str) {
    inc(&DISPATCH_OUTCOMES, &[outcome]);
}

/// Update the live throttle bucket gauge.
#[inline]
pub fn set_throttle_buckets(count: usize) {
    if let Some(g) = THROTTLE_BUCKETS.get() {
        g.set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}

/// Current value of a counter.
#[cfg(test)]
pub fn counter_value(metric: &OnceLock<IntCounterVec>, labels: &[&str]) -> u64 {
    metric
        .get()
        .map(|c| c.with_label_values(labels).get())
        .unwrap_or(0)
}
