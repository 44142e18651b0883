//! Optional metrics instrumentation for procmon.
//!
//! When the `observe` feature is enabled, the router and dispatcher emit
//! counters via the [`metrics`] crate. A downstream application must install
//! a metrics recorder (e.g. `metrics-exporter-prometheus`) to collect the
//! data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record a raw message read from a topic stream.
///
/// - `procmon.router.records_total` – counter with `topic` label
#[inline]
pub fn record_received(topic: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("procmon.router.records_total", "topic" => topic).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = topic;
    }
}

/// Record a message that failed envelope decoding.
///
/// - `procmon.router.decode_failures_total` – counter with `topic` label
#[inline]
pub fn record_decode_failure(topic: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("procmon.router.decode_failures_total", "topic" => topic).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = topic;
    }
}

/// Record a dispatch outcome (counter + latency histogram).
///
/// - `procmon.dispatch.total` – counter with `topic` and `outcome` labels
/// - `procmon.dispatch.duration_seconds` – histogram
#[inline]
pub fn record_dispatch(topic: &'static str, duration: std::time::Duration, success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("procmon.dispatch.total", "topic" => topic, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("procmon.dispatch.duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (topic, duration, success);
    }
}
