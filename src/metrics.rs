//! Process telemetry for the store
//!
//! Prometheus counters describing what the store did during this process:
//! ingestion volume, parse failures, selects served and backfill output.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter,
    CounterVec, Encoder, Gauge, HistogramVec, TextEncoder,
};

lazy_static! {
    // === Ingestion ===

    /// Samples added to the store by loads
    pub static ref INGESTED_SAMPLES_TOTAL: CounterVec = register_counter_vec!(
        "promstore_ingested_samples_total",
        "Samples added to the store by loads",
        &["mode"]
    ).expect("register promstore_ingested_samples_total");

    /// Loads aborted by malformed input
    pub static ref PARSE_ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "promstore_parse_errors_total",
        "Loads aborted by a parse error, by error class",
        &["class"]
    ).expect("register promstore_parse_errors_total");

    /// Load duration
    pub static ref LOAD_DURATION: HistogramVec = register_histogram_vec!(
        "promstore_load_duration_seconds",
        "Load latency in seconds",
        &["mode"],
        vec![0.0001, 0.001, 0.01, 0.1, 1.0, 5.0]
    ).expect("register promstore_load_duration_seconds");

    // === Query ===

    /// Select calls served by store queriers
    pub static ref SELECTS_TOTAL: CounterVec = register_counter_vec!(
        "promstore_selects_total",
        "Select calls served, by whether any series matched",
        &["result"]
    ).expect("register promstore_selects_total");

    // === Backfill ===

    /// Synthetic samples added by backfill
    pub static ref BACKFILLED_SAMPLES_TOTAL: Counter = register_counter!(
        "promstore_backfilled_samples_total",
        "Synthetic samples added by backfill"
    ).expect("register promstore_backfilled_samples_total");

    // === Store ===

    /// Samples currently held
    pub static ref STORED_SAMPLES: Gauge = register_gauge!(
        "promstore_stored_samples",
        "Samples currently held by the most recently mutated store"
    ).expect("register promstore_stored_samples");
}

/// Get metrics in Prometheus text format
///
/// # Returns
///
/// Result containing the formatted metrics string, or an error if encoding fails
pub fn gather_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Metrics contain invalid UTF-8: {}", e))
}

/// Record a completed load
#[inline]
pub fn record_load(filtered: bool, samples: usize, duration_secs: f64) {
    let mode = if filtered { "filtered" } else { "all" };

    INGESTED_SAMPLES_TOTAL
        .with_label_values(&[mode])
        .inc_by(samples as f64);

    LOAD_DURATION
        .with_label_values(&[mode])
        .observe(duration_secs);
}

/// Record a load aborted by a parse error
#[inline]
pub fn record_parse_error(class: &str) {
    PARSE_ERRORS_TOTAL.with_label_values(&[class]).inc();
}

/// Record a select call
#[inline]
pub fn record_select(matched_series: usize) {
    let result = if matched_series > 0 { "hit" } else { "empty" };
    SELECTS_TOTAL.with_label_values(&[result]).inc();
}

/// Record backfill output
#[inline]
pub fn record_backfill(added: usize) {
    BACKFILLED_SAMPLES_TOTAL.inc_by(added as f64);
}

/// Update the stored sample gauge
#[inline]
pub fn update_stored_samples(count: usize) {
    STORED_SAMPLES.set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_load() {
        record_load(false, 3, 0.001);
        let metrics = gather_metrics().expect("Failed to gather metrics");
        assert!(metrics.contains("promstore_ingested_samples_total"));
        assert!(metrics.contains("promstore_load_duration_seconds"));
    }

    #[test]
    fn test_record_select_and_backfill() {
        record_select(0);
        record_select(2);
        record_backfill(5);
        let metrics = gather_metrics().expect("Failed to gather metrics");
        assert!(metrics.contains("promstore_selects_total"));
        assert!(metrics.contains("promstore_backfilled_samples_total"));
    }

    #[test]
    fn test_stored_samples_gauge() {
        update_stored_samples(7);
        assert!(STORED_SAMPLES.get() >= 0.0);
    }
}
