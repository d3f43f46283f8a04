//! Synthetic history for existing series
//!
//! For every series of a metric, the latest sample (value `V` at time `T`)
//! seeds `steps` earlier points at `T - d * step` for `d = steps..=1`:
//!
//! ```text
//! counter-shaped (`*_total`, `*_total_*`):  max(0, V - d * max(1, 0.001 * V))
//! gauge:                                     V * max(0, 1 - 0.001 * d)
//! ```
//!
//! A point is skipped when its series already holds a sample at that
//! timestamp, so running the same backfill twice adds nothing the second
//! time. Plain loads do not deduplicate.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::config::BackfillConfig;
use crate::duration::{format_duration, parse_duration};
use crate::error::{Error, Result};
use crate::metrics;
use crate::store::MetricStore;
use crate::types::Sample;

/// Step used when a configured or given step cannot be parsed
pub const DEFAULT_STEP_MS: i64 = 60_000;

/// What a backfill call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// Nothing to seed from
    Skipped {
        /// Why nothing happened
        reason: String,
    },
    /// Points were generated
    Completed {
        /// Series visited
        series: usize,
        /// Samples added to the store
        added: usize,
        /// Points dropped because their timestamp was taken
        suppressed: usize,
    },
}

impl BackfillOutcome {
    /// Samples added (0 when skipped)
    pub fn added(&self) -> usize {
        match self {
            BackfillOutcome::Skipped { .. } => 0,
            BackfillOutcome::Completed { added, .. } => *added,
        }
    }
}

/// Number and spacing of synthetic points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillOptions {
    /// Points per series
    pub steps: usize,
    /// Spacing in milliseconds
    pub step_ms: i64,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            steps: 10,
            step_ms: DEFAULT_STEP_MS,
        }
    }
}

impl BackfillOptions {
    /// Options from string arguments
    ///
    /// `steps` must be a non-negative integer. A malformed or zero `step`
    /// falls back to one minute with a warning.
    pub fn parse(steps: &str, step: &str) -> Result<Self> {
        Self::default().with_overrides(Some(steps), Some(step))
    }

    /// Override `self` with string arguments
    ///
    /// Absent arguments keep the current values, and a malformed or zero
    /// `step` falls back to `self.step_ms`.
    pub fn with_overrides(self, steps: Option<&str>, step: Option<&str>) -> Result<Self> {
        let steps = match steps {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                Error::Validation(format!("steps must be a non-negative integer, got '{}'", raw))
            })?,
            None => self.steps,
        };
        Ok(Self {
            steps,
            step_ms: step.map_or(self.step_ms, |s| step_or_default(s, self.step_ms)),
        })
    }

    /// Options from the `[backfill]` configuration section
    pub fn from_config(config: &BackfillConfig) -> Self {
        Self {
            steps: config.steps,
            step_ms: step_or_default(&config.step, DEFAULT_STEP_MS),
        }
    }

    /// Run against a store
    pub fn run(&self, store: &mut MetricStore, metric: &str) -> Result<BackfillOutcome> {
        backfill(store, metric, self.steps, self.step_ms)
    }
}

/// Parse a step, falling back to `default_ms` on bad input
fn step_or_default(step: &str, default_ms: i64) -> i64 {
    match parse_duration(step) {
        Ok(ms) if ms > 0 => ms,
        Ok(_) => {
            warn!(step, fallback = %format_duration(default_ms), "Zero backfill step, using default");
            default_ms
        }
        Err(e) => {
            warn!(step, error = %e, fallback = %format_duration(default_ms), "Invalid backfill step, using default");
            default_ms
        }
    }
}

/// Whether a metric name looks like a monotonic counter
pub fn is_counter_name(metric: &str) -> bool {
    metric.ends_with("_total") || metric.contains("_total_")
}

/// Synthetic value `d` steps before a base value `v`
pub fn synthesize(v: f64, d: usize, counter: bool) -> f64 {
    let d = d as f64;
    if counter {
        (v - d * (0.001 * v).max(1.0)).max(0.0)
    } else {
        v * (1.0 - 0.001 * d).max(0.0)
    }
}

/// Generate `steps` earlier points spaced `step_ms` apart for every series
/// of `metric`
///
/// Points are computed before the store is touched; an overflowing
/// timestamp fails the whole call.
pub fn backfill(
    store: &mut MetricStore,
    metric: &str,
    steps: usize,
    step_ms: i64,
) -> Result<BackfillOutcome> {
    if step_ms <= 0 {
        return Err(Error::Validation(format!(
            "backfill step must be positive, got {}ms",
            step_ms
        )));
    }

    let samples = store.samples(metric);
    if samples.is_empty() {
        let reason = format!("no samples for metric {}", metric);
        warn!(metric, "Backfill skipped: no samples");
        return Ok(BackfillOutcome::Skipped { reason });
    }

    // Latest sample per series, series in first-seen order
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, &Sample> = HashMap::new();
    let mut taken: HashSet<(String, i64)> = HashSet::new();
    for sample in samples {
        let key = sample.labels.canonical_key();
        taken.insert((key.clone(), sample.timestamp));
        match latest.get(&key) {
            Some(current) if current.timestamp > sample.timestamp => {}
            Some(_) => {
                latest.insert(key, sample);
            }
            None => {
                order.push(key.clone());
                latest.insert(key, sample);
            }
        }
    }

    let counter = is_counter_name(metric);
    let mut generated = Vec::new();
    let mut suppressed = 0;

    for key in &order {
        let base = latest[key];
        for d in (1..=steps).rev() {
            let ts = i64::try_from(d)
                .ok()
                .and_then(|d| d.checked_mul(step_ms))
                .and_then(|back| base.timestamp.checked_sub(back))
                .ok_or_else(|| {
                    Error::Validation(format!(
                        "backfill of {} steps x {}ms before {} overflows",
                        steps, step_ms, base.timestamp
                    ))
                })?;

            if !taken.insert((key.clone(), ts)) {
                suppressed += 1;
                continue;
            }
            generated.push(Sample::new(
                base.labels.clone(),
                synthesize(base.value, d, counter),
                ts,
            ));
        }
    }

    let series = order.len();
    let added = store.append_all(generated)?;

    metrics::record_backfill(added);
    metrics::update_stored_samples(store.sample_count());
    info!(
        metric,
        series,
        added,
        suppressed,
        step = %format_duration(step_ms),
        "Backfill complete"
    );

    Ok(BackfillOutcome::Completed {
        series,
        added,
        suppressed,
    })
}
