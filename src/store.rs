//! In-memory metric store
//!
//! The store keeps, per metric name, the samples in insertion order plus an
//! optional help text. Series are not stored as such; they are recomputed
//! by grouping samples on their canonical label key when needed.
//!
//! ```text
//! MetricStore
//! ├── metrics: "http_requests_total" -> [Sample, Sample, ...]
//! │            "up"                  -> [Sample, ...]
//! └── help:    "http_requests_total" -> "Total HTTP requests."
//! ```
//!
//! Mutation takes `&mut self`, so the borrow checker keeps writers away
//! from open queriers. [`SharedStore`] adds a read-write lock for callers
//! that need shared ownership.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{Sample, METRIC_NAME_LABEL};

/// Timestamp statistics for one metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampSummary {
    /// Number of samples
    pub samples: usize,
    /// Number of distinct series
    pub series: usize,
    /// Earliest timestamp (ms)
    pub min: i64,
    /// Latest timestamp (ms)
    pub max: i64,
}

/// Ephemeral store of samples keyed by metric name
#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    metrics: HashMap<String, Vec<Sample>>,
    help: HashMap<String, String>,
}

impl MetricStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Append one sample under its own `__name__`
    ///
    /// Existing samples are never replaced, even with identical labels and
    /// timestamp.
    pub fn append(&mut self, sample: Sample) -> Result<()> {
        if sample.metric_name().is_empty() {
            return Err(Error::Validation(format!(
                "sample without {} label: {}",
                METRIC_NAME_LABEL, sample.labels
            )));
        }
        self.metrics
            .entry(sample.metric_name().to_string())
            .or_default()
            .push(sample);
        Ok(())
    }

    /// Append a batch of samples
    ///
    /// Validated up front so a bad sample leaves the store untouched.
    pub fn append_all(&mut self, samples: Vec<Sample>) -> Result<usize> {
        if let Some(bad) = samples.iter().find(|s| s.metric_name().is_empty()) {
            return Err(Error::Validation(format!(
                "sample without {} label: {}",
                METRIC_NAME_LABEL, bad.labels
            )));
        }

        let count = samples.len();
        for sample in samples {
            self.metrics
                .entry(sample.metric_name().to_string())
                .or_default()
                .push(sample);
        }
        Ok(count)
    }

    /// Set (or replace) the help text of a metric
    pub fn set_help(&mut self, metric: impl Into<String>, help: impl Into<String>) {
        self.help.insert(metric.into(), help.into());
    }

    /// Remove a metric with all its samples and help text
    ///
    /// Returns the number of samples removed.
    pub fn drop_metric(&mut self, metric: &str) -> Result<usize> {
        let removed = self
            .metrics
            .remove(metric)
            .ok_or_else(|| Error::NotFound(metric.to_string()))?;
        self.help.remove(metric);

        info!(metric, samples = removed.len(), "Dropped metric");
        Ok(removed.len())
    }

    /// Remove everything
    pub fn clear(&mut self) {
        debug!(metrics = self.metrics.len(), "Clearing store");
        self.metrics.clear();
        self.help.clear();
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Metric names in lexical order
    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.metrics.keys().cloned().collect();
        names.sort();
        names
    }

    /// Samples of a metric in insertion order (empty when unknown)
    pub fn samples(&self, metric: &str) -> &[Sample] {
        self.metrics.get(metric).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(metric name, samples)` in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Sample])> {
        self.metrics
            .iter()
            .map(|(name, samples)| (name.as_str(), samples.as_slice()))
    }

    /// Help text of a metric
    pub fn help(&self, metric: &str) -> Option<&str> {
        self.help.get(metric).map(String::as_str)
    }

    /// Whether a metric is present
    pub fn contains(&self, metric: &str) -> bool {
        self.metrics.contains_key(metric)
    }

    /// Number of metric names
    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    /// Total number of samples
    pub fn sample_count(&self) -> usize {
        self.metrics.values().map(Vec::len).sum()
    }

    /// Whether the store holds no samples
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Number of distinct series of a metric
    pub fn series_count(&self, metric: &str) -> usize {
        self.samples(metric)
            .iter()
            .map(|s| s.labels.canonical_key())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Distinct values of every label of a metric, `__name__` excluded
    pub fn label_summary(&self, metric: &str) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let samples = self
            .metrics
            .get(metric)
            .ok_or_else(|| Error::NotFound(metric.to_string()))?;

        let mut summary: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for sample in samples {
            for (name, value) in sample.labels.iter() {
                if name == METRIC_NAME_LABEL {
                    continue;
                }
                summary
                    .entry(name.to_string())
                    .or_default()
                    .insert(value.to_string());
            }
        }
        Ok(summary)
    }

    /// Sample count, series count and timestamp bounds of a metric
    pub fn timestamp_summary(&self, metric: &str) -> Result<TimestampSummary> {
        let samples = self
            .metrics
            .get(metric)
            .ok_or_else(|| Error::NotFound(metric.to_string()))?;

        let min = samples.iter().map(|s| s.timestamp).min();
        let max = samples.iter().map(|s| s.timestamp).max();
        match (min, max) {
            (Some(min), Some(max)) => Ok(TimestampSummary {
                samples: samples.len(),
                series: self.series_count(metric),
                min,
                max,
            }),
            _ => Err(Error::NotFound(metric.to_string())),
        }
    }
}

/// Store shared behind a read-write lock
///
/// Queriers opened through [`Queryable`](crate::query::Queryable) hold
/// recursive read guards, so nested queriers during one evaluation never
/// wait on each other.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<MetricStore>>,
}

impl SharedStore {
    /// Create an empty shared store
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an existing store
    pub fn from_store(store: MetricStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Acquire a read guard
    pub fn read(&self) -> RwLockReadGuard<'_, MetricStore> {
        self.inner.read_recursive()
    }

    /// Acquire the write guard
    pub fn write(&self) -> RwLockWriteGuard<'_, MetricStore> {
        self.inner.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Labels;

    fn sample(name: &str, labels: &[(&str, &str)], value: f64, ts: i64) -> Sample {
        let mut l = Labels::with_name(name);
        for (k, v) in labels {
            l.insert(*k, *v);
        }
        Sample::new(l, value, ts)
    }

    fn populated() -> MetricStore {
        let mut store = MetricStore::new();
        store
            .append_all(vec![
                sample("http_requests_total", &[("code", "200"), ("method", "GET")], 10.0, 1000),
                sample("http_requests_total", &[("code", "500"), ("method", "POST")], 2.0, 1000),
                sample("http_requests_total", &[("code", "200"), ("method", "GET")], 12.0, 2000),
                sample("up", &[("job", "api")], 1.0, 500),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_append_and_names() {
        let store = populated();
        assert_eq!(store.metric_names(), vec!["http_requests_total", "up"]);
        assert_eq!(store.metric_count(), 2);
        assert_eq!(store.sample_count(), 4);
        assert_eq!(store.samples("http_requests_total").len(), 3);
        assert!(store.samples("missing").is_empty());
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let mut store = MetricStore::new();
        store.append(sample("up", &[], 1.0, 1000)).unwrap();
        store.append(sample("up", &[], 1.0, 1000)).unwrap();
        assert_eq!(store.samples("up").len(), 2);
    }

    #[test]
    fn test_append_requires_name() {
        let mut store = MetricStore::new();
        let nameless = Sample::new(Labels::new(), 1.0, 0);
        assert!(matches!(store.append(nameless.clone()), Err(Error::Validation(_))));

        let batch = vec![sample("up", &[], 1.0, 0), nameless];
        assert!(store.append_all(batch).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_label_summary() {
        let store = populated();
        let summary = store.label_summary("http_requests_total").unwrap();

        assert_eq!(summary.len(), 2);
        assert!(!summary.contains_key("__name__"));
        assert_eq!(
            summary["code"].iter().collect::<Vec<_>>(),
            vec!["200", "500"]
        );
        assert_eq!(
            summary["method"].iter().collect::<Vec<_>>(),
            vec!["GET", "POST"]
        );
        assert!(matches!(
            store.label_summary("missing"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_timestamp_summary() {
        let store = populated();
        let summary = store.timestamp_summary("http_requests_total").unwrap();
        assert_eq!(
            summary,
            TimestampSummary {
                samples: 3,
                series: 2,
                min: 1000,
                max: 2000,
            }
        );
    }

    #[test]
    fn test_drop_metric() {
        let mut store = populated();
        store.set_help("up", "Target is up.");

        assert_eq!(store.drop_metric("up").unwrap(), 1);
        assert!(!store.contains("up"));
        assert_eq!(store.help("up"), None);

        assert!(matches!(store.drop_metric("up"), Err(Error::NotFound(_))));
        assert_eq!(store.sample_count(), 3);
    }

    #[test]
    fn test_shared_store_nested_reads() {
        let shared = SharedStore::from_store(populated());
        let outer = shared.read();
        let inner = shared.read();
        assert_eq!(outer.metric_count(), inner.metric_count());
        drop(outer);
        drop(inner);

        shared.write().clear();
        assert!(shared.read().is_empty());
    }
}
