//! Core data types used throughout the store
//!
//! This module defines the fundamental data structures shared by ingestion,
//! serialization, querying and backfill:
//!
//! # Key Types
//!
//! - **`Labels`**: Unordered label set, always carrying `__name__` for stored samples
//! - **`Sample`**: One observation (labels + value + millisecond timestamp)
//! - **`Point`**: A `(timestamp, value)` pair belonging to a selected series
//! - **`TimeRange`**: Inclusive query window
//!
//! The canonical label key produced by [`Labels::canonical_key`] is the single
//! grouping key used by select, export ordering and backfill dedup.
//!
//! # Example
//!
//! ```rust
//! use kuba_promstore::types::{Labels, Sample, TimeRange};
//!
//! let mut labels = Labels::with_name("http_requests_total");
//! labels.insert("method", "GET");
//! let sample = Sample::new(labels, 10.0, 1_700_000_000_000);
//!
//! assert_eq!(sample.metric_name(), "http_requests_total");
//! assert!(TimeRange::new(0, 2_000_000_000_000).unwrap().contains(sample.timestamp));
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// Reserved label holding the metric name
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Label added to histogram bucket samples
pub const BUCKET_LABEL: &str = "le";

/// Label added to summary quantile samples
pub const QUANTILE_LABEL: &str = "quantile";

/// Suffix of histogram bucket series
pub const BUCKET_SUFFIX: &str = "_bucket";

/// Suffix of histogram/summary sum series
pub const SUM_SUFFIX: &str = "_sum";

/// Suffix of histogram/summary count series
pub const COUNT_SUFFIX: &str = "_count";

/// Label set of a sample
///
/// Labels are an unordered set of name/value pairs. Ordering only matters
/// when a stable key or rendering is needed, which always goes through
/// [`Labels::sorted`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Labels {
    labels: HashMap<String, String>,
}

impl Labels {
    /// Create an empty label set
    pub fn new() -> Self {
        Self {
            labels: HashMap::new(),
        }
    }

    /// Create a label set holding only `__name__`
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut labels = Self::new();
        labels.insert(METRIC_NAME_LABEL, name);
        labels
    }

    /// Create from a hashmap
    pub fn from_map(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }

    /// Insert or replace a label
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(name.into(), value.into());
    }

    /// Remove a label, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.labels.remove(name)
    }

    /// Get a label value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Label value, with absence read as the empty string
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// The metric name, or "" when `__name__` is missing
    pub fn metric_name(&self) -> &str {
        self.get_or_empty(METRIC_NAME_LABEL)
    }

    /// Whether a label is present
    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Number of labels, `__name__` included
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no labels
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate labels in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Labels sorted by name
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    /// Labels sorted by name, `__name__` excluded
    pub fn sorted_without_name(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self.iter().filter(|(k, _)| *k != METRIC_NAME_LABEL).collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    /// Canonical key identifying the series this label set belongs to
    ///
    /// Labels are sorted by name and rendered `name="value"` with the value
    /// escaped, joined by `,`. Escaping keeps the key unambiguous and makes
    /// its lexical order match the order of rendered exposition lines.
    pub fn canonical_key(&self) -> String {
        render_pairs(&self.sorted())
    }

    /// Canonical key with `__name__` left out (used within one metric)
    pub fn canonical_key_without_name(&self) -> String {
        render_pairs(&self.sorted_without_name())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            labels: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self.sorted_without_name();
        write!(f, "{}", self.metric_name())?;
        if !pairs.is_empty() {
            write!(f, "{{{}}}", render_pairs(&pairs))?;
        }
        Ok(())
    }
}

/// Render sorted label pairs as `a="x",b="y"`
pub(crate) fn render_pairs(pairs: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (i, (name, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_label_value(value));
        out.push('"');
    }
    out
}

/// Escape a label value for the exposition format
///
/// Backslash, newline, tab and double quote are escaped.
pub fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Format a float the way the exposition format expects it
///
/// Shortest representation that round-trips, no trailing zeros, and the
/// special spellings `NaN`, `+Inf`, `-Inf`. Also used for `le` and
/// `quantile` label values.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{}", value)
    }
}

/// Current wall-clock time in Unix milliseconds
pub fn current_time_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A single stored observation
///
/// Invariant: `labels` carries `__name__` equal to the key the sample is
/// stored under in [`MetricStore`](crate::store::MetricStore).
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Full label set, `__name__` included
    pub labels: Labels,

    /// Floating-point value (NaN and infinities allowed)
    pub value: f64,

    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl Sample {
    /// Create a new sample
    pub fn new(labels: Labels, value: f64, timestamp: i64) -> Self {
        Self {
            labels,
            value,
            timestamp,
        }
    }

    /// The sample's metric name
    pub fn metric_name(&self) -> &str {
        self.labels.metric_name()
    }
}

/// A `(timestamp, value)` pair inside a selected series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Value
    pub value: f64,
}

impl Point {
    /// Create a new point
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Time range for queries (inclusive on both ends)
///
/// # Example
///
/// ```rust
/// use kuba_promstore::types::TimeRange;
///
/// let range = TimeRange::new(1000, 2000).unwrap();
/// assert!(range.contains(1000));
/// assert!(range.contains(2000));
/// assert!(!range.contains(2001));
/// assert!(TimeRange::new(2000, 1000).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Start timestamp in milliseconds (inclusive)
    pub start: i64,

    /// End timestamp in milliseconds (inclusive)
    pub end: i64,
}

impl TimeRange {
    /// Create a new time range, rejecting `start > end`
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start > end {
            return Err(Error::Validation(format!(
                "Invalid time range: start {} > end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Create a range without validation
    ///
    /// An inverted range contains nothing, which is what queriers rely on
    /// when the engine asks for an empty window.
    pub fn new_unchecked(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Check if a timestamp falls within this range (inclusive)
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Duration in milliseconds, `None` on overflow
    pub fn duration_ms(&self) -> Option<i64> {
        self.end.checked_sub(self.start)
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            start: i64::MIN,
            end: i64::MAX,
        }
    }
}
