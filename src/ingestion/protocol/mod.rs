//! Exposition format parsing
//!
//! Parses the line-oriented metrics exposition text into metric families.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────┐
//! │      raw exposition text   │
//! └─────────────┬──────────────┘
//!               │ line by line
//!               v
//! ┌────────────────────────────┐
//! │   ExpositionParser         │
//! │   HELP / TYPE / sample     │
//! └─────────────┬──────────────┘
//!               │ family assembly
//!               v
//! ┌────────────────────────────┐
//! │   Vec<MetricFamily>        │
//! │   (typed, not flattened)   │
//! └────────────────────────────┘
//! ```
//!
//! Flattening families into stored samples is the job of
//! [`decompose`](crate::ingestion::decompose).
//!
//! # Example
//!
//! ```rust
//! use kuba_promstore::ingestion::protocol::{ExpositionParser, MetricType};
//!
//! let text = "# TYPE http_requests_total counter\n\
//!             http_requests_total{method=\"GET\"} 10\n";
//! let families = ExpositionParser::new().parse(text)?;
//! assert_eq!(families.len(), 1);
//! assert_eq!(families[0].metric_type, MetricType::Counter);
//! # Ok::<(), kuba_promstore::ingestion::protocol::ParseError>(())
//! ```

pub mod error;
pub mod exposition;

pub use error::{ParseError, ParseErrorKind};
pub use exposition::{ExpositionConfig, ExpositionParser, ParsedLine, SampleLine};

use std::fmt;
use std::str::FromStr;

/// Metric family type declared by `# TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// Monotonic counter
    Counter,
    /// Point-in-time gauge
    Gauge,
    /// Bucketed histogram
    Histogram,
    /// Quantile summary
    Summary,
    /// No declared type
    Untyped,
}

impl MetricType {
    /// Keyword used in `# TYPE` lines
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
            MetricType::Untyped => "untyped",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = ParseErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricType::Counter),
            "gauge" => Ok(MetricType::Gauge),
            "histogram" => Ok(MetricType::Histogram),
            "summary" => Ok(MetricType::Summary),
            "untyped" => Ok(MetricType::Untyped),
            other => Err(ParseErrorKind::UnknownMetricType {
                type_name: other.to_string(),
            }),
        }
    }
}

/// One histogram bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    /// Inclusive upper bound (`le`)
    pub upper_bound: f64,
    /// Cumulative observation count up to the bound
    pub cumulative_count: f64,
}

/// One summary quantile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantile {
    /// Quantile rank in `[0, 1]`
    pub quantile: f64,
    /// Observed value at that rank
    pub value: f64,
}

/// Value of one metric instance
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Counter, gauge or untyped value
    Scalar(f64),

    /// Histogram with its buckets, sum and count
    Histogram {
        /// Buckets in input order
        buckets: Vec<Bucket>,
        /// `_sum` line, if any
        sum: Option<f64>,
        /// `_count` line, if any
        count: Option<f64>,
    },

    /// Summary with its quantiles, sum and count
    Summary {
        /// Quantiles in input order
        quantiles: Vec<Quantile>,
        /// `_sum` line, if any
        sum: Option<f64>,
        /// `_count` line, if any
        count: Option<f64>,
    },
}

/// One metric instance within a family
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Labels other than `__name__`, `le` and `quantile`, in input order
    pub labels: Vec<(String, String)>,
    /// The instance's value
    pub value: MetricValue,
    /// Explicit timestamp in milliseconds, if the source carried one
    pub timestamp: Option<i64>,
}

/// A parsed metric family
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    /// Family name (base name for histograms and summaries)
    pub name: String,
    /// `# HELP` text, unescaped
    pub help: Option<String>,
    /// Declared type, `Untyped` when none was declared
    pub metric_type: MetricType,
    /// Instances in order of first appearance
    pub metrics: Vec<Metric>,
}

impl MetricFamily {
    /// Create an empty family
    pub fn new(name: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            help: None,
            metric_type,
            metrics: Vec::new(),
        }
    }
}
