//! Loading exposition text into a store
//!
//! A load parses the whole document first and only then touches the store,
//! so malformed input never leaves partial data behind. Samples without an
//! explicit timestamp all share one timestamp taken at the start of the
//! call.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use regex::Regex;
use tracing::{debug, info};

use super::decompose::decompose;
use super::protocol::{ExpositionParser, MetricFamily, ParseError};
use crate::config::IngestConfig;
use crate::error::{Error, Result, ValidationError};
use crate::metrics;
use crate::store::MetricStore;
use crate::types::{current_time_millis, Sample};

/// Which metric families a load materializes
///
/// Applied to family names (histogram and summary base names) before
/// decomposition.
pub enum NameFilter {
    /// Every family
    All,
    /// Families whose name contains a match of the regex
    Regex(Regex),
    /// Families accepted by the closure
    Predicate(Box<dyn Fn(&str) -> bool + Send + Sync>),
}

impl NameFilter {
    /// Compile a regex filter
    pub fn regex(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).map_err(|e| ValidationError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(NameFilter::Regex(re))
    }

    /// Wrap a closure
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        NameFilter::Predicate(Box::new(f))
    }

    /// Whether a family name passes
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameFilter::All => true,
            NameFilter::Regex(re) => re.is_match(name),
            NameFilter::Predicate(f) => f(name),
        }
    }
}

impl Default for NameFilter {
    fn default() -> Self {
        NameFilter::All
    }
}

impl fmt::Debug for NameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameFilter::All => write!(f, "NameFilter::All"),
            NameFilter::Regex(re) => write!(f, "NameFilter::Regex({})", re.as_str()),
            NameFilter::Predicate(_) => write!(f, "NameFilter::Predicate(..)"),
        }
    }
}

/// Loads exposition text into a [`MetricStore`]
///
/// # Example
///
/// ```rust
/// use kuba_promstore::ingestion::Loader;
/// use kuba_promstore::store::MetricStore;
///
/// let mut store = MetricStore::new();
/// let text = "http_requests_total{method=\"GET\",code=\"200\"} 10\n\
///             http_requests_total{method=\"POST\",code=\"500\"} 2\n";
///
/// let families = Loader::new().load(&mut store, text).unwrap();
/// assert_eq!(families, 1);
/// assert_eq!(store.metric_names(), vec!["http_requests_total"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Loader {
    parser: ExpositionParser,
    default_timestamp: Option<i64>,
}

impl Loader {
    /// Create a loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader from the `[ingest]` configuration section
    pub fn with_config(config: &IngestConfig) -> Self {
        Self {
            parser: ExpositionParser::with_config(config.parser_config()),
            default_timestamp: config.default_timestamp_ms,
        }
    }

    /// Load text; returns the number of families ingested
    pub fn load(&self, store: &mut MetricStore, text: &str) -> Result<usize> {
        self.load_filtered(store, text, &NameFilter::All)
    }

    /// Load text, giving samples without a timestamp `default_ts`
    pub fn load_at(&self, store: &mut MetricStore, text: &str, default_ts: i64) -> Result<usize> {
        self.load_filtered_at(store, text, &NameFilter::All, default_ts)
    }

    /// Load only the families accepted by `filter`
    pub fn load_filtered(
        &self,
        store: &mut MetricStore,
        text: &str,
        filter: &NameFilter,
    ) -> Result<usize> {
        let ts = self.default_timestamp.unwrap_or_else(current_time_millis);
        self.load_filtered_at(store, text, filter, ts)
    }

    /// Filtered load with an explicit default timestamp
    pub fn load_filtered_at(
        &self,
        store: &mut MetricStore,
        text: &str,
        filter: &NameFilter,
        default_ts: i64,
    ) -> Result<usize> {
        let start = Instant::now();
        let families = self.parser.parse(text).map_err(parse_failure)?;
        self.apply(store, families, filter, default_ts, start)
    }

    /// Load raw bytes, rejecting invalid UTF-8
    pub fn load_bytes(&self, store: &mut MetricStore, bytes: &[u8]) -> Result<usize> {
        self.load_bytes_filtered(store, bytes, &NameFilter::All)
    }

    /// Filtered load of raw bytes
    pub fn load_bytes_filtered(
        &self,
        store: &mut MetricStore,
        bytes: &[u8],
        filter: &NameFilter,
    ) -> Result<usize> {
        let start = Instant::now();
        let families = self.parser.parse_bytes(bytes).map_err(parse_failure)?;
        let ts = self.default_timestamp.unwrap_or_else(current_time_millis);
        self.apply(store, families, filter, ts, start)
    }

    /// Read a file and load it
    pub fn load_file(&self, store: &mut MetricStore, path: impl AsRef<Path>) -> Result<usize> {
        self.load_file_filtered(store, path, &NameFilter::All)
    }

    /// Read a file and load the families accepted by `filter`
    pub fn load_file_filtered(
        &self,
        store: &mut MetricStore,
        path: impl AsRef<Path>,
        filter: &NameFilter,
    ) -> Result<usize> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Read exposition file");
        self.load_bytes_filtered(store, &bytes, filter)
    }

    fn apply(
        &self,
        store: &mut MetricStore,
        families: Vec<MetricFamily>,
        filter: &NameFilter,
        default_ts: i64,
        start: Instant,
    ) -> Result<usize> {
        let filtered = !matches!(filter, NameFilter::All);
        let mut samples: Vec<Sample> = Vec::new();
        let mut help = Vec::new();
        let mut family_count = 0;

        for family in families.iter().filter(|f| filter.matches(&f.name)) {
            family_count += 1;
            samples.extend(decompose(family, default_ts));
            if let Some(text) = &family.help {
                help.push((family.name.clone(), text.clone()));
            }
        }

        let sample_count = store.append_all(samples)?;
        for (name, text) in help {
            store.set_help(name, text);
        }

        let elapsed = start.elapsed();
        metrics::record_load(filtered, sample_count, elapsed.as_secs_f64());
        metrics::update_stored_samples(store.sample_count());
        info!(
            families = family_count,
            skipped = families.len() - family_count,
            samples = sample_count,
            elapsed_us = elapsed.as_micros() as u64,
            "Loaded exposition text"
        );

        Ok(family_count)
    }
}

fn parse_failure(e: ParseError) -> Error {
    let class = if e.is_syntax_error() {
        "syntax"
    } else if e.is_family_error() {
        "family"
    } else {
        "other"
    };
    metrics::record_parse_error(class);
    Error::Parse(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "# HELP http_requests_total Total HTTP requests.\n\
                        # TYPE http_requests_total counter\n\
                        http_requests_total{method=\"GET\",code=\"200\"} 10\n\
                        http_requests_total{method=\"POST\",code=\"500\"} 2 1000\n\
                        # TYPE rpc_seconds histogram\n\
                        rpc_seconds_bucket{le=\"1\"} 3\n\
                        rpc_seconds_bucket{le=\"+Inf\"} 4\n\
                        rpc_seconds_sum 2.5\n\
                        rpc_seconds_count 4\n";

    #[test]
    fn test_load_counts_families_and_decomposes() {
        let mut store = MetricStore::new();
        let families = Loader::new().load_at(&mut store, TEXT, 5000).unwrap();

        assert_eq!(families, 2);
        assert_eq!(
            store.metric_names(),
            vec![
                "http_requests_total",
                "rpc_seconds_bucket",
                "rpc_seconds_count",
                "rpc_seconds_sum"
            ]
        );
        assert_eq!(store.sample_count(), 6);
        assert_eq!(store.help("http_requests_total"), Some("Total HTTP requests."));
    }

    #[test]
    fn test_timestamp_policy() {
        let mut store = MetricStore::new();
        Loader::new().load_at(&mut store, TEXT, 5000).unwrap();

        let ts: Vec<i64> = store
            .samples("http_requests_total")
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(ts, vec![5000, 1000]);
    }

    #[test]
    fn test_wall_clock_shared_within_load() {
        let mut store = MetricStore::new();
        let before = current_time_millis();
        Loader::new().load(&mut store, "a 1\nb 2\nc 3\n").unwrap();
        let after = current_time_millis();

        let ts: Vec<i64> = store
            .metric_names()
            .iter()
            .map(|n| store.samples(n)[0].timestamp)
            .collect();
        assert!(ts.iter().all(|t| *t == ts[0]));
        assert!(ts[0] >= before && ts[0] <= after);
    }

    #[test]
    fn test_configured_default_timestamp() {
        let config = IngestConfig {
            default_timestamp_ms: Some(42),
            ..IngestConfig::default()
        };
        let mut store = MetricStore::new();
        Loader::with_config(&config).load(&mut store, "up 1\n").unwrap();
        assert_eq!(store.samples("up")[0].timestamp, 42);
    }

    #[test]
    fn test_parse_failure_leaves_store_unchanged() {
        let mut store = MetricStore::new();
        Loader::new().load_at(&mut store, "up 1\n", 1).unwrap();

        let err = Loader::new()
            .load_at(&mut store, "a 1\nb 2\nc{ 3\n", 2)
            .unwrap_err();
        assert!(matches!(err, Error::Parse(ref e) if e.line == Some(3)));
        assert_eq!(store.metric_names(), vec!["up"]);
        assert_eq!(store.sample_count(), 1);
    }

    #[test]
    fn test_load_is_additive() {
        let mut store = MetricStore::new();
        let loader = Loader::new();
        loader.load_at(&mut store, "up 1\n", 1000).unwrap();
        loader.load_at(&mut store, "up 1\n", 1000).unwrap();
        assert_eq!(store.samples("up").len(), 2);
    }

    #[test]
    fn test_load_filtered_regex() {
        let mut store = MetricStore::new();
        let filter = NameFilter::regex("^http_").unwrap();
        let families = Loader::new()
            .load_filtered_at(&mut store, TEXT, &filter, 0)
            .unwrap();

        assert_eq!(families, 1);
        assert_eq!(store.metric_names(), vec!["http_requests_total"]);
    }

    #[test]
    fn test_load_filtered_on_family_name() {
        let mut store = MetricStore::new();
        let filter = NameFilter::predicate(|name| name == "rpc_seconds");
        Loader::new()
            .load_filtered_at(&mut store, TEXT, &filter, 0)
            .unwrap();

        assert_eq!(store.metric_count(), 3);
        assert!(!store.contains("http_requests_total"));
        assert_eq!(store.help("http_requests_total"), None);
    }

    #[test]
    fn test_invalid_filter_regex() {
        assert!(matches!(
            NameFilter::regex("("),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_empty_text_adds_nothing() {
        let mut store = MetricStore::new();
        assert_eq!(Loader::new().load(&mut store, "").unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.prom");
        std::fs::write(&path, TEXT).unwrap();

        let mut store = MetricStore::new();
        assert_eq!(Loader::new().load_file(&mut store, &path).unwrap(), 2);

        let missing = dir.path().join("missing.prom");
        let err = Loader::new().load_file(&mut store, &missing).unwrap_err();
        assert!(matches!(err, Error::Io { ref path, .. } if path == &missing));
    }

    #[test]
    fn test_load_file_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.prom");
        std::fs::write(&path, TEXT).unwrap();

        let mut store = MetricStore::new();
        let filter = NameFilter::regex("^rpc_").unwrap();
        assert_eq!(
            Loader::new()
                .load_file_filtered(&mut store, &path, &filter)
                .unwrap(),
            1
        );
        assert!(!store.contains("http_requests_total"));
        assert!(store.contains("rpc_seconds_sum"));

        let bad = dir.path().join("bad.prom");
        std::fs::write(&bad, b"up 1\nmsg{x=\"\xff\"} 1\n").unwrap();
        let mut store = MetricStore::new();
        let err = Loader::new()
            .load_file_filtered(&mut store, &bad, &NameFilter::All)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ref e) if matches!(e.kind, crate::ingestion::protocol::ParseErrorKind::InvalidUtf8)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_help_on_member_name_keeps_single_sum() {
        let text = "# HELP lat_sum total latency\n\
                    # TYPE lat summary\n\
                    lat{quantile=\"0.5\"} 1\n\
                    lat_sum 10\n\
                    lat_count 3\n";
        let mut store = MetricStore::new();
        Loader::new().load_at(&mut store, text, 5).unwrap();

        let sums = store.samples("lat_sum");
        assert_eq!(sums.len(), 1);
        assert_eq!(sums[0].value, 10.0);
        assert_eq!(store.samples("lat_count").len(), 1);
    }
}
