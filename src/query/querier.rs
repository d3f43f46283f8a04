//! Store-backed queriers
//!
//! A querier is a read-only view of a store restricted to an inclusive
//! `[mint, maxt]` window. It answers the three primitives an expression
//! engine needs: series selection, label names and label values.
//!
//! # Select algorithm
//!
//! One pass over candidate samples: drop samples outside the window or
//! failing a matcher, group the survivors by canonical label key. Series
//! therefore never come back empty. An `__name__="x"` matcher narrows the
//! candidates to one metric; otherwise every metric is scanned.

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLockReadGuard;
use tracing::debug;

use super::matcher::{matches_all, LabelMatcher, MatchOp};
use super::series::{Series, SeriesSet};
use crate::error::Result;
use crate::metrics;
use crate::store::{MetricStore, SharedStore};
use crate::types::{Labels, Point, Sample, TimeRange, METRIC_NAME_LABEL};

/// Read access to series data over a fixed time window
pub trait Querier {
    /// Series matching every matcher with at least one sample in the window
    ///
    /// Each series carries only its in-window samples, ordered by timestamp.
    /// With `sort_series` the set is ordered by canonical label key. Never
    /// fails: problems are reported as warnings on an empty set.
    ///
    /// An empty matcher list is such a problem: selection needs at least one
    /// matcher, unlike [`label_names`](Querier::label_names) and
    /// [`label_values`](Querier::label_values).
    fn select(&self, sort_series: bool, matchers: &[LabelMatcher]) -> SeriesSet;

    /// Sorted distinct label names of matching in-window samples
    ///
    /// An empty matcher list matches every in-window sample.
    fn label_names(&self, matchers: &[LabelMatcher]) -> Result<Vec<String>>;

    /// Sorted distinct values of `name` across matching in-window samples
    ///
    /// An empty matcher list matches every in-window sample.
    fn label_values(&self, name: &str, matchers: &[LabelMatcher]) -> Result<Vec<String>>;

    /// The window this querier is scoped to
    fn time_range(&self) -> TimeRange;
}

/// Anything that can open queriers
pub trait Queryable {
    /// Open a querier over `[mint, maxt]`
    ///
    /// `mint > maxt` yields a querier that selects nothing.
    fn querier(&self, mint: i64, maxt: i64) -> Result<Box<dyn Querier + '_>>;
}

/// Querier borrowing a [`MetricStore`]
#[derive(Debug, Clone, Copy)]
pub struct StoreQuerier<'a> {
    store: &'a MetricStore,
    range: TimeRange,
}

impl<'a> StoreQuerier<'a> {
    /// Open a view over `range`
    pub fn new(store: &'a MetricStore, range: TimeRange) -> Self {
        Self { store, range }
    }

    /// Samples that could match, narrowed by an `__name__` equality matcher
    fn candidates(&self, matchers: &[LabelMatcher]) -> Vec<&'a [Sample]> {
        let by_name = matchers
            .iter()
            .find(|m| m.name() == METRIC_NAME_LABEL && m.op() == MatchOp::Equal);

        match by_name {
            Some(m) => vec![self.store.samples(m.value())],
            None => self.store.iter().map(|(_, samples)| samples).collect(),
        }
    }

    /// In-window samples satisfying every matcher
    fn matching<'m>(
        &'m self,
        matchers: &'m [LabelMatcher],
    ) -> impl Iterator<Item = &'a Sample> + 'm {
        let range = self.range;
        self.candidates(matchers)
            .into_iter()
            .flat_map(|samples| samples.iter())
            .filter(move |s| range.contains(s.timestamp) && matches_all(matchers, &s.labels))
    }
}

impl Querier for StoreQuerier<'_> {
    fn select(&self, sort_series: bool, matchers: &[LabelMatcher]) -> SeriesSet {
        if matchers.is_empty() {
            return SeriesSet::with_warning("select needs at least one label matcher");
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Labels, Vec<Point>)> = Vec::new();

        for sample in self.matching(matchers) {
            let key = sample.labels.canonical_key();
            let point = Point::new(sample.timestamp, sample.value);
            match index.get(&key) {
                Some(&i) => groups[i].2.push(point),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, sample.labels.clone(), vec![point]));
                }
            }
        }

        if sort_series {
            groups.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let series: Vec<Series> = groups
            .into_iter()
            .map(|(_, labels, points)| Series::new(labels, points))
            .collect();

        debug!(
            matchers = matchers.len(),
            series = series.len(),
            mint = self.range.start,
            maxt = self.range.end,
            "Select"
        );
        metrics::record_select(series.len());
        SeriesSet::new(series)
    }

    fn label_names(&self, matchers: &[LabelMatcher]) -> Result<Vec<String>> {
        let names: BTreeSet<&str> = self
            .matching(matchers)
            .flat_map(|s| s.labels.iter().map(|(name, _)| name))
            .collect();
        Ok(names.into_iter().map(String::from).collect())
    }

    fn label_values(&self, name: &str, matchers: &[LabelMatcher]) -> Result<Vec<String>> {
        let values: BTreeSet<&str> = self
            .matching(matchers)
            .filter_map(|s| s.labels.get(name))
            .collect();
        Ok(values.into_iter().map(String::from).collect())
    }

    fn time_range(&self) -> TimeRange {
        self.range
    }
}

impl Queryable for MetricStore {
    fn querier(&self, mint: i64, maxt: i64) -> Result<Box<dyn Querier + '_>> {
        Ok(Box::new(StoreQuerier::new(
            self,
            TimeRange::new_unchecked(mint, maxt),
        )))
    }
}

/// Querier holding a read guard on a [`SharedStore`]
pub struct SharedQuerier<'a> {
    guard: RwLockReadGuard<'a, MetricStore>,
    range: TimeRange,
}

impl SharedQuerier<'_> {
    fn view(&self) -> StoreQuerier<'_> {
        StoreQuerier::new(&self.guard, self.range)
    }
}

impl Querier for SharedQuerier<'_> {
    fn select(&self, sort_series: bool, matchers: &[LabelMatcher]) -> SeriesSet {
        self.view().select(sort_series, matchers)
    }

    fn label_names(&self, matchers: &[LabelMatcher]) -> Result<Vec<String>> {
        self.view().label_names(matchers)
    }

    fn label_values(&self, name: &str, matchers: &[LabelMatcher]) -> Result<Vec<String>> {
        self.view().label_values(name, matchers)
    }

    fn time_range(&self) -> TimeRange {
        self.range
    }
}

impl Queryable for SharedStore {
    fn querier(&self, mint: i64, maxt: i64) -> Result<Box<dyn Querier + '_>> {
        Ok(Box::new(SharedQuerier {
            guard: self.read(),
            range: TimeRange::new_unchecked(mint, maxt),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::Loader;

    fn store() -> MetricStore {
        let text = "http_requests_total{method=\"GET\",code=\"200\"} 1 1000\n\
                    http_requests_total{method=\"GET\",code=\"200\"} 2 2000\n\
                    http_requests_total{method=\"POST\",code=\"500\"} 3 3000\n\
                    up{job=\"api\"} 1 1000\n\
                    up{job=\"db\"} 0 5000\n\
                    up 1 1500\n";
        let mut store = MetricStore::new();
        Loader::new().load(&mut store, text).unwrap();
        store
    }

    #[test]
    fn test_select_groups_series() {
        let store = store();
        let q = store.querier(0, 10_000).unwrap();
        let set = q.select(true, &[LabelMatcher::metric_name("http_requests_total")]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.series()[0].labels().get("method"), Some("GET"));
        assert_eq!(set.series()[0].len(), 2);
        assert_eq!(set.series()[1].labels().get("method"), Some("POST"));
        assert!(set.warnings().is_empty());
    }

    #[test]
    fn test_select_restricts_window() {
        let store = store();
        let q = store.querier(1500, 2500).unwrap();
        let set = q.select(true, &[LabelMatcher::metric_name("http_requests_total")]);

        // POST series has nothing in the window and is not returned
        assert_eq!(set.len(), 1);
        let points = set.series()[0].points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, 2000);
    }

    #[test]
    fn test_select_inverted_window_is_empty() {
        let store = store();
        let q = store.querier(10_000, 0).unwrap();
        assert!(q
            .select(false, &[LabelMatcher::metric_name("up")])
            .is_empty());
    }

    #[test]
    fn test_select_across_metrics_with_regex() {
        let store = store();
        let q = store.querier(i64::MIN, i64::MAX).unwrap();
        let set = q.select(
            true,
            &[LabelMatcher::regex(METRIC_NAME_LABEL, "up|http_.*").unwrap()],
        );
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_select_absent_label() {
        let store = store();
        let q = store.querier(i64::MIN, i64::MAX).unwrap();
        let set = q.select(
            false,
            &[
                LabelMatcher::metric_name("up"),
                LabelMatcher::equal("job", ""),
            ],
        );
        assert_eq!(set.len(), 1);
        assert!(!set.series()[0].labels().contains("job"));
    }

    #[test]
    fn test_select_without_matchers_warns() {
        let store = store();
        let q = store.querier(0, 10_000).unwrap();
        let set = q.select(false, &[]);
        assert!(set.is_empty());
        assert_eq!(set.warnings().len(), 1);
    }

    #[test]
    fn test_label_lookups_without_matchers_match_all() {
        let store = store();
        let q = store.querier(0, 10_000).unwrap();

        let names = q.label_names(&[]).unwrap();
        assert!(names.contains(&"__name__".to_string()));
        assert!(names.contains(&"job".to_string()));

        let metrics = q.label_values("__name__", &[]).unwrap();
        assert!(metrics.contains(&"up".to_string()));
        assert!(metrics.contains(&"http_requests_total".to_string()));
    }

    #[test]
    fn test_label_names_and_values() {
        let store = store();
        let q = store.querier(0, 10_000).unwrap();

        let names = q
            .label_names(&[LabelMatcher::metric_name("http_requests_total")])
            .unwrap();
        assert_eq!(names, vec!["__name__", "code", "method"]);

        let values = q
            .label_values("job", &[LabelMatcher::metric_name("up")])
            .unwrap();
        assert_eq!(values, vec!["api", "db"]);

        let all_names = q.label_values(METRIC_NAME_LABEL, &[]).unwrap();
        assert_eq!(all_names, vec!["http_requests_total", "up"]);
    }

    #[test]
    fn test_label_values_respect_window() {
        let store = store();
        let q = store.querier(0, 2000).unwrap();
        let values = q
            .label_values("job", &[LabelMatcher::metric_name("up")])
            .unwrap();
        assert_eq!(values, vec!["api"]);
    }

    #[test]
    fn test_shared_store_nested_queriers() {
        let shared = SharedStore::from_store(store());
        let outer = shared.querier(0, 10_000).unwrap();
        let inner = shared.querier(0, 1000).unwrap();

        let m = [LabelMatcher::metric_name("up")];
        assert_eq!(outer.select(false, &m).len(), 3);
        assert_eq!(inner.select(false, &m).len(), 1);
        assert_eq!(inner.time_range(), TimeRange::new_unchecked(0, 1000));
    }
}
