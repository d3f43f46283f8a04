//! Property tests for export/ingest and selection
//!
//! Random stores are rendered, reloaded and queried; the properties below
//! must hold for any of them.

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;

use kuba_promstore::{
    export,
    ingestion::Loader,
    query::{LabelMatcher, Querier, Queryable},
    store::MetricStore,
    types::{Labels, Sample, METRIC_NAME_LABEL},
};

// =============================================================================
// Strategies
// =============================================================================

fn metric_name() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("up"),
        Just("http_requests_total"),
        Just("queue_depth"),
        Just("rpc_latency_sum"),
    ]
}

/// Label values including characters that need escaping
fn label_value() -> impl Strategy<Value = String> {
    "[a-z0-9 /\"\\\\\n\t]{1,6}"
}

fn sample_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1e6..1e6f64),
        (0u32..10_000).prop_map(|i| i as f64),
        Just(0.0),
        Just(f64::INFINITY),
    ]
}

fn sample() -> impl Strategy<Value = Sample> {
    (
        metric_name(),
        proptest::option::of(label_value()),
        proptest::option::of(label_value()),
        sample_value(),
        0i64..1_000_000,
    )
        .prop_map(|(name, job, path, value, timestamp)| {
            let mut labels = Labels::with_name(name);
            if let Some(job) = job {
                labels.insert("job", job);
            }
            if let Some(path) = path {
                labels.insert("path", path);
            }
            Sample::new(labels, value, timestamp)
        })
}

fn store() -> impl Strategy<Value = MetricStore> {
    prop::collection::vec(sample(), 0..40).prop_map(|samples| {
        let mut store = MetricStore::new();
        store.append_all(samples).unwrap();
        store
    })
}

fn matcher() -> impl Strategy<Value = LabelMatcher> {
    prop_oneof![
        metric_name().prop_map(|n| LabelMatcher::metric_name(n)),
        label_value().prop_map(|v| LabelMatcher::equal("job", v)),
        label_value().prop_map(|v| LabelMatcher::not_equal("path", v)),
        Just(LabelMatcher::regex(METRIC_NAME_LABEL, ".*_total|up").unwrap()),
        Just(LabelMatcher::not_regex("job", "[a-m].*").unwrap()),
    ]
}

// =============================================================================
// Helpers
// =============================================================================

/// Multiset of (series, timestamp, value bits)
fn contents(store: &MetricStore) -> HashMap<(String, i64, u64), usize> {
    let mut out = HashMap::new();
    for (_, samples) in store.iter() {
        for s in samples {
            *out.entry((s.labels.canonical_key(), s.timestamp, s.value.to_bits()))
                .or_insert(0) += 1;
        }
    }
    out
}

fn selected_keys(store: &MetricStore, matchers: &[LabelMatcher]) -> BTreeSet<String> {
    let querier = store.querier(i64::MIN, i64::MAX).unwrap();
    querier
        .select(false, matchers)
        .iter()
        .map(|s| s.labels().canonical_key())
        .collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_save_then_load_preserves_contents(store in store()) {
        let text = export::save_to_string(&store);

        let mut reloaded = MetricStore::new();
        Loader::new().load_at(&mut reloaded, &text, -1).unwrap();

        prop_assert_eq!(contents(&reloaded), contents(&store));
        prop_assert_eq!(export::save_to_string(&reloaded), text);
    }

    #[test]
    fn prop_select_respects_window(
        store in store(),
        name in metric_name(),
        mint in 0i64..1_000_000,
        width in 0i64..500_000,
    ) {
        let maxt = mint + width;
        let querier = store.querier(mint, maxt).unwrap();
        let set = querier.select(true, &[LabelMatcher::metric_name(name)]);

        let mut points = 0;
        for series in set.iter() {
            prop_assert!(!series.is_empty());
            for p in series.points() {
                prop_assert!(p.timestamp >= mint && p.timestamp <= maxt);
            }
            prop_assert!(series.points().windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            points += series.len();
        }

        let expected = store
            .samples(name)
            .iter()
            .filter(|s| s.timestamp >= mint && s.timestamp <= maxt)
            .count();
        prop_assert_eq!(points, expected);
    }

    #[test]
    fn prop_matchers_are_conjunctive(store in store(), a in matcher(), b in matcher()) {
        let left = selected_keys(&store, std::slice::from_ref(&a));
        let right = selected_keys(&store, std::slice::from_ref(&b));
        let both = selected_keys(&store, &[a, b]);

        let intersection: BTreeSet<String> = left.intersection(&right).cloned().collect();
        prop_assert!(both.is_subset(&intersection));
    }
}
