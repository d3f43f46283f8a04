//! Flattening of metric families into stored samples
//!
//! Counters, gauges and untyped metrics map 1:1 onto samples. Histograms
//! and summaries are spread over several scalar series:
//!
//! ```text
//! histogram h{svc="a"}          summary s{svc="a"}
//!   h_bucket{svc="a",le="0.1"}    s{svc="a",quantile="0.5"}
//!   h_bucket{svc="a",le="+Inf"}   s{svc="a",quantile="0.99"}
//!   h_sum{svc="a"}                s_sum{svc="a"}
//!   h_count{svc="a"}              s_count{svc="a"}
//! ```
//!
//! A missing `_sum` or `_count` line is emitted with value 0. There is no
//! inverse: stored data stays flattened.

use super::protocol::{Metric, MetricFamily, MetricValue};
use crate::types::{
    format_value, Labels, Sample, BUCKET_LABEL, BUCKET_SUFFIX, COUNT_SUFFIX, METRIC_NAME_LABEL,
    QUANTILE_LABEL, SUM_SUFFIX,
};

/// Flatten one family into samples
///
/// Instances without an explicit timestamp get `default_ts`.
pub fn decompose(family: &MetricFamily, default_ts: i64) -> Vec<Sample> {
    let mut samples = Vec::new();
    for metric in &family.metrics {
        decompose_metric(&family.name, metric, default_ts, &mut samples);
    }
    samples
}

fn decompose_metric(name: &str, metric: &Metric, default_ts: i64, out: &mut Vec<Sample>) {
    let ts = metric.timestamp.unwrap_or(default_ts);

    match &metric.value {
        MetricValue::Scalar(value) => {
            out.push(Sample::new(labels_for(name, metric, None), *value, ts));
        }
        MetricValue::Histogram {
            buckets,
            sum,
            count,
        } => {
            let bucket_name = format!("{}{}", name, BUCKET_SUFFIX);
            for bucket in buckets {
                let le = format_value(bucket.upper_bound);
                out.push(Sample::new(
                    labels_for(&bucket_name, metric, Some((BUCKET_LABEL, le))),
                    bucket.cumulative_count,
                    ts,
                ));
            }
            push_sum_count(name, metric, *sum, *count, ts, out);
        }
        MetricValue::Summary {
            quantiles,
            sum,
            count,
        } => {
            for q in quantiles {
                let quantile = format_value(q.quantile);
                out.push(Sample::new(
                    labels_for(name, metric, Some((QUANTILE_LABEL, quantile))),
                    q.value,
                    ts,
                ));
            }
            push_sum_count(name, metric, *sum, *count, ts, out);
        }
    }
}

fn push_sum_count(
    name: &str,
    metric: &Metric,
    sum: Option<f64>,
    count: Option<f64>,
    ts: i64,
    out: &mut Vec<Sample>,
) {
    out.push(Sample::new(
        labels_for(&format!("{}{}", name, SUM_SUFFIX), metric, None),
        sum.unwrap_or(0.0),
        ts,
    ));
    out.push(Sample::new(
        labels_for(&format!("{}{}", name, COUNT_SUFFIX), metric, None),
        count.unwrap_or(0.0),
        ts,
    ));
}

fn labels_for(name: &str, metric: &Metric, extra: Option<(&str, String)>) -> Labels {
    let mut labels: Labels = metric
        .labels
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    if let Some((k, v)) = extra {
        labels.insert(k, v);
    }
    labels.insert(METRIC_NAME_LABEL, name);
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::protocol::ExpositionParser;

    fn families(text: &str) -> Vec<MetricFamily> {
        ExpositionParser::new().parse(text).unwrap()
    }

    #[test]
    fn test_scalar_keeps_labels_and_timestamp() {
        let fam = families("up{job=\"api\"} 1 1234\nup{job=\"db\"} 0\n");
        let samples = decompose(&fam[0], 9999);

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].metric_name(), "up");
        assert_eq!(samples[0].labels.get("job"), Some("api"));
        assert_eq!(samples[0].timestamp, 1234);
        assert_eq!(samples[1].timestamp, 9999);
    }

    #[test]
    fn test_histogram_shape() {
        let text = "# TYPE rpc histogram\n\
                    rpc_bucket{svc=\"a\",le=\"0.50\"} 1\n\
                    rpc_bucket{svc=\"a\",le=\"1e1\"} 4\n\
                    rpc_bucket{svc=\"a\",le=\"+Inf\"} 5\n\
                    rpc_sum{svc=\"a\"} 7.5\n\
                    rpc_count{svc=\"a\"} 5\n";
        let samples = decompose(&families(text)[0], 0);

        let buckets: Vec<_> = samples
            .iter()
            .filter(|s| s.metric_name() == "rpc_bucket")
            .collect();
        assert_eq!(buckets.len(), 3);
        let les: Vec<_> = buckets.iter().map(|s| s.labels.get("le").unwrap()).collect();
        assert_eq!(les, vec!["0.5", "10", "+Inf"]);
        assert!(buckets.iter().all(|s| s.labels.get("svc") == Some("a")));

        let sum = samples.iter().find(|s| s.metric_name() == "rpc_sum").unwrap();
        assert_eq!(sum.value, 7.5);
        assert!(!sum.labels.contains("le"));
        let count = samples
            .iter()
            .find(|s| s.metric_name() == "rpc_count")
            .unwrap();
        assert_eq!(count.value, 5.0);
        assert_eq!(samples.len(), 5);
    }

    #[test]
    fn test_summary_shape() {
        let text = "# TYPE lat summary\n\
                    lat{quantile=\"0.5\"} 0.1\n\
                    lat{quantile=\"0.9\"} 0.4\n";
        let samples = decompose(&families(text)[0], 42);

        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].metric_name(), "lat");
        assert_eq!(samples[0].labels.get("quantile"), Some("0.5"));
        assert_eq!(samples[2].metric_name(), "lat_sum");
        assert_eq!(samples[2].value, 0.0);
        assert_eq!(samples[3].metric_name(), "lat_count");
        assert_eq!(samples[3].value, 0.0);
        assert!(samples.iter().all(|s| s.timestamp == 42));
    }
}
