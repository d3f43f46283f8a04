//! Rendering the store back to exposition text
//!
//! Output is deterministic:
//!
//! - metric names in lexical order
//! - within a metric, series ordered by canonical label key (`__name__` excluded)
//! - within a series, ascending timestamp (equal timestamps keep insertion order)
//!
//! Every line carries its timestamp. No `# HELP` or `# TYPE` lines are
//! written, and histograms and summaries stay flattened.
//!
//! ```text
//! http_requests_total{code="200",method="GET"} 10 1700000000000
//! up 1 1700000000000
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::store::MetricStore;
use crate::types::{format_value, Sample};

/// Write the whole store to `writer`
pub fn save<W: Write>(store: &MetricStore, writer: &mut W) -> Result<()> {
    let mut lines = 0;
    let mut buf = String::new();

    for name in store.metric_names() {
        buf.clear();
        lines += render_metric(&mut buf, &name, store.samples(&name));
        writer.write_all(buf.as_bytes())?;
    }

    debug!(metrics = store.metric_count(), lines, "Serialized store");
    Ok(())
}

/// Render the whole store as a string
pub fn save_to_string(store: &MetricStore) -> String {
    let mut out = String::new();
    for name in store.metric_names() {
        render_metric(&mut out, &name, store.samples(&name));
    }
    out
}

/// Write the whole store to a file, replacing it
pub fn save_file(store: &MetricStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);

    save(store, &mut writer).map_err(|e| match e {
        Error::Stream(source) => Error::io(path, source),
        other => other,
    })?;
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Append one metric's lines to `out`, returning the line count
fn render_metric(out: &mut String, name: &str, samples: &[Sample]) -> usize {
    let mut series: BTreeMap<String, Vec<&Sample>> = BTreeMap::new();
    for sample in samples {
        series
            .entry(sample.labels.canonical_key_without_name())
            .or_default()
            .push(sample);
    }

    let mut lines = 0;
    for (key, mut points) in series {
        points.sort_by_key(|s| s.timestamp);
        for sample in points {
            out.push_str(name);
            if !key.is_empty() {
                out.push('{');
                out.push_str(&key);
                out.push('}');
            }
            out.push(' ');
            out.push_str(&format_value(sample.value));
            out.push(' ');
            out.push_str(&sample.timestamp.to_string());
            out.push('\n');
            lines += 1;
        }
    }
    lines
}
