//! Boundary to an external expression engine
//!
//! The store does not evaluate expressions. An engine implements
//! [`QueryEngine`] against any [`Queryable`]; callers pick the evaluation
//! time per query through [`EvalTime`].

use super::matcher::LabelMatcher;
use super::querier::{Querier, Queryable};
use super::series::{SampleIterator, Series, ValueType};
use crate::error::Result;
use crate::types::{current_time_millis, Point, Sample};

/// Default staleness window of an instant selector (5 minutes)
pub const DEFAULT_LOOKBACK_MS: i64 = 5 * 60 * 1000;

/// Evaluation time of one query
///
/// `Pinned` is a caller-held session value; it resolves exactly like `At`
/// but records that the caller fixed it for a whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalTime {
    /// Wall clock at resolution time
    #[default]
    Now,
    /// Explicit timestamp (ms)
    At(i64),
    /// Session-pinned timestamp (ms)
    Pinned(i64),
}

impl EvalTime {
    /// Resolve against a given "now"
    pub fn resolve(&self, now_ms: i64) -> i64 {
        match *self {
            EvalTime::Now => now_ms,
            EvalTime::At(ts) | EvalTime::Pinned(ts) => ts,
        }
    }

    /// Resolve against the wall clock
    pub fn resolve_now(&self) -> i64 {
        self.resolve(current_time_millis())
    }
}

/// Typed result of an expression
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Single number at the evaluation time
    Scalar(Point),
    /// One sample per series at the evaluation time
    Vector(Vec<Sample>),
    /// Points per series over a range
    Matrix(Vec<Series>),
    /// String literal
    String(String),
}

impl QueryValue {
    /// Result kind as the engine names it
    pub fn kind(&self) -> &'static str {
        match self {
            QueryValue::Scalar(_) => "scalar",
            QueryValue::Vector(_) => "vector",
            QueryValue::Matrix(_) => "matrix",
            QueryValue::String(_) => "string",
        }
    }
}

/// An expression evaluator
pub trait QueryEngine {
    /// Evaluate `expr` at `eval_ts` (ms) against `queryable`
    fn instant_query(
        &self,
        queryable: &dyn Queryable,
        expr: &str,
        eval_ts: i64,
    ) -> Result<QueryValue>;
}

/// Resolve the evaluation time and run an instant query
pub fn run_instant(
    engine: &dyn QueryEngine,
    queryable: &dyn Queryable,
    expr: &str,
    at: EvalTime,
) -> Result<QueryValue> {
    engine.instant_query(queryable, expr, at.resolve_now())
}

/// Latest sample per matching series within `[eval_ts - lookback, eval_ts]`
///
/// The building block of an instant vector selector.
pub fn select_instant(
    queryable: &dyn Queryable,
    matchers: &[LabelMatcher],
    eval_ts: i64,
    lookback_ms: i64,
) -> Result<Vec<Sample>> {
    let querier = queryable.querier(eval_ts.saturating_sub(lookback_ms), eval_ts)?;
    let set = querier.select(true, matchers);

    let mut out = Vec::with_capacity(set.len());
    for series in set.iter() {
        let mut it = series.iter();
        let mut last = None;
        while it.next() == ValueType::Float {
            last = Some(it.at());
        }
        if let Some((timestamp, value)) = last {
            out.push(Sample::new(series.labels().clone(), value, timestamp));
        }
    }
    Ok(out)
}
