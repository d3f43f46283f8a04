//! Query adapter
//!
//! The surface an external expression engine reads the store through:
//!
//! - **matcher**: label matchers (`=`, `!=`, `=~`, `!~`)
//! - **series**: selected series and the `SampleIterator` protocol
//! - **querier**: `Queryable` / `Querier` traits and store-backed queriers
//! - **engine**: `QueryEngine` boundary and evaluation time
//!
//! # Example
//!
//! ```rust
//! use kuba_promstore::ingestion::Loader;
//! use kuba_promstore::query::{LabelMatcher, Querier, Queryable, SampleIterator, ValueType};
//! use kuba_promstore::store::MetricStore;
//!
//! let mut store = MetricStore::new();
//! Loader::new()
//!     .load(&mut store, "up{job=\"api\"} 1 1000\nup{job=\"api\"} 0 2000\n")
//!     .unwrap();
//!
//! let querier = store.querier(0, 5000).unwrap();
//! let set = querier.select(true, &[LabelMatcher::metric_name("up")]);
//! assert_eq!(set.len(), 1);
//!
//! let mut it = set.series()[0].iter();
//! assert_eq!(it.seek(1500), ValueType::Float);
//! assert_eq!(it.at(), (2000, 0.0));
//! ```

pub mod engine;
pub mod matcher;
pub mod querier;
pub mod series;

pub use engine::{run_instant, select_instant, EvalTime, QueryEngine, QueryValue};
pub use matcher::{matches_all, LabelMatcher, MatchOp};
pub use querier::{Querier, Queryable, SharedQuerier, StoreQuerier};
pub use series::{SampleIterator, Series, SeriesIterator, SeriesSet, ValueType};
