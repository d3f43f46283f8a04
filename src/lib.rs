//! Kuba PromStore - ephemeral in-memory metrics store with a query-adapter surface
//!
//! This library provides:
//! - Ingestion of the metrics exposition text format, with histograms and
//!   summaries flattened into scalar series
//! - Deterministic export back to exposition text
//! - The `Queryable` / `Querier` / `SampleIterator` contract an external
//!   expression engine evaluates against
//! - Synthetic history (backfill) for existing series
//!
//! # Example
//!
//! ```rust
//! use kuba_promstore::{backfill, export, ingestion::Loader, store::MetricStore};
//!
//! let mut store = MetricStore::new();
//! Loader::new()
//!     .load_at(&mut store, "requests_total{job=\"api\"} 100\n", 600_000)
//!     .unwrap();
//!
//! backfill::backfill(&mut store, "requests_total", 2, 60_000).unwrap();
//! assert_eq!(
//!     export::save_to_string(&store),
//!     "requests_total{job=\"api\"} 98 480000\n\
//!      requests_total{job=\"api\"} 99 540000\n\
//!      requests_total{job=\"api\"} 100 600000\n"
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

/// Prometheus metrics and telemetry
pub mod metrics;

/// Configuration management with TOML support
pub mod config;

/// Duration strings (`30s`, `1h30m`)
pub mod duration;

/// In-memory sample store
pub mod store;

/// Exposition text parsing, decomposition and loading
pub mod ingestion;

/// Exposition text serialization
pub mod export;

/// Query adapter for external expression engines
pub mod query;

/// Synthetic history generation
pub mod backfill;

// Re-export main types
pub use error::{Error, Result};
pub use store::{MetricStore, SharedStore};
pub use types::{Labels, Sample, TimeRange};
