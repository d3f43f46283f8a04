//! Ingestion of exposition text
//!
//! ```text
//! [text] → [protocol::ExpositionParser] → [MetricFamily] → [decompose] → [Sample] → [MetricStore]
//!                                              │
//!                                         [NameFilter]
//! ```
//!
//! - **protocol**: line parser and family assembly
//! - **decompose**: histogram/summary flattening
//! - **loader**: timestamp policy, filtering and store mutation

pub mod decompose;
pub mod loader;
pub mod protocol;

pub use decompose::decompose;
pub use loader::{Loader, NameFilter};
pub use protocol::{MetricFamily, MetricType, ParseError, ParseErrorKind};
