//! Domain model
//!
//! - `view` - named metric with an ordered label schema
//! - `filter` - monitoring filter builder
//! - `point` - backend observations and their normalization
//! - `importer` - the importer plugin contract
//! - `resolver` - fans a query out to every registered importer

pub mod filter;
pub mod importer;
pub mod point;
pub mod resolver;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use filter::{Filter, FilterError};
pub use importer::{ImportError, Importer, QueryContext, check_labels};
pub use point::{Point, PointValue, TimeInterval, TimeSeries, latest_point};
pub use resolver::{Resolution, ValueResolver};
pub use view::View;
