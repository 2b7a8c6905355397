//! Datadog importer

mod client;
mod importer;
mod query;

pub use client::{HttpDatadogClient, MetricsQueryClient};
pub use importer::{DatadogImporter, DatadogOptions};
pub use query::{DatadogQuery, metric_name};
