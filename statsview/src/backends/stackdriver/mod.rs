//! Google Cloud Monitoring (formerly Stackdriver) importer

mod client;
mod importer;

pub use client::{
    AccessTokenSource, GcpTokenSource, HttpMonitoringClient, MonitoringClient, StaticToken,
};
pub use importer::{StackdriverImporter, StackdriverOptions};
