//! Configuration and logging shared by the importers

pub mod config;
pub mod constants;
pub mod logging;

pub use config::{
    ConfigError, DatadogConfig, HttpConfig, ImporterConfig, StackdriverConfig,
};
pub use logging::init_logging;
