//! # statsview
//!
//! Pull side of metrics: read the most recent value of a labeled view back
//! from the backends it was exported to.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use statsview::backends::build_importers;
//! use statsview::core::ImporterConfig;
//! use statsview::data::{ImporterRegistry, ViewRegistry};
//! use statsview::domain::{ValueResolver, View};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! statsview::core::init_logging();
//!
//! let config = ImporterConfig::load(None)?;
//! let importers = Arc::new(ImporterRegistry::new());
//! for importer in build_importers(&config).await? {
//!     importers.register(importer)?;
//! }
//!
//! let views = Arc::new(ViewRegistry::new());
//! views.register([View::new("requests", ["region"])])?;
//!
//! let resolver = ValueResolver::new(importers).with_views(views);
//! let resolution = resolver
//!     .resolve_named("requests", &["us".to_string()], chrono::Utc::now())
//!     .await?;
//! for (importer, value) in resolution.iter() {
//!     println!("{importer}: {value:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
