//! Concrete importers for remote metrics backends
//!
//! Each backend pairs an [`Importer`] with a client trait, so tests and callers
//! can inject an already-initialized client.

pub mod datadog;
pub mod stackdriver;

use std::sync::Arc;

use crate::core::{ConfigError, ImporterConfig};
use crate::domain::{ImportError, Importer};

pub use datadog::{DatadogImporter, DatadogOptions, HttpDatadogClient};
pub use stackdriver::{HttpMonitoringClient, StackdriverImporter, StackdriverOptions};

/// Builds one importer per configured backend
pub async fn build_importers(
    config: &ImporterConfig,
) -> Result<Vec<Arc<dyn Importer>>, ConfigError> {
    let mut importers: Vec<Arc<dyn Importer>> = Vec::new();

    if let Some(dd) = &config.datadog {
        let client = HttpDatadogClient::new(dd, &config.http)?;
        importers.push(Arc::new(DatadogImporter::new(
            DatadogOptions::from(dd),
            Arc::new(client),
        )));
    }

    if let Some(sd) = &config.stackdriver {
        let client = HttpMonitoringClient::with_default_credentials(sd, &config.http).await?;
        importers.push(Arc::new(StackdriverImporter::new(
            StackdriverOptions::from(sd),
            Arc::new(client),
        )));
    }

    tracing::debug!(count = importers.len(), "Importers built from configuration");
    Ok(importers)
}

/// Passes 2xx responses through.
///
/// 5xx and 429 map to a transient [`ImportError::Http`]; other failures carry
/// the response body.
pub(crate) async fn check_status(
    backend: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ImportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if (status.is_server_error() || status.as_u16() == 429)
        && let Err(e) = resp.error_for_status_ref()
    {
        return Err(ImportError::Http(e));
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ImportError::backend(
        backend,
        format!("status {}: {}", status, body),
    ))
}
