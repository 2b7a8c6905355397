use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::client::MetricsQueryClient;
use super::query::{DatadogQuery, metric_name};
use crate::core::DatadogConfig;
use crate::core::constants::{DATADOG_HOST_TAG, DATADOG_IMPORTER_NAME};
use crate::domain::{ImportError, Importer, QueryContext, View, latest_point};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatadogOptions {
    /// Prefix joined to view names with a `.`
    pub namespace: String,
    /// Restricts queries to points reported by this host
    pub hostname: Option<String>,
}

impl From<&DatadogConfig> for DatadogOptions {
    fn from(config: &DatadogConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            hostname: config.hostname.clone(),
        }
    }
}

/// Reads view values back from Datadog
#[derive(Debug)]
pub struct DatadogImporter {
    options: DatadogOptions,
    client: Arc<dyn MetricsQueryClient>,
}

impl DatadogImporter {
    pub fn new(options: DatadogOptions, client: Arc<dyn MetricsQueryClient>) -> Self {
        Self { options, client }
    }

    pub fn options(&self) -> &DatadogOptions {
        &self.options
    }

    /// The configured hostname takes precedence over a view label named `host`.
    pub fn query(&self, view: &View, ctx: &QueryContext) -> DatadogQuery {
        let mut query = DatadogQuery::new(metric_name(&self.options.namespace, view));
        for (tag, value) in &ctx.labels {
            query.add_tag(tag, value);
        }
        if let Some(host) = self.options.hostname.as_deref().filter(|h| !h.is_empty()) {
            if let Some(label) = ctx.labels.get(DATADOG_HOST_TAG) {
                tracing::warn!(
                    view = %view.name,
                    label = %label,
                    hostname = %host,
                    "View label 'host' collides with the configured hostname, using the hostname"
                );
            }
            query.add_hostname(host);
        }
        query
    }
}

#[async_trait]
impl Importer for DatadogImporter {
    fn name(&self) -> &str {
        DATADOG_IMPORTER_NAME
    }

    async fn value(
        &self,
        view: &View,
        label_values: &[String],
        as_of: DateTime<Utc>,
    ) -> Result<f64, ImportError> {
        let ctx = QueryContext::new(view, label_values, as_of)?;
        let query = self.query(view, &ctx).to_string();

        tracing::debug!(query = %query, "Querying Datadog metrics");

        let series = self.client.query_metrics(ctx.interval, &query).await?;

        latest_point(&series)
            .map(|point| point.value.as_f64())
            .ok_or_else(|| ImportError::no_results(DATADOG_IMPORTER_NAME, query))
    }
}
