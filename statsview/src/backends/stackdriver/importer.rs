use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::client::MonitoringClient;
use crate::core::StackdriverConfig;
use crate::core::constants::{
    STACKDRIVER_DEFAULT_METRIC_PREFIX, STACKDRIVER_DEFAULT_RESOURCE_TYPE,
    STACKDRIVER_IMPORTER_NAME,
};
use crate::domain::{Filter, ImportError, Importer, QueryContext, View, latest_point};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackdriverOptions {
    pub project_id: String,
    pub resource_type: String,
    pub metric_prefix: String,
    /// Prepended verbatim to every view name
    pub namespace: String,
}

impl StackdriverOptions {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            resource_type: STACKDRIVER_DEFAULT_RESOURCE_TYPE.to_string(),
            metric_prefix: STACKDRIVER_DEFAULT_METRIC_PREFIX.to_string(),
            namespace: String::new(),
        }
    }
}

impl From<&StackdriverConfig> for StackdriverOptions {
    fn from(config: &StackdriverConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            resource_type: config.resource_type.clone(),
            metric_prefix: config.metric_prefix.clone(),
            namespace: config.namespace.clone(),
        }
    }
}

/// Reads view values back from Google Cloud Monitoring
#[derive(Debug)]
pub struct StackdriverImporter {
    options: StackdriverOptions,
    client: Arc<dyn MonitoringClient>,
}

impl StackdriverImporter {
    pub fn new(options: StackdriverOptions, client: Arc<dyn MonitoringClient>) -> Self {
        Self { options, client }
    }

    pub fn options(&self) -> &StackdriverOptions {
        &self.options
    }

    /// Filter selecting the time series of `view` for the given labels
    pub fn filter(&self, view: &View, ctx: &QueryContext) -> Result<Filter, ImportError> {
        let metric = format!("{}{}", self.options.namespace, view.name);
        let mut filter = Filter::with_metric_prefix(self.options.metric_prefix.as_str());
        filter
            .add_resource_type(&self.options.resource_type)?
            .add_metric_type(&metric)?
            .add_labels(&ctx.labels)?;
        Ok(filter)
    }
}

#[async_trait]
impl Importer for StackdriverImporter {
    fn name(&self) -> &str {
        STACKDRIVER_IMPORTER_NAME
    }

    async fn value(
        &self,
        view: &View,
        label_values: &[String],
        as_of: DateTime<Utc>,
    ) -> Result<f64, ImportError> {
        let ctx = QueryContext::new(view, label_values, as_of)?;
        let filter = self.filter(view, &ctx)?.to_string();

        tracing::debug!(
            project_id = %self.options.project_id,
            filter = %filter,
            "Listing time series"
        );

        let series = self
            .client
            .list_time_series(&self.options.project_id, &filter, ctx.interval)
            .await?;

        latest_point(&series)
            .map(|point| point.value.as_f64())
            .ok_or_else(|| ImportError::no_results(STACKDRIVER_IMPORTER_NAME, filter))
    }
}
