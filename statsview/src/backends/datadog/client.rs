//! Datadog v1 metrics query client

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::backends::check_status;
use crate::core::{ConfigError, DatadogConfig, HttpConfig};
use crate::domain::{ImportError, Point, PointValue, TimeInterval, TimeSeries};
use crate::utils::retry::{RetryPolicy, retry_async};
use crate::utils::time::millis_to_datetime;

const BACKEND: &str = "datadog";

/// Read access to Datadog timeseries queries
#[async_trait]
pub trait MetricsQueryClient: Send + Sync + fmt::Debug {
    async fn query_metrics(
        &self,
        interval: TimeInterval,
        query: &str,
    ) -> Result<Vec<TimeSeries>, ImportError>;
}

pub struct HttpDatadogClient {
    client: reqwest::Client,
    site: String,
    retry: RetryPolicy,
}

impl fmt::Debug for HttpDatadogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDatadogClient")
            .field("site", &self.site)
            .field("retry", &self.retry)
            .finish()
    }
}

impl HttpDatadogClient {
    pub fn new(config: &DatadogConfig, http: &HttpConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert("DD-API-KEY", header_value("api_key", &config.api_key)?);
        headers.insert(
            "DD-APPLICATION-KEY",
            header_value("app_key", &config.app_key)?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .default_headers(headers)
            .build()?;

        tracing::debug!(site = %config.site, "Datadog client initialized");
        Ok(Self {
            client,
            site: config.site.trim_end_matches('/').to_string(),
            retry: RetryPolicy::from(http),
        })
    }

    async fn fetch(&self, interval: TimeInterval, query: &str) -> Result<QueryResponse, ImportError> {
        let base = format!("{}/api/v1/query", self.site);
        let params = [
            ("from", interval.start.timestamp().to_string()),
            ("to", interval.end.timestamp().to_string()),
            ("query", query.to_string()),
        ];
        let url = reqwest::Url::parse_with_params(&base, &params)
            .map_err(|e| ImportError::backend(BACKEND, format!("invalid URL {}: {}", base, e)))?;

        let resp = self.client.get(url).send().await?;
        let resp = check_status(BACKEND, resp).await?;
        Ok(resp.json().await?)
    }
}

fn header_value(key: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    let mut header = HeaderValue::from_str(value).map_err(|e| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })?;
    header.set_sensitive(true);
    Ok(header)
}

#[async_trait]
impl MetricsQueryClient for HttpDatadogClient {
    async fn query_metrics(
        &self,
        interval: TimeInterval,
        query: &str,
    ) -> Result<Vec<TimeSeries>, ImportError> {
        let resp = retry_async(self.retry, ImportError::is_transient, || {
            self.fetch(interval, query)
        })
        .await?;

        if resp.status.as_deref() == Some("error") {
            return Err(ImportError::backend(
                BACKEND,
                resp.error.unwrap_or_else(|| "query failed".to_string()),
            ));
        }
        Ok(resp.series.into_iter().map(ApiSeries::into_domain).collect())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: Option<String>,
    error: Option<String>,
    #[serde(default)]
    series: Vec<ApiSeries>,
}

#[derive(Debug, Deserialize)]
struct ApiSeries {
    metric: String,
    #[serde(default)]
    tag_set: Vec<String>,
    /// `[timestamp_ms, value]`, value is null for empty rollup buckets
    #[serde(default)]
    pointlist: Vec<(f64, Option<f64>)>,
}

impl ApiSeries {
    fn into_domain(self) -> TimeSeries {
        let labels = self
            .tag_set
            .iter()
            .filter_map(|tag| tag.split_once(':'))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>();
        let points = self
            .pointlist
            .into_iter()
            .filter_map(|(ts, value)| {
                value.map(|v| Point::new(millis_to_datetime(ts as i64), PointValue::Double(v)))
            })
            .collect();
        TimeSeries {
            metric: self.metric,
            labels,
            points,
        }
    }
}
