//! Cloud Monitoring v3 time series client
//!
//! Uses the REST surface: `GET /v3/projects/{project}/timeSeries` with a
//! filter and an interval. int64 fields arrive as JSON strings.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::backends::check_status;
use crate::core::constants::{STACKDRIVER_MAX_PAGES, STACKDRIVER_READ_SCOPE};
use crate::core::{ConfigError, HttpConfig, StackdriverConfig};
use crate::domain::{ImportError, Point, PointValue, TimeInterval, TimeSeries};
use crate::utils::retry::{RetryPolicy, retry_async};
use crate::utils::time::{parse_rfc3339, to_rfc3339};

const BACKEND: &str = "stackdriver";

/// Read access to Cloud Monitoring time series
#[async_trait]
pub trait MonitoringClient: Send + Sync + fmt::Debug {
    /// All series matching `filter` with points inside `interval`
    async fn list_time_series(
        &self,
        project_id: &str,
        filter: &str,
        interval: TimeInterval,
    ) -> Result<Vec<TimeSeries>, ImportError>;
}

/// Source of OAuth access tokens for the REST client
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, ImportError>;
}

/// Fixed token, e.g. from `gcloud auth print-access-token`
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, ImportError> {
        Ok(self.0.clone())
    }
}

/// Tokens from an initialized `gcp_auth` provider
pub struct GcpTokenSource(pub Arc<dyn gcp_auth::TokenProvider>);

#[async_trait]
impl AccessTokenSource for GcpTokenSource {
    async fn access_token(&self) -> Result<String, ImportError> {
        let token = self
            .0
            .token(&[STACKDRIVER_READ_SCOPE])
            .await
            .map_err(|e| ImportError::backend(BACKEND, format!("failed to get token: {}", e)))?;
        Ok(token.as_str().to_string())
    }
}

pub struct HttpMonitoringClient {
    client: reqwest::Client,
    endpoint: String,
    tokens: Arc<dyn AccessTokenSource>,
    retry: RetryPolicy,
}

impl fmt::Debug for HttpMonitoringClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMonitoringClient")
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .finish()
    }
}

impl HttpMonitoringClient {
    pub fn new(
        config: &StackdriverConfig,
        http: &HttpConfig,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()?;

        tracing::debug!(
            endpoint = %config.endpoint,
            project_id = %config.project_id,
            "Cloud Monitoring client initialized"
        );
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            tokens,
            retry: RetryPolicy::from(http),
        })
    }

    /// Client authenticated with application default credentials
    pub async fn with_default_credentials(
        config: &StackdriverConfig,
        http: &HttpConfig,
    ) -> Result<Self, ConfigError> {
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| ConfigError::Auth(e.to_string()))?;
        Self::new(config, http, Arc::new(GcpTokenSource(provider)))
    }

    async fn fetch_page(
        &self,
        project_id: &str,
        filter: &str,
        interval: TimeInterval,
        page_token: Option<&str>,
    ) -> Result<ListTimeSeriesResponse, ImportError> {
        let base = format!("{}/v3/projects/{}/timeSeries", self.endpoint, project_id);
        let mut params = vec![
            ("filter", filter.to_string()),
            ("interval.startTime", to_rfc3339(interval.start)),
            ("interval.endTime", to_rfc3339(interval.end)),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        let url = reqwest::Url::parse_with_params(&base, &params)
            .map_err(|e| ImportError::backend(BACKEND, format!("invalid URL {}: {}", base, e)))?;

        let token = self.tokens.access_token().await?;
        let resp = self.client.get(url).bearer_auth(token).send().await?;
        let resp = check_status(BACKEND, resp).await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl MonitoringClient for HttpMonitoringClient {
    async fn list_time_series(
        &self,
        project_id: &str,
        filter: &str,
        interval: TimeInterval,
    ) -> Result<Vec<TimeSeries>, ImportError> {
        let mut series = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..STACKDRIVER_MAX_PAGES {
            let page = retry_async(self.retry, ImportError::is_transient, || {
                self.fetch_page(project_id, filter, interval, page_token.as_deref())
            })
            .await?;

            for raw in page.time_series {
                series.push(raw.into_domain()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(series),
            }
        }

        tracing::warn!(
            pages = STACKDRIVER_MAX_PAGES,
            "Stopped following Cloud Monitoring pages"
        );
        Ok(series)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTimeSeriesResponse {
    #[serde(default)]
    time_series: Vec<ApiTimeSeries>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTimeSeries {
    metric: ApiMetric,
    #[serde(default)]
    points: Vec<ApiPoint>,
}

#[derive(Debug, Deserialize)]
struct ApiMetric {
    #[serde(rename = "type")]
    metric_type: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ApiPoint {
    interval: ApiInterval,
    value: ApiTypedValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiInterval {
    end_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTypedValue {
    double_value: Option<f64>,
    int64_value: Option<Int64>,
    distribution_value: Option<ApiDistribution>,
}

#[derive(Debug, Deserialize)]
struct ApiDistribution {
    count: Option<Int64>,
    #[serde(default)]
    mean: f64,
}

/// int64 encoded either as a JSON string (proto3 mapping) or a number
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Int64 {
    Str(String),
    Num(i64),
}

impl Int64 {
    fn parse(&self) -> Result<i64, ImportError> {
        match self {
            Int64::Num(n) => Ok(*n),
            Int64::Str(s) => s
                .parse()
                .map_err(|e| ImportError::decode(BACKEND, format!("bad int64 '{}': {}", s, e))),
        }
    }
}

impl ApiTimeSeries {
    fn into_domain(self) -> Result<TimeSeries, ImportError> {
        let points = self
            .points
            .into_iter()
            .map(ApiPoint::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TimeSeries {
            metric: self.metric.metric_type,
            labels: self.metric.labels,
            points,
        })
    }
}

impl ApiPoint {
    fn into_domain(self) -> Result<Point, ImportError> {
        let timestamp = parse_rfc3339(&self.interval.end_time).ok_or_else(|| {
            ImportError::decode(
                BACKEND,
                format!("bad point end time '{}'", self.interval.end_time),
            )
        })?;

        let value = match self.value {
            ApiTypedValue {
                double_value: Some(v),
                ..
            } => PointValue::Double(v),
            ApiTypedValue {
                int64_value: Some(v),
                ..
            } => PointValue::Int64(v.parse()?),
            ApiTypedValue {
                distribution_value: Some(d),
                ..
            } => PointValue::Distribution {
                count: d.count.as_ref().map(Int64::parse).transpose()?.unwrap_or(0),
                mean: d.mean,
            },
            _ => {
                return Err(ImportError::decode(
                    BACKEND,
                    "point value is not a double, int64 or distribution",
                ));
            }
        };
        Ok(Point::new(timestamp, value))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::core::constants::{
        STACKDRIVER_DEFAULT_METRIC_PREFIX, STACKDRIVER_DEFAULT_RESOURCE_TYPE,
    };

    const FILTER: &str = r#"resource.type="global" metric.type="custom.googleapis.com/opencensus/requests""#;

    fn config(endpoint: String) -> StackdriverConfig {
        StackdriverConfig {
            project_id: "my-project".to_string(),
            endpoint,
            resource_type: STACKDRIVER_DEFAULT_RESOURCE_TYPE.to_string(),
            metric_prefix: STACKDRIVER_DEFAULT_METRIC_PREFIX.to_string(),
            namespace: String::new(),
        }
    }

    fn client(server: &MockServer, max_attempts: u32) -> HttpMonitoringClient {
        let http = HttpConfig {
            timeout_secs: 5,
            max_attempts,
            base_delay_ms: 1,
        };
        HttpMonitoringClient::new(
            &config(server.base_url()),
            &http,
            Arc::new(StaticToken("test-token".to_string())),
        )
        .unwrap()
    }

    fn interval() -> TimeInterval {
        TimeInterval {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_list_time_series_decodes_values() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/projects/my-project/timeSeries")
                    .header("authorization", "Bearer test-token")
                    .query_param("filter", FILTER)
                    .query_param("interval.startTime", "2024-01-01T00:00:00Z")
                    .query_param("interval.endTime", "2024-01-01T00:01:00Z");
                then.status(200).json_body(json!({
                    "timeSeries": [
                        {
                            "metric": {
                                "type": "custom.googleapis.com/opencensus/requests",
                                "labels": {"region": "us"}
                            },
                            "valueType": "DISTRIBUTION",
                            "points": [
                                {
                                    "interval": {"startTime": "2024-01-01T00:00:00Z", "endTime": "2024-01-01T00:00:50Z"},
                                    "value": {"distributionValue": {"count": "10", "mean": 2.0}}
                                }
                            ]
                        },
                        {
                            "metric": {"type": "custom.googleapis.com/opencensus/requests"},
                            "points": [
                                {
                                    "interval": {"endTime": "2024-01-01T00:00:40Z"},
                                    "value": {"int64Value": "7"}
                                },
                                {
                                    "interval": {"endTime": "2024-01-01T00:00:30Z"},
                                    "value": {"doubleValue": 1.5}
                                }
                            ]
                        }
                    ]
                }));
            })
            .await;

        let series = client(&server, 1)
            .list_time_series("my-project", FILTER, interval())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].labels.get("region").map(String::as_str), Some("us"));
        assert_eq!(
            series[0].points[0].value,
            PointValue::Distribution {
                count: 10,
                mean: 2.0
            }
        );
        assert_eq!(series[1].points[0].value, PointValue::Int64(7));
        assert_eq!(series[1].points[1].value, PointValue::Double(1.5));
        assert_eq!(
            series[0].points[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 50).unwrap()
        );
    }

    #[tokio::test]
    async fn test_interval_keeps_subseconds() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/projects/my-project/timeSeries")
                    .query_param("interval.startTime", "2024-01-01T00:00:00.500Z")
                    .query_param("interval.endTime", "2024-01-01T00:01:00.500Z");
                then.status(200).json_body(json!({}));
            })
            .await;

        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap()
            + chrono::Duration::milliseconds(500);
        let interval = TimeInterval::ending_at(end, chrono::Duration::seconds(60));
        client(&server, 1)
            .list_time_series("my-project", FILTER, interval)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/projects/my-project/timeSeries");
                then.status(200).json_body(json!({}));
            })
            .await;

        let series = client(&server, 1)
            .list_time_series("my-project", FILTER, interval())
            .await
            .unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_follows_page_token() {
        let server = MockServer::start_async().await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/projects/my-project/timeSeries")
                    .query_param("pageToken", "page-2");
                then.status(200).json_body(json!({
                    "timeSeries": [{
                        "metric": {"type": "m"},
                        "points": [{"interval": {"endTime": "2024-01-01T00:00:20Z"}, "value": {"doubleValue": 2.0}}]
                    }]
                }));
            })
            .await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/projects/my-project/timeSeries")
                    .query_param_missing("pageToken");
                then.status(200).json_body(json!({
                    "timeSeries": [{
                        "metric": {"type": "m"},
                        "points": [{"interval": {"endTime": "2024-01-01T00:00:10Z"}, "value": {"doubleValue": 1.0}}]
                    }],
                    "nextPageToken": "page-2"
                }));
            })
            .await;

        let series = client(&server, 1)
            .list_time_series("my-project", FILTER, interval())
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(series.len(), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/projects/my-project/timeSeries");
                then.status(403).body("permission denied");
            })
            .await;

        let err = client(&server, 3)
            .list_time_series("my-project", FILTER, interval())
            .await
            .unwrap_err();

        mock.assert_calls_async(1).await;
        assert!(matches!(err, ImportError::Backend { .. }));
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/projects/my-project/timeSeries");
                then.status(503);
            })
            .await;

        let err = client(&server, 2)
            .list_time_series("my-project", FILTER, interval())
            .await
            .unwrap_err();

        mock.assert_calls_async(2).await;
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_unsupported_value_type() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/projects/my-project/timeSeries");
                then.status(200).json_body(json!({
                    "timeSeries": [{
                        "metric": {"type": "m"},
                        "points": [{"interval": {"endTime": "2024-01-01T00:00:10Z"}, "value": {"stringValue": "up"}}]
                    }]
                }));
            })
            .await;

        let err = client(&server, 1)
            .list_time_series("my-project", FILTER, interval())
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Decode { .. }));
    }

    #[test]
    fn test_int64_parse() {
        assert_eq!(Int64::Str("42".to_string()).parse().unwrap(), 42);
        assert_eq!(Int64::Num(-1).parse().unwrap(), -1);
        assert!(Int64::Str("x".to_string()).parse().is_err());
    }

    #[test]
    fn test_distribution_without_count() {
        let point: ApiPoint = serde_json::from_value(json!({
            "interval": {"endTime": "2024-01-01T00:00:10Z"},
            "value": {"distributionValue": {}}
        }))
        .unwrap();
        assert_eq!(
            point.into_domain().unwrap().value,
            PointValue::Distribution {
                count: 0,
                mean: 0.0
            }
        );
    }
}
