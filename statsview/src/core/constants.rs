// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for log filters and identifiers)
pub const APP_NAME_LOWER: &str = "statsview";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "statsview.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "STATSVIEW_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "STATSVIEW_LOG";

// =============================================================================
// Resolution
// =============================================================================

/// Span before the query instant searched for the most recent point.
/// Backends flush aggregated points about once a minute.
pub const LOOKBACK_WINDOW_SECS: i64 = 60;

// =============================================================================
// Filter Syntax
// =============================================================================

pub const FILTER_RESOURCE_TYPE: &str = "resource.type";
pub const FILTER_METRIC_TYPE: &str = "metric.type";
pub const FILTER_METRIC_LABEL: &str = "metric.label";

// =============================================================================
// Cloud Monitoring (Stackdriver)
// =============================================================================

pub const STACKDRIVER_IMPORTER_NAME: &str = "stackdriver";

/// Path under which OpenCensus custom metrics are written
pub const STACKDRIVER_DEFAULT_METRIC_PREFIX: &str = "custom.googleapis.com/opencensus";

pub const STACKDRIVER_DEFAULT_RESOURCE_TYPE: &str = "global";

pub const STACKDRIVER_DEFAULT_ENDPOINT: &str = "https://monitoring.googleapis.com";

/// OAuth scope for reading time series
pub const STACKDRIVER_READ_SCOPE: &str = "https://www.googleapis.com/auth/monitoring.read";

/// Upper bound on followed `nextPageToken`s per query
pub const STACKDRIVER_MAX_PAGES: usize = 10;

pub const ENV_STACKDRIVER_PROJECT: &str = "PROJECT";
pub const ENV_STACKDRIVER_ENDPOINT: &str = "STATSVIEW_STACKDRIVER_ENDPOINT";
pub const ENV_STACKDRIVER_NAMESPACE: &str = "STATSVIEW_STACKDRIVER_NAMESPACE";
pub const ENV_STACKDRIVER_METRIC_PREFIX: &str = "STATSVIEW_STACKDRIVER_METRIC_PREFIX";
pub const ENV_STACKDRIVER_RESOURCE_TYPE: &str = "STATSVIEW_STACKDRIVER_RESOURCE_TYPE";

// =============================================================================
// Datadog
// =============================================================================

pub const DATADOG_IMPORTER_NAME: &str = "datadog";

pub const DATADOG_DEFAULT_SITE: &str = "https://api.datadoghq.com";

/// Tag carrying the reporting host
pub const DATADOG_HOST_TAG: &str = "host";

pub const ENV_DATADOG_API_KEY: &str = "DD_API";
pub const ENV_DATADOG_APP_KEY: &str = "DD_APP";
pub const ENV_DATADOG_SITE: &str = "STATSVIEW_DATADOG_SITE";
pub const ENV_DATADOG_NAMESPACE: &str = "STATSVIEW_DATADOG_NAMESPACE";
pub const ENV_DATADOG_HOSTNAME: &str = "STATSVIEW_DATADOG_HOSTNAME";

// =============================================================================
// HTTP Clients
// =============================================================================

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default maximum attempts for a backend request
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;

/// Upper bound accepted for configured attempts
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Default base delay in milliseconds for exponential backoff
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 100;

/// Cap on a single backoff sleep
pub const MAX_RETRY_DELAY_MS: u64 = 10_000;

pub const ENV_HTTP_TIMEOUT_SECS: &str = "STATSVIEW_HTTP_TIMEOUT_SECS";
pub const ENV_HTTP_MAX_ATTEMPTS: &str = "STATSVIEW_HTTP_MAX_ATTEMPTS";
pub const ENV_HTTP_BASE_DELAY_MS: &str = "STATSVIEW_HTTP_BASE_DELAY_MS";
