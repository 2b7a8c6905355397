use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::constants::{
    CONFIG_FILE_NAME, DATADOG_DEFAULT_SITE, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_RETRY_BASE_DELAY_MS,
    DEFAULT_RETRY_MAX_ATTEMPTS, ENV_CONFIG, ENV_DATADOG_API_KEY, ENV_DATADOG_APP_KEY,
    ENV_DATADOG_HOSTNAME, ENV_DATADOG_NAMESPACE, ENV_DATADOG_SITE, ENV_HTTP_BASE_DELAY_MS,
    ENV_HTTP_MAX_ATTEMPTS, ENV_HTTP_TIMEOUT_SECS, ENV_STACKDRIVER_ENDPOINT,
    ENV_STACKDRIVER_METRIC_PREFIX, ENV_STACKDRIVER_NAMESPACE, ENV_STACKDRIVER_PROJECT,
    ENV_STACKDRIVER_RESOURCE_TYPE, MAX_RETRY_ATTEMPTS, STACKDRIVER_DEFAULT_ENDPOINT,
    STACKDRIVER_DEFAULT_METRIC_PREFIX, STACKDRIVER_DEFAULT_RESOURCE_TYPE,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Authentication setup failed: {0}")]
    Auth(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

// =============================================================================
// File Config (all fields optional)
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct DatadogFileConfig {
    pub api_key: Option<String>,
    pub app_key: Option<String>,
    pub site: Option<String>,
    pub namespace: Option<String>,
    pub hostname: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StackdriverFileConfig {
    pub project_id: Option<String>,
    pub endpoint: Option<String>,
    pub resource_type: Option<String>,
    pub metric_prefix: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpFileConfig {
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub datadog: Option<DatadogFileConfig>,
    pub stackdriver: Option<StackdriverFileConfig>,
    pub http: Option<HttpFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct DatadogConfig {
    pub api_key: String,
    pub app_key: String,
    pub site: String,
    pub namespace: String,
    pub hostname: Option<String>,
}

// Keys stay out of logs
impl std::fmt::Debug for DatadogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatadogConfig")
            .field("api_key", &"[REDACTED]")
            .field("app_key", &"[REDACTED]")
            .field("site", &self.site)
            .field("namespace", &self.namespace)
            .field("hostname", &self.hostname)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackdriverConfig {
    pub project_id: String,
    pub endpoint: String,
    pub resource_type: String,
    pub metric_prefix: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

/// Backend importer configuration.
///
/// A backend is enabled when its file section exists or its identifying
/// environment variable (`DD_API`, `PROJECT`) is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImporterConfig {
    pub datadog: Option<DatadogConfig>,
    pub stackdriver: Option<StackdriverConfig>,
    pub http: HttpConfig,
}

impl ImporterConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Config file: `path`, else `$STATSVIEW_CONFIG`, else `./statsview.json` if present
    /// 3. Environment variables (including a `.env` file)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        tracing::debug!("Loading importer configuration");

        let file_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => match std::env::var(ENV_CONFIG) {
                Ok(p) => Some(PathBuf::from(p)),
                Err(_) => {
                    let local = PathBuf::from(CONFIG_FILE_NAME);
                    local.exists().then_some(local)
                }
            },
        };

        let file_config = match file_path {
            Some(p) => {
                let config = FileConfig::load_from_file(&p)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        Self::from_sources(file_config, |key| std::env::var(key).ok())
    }

    /// Layer `env` over `file` and validate the result
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());

        let datadog = match file.datadog {
            Some(section) => Some(section),
            None if env(ENV_DATADOG_API_KEY).is_some() => Some(DatadogFileConfig::default()),
            None => None,
        }
        .map(|section| -> Result<DatadogConfig, ConfigError> {
            Ok(DatadogConfig {
                api_key: env(ENV_DATADOG_API_KEY)
                    .or(section.api_key)
                    .ok_or(ConfigError::Missing(ENV_DATADOG_API_KEY))?,
                app_key: env(ENV_DATADOG_APP_KEY)
                    .or(section.app_key)
                    .ok_or(ConfigError::Missing(ENV_DATADOG_APP_KEY))?,
                site: env(ENV_DATADOG_SITE)
                    .or(section.site)
                    .unwrap_or_else(|| DATADOG_DEFAULT_SITE.to_string()),
                namespace: env(ENV_DATADOG_NAMESPACE)
                    .or(section.namespace)
                    .unwrap_or_default(),
                hostname: env(ENV_DATADOG_HOSTNAME).or(section.hostname),
            })
        })
        .transpose()?;

        let stackdriver = match file.stackdriver {
            Some(section) => Some(section),
            None if env(ENV_STACKDRIVER_PROJECT).is_some() => {
                Some(StackdriverFileConfig::default())
            }
            None => None,
        }
        .map(|section| -> Result<StackdriverConfig, ConfigError> {
            Ok(StackdriverConfig {
                project_id: env(ENV_STACKDRIVER_PROJECT)
                    .or(section.project_id)
                    .ok_or(ConfigError::Missing(ENV_STACKDRIVER_PROJECT))?,
                endpoint: env(ENV_STACKDRIVER_ENDPOINT)
                    .or(section.endpoint)
                    .unwrap_or_else(|| STACKDRIVER_DEFAULT_ENDPOINT.to_string()),
                resource_type: env(ENV_STACKDRIVER_RESOURCE_TYPE)
                    .or(section.resource_type)
                    .unwrap_or_else(|| STACKDRIVER_DEFAULT_RESOURCE_TYPE.to_string()),
                metric_prefix: env(ENV_STACKDRIVER_METRIC_PREFIX)
                    .or(section.metric_prefix)
                    .unwrap_or_else(|| STACKDRIVER_DEFAULT_METRIC_PREFIX.to_string()),
                namespace: env(ENV_STACKDRIVER_NAMESPACE)
                    .or(section.namespace)
                    .unwrap_or_default(),
            })
        })
        .transpose()?;

        let file_http = file.http.unwrap_or_default();
        let defaults = HttpConfig::default();
        let http = HttpConfig {
            timeout_secs: parse_env(&env, ENV_HTTP_TIMEOUT_SECS)?
                .or(file_http.timeout_secs)
                .unwrap_or(defaults.timeout_secs),
            max_attempts: parse_env(&env, ENV_HTTP_MAX_ATTEMPTS)?
                .or(file_http.max_attempts)
                .unwrap_or(defaults.max_attempts),
            base_delay_ms: parse_env(&env, ENV_HTTP_BASE_DELAY_MS)?
                .or(file_http.base_delay_ms)
                .unwrap_or(defaults.base_delay_ms),
        };

        let config = Self {
            datadog,
            stackdriver,
            http,
        };
        config.validate()?;

        tracing::debug!(
            datadog = config.datadog.is_some(),
            stackdriver = config.stackdriver.is_some(),
            "Importer configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                ENV_HTTP_TIMEOUT_SECS,
                "timeout must be greater than 0",
            ));
        }
        if self.http.max_attempts == 0 {
            return Err(ConfigError::invalid(
                ENV_HTTP_MAX_ATTEMPTS,
                "at least one attempt is required",
            ));
        }
        if self.http.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::invalid(
                ENV_HTTP_MAX_ATTEMPTS,
                format!("at most {} attempts are allowed", MAX_RETRY_ATTEMPTS),
            ));
        }
        if let Some(dd) = &self.datadog
            && !is_http_url(&dd.site)
        {
            return Err(ConfigError::invalid(
                ENV_DATADOG_SITE,
                format!("'{}' is not an http(s) URL", dd.site),
            ));
        }
        if let Some(sd) = &self.stackdriver {
            if !is_http_url(&sd.endpoint) {
                return Err(ConfigError::invalid(
                    ENV_STACKDRIVER_ENDPOINT,
                    format!("'{}' is not an http(s) URL", sd.endpoint),
                ));
            }
            if sd.resource_type.is_empty() {
                return Err(ConfigError::invalid(
                    ENV_STACKDRIVER_RESOURCE_TYPE,
                    "resource type must not be empty",
                ));
            }
        }
        Ok(())
    }
}

fn parse_env<T, F>(env: F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::invalid(key, format!("'{}': {}", raw, e)))
        })
        .transpose()
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
