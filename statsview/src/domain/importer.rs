//! Importer plugin contract
//!
//! An importer reads the current value of a [`View`] back from one metrics
//! backend. Concrete importers own an already-initialized backend client.

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::filter::FilterError;
use super::point::TimeInterval;
use super::view::View;
use crate::core::constants::LOOKBACK_WINDOW_SECS;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("View '{view}' has {expected} label names but {actual} label values were given")]
    LabelMismatch {
        view: String,
        expected: usize,
        actual: usize,
    },

    #[error("View '{0}' is not registered")]
    UnknownView(String),

    #[error("No time series returned by {importer} for: {query}")]
    NoResults { importer: String, query: String },

    #[error("Backend error ({backend}): {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    #[error("Unexpected response from {backend}: {message}")]
    Decode {
        backend: &'static str,
        message: String,
    },

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ImportError {
    pub fn backend(backend: &'static str, msg: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            message: msg.into(),
        }
    }

    pub fn decode(backend: &'static str, msg: impl Into<String>) -> Self {
        Self::Decode {
            backend,
            message: msg.into(),
        }
    }

    pub fn no_results(importer: impl Into<String>, query: impl Into<String>) -> Self {
        Self::NoResults {
            importer: importer.into(),
            query: query.into(),
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            _ => false,
        }
    }
}

/// Validates that one label value was supplied per label name
pub fn check_labels(view: &View, label_values: &[String]) -> Result<(), ImportError> {
    if view.label_names.len() != label_values.len() {
        return Err(ImportError::LabelMismatch {
            view: view.name.clone(),
            expected: view.label_names.len(),
            actual: label_values.len(),
        });
    }
    Ok(())
}

/// Backend-agnostic description of one value query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub interval: TimeInterval,
    /// Label name to label value, zipped positionally from the view
    pub labels: BTreeMap<String, String>,
}

impl QueryContext {
    pub fn new(
        view: &View,
        label_values: &[String],
        as_of: DateTime<Utc>,
    ) -> Result<Self, ImportError> {
        check_labels(view, label_values)?;
        let labels = view
            .label_names
            .iter()
            .cloned()
            .zip(label_values.iter().cloned())
            .collect();
        Ok(Self {
            interval: TimeInterval::ending_at(as_of, Duration::seconds(LOOKBACK_WINDOW_SECS)),
            labels,
        })
    }
}

#[async_trait]
pub trait Importer: Send + Sync + Debug {
    /// Stable, non-empty name. Used as the key of resolved values.
    fn name(&self) -> &str;

    /// Most recent value of `view` for `label_values` within the lookback window ending at `as_of`
    async fn value(
        &self,
        view: &View,
        label_values: &[String],
        as_of: DateTime<Utc>,
    ) -> Result<f64, ImportError>;
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_query_context_zips_labels() {
        let view = View::new("requests", ["region", "method"]);
        let as_of = Utc.timestamp_opt(1_700_000_060, 0).unwrap();
        let ctx = QueryContext::new(&view, &values(&["us", "GET"]), as_of).unwrap();

        assert_eq!(ctx.labels.get("region").map(String::as_str), Some("us"));
        assert_eq!(ctx.labels.get("method").map(String::as_str), Some("GET"));
        assert_eq!(ctx.interval.end, as_of);
        assert_eq!(ctx.interval.start.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_query_context_label_mismatch() {
        let view = View::new("requests", ["region"]);
        let err = QueryContext::new(&view, &values(&["us", "GET"]), Utc::now()).unwrap_err();
        match err {
            ImportError::LabelMismatch {
                view,
                expected,
                actual,
            } => {
                assert_eq!(view, "requests");
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ImportError::no_results("stackdriver", "metric.type=\"x\"");
        assert_eq!(
            err.to_string(),
            "No time series returned by stackdriver for: metric.type=\"x\""
        );
        let err = ImportError::backend("datadog", "status 403");
        assert_eq!(err.to_string(), "Backend error (datadog): status 403");
    }

    #[test]
    fn test_non_http_errors_are_not_transient() {
        assert!(!ImportError::no_results("a", "b").is_transient());
        assert!(!ImportError::UnknownView("x".to_string()).is_transient());
        assert!(
            !ImportError::Filter(FilterError::DuplicateClause {
                clause: "metric.type"
            })
            .is_transient()
        );
    }
}
