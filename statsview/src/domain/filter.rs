//! Monitoring filter builder
//!
//! Accumulates `key="value"` clauses into a single space-separated predicate:
//!
//! ```text
//! resource.type="global" metric.type="custom.googleapis.com/opencensus/requests" metric.label.region="us"
//! ```
//!
//! A filter holds at most one `resource.type` and one `metric.type` clause.

use std::fmt;

use thiserror::Error;

use crate::core::constants::{
    FILTER_METRIC_LABEL, FILTER_METRIC_TYPE, FILTER_RESOURCE_TYPE, STACKDRIVER_DEFAULT_METRIC_PREFIX,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Filters may only contain one '{clause}' clause")]
    DuplicateClause { clause: &'static str },

    #[error("Invalid metric label key '{key}': expected letters, digits or '_'")]
    InvalidLabelKey { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    metric_prefix: String,
    clauses: Vec<String>,
    has_resource_type: bool,
    has_metric_type: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter {
    /// Empty filter using the OpenCensus custom metric path
    pub fn new() -> Self {
        Self::with_metric_prefix(STACKDRIVER_DEFAULT_METRIC_PREFIX)
    }

    /// Empty filter whose `metric.type` values live under `prefix`
    pub fn with_metric_prefix(prefix: impl Into<String>) -> Self {
        Self {
            metric_prefix: prefix.into().trim_end_matches('/').to_string(),
            clauses: Vec::new(),
            has_resource_type: false,
            has_metric_type: false,
        }
    }

    pub fn metric_prefix(&self) -> &str {
        &self.metric_prefix
    }

    pub fn add_resource_type(&mut self, resource_type: &str) -> Result<&mut Self, FilterError> {
        if self.has_resource_type {
            return Err(FilterError::DuplicateClause {
                clause: FILTER_RESOURCE_TYPE,
            });
        }
        self.push(FILTER_RESOURCE_TYPE, resource_type);
        self.has_resource_type = true;
        Ok(self)
    }

    pub fn add_metric_type(&mut self, name: &str) -> Result<&mut Self, FilterError> {
        if self.has_metric_type {
            return Err(FilterError::DuplicateClause {
                clause: FILTER_METRIC_TYPE,
            });
        }
        let value = format!("{}/{}", self.metric_prefix, name);
        self.push(FILTER_METRIC_TYPE, &value);
        self.has_metric_type = true;
        Ok(self)
    }

    /// Adds one `metric.label.<key>="<value>"` clause per pair.
    ///
    /// Clauses are appended in iteration order; pass a `BTreeMap` for a stable order.
    /// Keys are emitted unquoted, so each must be a non-empty run of ASCII
    /// letters, digits and `_`. Nothing is added if any key is rejected.
    pub fn add_labels<I, K, V>(&mut self, labels: I) -> Result<&mut Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let labels: Vec<(K, V)> = labels.into_iter().collect();
        if let Some((key, _)) = labels.iter().find(|(k, _)| !is_label_key(k.as_ref())) {
            return Err(FilterError::InvalidLabelKey {
                key: key.as_ref().to_string(),
            });
        }
        for (key, value) in labels {
            let key = format!("{}.{}", FILTER_METRIC_LABEL, key.as_ref());
            self.push(&key, value.as_ref());
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn push(&mut self, key: &str, value: &str) {
        self.clauses.push(format!("{}=\"{}\"", key, escape(value)));
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clauses.join(" "))
    }
}

fn is_label_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
