//! Datadog metric query strings: `metric{tag:value,...}`

use std::collections::BTreeMap;
use std::fmt;

use crate::core::constants::DATADOG_HOST_TAG;
use crate::domain::View;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatadogQuery {
    metric: String,
    tags: BTreeMap<String, String>,
}

impl DatadogQuery {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Adds `tag:value`. Ignored if either side is empty.
    pub fn add_tag(&mut self, tag: &str, value: &str) -> &mut Self {
        if !tag.is_empty() && !value.is_empty() {
            self.tags.insert(tag.to_string(), value.to_string());
        }
        self
    }

    pub fn add_hostname(&mut self, host: &str) -> &mut Self {
        self.add_tag(DATADOG_HOST_TAG, host)
    }

    /// `{k:v,...}` or empty when no tags were added
    pub fn tag_string(&self) -> String {
        if self.tags.is_empty() {
            return String::new();
        }
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v))
            .collect();
        format!("{{{}}}", tags.join(","))
    }
}

impl fmt::Display for DatadogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.metric, self.tag_string())
    }
}

/// Name a view is exported under: `[namespace.]name[_label1_label2...]`
pub fn metric_name(namespace: &str, view: &View) -> String {
    let mut name = if namespace.is_empty() {
        view.name.clone()
    } else {
        format!("{}.{}", namespace, view.name)
    };
    if !view.label_names.is_empty() {
        name.push('_');
        name.push_str(&view.label_names.join("_"));
    }
    name
}
