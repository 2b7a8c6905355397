//! Value resolution across every registered importer
//!
//! One logical query fans out to all importers concurrently. Each importer's
//! outcome is kept under its name, so a failed backend is reported as an
//! error instead of a zero value.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use super::importer::{ImportError, check_labels};
use super::view::View;
use crate::data::{ImporterRegistry, ViewRegistry};

/// Per-importer outcome of one resolution
#[derive(Debug, Default)]
pub struct Resolution {
    results: BTreeMap<String, Result<f64, ImportError>>,
}

impl Resolution {
    pub fn get(&self, importer: &str) -> Option<&Result<f64, ImportError>> {
        self.results.get(importer)
    }

    /// Value reported by `importer`, if it succeeded
    pub fn value(&self, importer: &str) -> Option<f64> {
        match self.results.get(importer) {
            Some(Ok(v)) => Some(*v),
            _ => None,
        }
    }

    /// Successful values only
    pub fn values(&self) -> BTreeMap<&str, f64> {
        self.results
            .iter()
            .filter_map(|(name, r)| r.as_ref().ok().map(|v| (name.as_str(), *v)))
            .collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &ImportError)> {
        self.results
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (name.as_str(), e)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<f64, ImportError>)> {
        self.results.iter().map(|(name, r)| (name.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Result<f64, ImportError>> {
        self.results
    }
}

#[derive(Debug, Clone)]
pub struct ValueResolver {
    importers: Arc<ImporterRegistry>,
    views: Option<Arc<ViewRegistry>>,
}

impl ValueResolver {
    pub fn new(importers: Arc<ImporterRegistry>) -> Self {
        Self {
            importers,
            views: None,
        }
    }

    /// Attach a view registry for [`resolve_named`](Self::resolve_named)
    pub fn with_views(mut self, views: Arc<ViewRegistry>) -> Self {
        self.views = Some(views);
        self
    }

    /// Query every registered importer for the value of `view` as of `as_of`.
    ///
    /// Fails before any backend call if the label counts disagree.
    pub async fn resolve(
        &self,
        view: &View,
        label_values: &[String],
        as_of: DateTime<Utc>,
    ) -> Result<Resolution, ImportError> {
        check_labels(view, label_values)?;

        let importers = self.importers.all();
        tracing::debug!(
            view = %view.name,
            importers = importers.len(),
            as_of = %as_of,
            "Resolving view"
        );

        let queries = importers.iter().map(|importer| async move {
            let result = importer.value(view, label_values, as_of).await;
            if let Err(e) = &result {
                tracing::warn!(
                    importer = importer.name(),
                    view = %view.name,
                    error = %e,
                    "Importer failed to provide a value"
                );
            }
            (importer.name().to_string(), result)
        });

        let results = join_all(queries).await.into_iter().collect();
        Ok(Resolution { results })
    }

    pub async fn resolve_now(
        &self,
        view: &View,
        label_values: &[String],
    ) -> Result<Resolution, ImportError> {
        self.resolve(view, label_values, Utc::now()).await
    }

    /// Like [`resolve`](Self::resolve) for a view looked up by name
    pub async fn resolve_named(
        &self,
        view_name: &str,
        label_values: &[String],
        as_of: DateTime<Utc>,
    ) -> Result<Resolution, ImportError> {
        let view = self
            .views
            .as_ref()
            .and_then(|views| views.lookup(view_name))
            .ok_or_else(|| ImportError::UnknownView(view_name.to_string()))?;
        self.resolve(&view, label_values, as_of).await
    }
}
