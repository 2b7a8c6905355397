//! Test importers

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::importer::{ImportError, Importer, QueryContext};
use super::point::PointValue;
use super::view::View;

#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Point(PointValue),
    NoResults,
    Fail,
}

#[derive(Debug)]
pub struct StubImporter {
    name: String,
    reply: Reply,
    calls: AtomicUsize,
}

impl StubImporter {
    pub fn new(name: &str, reply: Reply) -> Self {
        Self {
            name: name.to_string(),
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn value(name: &str, value: f64) -> Self {
        Self::new(name, Reply::Point(PointValue::Double(value)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Importer for StubImporter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn value(
        &self,
        view: &View,
        label_values: &[String],
        as_of: DateTime<Utc>,
    ) -> Result<f64, ImportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        QueryContext::new(view, label_values, as_of)?;
        match self.reply {
            Reply::Point(v) => Ok(v.as_f64()),
            Reply::NoResults => Err(ImportError::no_results(&self.name, &view.name)),
            Reply::Fail => Err(ImportError::backend("stub", "connection refused")),
        }
    }
}
