use std::fmt;

use serde::{Deserialize, Serialize};

/// A named metric with an ordered label schema.
///
/// Label values supplied at query time are matched to `label_names` by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    #[serde(default)]
    pub label_names: Vec<String>,
}

impl View {
    pub fn new<I, S>(name: impl Into<String>, label_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            label_names: label_names.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label_names.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.label_names.join(","))
        }
    }
}
