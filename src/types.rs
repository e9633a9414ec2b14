use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A column header. Not unique inside a raw fragment; unique in a canonical table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnLabel(String);

impl ColumnLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnLabel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ColumnLabel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for ColumnLabel {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ColumnLabel {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A table cell. `None` marks a value absent because the fragment lacked the
/// column; `Some("")` is an empty value reported by the source.
pub type Cell = Option<String>;

/// An ordered, duplicate-free set of labels used as a rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ColumnLabel>", into = "Vec<ColumnLabel>")]
pub struct LabelSet(Vec<ColumnLabel>);

impl LabelSet {
    pub fn new<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<ColumnLabel>,
    {
        let mut out: Vec<ColumnLabel> = Vec::new();
        for label in labels {
            let label = label.into();
            if !out.contains(&label) {
                out.push(label);
            }
        }
        Self(out)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l.as_str() == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnLabel> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ColumnLabel>> for LabelSet {
    fn from(labels: Vec<ColumnLabel>) -> Self {
        Self::new(labels)
    }
}

impl From<LabelSet> for Vec<ColumnLabel> {
    fn from(set: LabelSet) -> Self {
        set.0
    }
}

/// Labels the source renders twice: cumulative first, per-90 second.
pub type AmbiguousNameSet = LabelSet;

/// Labels that are always per-90 statistics and never duplicated.
pub type AlwaysDerivedSet = LabelSet;

/// One source's table as extracted from HTML, before any cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawFragment {
    /// Display name of the source that produced this fragment
    pub source: String,
    /// Header levels from outermost (grouping) to leaf; each level has one label per column
    pub header: Vec<Vec<String>>,
    /// Positional rows aligned with the leaf header level
    pub rows: Vec<Vec<Cell>>,
    /// Value for the source-identity column
    pub source_id: Option<String>,
    /// Whether `source_id` must be injected as a constant column
    pub inject_source_id: bool,
}

impl RawFragment {
    pub fn new(source: impl Into<String>, header: Vec<Vec<String>>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            source: source.into(),
            header,
            rows,
            source_id: None,
            inject_source_id: false,
        }
    }

    /// Marks this fragment for source-identity injection with `value`.
    pub fn with_source_id(mut self, value: impl Into<String>) -> Self {
        self.source_id = Some(value.into());
        self.inject_source_id = true;
        self
    }
}

/// A cleaned fragment with a single header level.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub source: String,
    pub columns: Vec<ColumnLabel>,
    pub rows: Vec<Vec<Cell>>,
}

impl Fragment {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Core trait that every table source must implement
#[async_trait::async_trait]
pub trait TableSource: Send + Sync {
    /// Display name used in logs and reports
    fn name(&self) -> &str;

    /// Fetch and extract every table on the source page, in document order
    async fn fetch_fragments(&self) -> Result<Vec<RawFragment>>;
}
