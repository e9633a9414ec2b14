use crate::types::{Cell, ColumnLabel};
use std::collections::HashMap;

/// A single named column of the unified table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: ColumnLabel,
    pub cells: Vec<Cell>,
}

/// Dense rectangular table stored column-wise.
///
/// Every column holds exactly `row_count` cells. Labels are addressed by
/// name; after canonicalization they are expected to be unique, and
/// [`UnifiedTable::duplicate_labels`] reports when they are not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl UnifiedTable {
    /// Builds a table from columns of equal length.
    ///
    /// # Panics
    /// Panics if the columns differ in length.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let row_count = columns.first().map(|c| c.cells.len()).unwrap_or(0);
        assert!(
            columns.iter().all(|c| c.cells.len() == row_count),
            "all columns must have the same number of cells"
        );
        Self { columns, row_count }
    }

    /// Builds a table with an explicit row count, so rows survive even when
    /// there are no columns to carry them.
    ///
    /// # Panics
    /// Panics if any column does not hold `row_count` cells.
    pub fn with_row_count(columns: Vec<Column>, row_count: usize) -> Self {
        assert!(
            columns.iter().all(|c| c.cells.len() == row_count),
            "all columns must have the same number of cells"
        );
        Self { columns, row_count }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn labels(&self) -> Vec<ColumnLabel> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    /// First column carrying `label`.
    pub fn column(&self, label: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.label.as_str() == label)
    }

    pub fn column_mut(&mut self, label: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.label.as_str() == label)
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.column(label).is_some()
    }

    /// Replaces every column label, keeping cells in place.
    ///
    /// # Panics
    /// Panics if `labels` does not have one entry per column.
    pub fn set_labels(&mut self, labels: Vec<ColumnLabel>) {
        assert_eq!(labels.len(), self.columns.len(), "one label per column");
        for (column, label) in self.columns.iter_mut().zip(labels) {
            column.label = label;
        }
    }

    /// Appends a column; `cells` must have one entry per row.
    pub fn push_column(&mut self, label: ColumnLabel, cells: Vec<Cell>) {
        if self.columns.is_empty() && self.row_count == 0 {
            self.row_count = cells.len();
        }
        assert_eq!(cells.len(), self.row_count, "column length must match row count");
        self.columns.push(Column { label, cells });
    }

    /// Row `index` in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        (index < self.row_count).then(|| self.columns.iter().map(|c| &c.cells[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.row_count).map(move |i| self.columns.iter().map(|c| &c.cells[i]).collect())
    }

    /// Labels that occur more than once, in first-seen order.
    pub fn duplicate_labels(&self) -> Vec<ColumnLabel> {
        duplicate_labels(self.columns.iter().map(|c| &c.label))
    }
}

pub(crate) fn duplicate_labels<'a>(labels: impl Iterator<Item = &'a ColumnLabel>) -> Vec<ColumnLabel> {
    let mut counts: HashMap<&ColumnLabel, usize> = HashMap::new();
    let mut order = Vec::new();
    for label in labels {
        let n = counts.entry(label).or_insert(0);
        *n += 1;
        if *n == 2 {
            order.push(label.clone());
        }
    }
    order
}
