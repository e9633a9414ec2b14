use crate::error::{Result, StatsError};
use crate::table::{Column, UnifiedTable};
use crate::types::{Cell, ColumnLabel, Fragment};
use std::collections::HashMap;
use tracing::debug;

/// A column slot in the union schema: a label and which occurrence of it
/// (1-based, counted within a single fragment) the slot holds.
type Slot = (ColumnLabel, usize);

/// Concatenates fragments into one dense table.
///
/// The column set is the union of every fragment's columns in first-seen
/// order. A label repeated inside a fragment keeps one slot per occurrence,
/// so the 2nd `Gls` of every fragment lands in the same column. Cells a
/// fragment has no column for are absent (`None`). Rows keep fragment order,
/// then source row order.
pub fn merge(fragments: Vec<Fragment>) -> Result<UnifiedTable> {
    if fragments.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let mut slots: Vec<Slot> = Vec::new();
    let mut slot_index: HashMap<Slot, usize> = HashMap::new();
    // per fragment: position in fragment -> slot index
    let mut projections: Vec<Vec<usize>> = Vec::with_capacity(fragments.len());

    for fragment in &fragments {
        let mut seen: HashMap<&ColumnLabel, usize> = HashMap::new();
        let mut projection = Vec::with_capacity(fragment.columns.len());
        for label in &fragment.columns {
            let occurrence = seen.entry(label).or_insert(0);
            *occurrence += 1;
            let slot = (label.clone(), *occurrence);
            let idx = *slot_index.entry(slot.clone()).or_insert_with(|| {
                slots.push(slot);
                slots.len() - 1
            });
            projection.push(idx);
        }
        projections.push(projection);
    }

    let total_rows: usize = fragments.iter().map(Fragment::row_count).sum();
    let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(total_rows); slots.len()];

    for (fragment, projection) in fragments.into_iter().zip(&projections) {
        let rows = fragment.rows.len();
        let mut filled = vec![false; slots.len()];
        for &idx in projection {
            filled[idx] = true;
        }
        for row in fragment.rows {
            let mut cells = row.into_iter();
            for &idx in projection {
                columns[idx].push(cells.next().flatten());
            }
        }
        for (idx, present) in filled.iter().enumerate() {
            if !present {
                columns[idx].extend(std::iter::repeat(None).take(rows));
            }
        }
        debug!(source = %fragment.source, rows, "merged fragment");
    }

    let columns = slots
        .into_iter()
        .zip(columns)
        .map(|((label, _), cells)| Column { label, cells })
        .collect();

    Ok(UnifiedTable::with_row_count(columns, total_rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(source: &str, columns: &[&str], rows: &[&[&str]]) -> Fragment {
        Fragment {
            source: source.to_string(),
            columns: columns.iter().map(|c| ColumnLabel::from(*c)).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        }
    }

    fn column<'a>(table: &'a UnifiedTable, idx: usize) -> Vec<Option<&'a str>> {
        table.columns()[idx].cells.iter().map(|c| c.as_deref()).collect()
    }

    #[test]
    fn test_union_in_first_seen_order_with_absent_fill() {
        let a = fragment("A", &["Player", "Comp", "Gls"], &[&["A1", "eng Premier League", "1"]]);
        let b = fragment("B", &["Player", "Gls", "Squad"], &[&["B1", "2", "Leeds"], &["B2", "3", "Hull"]]);

        let table = merge(vec![a, b]).unwrap();
        let labels: Vec<String> = table.labels().into_iter().map(|l| l.into_string()).collect();
        assert_eq!(labels, vec!["Player", "Comp", "Gls", "Squad"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(column(&table, 0), vec![Some("A1"), Some("B1"), Some("B2")]);
        assert_eq!(column(&table, 1), vec![Some("eng Premier League"), None, None]);
        assert_eq!(column(&table, 3), vec![None, Some("Leeds"), Some("Hull")]);
    }

    #[test]
    fn test_repeated_labels_align_by_occurrence() {
        let a = fragment("A", &["Player", "Gls", "Gls"], &[&["A1", "10", "0.5"]]);
        let b = fragment("B", &["Player", "Gls", "Ast", "Gls"], &[&["B1", "4", "2", "0.2"]]);

        let table = merge(vec![a, b]).unwrap();
        let labels: Vec<String> = table.labels().into_iter().map(|l| l.into_string()).collect();
        assert_eq!(labels, vec!["Player", "Gls", "Gls", "Ast"]);
        assert_eq!(column(&table, 1), vec![Some("10"), Some("4")]);
        assert_eq!(column(&table, 2), vec![Some("0.5"), Some("0.2")]);
        assert_eq!(column(&table, 3), vec![None, Some("2")]);
    }

    #[test]
    fn test_empty_input_is_fatal() {
        assert!(matches!(merge(Vec::new()), Err(StatsError::EmptyInput)));
    }

    #[test]
    fn test_fragment_without_rows_contributes_columns() {
        let a = fragment("A", &["Player"], &[&["A1"]]);
        let b = fragment("B", &["Player", "Squad"], &[]);

        let table = merge(vec![a, b]).unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 1);
        assert_eq!(column(&table, 1), vec![None]);
    }

    #[test]
    fn test_rows_without_columns_still_count() {
        let a = fragment("A", &[], &[&[], &[]]);

        let table = merge(vec![a]).unwrap();
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 2);
    }
}
