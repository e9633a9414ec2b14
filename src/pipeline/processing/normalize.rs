use crate::types::{Cell, ColumnLabel, Fragment, RawFragment};
use tracing::{debug, warn};

/// Per-fragment cleaning rules.
#[derive(Debug, Clone)]
pub struct NormalizeRules {
    /// Column whose value equals its own label on echoed header rows
    pub identity_column: ColumnLabel,
    /// Label of the injected source-identity column
    pub source_id_column: ColumnLabel,
}

/// Result of normalizing one fragment.
#[derive(Debug, Clone)]
pub struct NormalizedFragment {
    pub fragment: Fragment,
    /// Header-echo rows removed
    pub dropped_rows: usize,
    /// Set when the identity column was missing and the echo filter was skipped
    pub identity_missing: bool,
    /// Set when the leaf header already had the source-identity label
    pub source_id_clash: bool,
}

/// Flattens the header, drops echoed header rows and injects the source id.
///
/// The output never has more rows than the input, and has exactly one more
/// column than the leaf header iff `raw.inject_source_id` is set.
pub fn normalize(raw: RawFragment, rules: &NormalizeRules) -> NormalizedFragment {
    let RawFragment {
        source,
        header,
        rows,
        source_id,
        inject_source_id,
    } = raw;

    let mut columns = flatten_header(header);
    let width = columns.len();

    let mut rows: Vec<Vec<Cell>> = rows.into_iter().map(|row| fit_row(row, width)).collect();

    let before = rows.len();
    let identity_pos = columns
        .iter()
        .position(|c| *c == rules.identity_column);
    let identity_missing = identity_pos.is_none();
    match identity_pos {
        Some(pos) => {
            let marker = rules.identity_column.as_str();
            rows.retain(|row| row[pos].as_deref() != Some(marker));
        }
        None => {
            warn!(
                source = %source,
                column = %rules.identity_column,
                "identity column missing; header-echo rows were not filtered"
            );
        }
    }
    let dropped_rows = before - rows.len();

    let source_id_clash = inject_source_id && columns.contains(&rules.source_id_column);
    if source_id_clash {
        warn!(
            source = %source,
            column = %rules.source_id_column,
            "fragment already has the source-id column; injected copy will duplicate it"
        );
    }

    if inject_source_id {
        let value = source_id.unwrap_or_default();
        columns.push(rules.source_id_column.clone());
        for row in &mut rows {
            row.push(Some(value.clone()));
        }
    }

    debug!(
        source = %source,
        rows = rows.len(),
        columns = columns.len(),
        dropped_rows,
        "normalized fragment"
    );

    NormalizedFragment {
        fragment: Fragment {
            source,
            columns,
            rows,
        },
        dropped_rows,
        identity_missing,
        source_id_clash,
    }
}

/// Keeps only the leaf level of a multi-level header.
fn flatten_header(mut levels: Vec<Vec<String>>) -> Vec<ColumnLabel> {
    levels
        .pop()
        .unwrap_or_default()
        .into_iter()
        .map(ColumnLabel::from)
        .collect()
}

/// Pads short rows with absent cells and truncates long ones.
fn fit_row(mut row: Vec<Cell>, width: usize) -> Vec<Cell> {
    row.resize(width, None);
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> NormalizeRules {
        NormalizeRules {
            identity_column: "Player".into(),
            source_id_column: "Comp".into(),
        }
    }

    fn row(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn header(levels: &[&[&str]]) -> Vec<Vec<String>> {
        levels
            .iter()
            .map(|l| l.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_outer_level_dropped_and_echo_rows_removed() {
        let raw = RawFragment::new(
            "A",
            header(&[
                &["", "Performance", "Performance", "Per 90 Minutes"],
                &["Player", "Gls", "Ast", "Gls"],
            ]),
            vec![
                row(&["Player", "Gls", "Ast", "Gls"]),
                row(&["Erling Haaland", "27", "5", "0.87"]),
            ],
        );

        let out = normalize(raw, &rules());
        let labels: Vec<&str> = out.fragment.columns.iter().map(|c| c.as_str()).collect();
        assert_eq!(labels, vec!["Player", "Gls", "Ast", "Gls"]);
        assert_eq!(out.fragment.row_count(), 1);
        assert_eq!(out.dropped_rows, 1);
        assert!(!out.identity_missing);
    }

    #[test]
    fn test_single_level_header_is_kept() {
        let raw = RawFragment::new("A", header(&[&["Player", "Gls"]]), vec![row(&["X", "1"])]);
        let out = normalize(raw, &rules());
        assert_eq!(out.fragment.columns, vec![ColumnLabel::from("Player"), ColumnLabel::from("Gls")]);
    }

    #[test]
    fn test_source_id_injected_on_every_row() {
        let raw = RawFragment::new(
            "Championship",
            header(&[&["Player", "Gls"]]),
            vec![row(&["A", "1"]), row(&["B", "2"])],
        )
        .with_source_id("ENG-Championship");

        let out = normalize(raw, &rules());
        assert_eq!(out.fragment.columns.len(), 3);
        assert_eq!(out.fragment.columns[2], "Comp");
        for r in &out.fragment.rows {
            assert_eq!(r[2].as_deref(), Some("ENG-Championship"));
        }
    }

    #[test]
    fn test_existing_source_id_column_is_flagged() {
        let raw = RawFragment::new(
            "Championship",
            header(&[&["Player", "Comp"]]),
            vec![row(&["A", "eng Championship"])],
        )
        .with_source_id("ENG-Championship");

        let out = normalize(raw, &rules());
        assert!(out.source_id_clash);
        assert_eq!(out.fragment.columns.len(), 3);

        let plain = RawFragment::new("A", header(&[&["Player", "Comp"]]), vec![]);
        assert!(!normalize(plain, &rules()).source_id_clash);
    }

    #[test]
    fn test_missing_identity_column_skips_filter() {
        let raw = RawFragment::new(
            "NoPlayer",
            header(&[&["Squad", "Gls"]]),
            vec![row(&["Squad", "Gls"]), row(&["Arsenal", "60"])],
        );

        let out = normalize(raw, &rules());
        assert!(out.identity_missing);
        assert_eq!(out.fragment.row_count(), 2);
        assert_eq!(out.dropped_rows, 0);
    }

    #[test]
    fn test_ragged_rows_fit_header_width() {
        let raw = RawFragment::new(
            "A",
            header(&[&["Player", "Gls", "Ast"]]),
            vec![row(&["A"]), row(&["B", "1", "2", "extra"])],
        );

        let out = normalize(raw, &rules());
        assert_eq!(out.fragment.rows[0], vec![Some("A".to_string()), None, None]);
        assert_eq!(out.fragment.rows[1].len(), 3);
    }

    #[test]
    fn test_empty_identity_value_is_not_an_echo() {
        let raw = RawFragment::new("A", header(&[&["Player"]]), vec![row(&[""]), vec![None]]);
        let out = normalize(raw, &rules());
        assert_eq!(out.fragment.row_count(), 2);
    }
}
