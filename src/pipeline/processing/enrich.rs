use crate::config::EnrichConfig;
use crate::table::UnifiedTable;
use crate::types::Cell;
use serde::Serialize;
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// What the enrichment pass actually did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentSummary {
    pub key_added: bool,
    pub folded_columns: Vec<String>,
    pub warnings: Vec<String>,
}

/// Strips diacritics, e.g. `José` -> `Jose`, `Ødegaard` -> `Odegaard`.
///
/// Case is preserved. Characters with no Latin base letter are kept as-is,
/// so the result is ASCII only for Latin-script input.
pub fn fold_to_ascii(text: &str) -> String {
    let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let mut out = String::with_capacity(stripped.len());
    for c in stripped.as_str().nfc() {
        match c {
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'đ' => out.push('d'),
            'Đ' => out.push('D'),
            'ı' => out.push('i'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'þ' => out.push_str("th"),
            'Þ' => out.push_str("Th"),
            _ => out.push(c),
        }
    }
    out
}

/// ASCII-folds every present cell of `label`. Returns false if the column is missing.
pub fn fold_column(table: &mut UnifiedTable, label: &str) -> bool {
    let Some(column) = table.column_mut(label) else {
        return false;
    };
    for cell in column.cells.iter_mut() {
        if let Some(text) = cell.as_mut() {
            *text = fold_to_ascii(text);
        }
    }
    true
}

/// Builds the entity+group key column, e.g. `Jose` + `Utd` -> `JoseUtd`.
///
/// Absent cells contribute an empty string. Returns `None` when either
/// source column is missing.
pub fn composite_key(table: &UnifiedTable, entity: &str, group: &str) -> Option<Vec<Cell>> {
    let entity = table.column(entity)?;
    let group = table.column(group)?;
    Some(
        entity
            .cells
            .iter()
            .zip(&group.cells)
            .map(|(e, g)| {
                let mut key = e.clone().unwrap_or_default();
                key.push_str(g.as_deref().unwrap_or(""));
                Some(key)
            })
            .collect(),
    )
}

/// Folds the configured text columns, then appends the composite key.
///
/// Runs on canonical labels. Missing columns skip the dependent step with a
/// warning.
pub fn enrich(table: &mut UnifiedTable, config: &EnrichConfig) -> EnrichmentSummary {
    let mut summary = EnrichmentSummary::default();

    for label in &config.fold_columns {
        if fold_column(table, label.as_str()) {
            summary.folded_columns.push(label.to_string());
        } else {
            let msg = format!("fold column '{}' not found", label);
            warn!(column = %label, "fold column not found; skipping text normalization");
            summary.warnings.push(msg);
        }
    }

    if table.has_column(config.key_column.as_str()) {
        let msg = format!("key column '{}' already exists", config.key_column);
        warn!(column = %config.key_column, "key column already exists; composite key not added");
        summary.warnings.push(msg);
        return summary;
    }

    match composite_key(table, config.entity_column.as_str(), config.group_column.as_str()) {
        Some(cells) => {
            table.push_column(config.key_column.clone(), cells);
            summary.key_added = true;
            debug!(column = %config.key_column, "added composite key");
        }
        None => {
            let msg = format!(
                "composite key skipped: '{}' or '{}' missing",
                config.entity_column, config.group_column
            );
            warn!(
                entity = %config.entity_column,
                group = %config.group_column,
                "composite key skipped; source column missing"
            );
            summary.warnings.push(msg);
        }
    }

    summary
}
