use crate::table::UnifiedTable;
use crate::types::{AmbiguousNameSet, ColumnLabel};
use std::collections::HashMap;
use tracing::debug;

/// Gives repeated ambiguous labels distinct names.
pub trait DuplicateResolver {
    /// Returns the relabelled sequence; must return one label per input label.
    fn resolve_labels(&self, labels: &[ColumnLabel], ambiguous: &AmbiguousNameSet) -> Vec<ColumnLabel>;

    /// Relabels the table in place; cells are not touched.
    fn resolve(&self, table: &mut UnifiedTable, ambiguous: &AmbiguousNameSet) {
        let labels = self.resolve_labels(&table.labels(), ambiguous);
        table.set_labels(labels);
    }
}

/// Suffixes the k-th occurrence of a repeated ambiguous label with `_k`.
///
/// Precondition: the source renders the cumulative statistic to the left of
/// its per-90 counterpart. Cell contents are never inspected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalResolver;

impl DuplicateResolver for PositionalResolver {
    fn resolve_labels(&self, labels: &[ColumnLabel], ambiguous: &AmbiguousNameSet) -> Vec<ColumnLabel> {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for label in labels {
            *totals.entry(label.as_str()).or_insert(0) += 1;
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        labels
            .iter()
            .map(|label| {
                let name = label.as_str();
                if !ambiguous.contains(name) || totals[name] < 2 {
                    return label.clone();
                }
                let k = seen.entry(name).or_insert(0);
                *k += 1;
                debug!(label = name, occurrence = *k, "disambiguated label");
                ColumnLabel::new(format!("{}_{}", name, k))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LabelSet;

    fn labels(names: &[&str]) -> Vec<ColumnLabel> {
        names.iter().map(|n| ColumnLabel::from(*n)).collect()
    }

    fn strings(labels: Vec<ColumnLabel>) -> Vec<String> {
        labels.into_iter().map(ColumnLabel::into_string).collect()
    }

    #[test]
    fn test_repeated_ambiguous_labels_get_positions() {
        let set = LabelSet::new(["Gls", "Ast"]);
        let out = PositionalResolver.resolve_labels(&labels(&["Player", "Gls", "Ast", "Gls", "Ast"]), &set);
        assert_eq!(strings(out), vec!["Player", "Gls_1", "Ast_1", "Gls_2", "Ast_2"]);
    }

    #[test]
    fn test_single_occurrence_untouched() {
        let set = LabelSet::new(["Gls", "xG"]);
        let out = PositionalResolver.resolve_labels(&labels(&["Gls", "Gls", "xG"]), &set);
        assert_eq!(strings(out), vec!["Gls_1", "Gls_2", "xG"]);
    }

    #[test]
    fn test_labels_outside_set_untouched_even_when_repeated() {
        let set = LabelSet::new(["Gls"]);
        let out = PositionalResolver.resolve_labels(&labels(&["Min", "Min"]), &set);
        assert_eq!(strings(out), vec!["Min", "Min"]);
    }

    #[test]
    fn test_third_occurrence_numbered() {
        let set = LabelSet::new(["Gls"]);
        let out = PositionalResolver.resolve_labels(&labels(&["Gls", "Gls", "Gls"]), &set);
        assert_eq!(strings(out), vec!["Gls_1", "Gls_2", "Gls_3"]);
    }
}
