use crate::config::RenamePolicy;
use crate::error::{Result, StatsError};
use crate::table::{self, UnifiedTable};
use crate::types::{AlwaysDerivedSet, ColumnLabel};
use tracing::warn;

const FIRST_MARKER: &str = "_1";
const SECOND_MARKER: &str = "_2";

/// Rules for turning resolved labels into canonical ones.
#[derive(Debug, Clone)]
pub struct CanonicalRules {
    pub always_derived: AlwaysDerivedSet,
    /// Suffix marking a per-90 statistic, e.g. `_p90`
    pub derived_suffix: String,
    pub policy: RenamePolicy,
}

/// Result of a canonical rename.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalizeOutcome {
    /// Labels still repeated after renaming; empty on a clean run
    pub duplicates: Vec<ColumnLabel>,
}

impl CanonicalizeOutcome {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }
}

/// Maps one label to its canonical name.
///
/// `X_1` becomes `X`, `X_2` becomes `X` plus the derived suffix, a bare label
/// in `always_derived` gains the derived suffix, anything else is unchanged.
pub fn canonical_label(label: &ColumnLabel, rules: &CanonicalRules) -> ColumnLabel {
    let name = label.as_str();
    if let Some(stem) = name.strip_suffix(FIRST_MARKER).filter(|s| !s.is_empty()) {
        return ColumnLabel::from(stem);
    }
    if let Some(stem) = name.strip_suffix(SECOND_MARKER).filter(|s| !s.is_empty()) {
        return ColumnLabel::new(format!("{}{}", stem, rules.derived_suffix));
    }
    if rules.always_derived.contains(name) {
        return ColumnLabel::new(format!("{}{}", name, rules.derived_suffix));
    }
    label.clone()
}

/// Renames every column in a single pass over the current labels.
///
/// Under [`RenamePolicy::Warn`] colliding labels are logged and kept; under
/// [`RenamePolicy::Abort`] the table is left untouched and an error returned.
pub fn canonicalize(table: &mut UnifiedTable, rules: &CanonicalRules) -> Result<CanonicalizeOutcome> {
    let renamed: Vec<ColumnLabel> = table
        .labels()
        .iter()
        .map(|label| canonical_label(label, rules))
        .collect();

    let duplicates = table::duplicate_labels(renamed.iter());
    if !duplicates.is_empty() {
        match rules.policy {
            RenamePolicy::Abort => {
                return Err(StatsError::RenameIntegrity { duplicates });
            }
            RenamePolicy::Warn => {
                for label in &duplicates {
                    warn!(label = %label, "duplicate column label after canonical rename");
                }
            }
        }
    }

    table.set_labels(renamed);
    Ok(CanonicalizeOutcome { duplicates })
}
