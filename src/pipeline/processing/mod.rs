//! Synchronous table transformations, run in order:
//! normalize -> merge -> resolve -> canonical -> enrich.

pub mod canonical;
pub mod enrich;
pub mod merge;
pub mod normalize;
pub mod resolve;

pub use canonical::{canonicalize, CanonicalRules, CanonicalizeOutcome};
pub use enrich::{enrich, fold_to_ascii, EnrichmentSummary};
pub use merge::merge;
pub use normalize::{normalize, NormalizeRules, NormalizedFragment};
pub use resolve::{DuplicateResolver, PositionalResolver};
