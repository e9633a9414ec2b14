// Data processing pipeline: ingestion, then synchronous table processing

pub mod ingestion;
pub mod processing;

use crate::config::Config;
use crate::error::{Result, StatsError};
use crate::storage::TableSink;
use crate::table::UnifiedTable;
use crate::types::{ColumnLabel, RawFragment, TableSource};
use chrono::{DateTime, Utc};
use processing::{
    canonicalize, enrich, merge, normalize, CanonicalRules, DuplicateResolver, EnrichmentSummary,
    NormalizeRules, PositionalResolver,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Rows one source contributed.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRows {
    pub source: String,
    pub rows: usize,
    pub dropped_rows: usize,
}

/// A source that was skipped, and why.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

/// The unified table plus everything learned while building it.
#[derive(Debug, Clone)]
pub struct BuiltTable {
    pub table: UnifiedTable,
    pub sources: Vec<SourceRows>,
    /// Labels still duplicated after canonicalization
    pub duplicates: Vec<ColumnLabel>,
    pub enrichment: EnrichmentSummary,
    pub warnings: Vec<String>,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub succeeded: Vec<SourceRows>,
    pub failed: Vec<SourceFailure>,
    pub total_rows: usize,
    pub columns: Vec<ColumnLabel>,
    pub duplicates: Vec<ColumnLabel>,
    pub warnings: Vec<String>,
    pub output_file: String,
    pub finished_at: DateTime<Utc>,
}

pub struct Pipeline {
    config: Config,
    resolver: Box<dyn DuplicateResolver + Send + Sync>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            resolver: Box::new(PositionalResolver),
        }
    }

    /// Swaps the duplicate-name resolver.
    pub fn with_resolver(mut self, resolver: Box<dyn DuplicateResolver + Send + Sync>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn normalize_rules(&self) -> NormalizeRules {
        NormalizeRules {
            identity_column: self.config.rules.identity_column.clone(),
            source_id_column: self.config.rules.source_id_column.clone(),
        }
    }

    fn canonical_rules(&self) -> CanonicalRules {
        CanonicalRules {
            always_derived: self.config.rules.always_derived.clone(),
            derived_suffix: self.config.rules.derived_suffix.clone(),
            policy: self.config.rules.rename_policy,
        }
    }

    /// Normalize, merge, resolve, canonicalize and enrich, in that order.
    ///
    /// Pure with respect to I/O. Fails on an empty fragment list, or on a
    /// label collision under the `abort` rename policy.
    pub fn build_table(&self, fragments: Vec<RawFragment>) -> Result<BuiltTable> {
        let rules = self.normalize_rules();
        let mut warnings = Vec::new();
        let mut sources = Vec::with_capacity(fragments.len());
        let mut cleaned = Vec::with_capacity(fragments.len());

        for raw in fragments {
            let out = normalize(raw, &rules);
            if out.identity_missing {
                warnings.push(format!(
                    "{}: identity column '{}' missing; header rows not filtered",
                    out.fragment.source, rules.identity_column
                ));
            }
            if out.source_id_clash {
                warnings.push(format!(
                    "{}: already has a '{}' column; injected source id duplicates it",
                    out.fragment.source, rules.source_id_column
                ));
            }
            sources.push(SourceRows {
                source: out.fragment.source.clone(),
                rows: out.fragment.row_count(),
                dropped_rows: out.dropped_rows,
            });
            cleaned.push(out.fragment);
        }

        let mut table = merge(cleaned)?;
        self.resolver.resolve(&mut table, &self.config.rules.ambiguous);
        let outcome = canonicalize(&mut table, &self.canonical_rules())?;
        for label in &outcome.duplicates {
            warnings.push(format!("duplicate column label '{}' after rename", label));
        }
        let enrichment = enrich(&mut table, &self.config.enrich);
        warnings.extend(enrichment.warnings.iter().cloned());

        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "built unified table"
        );

        Ok(BuiltTable {
            table,
            sources,
            duplicates: outcome.duplicates,
            enrichment,
            warnings,
        })
    }

    /// Fetch every source, build the table and hand it to `sink`.
    ///
    /// Per-source failures are skipped; if none succeed the run fails with
    /// `NoDataAvailable` and nothing is written.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub async fn run(&self, sources: Vec<Arc<dyn TableSource>>, sink: &dyn TableSink) -> Result<PipelineReport> {
        info!("starting pipeline");
        let outcomes = ingestion::fetch_all(sources, &self.config.fetch).await;

        let mut fragments = Vec::new();
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(fragment) => fragments.push(fragment),
                Err(e) => {
                    warn!(source = %outcome.source, "source skipped: {}", e);
                    failed.push(SourceFailure {
                        source: outcome.source,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if fragments.is_empty() {
            error!("every source failed; nothing to write");
            return Err(StatsError::NoDataAvailable);
        }

        let built = self.build_table(fragments)?;
        let output = sink.write(&built.table)?;

        Ok(PipelineReport {
            total_rows: built.table.row_count(),
            columns: built.table.labels(),
            succeeded: built.sources,
            failed,
            duplicates: built.duplicates,
            warnings: built.warnings,
            output_file: output.display().to_string(),
            finished_at: Utc::now(),
        })
    }
}
