// Pipeline ingestion: concurrent per-source fetching with independent retries

use crate::config::FetchConfig;
use crate::error::{Result, StatsError};
use crate::types::{RawFragment, TableSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

/// What one source produced.
#[derive(Debug)]
pub struct FetchOutcome {
    pub source: String,
    /// The first table on the page, or the reason the source was skipped
    pub result: Result<RawFragment>,
}

/// Fetches every source with at most `fetch.concurrency` in flight.
///
/// Outcomes come back in the order of `sources`, regardless of which
/// finished first. A source that fails every attempt, or yields no tables,
/// is reported as a `SourceFetch` error and never aborts the others.
pub async fn fetch_all(sources: Vec<Arc<dyn TableSource>>, fetch: &FetchConfig) -> Vec<FetchOutcome> {
    let sem = Arc::new(Semaphore::new(fetch.concurrency.max(1)));
    let max_retries = fetch.max_retries.max(1);
    let delay = Duration::from_millis(fetch.retry_delay_ms);

    let mut handles = Vec::with_capacity(sources.len());
    for source in sources {
        let sem = sem.clone();
        let name = source.name().to_string();
        let handle = tokio::spawn(async move {
            // Semaphore is never closed
            let _permit = sem.acquire_owned().await.ok();
            let start = Instant::now();
            let result = fetch_first_fragment(source.as_ref(), max_retries, delay).await;
            match &result {
                Ok(fragment) => info!(source = %source.name(), rows = fragment.rows.len(), elapsed = ?start.elapsed(), "fetched"),
                Err(e) => error!(source = %source.name(), "skipping source: {}", e),
            }
            result
        });
        handles.push((name, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (source, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(join_err) => Err(StatsError::SourceFetch {
                source_name: source.clone(),
                message: format!("fetch task failed: {}", join_err),
            }),
        };
        outcomes.push(FetchOutcome { source, result });
    }
    outcomes
}

async fn fetch_first_fragment(source: &dyn TableSource, max_retries: u32, delay: Duration) -> Result<RawFragment> {
    let mut attempt = 0;
    let fragments = loop {
        attempt += 1;
        match source.fetch_fragments().await {
            Ok(fragments) => break fragments,
            Err(e) if attempt < max_retries => {
                warn!(source = %source.name(), attempt, "fetch failed, retrying: {}", e);
                sleep(delay).await;
            }
            Err(e) => {
                return Err(StatsError::SourceFetch {
                    source_name: source.name().to_string(),
                    message: format!("{} (after {} attempts)", e, attempt),
                })
            }
        }
    };

    let total = fragments.len();
    let first = fragments.into_iter().next().ok_or_else(|| StatsError::SourceFetch {
        source_name: source.name().to_string(),
        message: "no tables found".to_string(),
    })?;
    if total > 1 {
        info!(source = %source.name(), tables = total, "using the first table");
    }
    Ok(first)
}
