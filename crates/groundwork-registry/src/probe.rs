//! Parallel multi-source entity probe.
//!
//! Runs one search per (store, term) pair, each under its own timeout.
//! Probes that time out or fail are dropped from the result; partial results
//! are the normal case. Nothing is retried.

use groundwork_domain::{Row, StoreAdapter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Rows one store returned for one term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeHit {
    /// Store that answered
    pub source_id: String,
    /// Term searched for
    pub term: String,
    /// Matching rows (never empty)
    pub rows: Vec<Row>,
}

/// Aggregate of one probe round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Non-empty answers, ordered by store then term
    pub hits: Vec<ProbeHit>,
    /// Probes launched
    pub attempted: usize,
    /// Probes that timed out or failed
    pub dropped: usize,
}

impl ProbeReport {
    /// Distinct stores that returned something
    pub fn sources_hit(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for hit in &self.hits {
            if !ids.contains(&hit.source_id.as_str()) {
                ids.push(hit.source_id.as_str());
            }
        }
        ids
    }
}

/// Search every store for every term concurrently
///
/// Adapter calls are blocking and run on the blocking pool. A probe that
/// exceeds `timeout` is abandoned; its thread may still finish in the
/// background but its result is discarded.
pub async fn probe_entities(
    adapters: &[Arc<dyn StoreAdapter>],
    terms: &[String],
    timeout: Duration,
    limit: usize,
) -> ProbeReport {
    let mut tasks = JoinSet::new();

    for (store_idx, adapter) in adapters.iter().enumerate() {
        for (term_idx, term) in terms.iter().enumerate() {
            let adapter = Arc::clone(adapter);
            let term = term.clone();
            tasks.spawn(async move {
                let source_id = adapter.source_id().to_string();
                let search_term = term.clone();
                let search = tokio::task::spawn_blocking(move || adapter.search(&search_term, limit));
                let outcome = match tokio::time::timeout(timeout, search).await {
                    Ok(Ok(Ok(rows))) => Ok(rows),
                    Ok(Ok(Err(e))) => Err(e.to_string()),
                    Ok(Err(join)) => Err(join.to_string()),
                    Err(_) => Err(format!("timed out after {:?}", timeout)),
                };
                ((store_idx, term_idx), source_id, term, outcome)
            });
        }
    }

    let mut report = ProbeReport::default();
    let mut hits = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        report.attempted += 1;
        match joined {
            Ok((order, source_id, term, Ok(rows))) => {
                if !rows.is_empty() {
                    hits.push((order, ProbeHit { source_id, term, rows }));
                }
            }
            Ok((_, source_id, term, Err(error))) => {
                tracing::debug!(source_id = %source_id, term = %term, error = %error, "Probe dropped");
                report.dropped += 1;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Probe task aborted");
                report.dropped += 1;
            }
        }
    }

    hits.sort_by_key(|(order, _)| *order);
    report.hits = hits.into_iter().map(|(_, hit)| hit).collect();
    report
}
