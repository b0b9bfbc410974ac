//! The aggregation pass: fetch, canonicalize, merge, classify, persist.
//!
//! Merge and classification run single-threaded over a fully collected
//! snapshot once all fetch tasks have finished; a fingerprint group must be
//! complete before a survivor can be picked, so partial or streaming merges
//! would be order-dependent.

use chrono::Utc;
use tracing::{debug, info};

use crate::canonical::canonicalize_batch;
use crate::classify::ApprovalState;
use crate::config::HemcalConfig;
use crate::dedup::merge;
use crate::error::HemcalResult;
use crate::fetch::{FeedBatch, FetchOutcome, SourceReport, fetch_all};
use crate::source::CalendarSource;
use crate::store::EventStore;

/// Outcome of one aggregation pass.
#[derive(Debug)]
pub struct PassReport {
    pub sources: Vec<SourceReport>,
    /// Events in the deduplicated set after the pass.
    pub merged: usize,
    /// Duplicate copies discarded by this pass.
    pub superseded: usize,
    /// Events waiting in the inbox after the pass.
    pub pending: usize,
    /// Events on the shared calendar (approved or already synced).
    pub approved: usize,
}

/// Run a full aggregation pass over every configured source.
pub async fn run_pass(config: &HemcalConfig, store: &mut EventStore) -> HemcalResult<PassReport> {
    let results = fetch_all(&config.sources, config.fetch.timeout).await;
    let report = apply(config, store, results)?;
    store.save()?;
    Ok(report)
}

/// Apply a set of per-source fetch results to the store.
///
/// Split out of [`run_pass`] so the reconciliation logic is a pure function
/// of its inputs.
pub fn apply(
    config: &HemcalConfig,
    store: &mut EventStore,
    results: Vec<(CalendarSource, HemcalResult<FeedBatch>)>,
) -> HemcalResult<PassReport> {
    let now = Utc::now();
    let mut sources = Vec::with_capacity(results.len());

    for (source, result) in results {
        let outcome = match result {
            Ok(batch) => {
                let skipped = batch.skipped;
                let (events, dropped) = canonicalize_batch(batch.raw, &source, now);

                for event in &events {
                    debug!(source = %source.id, uid = %event.uid, "ingesting");
                }
                let count = events.len();
                for event in events {
                    store.upsert(event, &config.rules);
                }

                FetchOutcome::Fetched {
                    events: count,
                    skipped: skipped + dropped,
                }
            }
            Err(e) => FetchOutcome::Failed {
                error: e.to_string(),
            },
        };

        sources.push(SourceReport {
            source_id: source.id,
            source_name: source.name,
            outcome,
        });
    }

    // Cross-source dedup over the complete snapshot.
    let outcome = merge(store.snapshot(), config.dedup.bucket_width);
    let mut superseded = 0;
    for decision in &outcome.decisions {
        info!(
            fingerprint = %decision.fingerprint,
            survivor = %decision.survivor,
            superseded = ?decision.superseded,
            "merged duplicate group"
        );
        for uid in &decision.superseded {
            store.remove(uid);
            superseded += 1;
        }
    }

    Ok(PassReport {
        sources,
        merged: outcome.events.len(),
        superseded,
        pending: store.in_state(ApprovalState::Pending).count(),
        approved: store.in_state(ApprovalState::Approved).count()
            + store.in_state(ApprovalState::Synced).count(),
    })
}
