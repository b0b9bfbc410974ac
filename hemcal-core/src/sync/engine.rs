//! The sync engine: drives create/update/delete against the remote service.
//!
//! Every operation is idempotent and safe to repeat: `ensure_synced` never
//! creates a second remote copy for the same uid, and a remote copy that is
//! already gone counts as successfully removed. Remote mutations are paced
//! with a minimum inter-call delay to stay under the service's rate limits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::classify::ApprovalState;
use crate::error::{HemcalError, HemcalResult};
use crate::event::{CanonicalEvent, normalize_summary};
use crate::store::EventStore;
use crate::sync::mapping::{MappingTable, SyncMapping};
use crate::sync::remote::{RemoteCalendar, RemoteEvent};

/// Default minimum delay between consecutive remote mutations.
pub const DEFAULT_PACE: Duration = Duration::from_millis(250);

/// What a sync operation did for one uid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncAction {
    Created,
    Updated,
    Deleted,
    /// Nothing to do (no mapping existed).
    Skipped,
}

/// Per-uid outcome of a batch operation. A failure on one uid never aborts
/// the rest of the batch.
#[derive(Debug)]
pub struct SyncReport {
    pub uid: String,
    pub action: Option<SyncAction>,
    pub error: Option<String>,
}

/// Outcome of a reconciliation pass against a remote snapshot.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Mappings dropped because the remote copy is gone.
    pub orphaned: Vec<String>,
    /// Remote duplicate copies deleted.
    pub duplicates_deleted: usize,
}

pub struct SyncEngine {
    client: Arc<dyn RemoteCalendar>,
    calendar_id: String,
    table: MappingTable,
    pace: Duration,
    last_call: Option<Instant>,
}

impl SyncEngine {
    pub fn new(
        client: Arc<dyn RemoteCalendar>,
        calendar_id: impl Into<String>,
        table: MappingTable,
        pace: Duration,
    ) -> Self {
        SyncEngine {
            client,
            calendar_id: calendar_id.into(),
            table,
            pace,
            last_call: None,
        }
    }

    pub fn mappings(&self) -> &MappingTable {
        &self.table
    }

    pub fn persist(&self) -> HemcalResult<()> {
        self.table.save()
    }

    /// Enforce the minimum inter-call delay before a remote mutation.
    async fn pace(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.pace {
                tokio::time::sleep(self.pace - elapsed).await;
            }
        }
        self.last_call = Some(Instant::now());
    }

    /// Bring the remote copy of `event` into existence or up to date.
    ///
    /// With a mapping the remote event is updated in place; a 404/410 on
    /// that update means the copy vanished remotely, so it is recreated and
    /// the mapping rewritten. Without a mapping a remote event is created
    /// and the mapping recorded. Never duplicates.
    pub async fn ensure_synced(&mut self, event: &CanonicalEvent) -> HemcalResult<SyncAction> {
        if let Some(mapping) = self.table.get(&event.uid).cloned() {
            self.pace().await;
            match self
                .client
                .update(&self.calendar_id, &mapping.remote_event_id, event)
                .await
            {
                Ok(()) => return Ok(SyncAction::Updated),
                Err(HemcalError::RemoteNotFound) => {
                    warn!(uid = %event.uid, "remote copy vanished, recreating");
                    self.table.remove(&event.uid);
                }
                Err(e) => return Err(e),
            }
        }

        self.pace().await;
        let remote_event_id = self.client.create(&self.calendar_id, event).await?;
        self.table.insert(SyncMapping {
            uid: event.uid.clone(),
            remote_event_id,
            remote_calendar_id: self.calendar_id.clone(),
        });
        Ok(SyncAction::Created)
    }

    /// Remove the remote copy for `uid`, if one is mapped.
    ///
    /// A remote "not found" is success: the desired end state already holds.
    pub async fn remove_synced(&mut self, uid: &str) -> HemcalResult<SyncAction> {
        let Some(mapping) = self.table.get(uid).cloned() else {
            return Ok(SyncAction::Skipped);
        };

        self.pace().await;
        match self
            .client
            .delete(&self.calendar_id, &mapping.remote_event_id)
            .await
        {
            Ok(()) | Err(HemcalError::RemoteNotFound) => {
                self.table.remove(uid);
                Ok(SyncAction::Deleted)
            }
            Err(e) => Err(e),
        }
    }

    /// Push every approved/synced event and retire mappings whose event no
    /// longer belongs on the shared calendar. Reports per uid.
    pub async fn sync_pass(&mut self, store: &mut EventStore) -> Vec<SyncReport> {
        let mut reports = Vec::new();

        let to_push: Vec<(CanonicalEvent, ApprovalState)> = store
            .records()
            .filter(|r| matches!(r.state, ApprovalState::Approved | ApprovalState::Synced))
            .map(|r| (r.event.clone(), r.state))
            .collect();

        for (event, state) in to_push {
            match self.ensure_synced(&event).await {
                Ok(action) => {
                    let mut error = None;
                    if state == ApprovalState::Approved {
                        // The store decision is keyed by the state we read.
                        if let Err(e) = store.mark_synced(&event.uid) {
                            error = Some(e.to_string());
                        }
                    }
                    reports.push(SyncReport {
                        uid: event.uid,
                        action: Some(action),
                        error,
                    });
                }
                Err(e) => {
                    warn!(uid = %event.uid, "sync failed: {e}");
                    reports.push(SyncReport {
                        uid: event.uid,
                        action: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        // Mappings for events that were rejected, restored to the inbox, or
        // deleted locally: the remote copy comes down.
        for uid in self.table.uids() {
            let eligible = store
                .get(&uid)
                .is_some_and(|r| matches!(r.state, ApprovalState::Approved | ApprovalState::Synced));
            if eligible {
                continue;
            }

            match self.remove_synced(&uid).await {
                Ok(SyncAction::Skipped) => {}
                Ok(action) => reports.push(SyncReport {
                    uid,
                    action: Some(action),
                    error: None,
                }),
                Err(e) => {
                    warn!(uid, "remote removal failed: {e}");
                    reports.push(SyncReport {
                        uid,
                        action: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        reports
    }

    /// Reconcile local mappings against a listing of the remote calendar.
    ///
    /// Orphaned mappings (remote copy gone) are dropped. Remote duplicates
    /// sharing the same normalized-summary + exact-start key are reduced to
    /// the earliest-created copy; this is deliberately a coarser rule set
    /// than the bucketed cross-source fingerprint, because remote duplicates
    /// come from repeated pushes, not timestamp jitter.
    pub async fn reconcile(&mut self, snapshot: &[RemoteEvent]) -> HemcalResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        let remote_ids: std::collections::HashSet<&str> =
            snapshot.iter().map(|e| e.id.as_str()).collect();

        for uid in self.table.uids() {
            let gone = self
                .table
                .get(&uid)
                .is_some_and(|m| !remote_ids.contains(m.remote_event_id.as_str()));
            if gone {
                info!(uid, "dropping orphaned mapping");
                self.table.remove(&uid);
                report.orphaned.push(uid);
            }
        }

        let mut by_key: HashMap<(String, DateTime<Utc>), Vec<&RemoteEvent>> = HashMap::new();
        for event in snapshot {
            by_key
                .entry((normalize_summary(&event.summary), event.start))
                .or_default()
                .push(event);
        }

        for (_, mut copies) in by_key {
            if copies.len() < 2 {
                continue;
            }

            // Earliest created survives; copies without a creation time sort
            // last, and id order keeps the choice deterministic.
            copies.sort_by(|a, b| match (a.created, b.created) {
                (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.id.cmp(&b.id),
            });

            let survivor = copies[0].id.clone();
            for copy in &copies[1..] {
                self.pace().await;
                match self.client.delete(&self.calendar_id, &copy.id).await {
                    Ok(()) | Err(HemcalError::RemoteNotFound) => {
                        report.duplicates_deleted += 1;
                        // A mapping that pointed at the deleted copy follows
                        // the surviving one.
                        let repoint: Vec<SyncMapping> = self
                            .table
                            .iter()
                            .filter(|m| m.remote_event_id == copy.id)
                            .cloned()
                            .collect();
                        for mut mapping in repoint {
                            mapping.remote_event_id = survivor.clone();
                            self.table.insert(mapping);
                        }
                    }
                    Err(e) => {
                        warn!(remote_event_id = %copy.id, "duplicate removal failed: {e}");
                    }
                }
            }
        }

        Ok(report)
    }
}
