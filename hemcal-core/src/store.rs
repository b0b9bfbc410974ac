//! The persisted event set.
//!
//! One JSON document keyed by uid, written atomically. All state machine
//! transitions go through here so concurrent mutators cannot silently revert
//! each other's decisions: every transition names the expected current state
//! and is rejected as stale on mismatch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{ApprovalState, ClassifierRules, classify};
use crate::error::{HemcalError, HemcalResult};
use crate::event::{CanonicalEvent, OriginalSource};

const EVENTS_FILE: &str = "events.json";

/// A canonical event together with its approval state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event: CanonicalEvent,
    pub state: ApprovalState,
}

/// Inbound create-event payload (manual events).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventPayload {
    pub summary: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// File-backed store of all persisted events, keyed by uid.
#[derive(Debug)]
pub struct EventStore {
    path: PathBuf,
    records: BTreeMap<String, StoredEvent>,
}

impl EventStore {
    /// Load the event set from `data_dir`. A missing file is an empty store;
    /// an unreadable one is fatal to the whole pass.
    pub fn load(data_dir: &Path) -> HemcalResult<Self> {
        let path = data_dir.join(EVENTS_FILE);

        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                HemcalError::Store(format!("unreadable event set {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(EventStore { path, records })
    }

    pub fn save(&self) -> HemcalResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(&self.records)
            .map_err(|e| HemcalError::Serialization(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, uid: &str) -> Option<&StoredEvent> {
        self.records.get(uid)
    }

    pub fn records(&self) -> impl Iterator<Item = &StoredEvent> {
        self.records.values()
    }

    pub fn in_state(&self, state: ApprovalState) -> impl Iterator<Item = &StoredEvent> {
        self.records.values().filter(move |r| r.state == state)
    }

    /// All persisted canonical events, for building a merge snapshot.
    pub fn snapshot(&self) -> Vec<CanonicalEvent> {
        self.records.values().map(|r| r.event.clone()).collect()
    }

    /// Insert or refresh one merged event.
    ///
    /// A refetch refreshes content but never resets an existing approval
    /// decision, never flips `inbox_only`, and leaves manually overridden
    /// events (those carrying `created_by`) untouched.
    pub fn upsert(&mut self, mut event: CanonicalEvent, rules: &ClassifierRules) -> ApprovalState {
        match self.records.get_mut(&event.uid) {
            Some(existing) => {
                if existing.event.created_by.is_none() {
                    event.inbox_only = existing.event.inbox_only;
                    event.is_lesson = existing.event.is_lesson;
                    event.created_at = match (existing.event.created_at, event.created_at) {
                        (Some(a), Some(b)) => Some(a.min(b)),
                        (a, b) => a.or(b),
                    };
                    event.assignees = existing.event.assignees.clone();
                    event.category = event.category.take().or_else(|| existing.event.category.clone());
                    existing.event = event;
                }
                existing.state
            }
            None => {
                let state = classify(&mut event, rules);
                let uid = event.uid.clone();
                self.records.insert(uid, StoredEvent { event, state });
                state
            }
        }
    }

    /// Drop a superseded or deleted event. Returns the removed record.
    pub fn remove(&mut self, uid: &str) -> Option<StoredEvent> {
        self.records.remove(uid)
    }

    /// Create a locally authored event. Manual events are never inbox-only
    /// and enter the shared calendar immediately.
    pub fn create_manual(&mut self, payload: CreateEventPayload) -> HemcalResult<CanonicalEvent> {
        let summary = payload.summary.trim().to_string();
        if summary.is_empty() {
            return Err(HemcalError::Validation("summary must not be empty".into()));
        }
        if let Some(end) = payload.end
            && end < payload.start
        {
            return Err(HemcalError::Validation(
                "event must not end before it starts".into(),
            ));
        }

        let event = CanonicalEvent {
            uid: uuid::Uuid::new_v4().to_string(),
            summary,
            start: payload.start,
            end: payload.end,
            location: payload.location,
            description: payload.description,
            source: "Manual".to_string(),
            original_source: OriginalSource::Manual,
            assignees: payload.assignees.into_iter().collect(),
            category: payload.category,
            inbox_only: false,
            is_lesson: false,
            created_by: Some(payload.created_by.unwrap_or_else(|| "manual".to_string())),
            created_at: Some(Utc::now()),
        };

        self.records.insert(
            event.uid.clone(),
            StoredEvent {
                event: event.clone(),
                state: ApprovalState::Approved,
            },
        );

        Ok(event)
    }

    /// Move an event from `expected` to `next`.
    ///
    /// Rejected as stale when the stored state is not `expected`, so a
    /// concurrent decision is never silently reverted.
    pub fn transition(
        &mut self,
        uid: &str,
        expected: ApprovalState,
        next: ApprovalState,
    ) -> HemcalResult<()> {
        let record = self
            .records
            .get_mut(uid)
            .ok_or_else(|| HemcalError::NotFound(uid.to_string()))?;

        if record.state != expected {
            return Err(HemcalError::Stale {
                uid: uid.to_string(),
                expected,
                actual: record.state,
            });
        }

        if !expected.can_transition_to(next) {
            return Err(HemcalError::Validation(format!(
                "illegal transition {expected} -> {next}"
            )));
        }

        debug!(uid, %expected, %next, "state transition");
        record.state = next;
        Ok(())
    }

    pub fn approve(&mut self, uid: &str) -> HemcalResult<()> {
        self.transition(uid, ApprovalState::Pending, ApprovalState::Approved)
    }

    pub fn reject(&mut self, uid: &str) -> HemcalResult<()> {
        self.transition(uid, ApprovalState::Pending, ApprovalState::Rejected)
    }

    /// Restore a rejected or synced event to the inbox.
    pub fn restore(&mut self, uid: &str) -> HemcalResult<()> {
        let actual = self
            .records
            .get(uid)
            .map(|r| r.state)
            .ok_or_else(|| HemcalError::NotFound(uid.to_string()))?;

        match actual {
            ApprovalState::Rejected | ApprovalState::Synced => {
                self.transition(uid, actual, ApprovalState::Pending)
            }
            other => Err(HemcalError::Validation(format!(
                "cannot restore an event in state {other}"
            ))),
        }
    }

    /// Sync engine bookkeeping: the event now exists remotely.
    pub fn mark_synced(&mut self, uid: &str) -> HemcalResult<()> {
        self.transition(uid, ApprovalState::Approved, ApprovalState::Synced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rules() -> ClassifierRules {
        ClassifierRules {
            training_keywords: vec!["träning".to_string()],
            notable_keywords: vec!["cup".to_string()],
        }
    }

    fn store() -> EventStore {
        let dir = tempfile::tempdir().unwrap();
        EventStore::load(dir.path()).unwrap()
    }

    fn feed_event(uid: &str, summary: &str, inbox_only: bool) -> CanonicalEvent {
        CanonicalEvent {
            uid: uid.to_string(),
            summary: summary.to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 20, 18, 0, 0).unwrap(),
            end: None,
            location: None,
            description: None,
            source: "Laget".to_string(),
            original_source: OriginalSource::SubscriptionFeed,
            assignees: Default::default(),
            category: None,
            inbox_only,
            is_lesson: false,
            created_by: None,
            created_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
        }
    }

    fn payload(summary: &str) -> CreateEventPayload {
        CreateEventPayload {
            summary: summary.to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 20, 18, 0, 0).unwrap(),
            end: None,
            location: None,
            description: None,
            assignees: vec![],
            category: None,
            created_by: Some("app".to_string()),
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = EventStore::load(dir.path()).unwrap();
        store.upsert(feed_event("a", "Träning P10", true), &rules());
        store.save().unwrap();

        let reloaded = EventStore::load(dir.path()).unwrap();
        assert_eq!(reloaded.len(), 1);
        let record = reloaded.get("a").unwrap();
        assert_eq!(record.state, ApprovalState::Approved);
        assert!(record.event.is_lesson);
    }

    #[test]
    fn test_unreadable_store_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("events.json"), "not json").unwrap();

        let err = EventStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, HemcalError::Store(_)));
    }

    #[test]
    fn test_refetch_keeps_manual_decision() {
        let mut store = store();
        store.upsert(feed_event("a", "Vårcupen", true), &rules());
        assert_eq!(store.get("a").unwrap().state, ApprovalState::Pending);
        store.reject("a").unwrap();

        // Same uid arrives again on the next pass.
        store.upsert(feed_event("a", "Vårcupen", true), &rules());
        assert_eq!(store.get("a").unwrap().state, ApprovalState::Rejected);
    }

    #[test]
    fn test_refetch_refreshes_content_but_not_inbox_flag() {
        let mut store = store();
        store.upsert(feed_event("a", "Träning P10", true), &rules());

        let mut update = feed_event("a", "Träning P10 (ny tid)", false);
        update.location = Some("Nya hallen".to_string());
        store.upsert(update, &rules());

        let record = store.get("a").unwrap();
        assert_eq!(record.event.summary, "Träning P10 (ny tid)");
        assert_eq!(record.event.location.as_deref(), Some("Nya hallen"));
        assert!(record.event.inbox_only, "inbox_only is never silently flipped");
    }

    #[test]
    fn test_create_manual_is_approved_and_never_inbox_only() {
        let mut store = store();
        let event = store.create_manual(payload("Mormors födelsedag")).unwrap();

        let record = store.get(&event.uid).unwrap();
        assert_eq!(record.state, ApprovalState::Approved);
        assert!(!record.event.inbox_only);
        assert_eq!(record.event.original_source, OriginalSource::Manual);
        assert_eq!(record.event.created_by.as_deref(), Some("app"));
    }

    #[test]
    fn test_create_manual_rejects_empty_summary() {
        let mut store = store();
        let err = store.create_manual(payload("   ")).unwrap_err();
        assert!(matches!(err, HemcalError::Validation(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_transition_is_rejected() {
        let mut store = store();
        store.upsert(feed_event("a", "Vårcupen", true), &rules());
        store.approve("a").unwrap();

        // A second decision against the old state must not win.
        let err = store.reject("a").unwrap_err();
        assert!(matches!(err, HemcalError::Stale { .. }));
        assert_eq!(store.get("a").unwrap().state, ApprovalState::Approved);
    }

    #[test]
    fn test_restore_unknown_uid_is_not_found() {
        let mut store = store();
        store.upsert(feed_event("a", "Vårcupen", true), &rules());

        let err = store.restore("missing").unwrap_err();
        assert!(matches!(err, HemcalError::NotFound(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().state, ApprovalState::Pending);
    }

    #[test]
    fn test_restore_rejected_event() {
        let mut store = store();
        store.upsert(feed_event("a", "Vårcupen", true), &rules());
        store.reject("a").unwrap();

        store.restore("a").unwrap();
        assert_eq!(store.get("a").unwrap().state, ApprovalState::Pending);
    }
}
