//! Cross-source duplicate detection and merging.
//!
//! Multiple sources (or repeated fetches of the same source) can describe the
//! same real-world occurrence. Events are grouped by a fingerprint of the
//! normalized summary and a start-time bucket, and each group resolves to
//! exactly one survivor. The merge is a pure function over a fully
//! materialized snapshot: same input set, same survivors, regardless of input
//! order, and re-merging merged output is a no-op.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;

use crate::event::{CanonicalEvent, normalize_summary};

/// Default width of a fingerprint time bucket.
pub const DEFAULT_BUCKET_WIDTH: Duration = Duration::from_secs(5 * 60);

/// One resolved duplicate group. Superseded events are discarded by the
/// engine; callers needing an audit trail capture these decisions first.
#[derive(Debug, Clone)]
pub struct MergeDecision {
    pub fingerprint: String,
    pub survivor: String,
    pub superseded: Vec<String>,
}

/// The deduplicated event set plus the decisions that produced it.
#[derive(Debug)]
pub struct MergeOutcome {
    pub events: Vec<CanonicalEvent>,
    pub decisions: Vec<MergeDecision>,
}

/// Fingerprint tolerating small timestamp jitter between sources describing
/// the same event: normalized summary plus the start-time bucket.
pub fn fingerprint(event: &CanonicalEvent, bucket: Duration) -> String {
    let bucket_secs = bucket.as_secs().max(1) as i64;
    let bucket_index = event.start.timestamp().div_euclid(bucket_secs);
    format!("{}_{}", normalize_summary(&event.summary), bucket_index)
}

/// Resolve each fingerprint group to one surviving event.
pub fn merge(events: Vec<CanonicalEvent>, bucket: Duration) -> MergeOutcome {
    let mut groups: HashMap<String, Vec<CanonicalEvent>> = HashMap::new();
    for event in events {
        groups.entry(fingerprint(&event, bucket)).or_default().push(event);
    }

    let mut survivors = Vec::with_capacity(groups.len());
    let mut decisions = Vec::new();

    for (fingerprint, mut group) in groups {
        group.sort_by(preference);
        let mut rest = group.split_off(1);
        let survivor = group.pop().expect("group is never empty");

        if !rest.is_empty() {
            decisions.push(MergeDecision {
                fingerprint,
                survivor: survivor.uid.clone(),
                superseded: rest.drain(..).map(|e| e.uid).collect(),
            });
        }

        survivors.push(survivor);
    }

    // Deterministic output order, independent of hash iteration.
    survivors.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.uid.cmp(&b.uid)));
    decisions.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));

    MergeOutcome {
        events: survivors,
        decisions,
    }
}

/// Survivor preference: oldest recorded creation time wins; without a usable
/// creation-time comparison, higher source trust wins; then smallest uid.
fn preference(a: &CanonicalEvent, b: &CanonicalEvent) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(x), Some(y)) if x != y => x.cmp(&y),
        _ => a
            .original_source
            .cmp(&b.original_source)
            .then_with(|| a.uid.cmp(&b.uid)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::OriginalSource;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn event(uid: &str, summary: &str, start: DateTime<Utc>) -> CanonicalEvent {
        CanonicalEvent {
            uid: uid.to_string(),
            summary: summary.to_string(),
            start,
            end: None,
            location: None,
            description: None,
            source: "Test".to_string(),
            original_source: OriginalSource::SubscriptionFeed,
            assignees: BTreeSet::new(),
            category: None,
            inbox_only: false,
            is_lesson: false,
            created_by: None,
            created_at: None,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, h, m, 0).unwrap()
    }

    #[test]
    fn test_jittered_duplicates_merge() {
        let a = event("a", "Träning P10", at(18, 0));
        let b = event("b", "träning p10  ", at(18, 3));

        let outcome = merge(vec![a, b], DEFAULT_BUCKET_WIDTH);
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.decisions.len(), 1);
        assert_eq!(outcome.decisions[0].superseded.len(), 1);
    }

    #[test]
    fn test_events_in_different_buckets_stay_distinct() {
        let a = event("a", "Träning P10", at(18, 4));
        let b = event("b", "Träning P10", at(18, 10));

        let outcome = merge(vec![a, b], DEFAULT_BUCKET_WIDTH);
        assert_eq!(outcome.events.len(), 2);
        assert!(outcome.decisions.is_empty());
    }

    #[test]
    fn test_oldest_creation_time_wins() {
        let mut a = event("newer", "Cup", at(10, 0));
        a.created_at = Some(at(9, 0));
        let mut b = event("older", "Cup", at(10, 1));
        b.created_at = Some(at(8, 0));

        let outcome = merge(vec![a, b], DEFAULT_BUCKET_WIDTH);
        assert_eq!(outcome.events[0].uid, "older");
    }

    #[test]
    fn test_trust_breaks_ties_without_creation_time() {
        let mut a = event("feed-copy", "Match", at(10, 0));
        a.original_source = OriginalSource::SubscriptionFeed;
        let mut b = event("manual-copy", "Match", at(10, 1));
        b.original_source = OriginalSource::Manual;

        let outcome = merge(vec![a, b], DEFAULT_BUCKET_WIDTH);
        assert_eq!(outcome.events[0].uid, "manual-copy");
    }

    #[test]
    fn test_uid_breaks_remaining_ties() {
        let a = event("bbb", "Match", at(10, 0));
        let b = event("aaa", "Match", at(10, 1));

        let outcome = merge(vec![a, b], DEFAULT_BUCKET_WIDTH);
        assert_eq!(outcome.events[0].uid, "aaa");
    }

    #[test]
    fn test_merge_is_deterministic_under_input_order() {
        let events = vec![
            event("c", "Träning P10", at(18, 0)),
            event("a", "träning p10", at(18, 2)),
            event("b", "TRÄNING P10", at(18, 4)),
            event("d", "Annat", at(9, 0)),
        ];

        let forward = merge(events.clone(), DEFAULT_BUCKET_WIDTH);
        let mut reversed_input = events;
        reversed_input.reverse();
        let reversed = merge(reversed_input, DEFAULT_BUCKET_WIDTH);

        let forward_uids: Vec<_> = forward.events.iter().map(|e| &e.uid).collect();
        let reversed_uids: Vec<_> = reversed.events.iter().map(|e| &e.uid).collect();
        assert_eq!(forward_uids, reversed_uids);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let events = vec![
            event("a", "Träning P10", at(18, 0)),
            event("b", "träning p10", at(18, 3)),
            event("c", "Cupmatch", at(12, 0)),
        ];

        let first = merge(events, DEFAULT_BUCKET_WIDTH);
        let second = merge(first.events.clone(), DEFAULT_BUCKET_WIDTH);

        assert_eq!(first.events, second.events);
        assert!(second.decisions.is_empty());
    }
}
