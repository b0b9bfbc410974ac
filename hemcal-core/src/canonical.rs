//! Canonicalization of raw source records.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{HemcalError, HemcalResult};
use crate::event::{CanonicalEvent, OriginalSource, derive_uid};
use crate::source::{CalendarSource, RawEvent, SourceKind};

const UNTITLED: &str = "(No title)";

/// Map one raw record into the canonical model.
///
/// Records without a usable start are unusable: they cannot be fingerprinted
/// or placed on the timeline. All other missing fields default.
pub fn canonicalize(
    raw: RawEvent,
    source: &CalendarSource,
    now: DateTime<Utc>,
) -> HemcalResult<CanonicalEvent> {
    let Some(start) = raw.start else {
        return Err(HemcalError::DataIntegrity(format!(
            "record from '{}' has no usable start time (uid: {:?})",
            source.id, raw.provider_uid
        )));
    };

    if let Some(end) = raw.end
        && end < start
    {
        return Err(HemcalError::DataIntegrity(format!(
            "record from '{}' ends before it starts (uid: {:?})",
            source.id, raw.provider_uid
        )));
    }

    let summary = raw
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let uid = raw
        .provider_uid
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| derive_uid(&summary, &start));

    let original_source = match source.kind {
        SourceKind::IcsFeed => OriginalSource::SubscriptionFeed,
        SourceKind::RemoteApi => OriginalSource::RemoteApi,
    };

    Ok(CanonicalEvent {
        uid,
        summary,
        start,
        end: raw.end,
        location: raw.location.filter(|s| !s.trim().is_empty()),
        description: raw.description.filter(|s| !s.trim().is_empty()),
        source: source.name.clone(),
        original_source,
        assignees: Default::default(),
        category: None,
        inbox_only: source.inbox_only,
        is_lesson: false,
        created_by: None,
        created_at: Some(now),
    })
}

/// Canonicalize a whole batch, dropping unusable records with a diagnostic.
/// Returns the surviving events and the number of drops.
pub fn canonicalize_batch(
    raw: Vec<RawEvent>,
    source: &CalendarSource,
    now: DateTime<Utc>,
) -> (Vec<CanonicalEvent>, usize) {
    let mut events = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for record in raw {
        match canonicalize(record, source, now) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(source = %source.id, "dropping record: {e}");
                dropped += 1;
            }
        }
    }

    (events, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn feed_source(inbox_only: bool) -> CalendarSource {
        CalendarSource {
            id: "laget".to_string(),
            name: "Lagets kalender".to_string(),
            kind: SourceKind::IcsFeed,
            url: "https://example.com/feed.ics".to_string(),
            inbox_only,
        }
    }

    fn raw(summary: &str) -> RawEvent {
        RawEvent {
            provider_uid: Some("uid-1".to_string()),
            summary: Some(summary.to_string()),
            start: Some(Utc.with_ymd_and_hms(2025, 3, 20, 18, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_canonicalize_preserves_display_casing() {
        let event = canonicalize(raw("  Träning P10 "), &feed_source(true), Utc::now()).unwrap();
        assert_eq!(event.summary, "Träning P10");
        assert!(event.inbox_only);
        assert_eq!(event.original_source, OriginalSource::SubscriptionFeed);
    }

    #[test]
    fn test_canonicalize_derives_uid_when_missing() {
        let mut record = raw("Träning P10");
        record.provider_uid = None;
        let event = canonicalize(record, &feed_source(false), Utc::now()).unwrap();
        assert_eq!(event.uid, "traning-p10-20250320T180000");
    }

    #[test]
    fn test_canonicalize_drops_record_without_start() {
        let record = RawEvent {
            summary: Some("Floating".to_string()),
            ..Default::default()
        };
        let err = canonicalize(record, &feed_source(false), Utc::now()).unwrap_err();
        assert!(matches!(err, HemcalError::DataIntegrity(_)));
    }

    #[test]
    fn test_canonicalize_drops_record_ending_before_start() {
        let mut record = raw("Backwards");
        record.end = Some(Utc.with_ymd_and_hms(2025, 3, 20, 17, 0, 0).unwrap());
        let err = canonicalize(record, &feed_source(false), Utc::now()).unwrap_err();
        assert!(matches!(err, HemcalError::DataIntegrity(_)));
    }

    #[test]
    fn test_canonicalize_batch_counts_drops() {
        let records = vec![
            raw("Ok"),
            RawEvent::default(),
            RawEvent {
                provider_uid: Some("only-uid".to_string()),
                ..Default::default()
            },
        ];
        let (events, dropped) = canonicalize_batch(records, &feed_source(false), Utc::now());
        assert_eq!(events.len(), 1);
        assert_eq!(dropped, 2);
    }
}
