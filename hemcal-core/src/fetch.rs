//! Source adapters and the concurrent aggregation fetch.
//!
//! One task per configured source; a slow or failing source never blocks or
//! poisons the others. The pass always returns the union of whatever sources
//! succeeded, plus a per-source status report.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{HemcalError, HemcalResult};
use crate::ics;
use crate::source::{CalendarSource, RawEvent, SourceKind};

/// Default per-source fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw records fetched from one source, plus the count of records the
/// adapter had to skip.
#[derive(Debug, Default)]
pub struct FeedBatch {
    pub raw: Vec<RawEvent>,
    pub skipped: usize,
}

/// Per-source outcome of an aggregation fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched { events: usize, skipped: usize },
    Failed { error: String },
}

/// Status report for one source in an aggregation pass.
#[derive(Debug)]
pub struct SourceReport {
    pub source_id: String,
    pub source_name: String,
    pub outcome: FetchOutcome,
}

/// A record as returned by the third-party calendar API.
#[derive(Debug, Deserialize)]
struct ApiRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    start: Option<DateTime<Utc>>,
    #[serde(default)]
    end: Option<DateTime<Utc>>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl From<ApiRecord> for RawEvent {
    fn from(record: ApiRecord) -> Self {
        RawEvent {
            provider_uid: record.id,
            summary: record.title,
            start: record.start,
            end: record.end,
            location: record.location,
            description: record.notes,
        }
    }
}

/// Fetch and parse one source. Failures are scoped to this source only.
pub async fn fetch_source(
    http: &reqwest::Client,
    source: &CalendarSource,
    fetch_timeout: Duration,
) -> HemcalResult<FeedBatch> {
    let request = http.get(&source.url).send();

    let resp = timeout(fetch_timeout, request)
        .await
        .map_err(|_| {
            HemcalError::SourceFetch(format!(
                "'{}' timed out after {}s",
                source.id,
                fetch_timeout.as_secs()
            ))
        })?
        .map_err(|e| HemcalError::SourceFetch(format!("'{}': {e}", source.id)))?;

    if !resp.status().is_success() {
        return Err(HemcalError::SourceFetch(format!(
            "'{}' returned {}",
            source.id,
            resp.status()
        )));
    }

    match source.kind {
        SourceKind::IcsFeed => {
            let body = timeout(fetch_timeout, resp.text())
                .await
                .map_err(|_| {
                    HemcalError::SourceFetch(format!("'{}' timed out reading body", source.id))
                })?
                .map_err(|e| HemcalError::SourceFetch(format!("'{}': {e}", source.id)))?;

            let parse = ics::parse_feed(&body);
            debug!(
                source = %source.id,
                events = parse.events.len(),
                skipped = parse.skipped,
                "parsed ICS feed"
            );
            Ok(FeedBatch {
                raw: parse.events,
                skipped: parse.skipped,
            })
        }
        SourceKind::RemoteApi => {
            let records: Vec<serde_json::Value> = timeout(fetch_timeout, resp.json())
                .await
                .map_err(|_| {
                    HemcalError::SourceFetch(format!("'{}' timed out reading body", source.id))
                })?
                .map_err(|e| HemcalError::SourceFetch(format!("'{}': {e}", source.id)))?;

            // One bad record is skipped, not the whole listing.
            let mut batch = FeedBatch::default();
            for value in records {
                match serde_json::from_value::<ApiRecord>(value) {
                    Ok(record) => batch.raw.push(record.into()),
                    Err(e) => {
                        warn!(source = %source.id, "skipping malformed API record: {e}");
                        batch.skipped += 1;
                    }
                }
            }
            Ok(batch)
        }
    }
}

/// Fetch every source concurrently. Each entry pairs the source with its own
/// result; errors are carried, never propagated across sources.
pub async fn fetch_all(
    sources: &[CalendarSource],
    fetch_timeout: Duration,
) -> Vec<(CalendarSource, HemcalResult<FeedBatch>)> {
    let http = reqwest::Client::new();

    let tasks = sources.iter().cloned().map(|source| {
        let http = http.clone();
        tokio::spawn(async move {
            let result = fetch_source(&http, &source, fetch_timeout).await;
            (source, result)
        })
    });

    join_all(tasks)
        .await
        .into_iter()
        .filter_map(|joined| joined.ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_record_maps_to_raw_event() {
        let json = serde_json::json!({
            "id": "api-1",
            "title": "Simskola",
            "start": "2025-03-20T16:00:00Z",
            "location": "Badhuset"
        });

        let record: ApiRecord = serde_json::from_value(json).unwrap();
        let raw = RawEvent::from(record);

        assert_eq!(raw.provider_uid.as_deref(), Some("api-1"));
        assert_eq!(raw.summary.as_deref(), Some("Simskola"));
        assert!(raw.start.is_some());
        assert!(raw.end.is_none());
        assert_eq!(raw.location.as_deref(), Some("Badhuset"));
    }

    #[test]
    fn test_api_record_tolerates_missing_fields() {
        let record: ApiRecord = serde_json::from_value(serde_json::json!({})).unwrap();
        let raw = RawEvent::from(record);
        assert!(raw.provider_uid.is_none());
        assert!(raw.start.is_none());
    }
}
