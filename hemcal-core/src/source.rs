//! Calendar source configuration and raw source records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a source is fetched and parsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// A published ICS subscription feed.
    IcsFeed,
    /// A third-party calendar API returning JSON records.
    RemoteApi,
}

/// One configured external calendar source. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSource {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
    /// Events from this source never auto-enter the shared calendar.
    #[serde(default)]
    pub inbox_only: bool,
}

/// A source-specific record prior to normalization.
/// Discarded after canonicalization.
#[derive(Debug, Clone, Default)]
pub struct RawEvent {
    pub provider_uid: Option<String>,
    pub summary: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
}
