//! The canonical event model.
//!
//! Every source record is normalized into a `CanonicalEvent` before the rest
//! of the system sees it. Dedup, classification, sync and layout all work
//! exclusively with these types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Machine provenance tag, used by reconciliation logic.
///
/// Variant order is trust order: a manually created event outranks one from
/// the remote API, which outranks a subscription feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginalSource {
    Manual,
    RemoteApi,
    SubscriptionFeed,
}

/// A normalized, deduplicated calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Stable identifier, unique across the whole event set.
    pub uid: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    /// Absent for point events.
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,

    /// Human-readable provenance label (the source's display name).
    pub source: String,
    pub original_source: OriginalSource,

    /// Household members this event concerns.
    #[serde(default)]
    pub assignees: BTreeSet<String>,
    /// Free-text classification, e.g. "sport" or "school".
    pub category: Option<String>,

    /// Inherited from the originating source at canonicalization; flipped
    /// only by a manual override that also sets `created_by`.
    #[serde(default)]
    pub inbox_only: bool,
    /// True when classified as a recurring lesson/training rather than a
    /// notable event.
    #[serde(default)]
    pub is_lesson: bool,

    /// Provenance of manual edits; exempts the event from automated
    /// content refreshes.
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Comparison form of a summary: lowercased, trimmed, internal whitespace
/// collapsed. Never used for display.
pub fn normalize_summary(summary: &str) -> String {
    summary
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Deterministic uid for records whose source provides none.
/// The same summary and start always derive the same uid, so refetches of
/// the same feed record resolve to one event.
pub fn derive_uid(summary: &str, start: &DateTime<Utc>) -> String {
    format!(
        "{}-{}",
        slug::slugify(summary),
        start.format("%Y%m%dT%H%M%S")
    )
}
