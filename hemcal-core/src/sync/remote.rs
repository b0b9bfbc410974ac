//! The remote calendar service boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HemcalResult;
use crate::event::CanonicalEvent;
use crate::range::DateRange;

/// One event as listed by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    /// When the remote copy was created, if the service reports it.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// Client for the external calendar service.
///
/// `update` and `delete` surface a gone remote copy as
/// [`HemcalError::RemoteNotFound`](crate::error::HemcalError::RemoteNotFound)
/// so the engine can apply 404/410 semantics; any other failure is a
/// [`Sync`](crate::error::HemcalError::Sync) error.
#[async_trait]
pub trait RemoteCalendar: Send + Sync {
    async fn list(&self, calendar_id: &str, range: &DateRange) -> HemcalResult<Vec<RemoteEvent>>;

    /// Create the remote copy; returns the remote event id.
    async fn create(&self, calendar_id: &str, event: &CanonicalEvent) -> HemcalResult<String>;

    async fn update(
        &self,
        calendar_id: &str,
        remote_event_id: &str,
        event: &CanonicalEvent,
    ) -> HemcalResult<()>;

    async fn delete(&self, calendar_id: &str, remote_event_id: &str) -> HemcalResult<()>;
}
