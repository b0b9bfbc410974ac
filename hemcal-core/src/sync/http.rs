//! HTTP client for the remote calendar service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{HemcalError, HemcalResult};
use crate::event::CanonicalEvent;
use crate::range::DateRange;
use crate::sync::remote::{RemoteCalendar, RemoteEvent};

/// Reqwest-backed implementation of [`RemoteCalendar`] against the service's
/// REST surface.
pub struct HttpRemoteCalendar {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct EventPayload<'a> {
    summary: &'a str,
    start: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> From<&'a CanonicalEvent> for EventPayload<'a> {
    fn from(event: &'a CanonicalEvent) -> Self {
        EventPayload {
            summary: &event.summary,
            start: event.start,
            end: event.end,
            location: event.location.as_deref(),
            description: event.description.as_deref(),
        }
    }
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Deserialize)]
struct ListResponse {
    events: Vec<RemoteEvent>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl HttpRemoteCalendar {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpRemoteCalendar {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.base_url, calendar_id)
    }

    /// Map a non-success response to the error taxonomy: 404/410 carry
    /// not-found semantics, everything else is a sync error.
    async fn check(resp: reqwest::Response) -> HemcalResult<reqwest::Response> {
        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(HemcalError::RemoteNotFound),
            status => {
                let message = match resp.json::<ErrorResponse>().await {
                    Ok(body) => body.error,
                    Err(_) => format!("remote service returned {status}"),
                };
                Err(HemcalError::Sync(message))
            }
        }
    }
}

#[async_trait]
impl RemoteCalendar for HttpRemoteCalendar {
    async fn list(&self, calendar_id: &str, range: &DateRange) -> HemcalResult<Vec<RemoteEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(self.events_url(calendar_id)).query(&[
                ("from", range.from_rfc3339()),
                ("to", range.to_rfc3339()),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("page_token", token)]);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| HemcalError::Sync(e.to_string()))?;
            let page: ListResponse = Self::check(resp)
                .await?
                .json()
                .await
                .map_err(|e| HemcalError::Sync(e.to_string()))?;

            events.extend(page.events);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(events)
    }

    async fn create(&self, calendar_id: &str, event: &CanonicalEvent) -> HemcalResult<String> {
        let resp = self
            .http
            .post(self.events_url(calendar_id))
            .json(&EventPayload::from(event))
            .send()
            .await
            .map_err(|e| HemcalError::Sync(e.to_string()))?;

        let created: CreatedResponse = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| HemcalError::Sync(e.to_string()))?;
        Ok(created.id)
    }

    async fn update(
        &self,
        calendar_id: &str,
        remote_event_id: &str,
        event: &CanonicalEvent,
    ) -> HemcalResult<()> {
        let resp = self
            .http
            .put(format!("{}/{}", self.events_url(calendar_id), remote_event_id))
            .json(&EventPayload::from(event))
            .send()
            .await
            .map_err(|e| HemcalError::Sync(e.to_string()))?;

        Self::check(resp).await?;
        Ok(())
    }

    async fn delete(&self, calendar_id: &str, remote_event_id: &str) -> HemcalResult<()> {
        let resp = self
            .http
            .delete(format!("{}/{}", self.events_url(calendar_id), remote_event_id))
            .send()
            .await
            .map_err(|e| HemcalError::Sync(e.to_string()))?;

        Self::check(resp).await?;
        Ok(())
    }
}
