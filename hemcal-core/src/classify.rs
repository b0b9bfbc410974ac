//! Event classification and the approval state machine.
//!
//! Events from inbox-only sources wait in the inbox for a manual decision
//! before they reach the shared calendar. Keyword rules are configuration,
//! not code: a household tunes them to its own languages and sports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{CanonicalEvent, normalize_summary};

/// Approval workflow state of a persisted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalState {
    /// Awaiting a manual decision in the inbox.
    Pending,
    /// Included in the shared calendar, not yet pushed remotely.
    Approved,
    /// Pushed to the remote service; a sync mapping exists.
    Synced,
    /// Excluded; retained as a tombstone so it is not re-offered.
    Rejected,
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalState::Pending => write!(f, "pending"),
            ApprovalState::Approved => write!(f, "approved"),
            ApprovalState::Synced => write!(f, "synced"),
            ApprovalState::Rejected => write!(f, "rejected"),
        }
    }
}

impl ApprovalState {
    /// Legal transitions. Manual decisions move Pending out of the inbox;
    /// restore moves a tombstoned or synced event back; only the sync
    /// engine moves Approved to Synced.
    pub fn can_transition_to(self, next: ApprovalState) -> bool {
        use ApprovalState::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Synced)
                | (Synced, Pending)
                | (Synced, Approved)
                | (Rejected, Pending)
                | (Rejected, Approved)
        )
    }
}

/// Keyword rule table mapping summary matches to classifier outcomes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierRules {
    /// Recurring training/lesson keywords: low-risk, high-volume events that
    /// auto-approve even from inbox-only sources.
    #[serde(default)]
    pub training_keywords: Vec<String>,
    /// Notable-event keywords (tournament, match, final): always require a
    /// manual decision when the source is inbox-only.
    #[serde(default)]
    pub notable_keywords: Vec<String>,
}

impl ClassifierRules {
    pub fn is_training(&self, summary: &str) -> bool {
        Self::matches(&self.training_keywords, summary)
    }

    pub fn is_notable(&self, summary: &str) -> bool {
        Self::matches(&self.notable_keywords, summary)
    }

    fn matches(keywords: &[String], summary: &str) -> bool {
        let normalized = normalize_summary(summary);
        keywords
            .iter()
            .any(|k| !k.is_empty() && normalized.contains(&normalize_summary(k)))
    }
}

/// Decide the initial state of a freshly canonicalized event, setting
/// `is_lesson` when a training rule fires. Notable keywords outrank
/// training keywords.
pub fn classify(event: &mut CanonicalEvent, rules: &ClassifierRules) -> ApprovalState {
    if !event.inbox_only {
        return ApprovalState::Approved;
    }

    if rules.is_notable(&event.summary) {
        return ApprovalState::Pending;
    }

    if rules.is_training(&event.summary) {
        event.is_lesson = true;
        return ApprovalState::Approved;
    }

    ApprovalState::Pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::OriginalSource;
    use chrono::{TimeZone, Utc};

    fn rules() -> ClassifierRules {
        ClassifierRules {
            training_keywords: vec!["träning".to_string(), "lesson".to_string()],
            notable_keywords: vec![
                "cup".to_string(),
                "turnering".to_string(),
                "match".to_string(),
                "final".to_string(),
            ],
        }
    }

    fn inbox_event(summary: &str) -> CanonicalEvent {
        CanonicalEvent {
            uid: "e1".to_string(),
            summary: summary.to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 20, 18, 0, 0).unwrap(),
            end: None,
            location: None,
            description: None,
            source: "Laget".to_string(),
            original_source: OriginalSource::SubscriptionFeed,
            assignees: Default::default(),
            category: None,
            inbox_only: true,
            is_lesson: false,
            created_by: None,
            created_at: None,
        }
    }

    #[test]
    fn test_trusted_source_auto_approves() {
        let mut event = inbox_event("Anything at all");
        event.inbox_only = false;
        assert_eq!(classify(&mut event, &rules()), ApprovalState::Approved);
        assert!(!event.is_lesson);
    }

    #[test]
    fn test_training_keyword_auto_approves_inbox_event() {
        let mut event = inbox_event("Träning P10");
        assert_eq!(classify(&mut event, &rules()), ApprovalState::Approved);
        assert!(event.is_lesson);
    }

    #[test]
    fn test_notable_keyword_stays_pending() {
        let mut event = inbox_event("Vårcupen 2025");
        assert_eq!(classify(&mut event, &rules()), ApprovalState::Pending);
        assert!(!event.is_lesson);
    }

    #[test]
    fn test_notable_outranks_training() {
        let mut event = inbox_event("Träning inför cupen");
        assert_eq!(classify(&mut event, &rules()), ApprovalState::Pending);
    }

    #[test]
    fn test_unmatched_inbox_event_stays_pending() {
        let mut event = inbox_event("Föräldramöte");
        assert_eq!(classify(&mut event, &rules()), ApprovalState::Pending);
    }

    #[test]
    fn test_transition_table() {
        use ApprovalState::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Synced));
        assert!(Rejected.can_transition_to(Pending));
        assert!(Synced.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Synced));
        assert!(!Rejected.can_transition_to(Synced));
        assert!(!Approved.can_transition_to(Pending));
    }
}
