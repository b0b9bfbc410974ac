//! Aggregation and reconciliation core for the hemcal household calendar.
//!
//! Events from heterogeneous sources (ICS subscription feeds, a third-party
//! calendar API, locally created events) are normalized into one canonical
//! model, deduplicated, classified through an inbox/approval workflow, and
//! kept in sync with an external calendar service:
//! - `fetch` + `ics` fetch and parse one source per task
//! - `canonical` maps raw records into `CanonicalEvent`
//! - `dedup` collapses near-identical events across sources
//! - `classify` + `store` run the approval state machine over the persisted set
//! - `sync` maintains the idempotent local ↔ remote mapping
//! - `week` lays events out on the 7-column week grid

pub mod aggregate;
pub mod canonical;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod event;
pub mod fetch;
pub mod ics;
pub mod range;
pub mod source;
pub mod store;
pub mod sync;
pub mod week;

pub use classify::{ApprovalState, ClassifierRules};
pub use error::{HemcalError, HemcalResult};
pub use event::{CanonicalEvent, OriginalSource};
pub use source::{CalendarSource, RawEvent, SourceKind};
