//! Idempotent reconciliation with the remote calendar service.

mod engine;
mod http;
mod mapping;
mod remote;

pub use engine::{DEFAULT_PACE, ReconcileReport, SyncAction, SyncEngine, SyncReport};
pub use http::HttpRemoteCalendar;
pub use mapping::{MappingTable, SyncMapping};
pub use remote::{RemoteCalendar, RemoteEvent};
