//! Proctor-Store: session and violation-event persistence
//!
//! The reporting backend owns durable storage, integrity scoring and report
//! summaries. This crate defines the seams the monitoring core writes through
//! and the records that cross them.
//!
//! ## Layer 0 - Persistence
//!
//! - `SessionStore` / `EventStore`: async storage traits
//! - `RestBackend`: HTTP implementation against the reporting service
//! - `fakes`: in-memory implementations for tests and offline replay

mod error;
pub mod fakes;
pub mod rest;
mod schema;
pub mod storage_traits;

pub use error::StorageError;
pub use rest::{BackendConfig, RestBackend};
pub use schema::{
    EventSubmission, EventType, NewSession, ReportSummary, SessionEndReceipt, SessionId,
    SessionRecord, SessionReport, SessionStatus, TimelineEntry, ViolationEvent,
};
pub use storage_traits::{EventStore, SessionStore, StorageResult};
