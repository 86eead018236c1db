//! Storage trait definitions for Proctor
//!
//! - `SessionStore`: interview session lifecycle (create, fetch, end)
//! - `EventStore`: append-only violation event log per session
//!
//! Both traits are async and backend-agnostic. `RestBackend` implements them
//! against the reporting service; in-memory fakes live in the `fakes` module.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::{NewSession, SessionEndReceipt, SessionId, SessionRecord, ViolationEvent};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Interview session store.
///
/// Guarantees:
/// - `get_session` returns `StorageError::SessionNotFound` for unknown ids.
/// - A session transitions active → completed exactly once; `end_session`
///   on an ended session fails with `StorageError::SessionClosed`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new active session.
    async fn create_session(&self, new: NewSession) -> StorageResult<SessionRecord>;

    /// Fetch a session by id.
    async fn get_session(&self, id: &SessionId) -> StorageResult<SessionRecord>;

    /// List all sessions known to the store.
    async fn list_sessions(&self) -> StorageResult<Vec<SessionRecord>>;

    /// Mark a session as ended, stamping its end time.
    async fn end_session(&self, id: &SessionId) -> StorageResult<SessionEndReceipt>;
}

/// Append-only violation event log.
///
/// Guarantees:
/// - Events are returned in append order.
/// - Stored events are never edited or removed.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append an event, returning the stored copy (the backend may assign
    /// its own id and timestamp).
    async fn append_event(&self, event: &ViolationEvent) -> StorageResult<ViolationEvent>;

    /// All events recorded for a session, oldest first.
    async fn list_events(&self, session_id: &SessionId) -> StorageResult<Vec<ViolationEvent>>;
}
