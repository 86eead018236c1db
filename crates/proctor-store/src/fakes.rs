//! In-memory fakes for storage traits (testing only)
//!
//! `MemorySessionStore` and `MemoryEventStore` satisfy the trait contracts
//! without a backend. Both can be switched into an "unreachable" mode to
//! exercise failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::schema::*;
use crate::storage_traits::*;

fn unreachable() -> StorageError {
    StorageError::Unreachable("in-memory store switched offline".to_string())
}

// ---------------------------------------------------------------------------
// MemorySessionStore
// ---------------------------------------------------------------------------

/// In-memory session store backed by a `HashMap<SessionId, SessionRecord>`.
///
/// Does not compute integrity scores; ended sessions keep the default score.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionId, SessionRecord>>,
    offline: AtomicBool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StorageError::Unreachable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, new: NewSession) -> StorageResult<SessionRecord> {
        self.check_online()?;
        let record = SessionRecord {
            id: SessionId::generate(),
            candidate_name: new.candidate_name,
            interviewer_name: new.interviewer_name,
            start_time: Utc::now(),
            end_time: None,
            status: SessionStatus::Active,
            total_events: 0,
            integrity_score: 100.0,
        };
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_session(&self, id: &SessionId) -> StorageResult<SessionRecord> {
        self.check_online()?;
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: id.to_string(),
            })
    }

    async fn list_sessions(&self) -> StorageResult<Vec<SessionRecord>> {
        self.check_online()?;
        let sessions = self.sessions.lock().unwrap();
        let mut records: Vec<SessionRecord> = sessions.values().cloned().collect();
        records.sort_by_key(|r| r.start_time);
        Ok(records)
    }

    async fn end_session(&self, id: &SessionId) -> StorageResult<SessionEndReceipt> {
        self.check_online()?;
        let mut sessions = self.sessions.lock().unwrap();
        let record = sessions
            .get_mut(id)
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: id.to_string(),
            })?;
        if !record.is_open() {
            return Err(StorageError::SessionClosed {
                session_id: id.to_string(),
                status: record.status.to_string(),
            });
        }
        record.status = SessionStatus::Completed;
        record.end_time = Some(Utc::now());
        Ok(SessionEndReceipt {
            message: "Session ended successfully".to_string(),
            integrity_score: record.integrity_score,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryEventStore
// ---------------------------------------------------------------------------

/// In-memory event log backed by a `HashMap<SessionId, Vec<ViolationEvent>>`.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: Mutex<HashMap<SessionId, Vec<ViolationEvent>>>,
    offline: AtomicBool,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StorageError::Unreachable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Total events across all sessions.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append_event(&self, event: &ViolationEvent) -> StorageResult<ViolationEvent> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        let mut events = self.events.lock().unwrap();
        events
            .entry(event.session_id.clone())
            .or_default()
            .push(event.clone());
        Ok(event.clone())
    }

    async fn list_events(&self, session_id: &SessionId) -> StorageResult<Vec<ViolationEvent>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        let events = self.events.lock().unwrap();
        Ok(events.get(session_id).cloned().unwrap_or_default())
    }
}
