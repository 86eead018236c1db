//! Event sink: stamps engine violations and fans them out.
//!
//! Each [`EventSink::emit`] call:
//! - assigns a UUID v4 and a timestamp
//! - notifies local observers synchronously, in emission order
//! - publishes on the broadcast channel for live subscribers
//! - enqueues the event for the background store writer
//!
//! The writer appends events in order and never retries. A failed append is
//! logged as `event.persist_failed`; counters already advanced stay advanced.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{instrument, Instrument};
use uuid::Uuid;

use proctor_store::{EventStore, SessionId, StorageError, ViolationEvent};

use crate::debounce::Violation;
use crate::metrics::METRICS;
use crate::obs;

/// Local, synchronous consumer of emitted events (UI panel, audit log).
pub trait EventObserver: Send + Sync {
    fn on_violation(&self, event: &ViolationEvent);
}

/// Emitting half of the sink. Dropping every `EventSink` of a session lets
/// the writer drain its queue and exit.
pub struct EventSink {
    session_id: SessionId,
    queue: mpsc::UnboundedSender<ViolationEvent>,
    observers: Vec<Arc<dyn EventObserver>>,
    live: Option<broadcast::Sender<ViolationEvent>>,
}

impl EventSink {
    /// Create a sink for `session_id` and spawn its store writer.
    pub fn spawn(
        session_id: SessionId,
        store: Arc<dyn EventStore>,
        observers: Vec<Arc<dyn EventObserver>>,
    ) -> (Self, JoinHandle<()>) {
        let (queue, rx) = mpsc::unbounded_channel();
        let writer = spawn_writer(session_id.clone(), store, rx);
        let sink = Self {
            session_id,
            queue,
            observers,
            live: None,
        };
        (sink, writer)
    }

    /// Also publish every event on `live`. Lagging or absent receivers are
    /// not an error.
    pub fn with_broadcast(mut self, live: broadcast::Sender<ViolationEvent>) -> Self {
        self.live = Some(live);
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Stamp and dispatch one violation, returning the stamped event.
    pub fn emit(&self, violation: Violation) -> ViolationEvent {
        let event = ViolationEvent {
            id: Uuid::new_v4(),
            session_id: self.session_id.clone(),
            event_type: violation.event_type,
            details: violation.details,
            confidence: violation.confidence,
            timestamp: violation.observed_at.unwrap_or_else(Utc::now),
        };

        METRICS.inc_violations();
        obs::emit_violation(
            self.session_id.as_str(),
            event.event_type.as_str(),
            event.confidence,
            &event.details,
        );

        for observer in &self.observers {
            observer.on_violation(&event);
        }
        if let Some(live) = &self.live {
            let _ = live.send(event.clone());
        }

        if let Err(rejected) = self.queue.send(event.clone()) {
            METRICS.inc_persist_failures();
            obs::emit_persist_failure(
                self.session_id.as_str(),
                rejected.0.event_type.as_str(),
                &StorageError::Unreachable("store writer has shut down".into()),
            );
        }

        event
    }
}

/// Append queued events to `store` in order until every sender is dropped.
fn spawn_writer(
    session_id: SessionId,
    store: Arc<dyn EventStore>,
    rx: mpsc::UnboundedReceiver<ViolationEvent>,
) -> JoinHandle<()> {
    let span = obs::session_span(session_id.as_str());
    tokio::spawn(drain(store, rx).instrument(span))
}

#[instrument(skip_all, name = "event_writer", level = "debug")]
async fn drain(store: Arc<dyn EventStore>, mut rx: mpsc::UnboundedReceiver<ViolationEvent>) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = store.append_event(&event).await {
            METRICS.inc_persist_failures();
            obs::emit_persist_failure(event.session_id.as_str(), event.event_type.as_str(), &e);
        }
    }
}
