//! Structured observability hooks for the session lifecycle.
//!
//! Named emission helpers keep event names (`session.started`,
//! `violation.emitted`, ...) consistent across call sites so log pipelines
//! can filter on the `event` field.

use proctor_store::StorageError;
use tracing::{debug, info, warn};

/// RAII guard that enters a session-scoped span.
///
/// ```ignore
/// let _span = SessionSpan::enter("session-123");
/// // everything logged here carries session_id = "session-123"
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    pub fn enter(session_id: &str) -> Self {
        Self {
            _span: session_span(session_id).entered(),
        }
    }
}

/// Session span for instrumenting spawned tasks, where an entered guard
/// cannot be held across `.await`.
pub fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("proctor.session", session_id = %session_id)
}

pub fn emit_session_started(session_id: &str, candidate: &str) {
    info!(event = "session.started", session_id = %session_id, candidate = %candidate);
}

pub fn emit_session_ended(session_id: &str, elapsed_seconds: u64, total_violations: u64) {
    info!(
        event = "session.ended",
        session_id = %session_id,
        elapsed_seconds = elapsed_seconds,
        total_violations = total_violations,
    );
}

pub fn emit_violation(session_id: &str, event_type: &str, confidence: f64, details: &str) {
    info!(
        event = "violation.emitted",
        session_id = %session_id,
        event_type = %event_type,
        confidence = confidence,
        details = %details,
    );
}

/// A detector failed or timed out; the tick (or half of it) was dropped.
pub fn emit_detector_failure(detector: &str, error: &dyn std::fmt::Display) {
    debug!(event = "detector.failed", detector = %detector, error = %error);
}

pub fn emit_tick_skipped(session_id: &str, reason: &str) {
    debug!(event = "tick.skipped", session_id = %session_id, reason = %reason);
}

pub fn emit_persist_failure(session_id: &str, event_type: &str, error: &StorageError) {
    warn!(
        event = "event.persist_failed",
        session_id = %session_id,
        event_type = %event_type,
        transient = error.is_transient(),
        error = %error,
    );
}

pub fn emit_finalize_error(session_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "session.finalize_error", session_id = %session_id, error = %error);
}
