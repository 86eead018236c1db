//! Error taxonomy for the monitoring core.

use proctor_store::{SessionId, StorageError};

use crate::session::SessionPhase;

/// Failures of a single perception query. Always tick-scoped: the sampler
/// logs them and moves on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectorError {
    #[error("{detector} detector is not ready")]
    NotReady { detector: &'static str },

    #[error("{detector} detection failed: {reason}")]
    Failed {
        detector: &'static str,
        reason: String,
    },

    #[error("{detector} detection timed out after {timeout_ms} ms")]
    TimedOut {
        detector: &'static str,
        timeout_ms: u64,
    },
}

/// Errors surfaced to callers of the session controller.
#[derive(Debug, thiserror::Error)]
pub enum ProctorError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("perception models not ready (faces: {faces_ready}, objects: {objects_ready})")]
    ModelsNotReady {
        faces_ready: bool,
        objects_ready: bool,
    },

    #[error("session {0} has already ended")]
    SessionAlreadyEnded(SessionId),

    #[error("cannot {action} a session that is {phase}")]
    InvalidTransition {
        phase: SessionPhase,
        action: &'static str,
    },

    #[error("session {session_id} ended locally but the store did not confirm: {source}")]
    SessionFinalizationFailed {
        session_id: SessionId,
        #[source]
        source: StorageError,
    },

    #[error("invalid trace line {line}: {source}")]
    InvalidTrace {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, ProctorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_not_ready_reports_both_detectors() {
        let err = ProctorError::ModelsNotReady {
            faces_ready: true,
            objects_ready: false,
        };
        let msg = err.to_string();
        assert!(msg.contains("faces: true"));
        assert!(msg.contains("objects: false"));
    }

    #[test]
    fn invalid_transition_names_phase_and_action() {
        let err = ProctorError::InvalidTransition {
            phase: SessionPhase::Ended,
            action: "start",
        };
        assert_eq!(err.to_string(), "cannot start a session that is ended");
    }

    #[test]
    fn finalization_failure_keeps_storage_source() {
        let err = ProctorError::SessionFinalizationFailed {
            session_id: SessionId::from("s-9"),
            source: StorageError::Unreachable("connection refused".into()),
        };
        assert!(err.to_string().contains("s-9"));
        assert!(err.to_string().contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn detector_timeout_display() {
        let err = DetectorError::TimedOut {
            detector: "face",
            timeout_ms: 1000,
        };
        assert_eq!(err.to_string(), "face detection timed out after 1000 ms");
    }
}
