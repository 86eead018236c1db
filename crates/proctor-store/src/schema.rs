//! Record types exchanged with the reporting backend.
//!
//! Field names follow the backend's snake_case JSON so records decode
//! directly from REST responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an interview session, assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh random id (used by the in-memory store).
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend-side status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Interrupted,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// An interview session as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub candidate_name: String,
    pub interviewer_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    #[serde(default)]
    pub total_events: u64,
    /// Computed by the backend when the session ends.
    #[serde(default = "default_integrity_score")]
    pub integrity_score: f64,
}

fn default_integrity_score() -> f64 {
    100.0
}

impl SessionRecord {
    /// Whether the session can still be recorded.
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Active && self.end_time.is_none()
    }
}

/// Payload for creating a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub candidate_name: String,
    pub interviewer_name: String,
}

impl NewSession {
    pub fn new(candidate_name: impl Into<String>, interviewer_name: impl Into<String>) -> Self {
        Self {
            candidate_name: candidate_name.into(),
            interviewer_name: interviewer_name.into(),
        }
    }
}

/// Response to ending a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEndReceipt {
    #[serde(default)]
    pub message: String,
    pub integrity_score: f64,
}

/// Kind of integrity violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    FocusLost,
    NoFace,
    MultipleFaces,
    ObjectDetected,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::FocusLost,
        EventType::NoFace,
        EventType::MultipleFaces,
        EventType::ObjectDetected,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::FocusLost => "focus_lost",
            EventType::NoFace => "no_face",
            EventType::MultipleFaces => "multiple_faces",
            EventType::ObjectDetected => "object_detected",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single integrity violation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEvent {
    pub id: Uuid,
    pub session_id: SessionId,
    pub event_type: EventType,
    pub details: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /events`; the backend assigns its own id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSubmission {
    pub session_id: SessionId,
    pub event_type: EventType,
    pub details: String,
    pub confidence: f64,
}

impl From<&ViolationEvent> for EventSubmission {
    fn from(event: &ViolationEvent) -> Self {
        Self {
            session_id: event.session_id.clone(),
            event_type: event.event_type,
            details: event.details.clone(),
            confidence: event.confidence,
        }
    }
}

/// One row of a report timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub details: String,
}

/// Summary statistics computed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_events: u64,
    pub focus_lost_count: u64,
    pub no_face_count: u64,
    pub multiple_faces_count: u64,
    pub object_detected_count: u64,
    #[serde(default)]
    pub detected_objects: Vec<String>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

impl ReportSummary {
    pub fn count_for(&self, event_type: EventType) -> u64 {
        match event_type {
            EventType::FocusLost => self.focus_lost_count,
            EventType::NoFace => self.no_face_count,
            EventType::MultipleFaces => self.multiple_faces_count,
            EventType::ObjectDetected => self.object_detected_count,
        }
    }
}

/// Full report for a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session: SessionRecord,
    pub events: Vec<ViolationEvent>,
    pub summary: ReportSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_record_decodes_backend_payload() {
        let payload = json!({
            "id": "0f8e2c43-5c1e-4a39-9d5e-3f0f1c2b7a10",
            "candidate_name": "Ada",
            "interviewer_name": "Grace",
            "start_time": "2024-05-01T10:00:00.123456+00:00",
            "end_time": null,
            "status": "active",
            "total_events": 0,
            "integrity_score": 100.0
        });
        let record: SessionRecord = serde_json::from_value(payload).expect("decode");
        assert_eq!(record.id.as_str(), "0f8e2c43-5c1e-4a39-9d5e-3f0f1c2b7a10");
        assert_eq!(record.status, SessionStatus::Active);
        assert!(record.is_open());
    }

    #[test]
    fn completed_session_is_not_open() {
        let payload = json!({
            "id": "s-1",
            "candidate_name": "Ada",
            "interviewer_name": "Grace",
            "start_time": "2024-05-01T10:00:00Z",
            "end_time": "2024-05-01T10:30:00Z",
            "status": "completed"
        });
        let record: SessionRecord = serde_json::from_value(payload).expect("decode");
        assert!(!record.is_open());
        assert_eq!(record.integrity_score, 100.0);
        assert_eq!(record.total_events, 0);
    }

    #[test]
    fn event_type_wire_names_match_serde() {
        for event_type in EventType::ALL {
            let json = serde_json::to_value(event_type).expect("serialize");
            assert_eq!(json, json!(event_type.as_str()));
        }
    }

    #[test]
    fn report_decodes_timeline_type_field() {
        let payload = json!({
            "total_events": 1,
            "focus_lost_count": 0,
            "no_face_count": 1,
            "multiple_faces_count": 0,
            "object_detected_count": 0,
            "detected_objects": [],
            "timeline": [
                {"time": "2024-05-01T10:00:10Z", "type": "no_face", "details": "No face detected for more than 10 seconds"}
            ]
        });
        let summary: ReportSummary = serde_json::from_value(payload).expect("decode");
        assert_eq!(summary.timeline.len(), 1);
        assert_eq!(summary.timeline[0].event_type, EventType::NoFace);
        assert_eq!(summary.count_for(EventType::NoFace), 1);
    }
}
