//! Per-session runtime state.
//!
//! `SessionRuntimeState` is the single serialization point for a recording:
//! the detection loop and the session clock both mutate it under one lock,
//! and observers only ever see `SessionSnapshot` copies.

use serde::{Deserialize, Serialize};

use proctor_store::{EventType, SessionId};

use crate::config::ProctorConfig;
use crate::debounce::{ConditionState, ConditionType, DebounceEngine, Violation};
use crate::domain::DetectedObject;
use crate::evaluator::RawConditions;

/// Lifecycle phase of a monitored session. One way only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    Recording,
    Ended,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPhase::NotStarted => "not started",
            SessionPhase::Recording => "recording",
            SessionPhase::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Occurrences per event type. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub focus_lost: u64,
    pub no_face: u64,
    pub multiple_faces: u64,
    pub object_detected: u64,
}

impl Counters {
    pub fn get(&self, event_type: EventType) -> u64 {
        match event_type {
            EventType::FocusLost => self.focus_lost,
            EventType::NoFace => self.no_face,
            EventType::MultipleFaces => self.multiple_faces,
            EventType::ObjectDetected => self.object_detected,
        }
    }

    pub fn increment(&mut self, event_type: EventType) {
        let slot = match event_type {
            EventType::FocusLost => &mut self.focus_lost,
            EventType::NoFace => &mut self.no_face,
            EventType::MultipleFaces => &mut self.multiple_faces,
            EventType::ObjectDetected => &mut self.object_detected,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u64 {
        self.focus_lost + self.no_face + self.multiple_faces + self.object_detected
    }
}

/// Whether the candidate currently faces the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusStatus {
    Focused,
    Unfocused,
    /// No face in view, or no face reading yet.
    #[default]
    Unknown,
}

/// What the last successful tick saw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub faces: u32,
    pub focus: FocusStatus,
    pub objects: Vec<DetectedObject>,
}

/// Mutable state of one recording.
#[derive(Debug, Clone)]
pub struct SessionRuntimeState {
    session_id: Option<SessionId>,
    phase: SessionPhase,
    elapsed_seconds: u64,
    engine: DebounceEngine,
    counters: Counters,
    live: LiveStatus,
    ticks_sampled: u64,
    ticks_skipped: u64,
    last_tick_ms: u64,
}

impl SessionRuntimeState {
    pub fn new(config: &ProctorConfig) -> Self {
        Self {
            session_id: None,
            phase: SessionPhase::NotStarted,
            elapsed_seconds: 0,
            engine: DebounceEngine::from_config(config),
            counters: Counters::default(),
            live: LiveStatus::default(),
            ticks_sampled: 0,
            ticks_skipped: 0,
            last_tick_ms: 0,
        }
    }

    /// Bound by `begin()`; `None` before the first recording.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_recording(&self) -> bool {
        self.phase == SessionPhase::Recording
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Enter `Recording` for `session_id` with every timer and counter zeroed.
    pub fn begin(&mut self, session_id: SessionId) {
        self.session_id = Some(session_id);
        self.engine.reset();
        self.counters = Counters::default();
        self.live = LiveStatus::default();
        self.elapsed_seconds = 0;
        self.ticks_sampled = 0;
        self.ticks_skipped = 0;
        self.last_tick_ms = 0;
        self.phase = SessionPhase::Recording;
    }

    /// Enter `Ended`. Returns false if the session was not recording.
    pub fn end(&mut self) -> bool {
        let was_recording = self.is_recording();
        self.phase = SessionPhase::Ended;
        was_recording
    }

    /// One wall-clock second passed. No-op outside `Recording`.
    pub fn tick_clock(&mut self) {
        if self.is_recording() {
            self.elapsed_seconds += 1;
        }
    }

    /// Record a detection tick that produced no signal.
    pub fn record_skipped(&mut self) {
        if self.is_recording() {
            self.ticks_skipped += 1;
        }
    }

    /// Apply one tick's raw conditions at `now_ms` (milliseconds since the
    /// recording began). Returns the violations to emit, already counted.
    ///
    /// Returns nothing outside `Recording`, so a detector result that lands
    /// after `stop()` cannot produce events.
    pub fn apply(&mut self, raw: &RawConditions, now_ms: u64) -> Vec<Violation> {
        if !self.is_recording() {
            return Vec::new();
        }
        let now_ms = now_ms.max(self.last_tick_ms);
        self.last_tick_ms = now_ms;
        self.ticks_sampled += 1;

        if let Some(faces) = raw.faces {
            self.live.faces = faces.face_count;
            self.live.focus = if faces.face_count == 0 {
                FocusStatus::Unknown
            } else if faces.unfocused {
                FocusStatus::Unfocused
            } else {
                FocusStatus::Focused
            };
        }
        if let Some(objects) = &raw.suspicious_objects {
            self.live.objects = objects.clone();
        }

        let violations = self.engine.step(raw, now_ms);
        for violation in &violations {
            self.counters.increment(violation.event_type);
        }
        violations
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            phase: self.phase,
            elapsed_seconds: self.elapsed_seconds,
            counters: self.counters,
            live: self.live.clone(),
            no_face: self.engine.state(ConditionType::NoFace),
            focus_lost: self.engine.state(ConditionType::FocusLost),
            ticks_sampled: self.ticks_sampled,
            ticks_skipped: self.ticks_skipped,
        }
    }
}

/// Read-only copy of `SessionRuntimeState` handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Option<SessionId>,
    pub phase: SessionPhase,
    pub elapsed_seconds: u64,
    pub counters: Counters,
    pub live: LiveStatus,
    pub no_face: ConditionState,
    pub focus_lost: ConditionState,
    pub ticks_sampled: u64,
    pub ticks_skipped: u64,
}
