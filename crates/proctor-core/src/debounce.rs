//! Debounce engine: raw per-tick conditions in, violations out.
//!
//! Two disciplines run side by side on every tick:
//!
//! - **Sustained** (`no_face`, `focus_lost`): a condition must hold on every
//!   tick for its sustain threshold before one violation is emitted. Any tick
//!   where it does not hold clears the episode entirely.
//! - **Immediate** (`multiple_faces`, `object_detected`): every observation
//!   emits, one violation per tick for multiple faces and one per suspicious
//!   object.
//!
//! Thresholds are polled against the tick's timestamp; nothing is scheduled.
//!
//! ```text
//!   Clear --raw--> Pending --raw, elapsed >= threshold--> Fired
//!     ^               |                                    |
//!     +----!raw-------+-------------!raw-------------------+
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use proctor_store::EventType;

use crate::config::ProctorConfig;
use crate::evaluator::RawConditions;

/// Conditions that require a sustained period before they count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    NoFace,
    FocusLost,
}

impl ConditionType {
    pub fn event_type(&self) -> EventType {
        match self {
            ConditionType::NoFace => EventType::NoFace,
            ConditionType::FocusLost => EventType::FocusLost,
        }
    }

    fn describe(&self, threshold_ms: u64) -> String {
        let span = format_seconds(threshold_ms);
        match self {
            ConditionType::NoFace => format!("No face detected for more than {span}"),
            ConditionType::FocusLost => {
                format!("Candidate looking away for more than {span}")
            }
        }
    }
}

fn format_seconds(ms: u64) -> String {
    if ms % 1000 == 0 {
        let secs = ms / 1000;
        if secs == 1 {
            "1 second".to_string()
        } else {
            format!("{secs} seconds")
        }
    } else {
        format!("{:.1} seconds", ms as f64 / 1000.0)
    }
}

/// Where a sustained condition is within its current episode.
///
/// `since_ms` is the tick time at which the episode began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConditionState {
    #[default]
    Clear,
    Pending { since_ms: u64 },
    Fired { since_ms: u64 },
}

impl ConditionState {
    pub fn pending_since(&self) -> Option<u64> {
        match self {
            ConditionState::Clear => None,
            ConditionState::Pending { since_ms } | ConditionState::Fired { since_ms } => {
                Some(*since_ms)
            }
        }
    }

    pub fn fired(&self) -> bool {
        matches!(self, ConditionState::Fired { .. })
    }
}

/// A violation produced by the engine, not yet stamped with an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub event_type: EventType,
    pub details: String,
    pub confidence: f64,
    /// Wall-clock time of the observation, when the caller knows it. The
    /// event sink stamps `Utc::now()` otherwise.
    pub observed_at: Option<DateTime<Utc>>,
}

impl Violation {
    pub fn new(event_type: EventType, details: impl Into<String>, confidence: f64) -> Self {
        Self {
            event_type,
            details: details.into(),
            confidence: confidence.clamp(0.0, 1.0),
            observed_at: None,
        }
    }

    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }
}

/// Timer for one sustained condition.
#[derive(Debug, Clone)]
pub struct SustainedCondition {
    condition: ConditionType,
    threshold_ms: u64,
    state: ConditionState,
}

impl SustainedCondition {
    pub fn new(condition: ConditionType, threshold_ms: u64) -> Self {
        Self {
            condition,
            threshold_ms,
            state: ConditionState::Clear,
        }
    }

    pub fn condition(&self) -> ConditionType {
        self.condition
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    pub fn state(&self) -> ConditionState {
        self.state
    }

    /// Advance with this tick's raw value. Returns a violation on the single
    /// tick where the episode crosses its threshold.
    pub fn observe(&mut self, raw: bool, now_ms: u64) -> Option<Violation> {
        if !raw {
            self.state = ConditionState::Clear;
            return None;
        }

        match self.state {
            ConditionState::Clear => {
                self.state = ConditionState::Pending { since_ms: now_ms };
                // A zero threshold fires on the first tick.
                self.try_fire(now_ms, now_ms)
            }
            ConditionState::Pending { since_ms } => self.try_fire(since_ms, now_ms),
            ConditionState::Fired { .. } => None,
        }
    }

    fn try_fire(&mut self, since_ms: u64, now_ms: u64) -> Option<Violation> {
        if now_ms.saturating_sub(since_ms) < self.threshold_ms {
            return None;
        }
        self.state = ConditionState::Fired { since_ms };
        Some(Violation::new(
            self.condition.event_type(),
            self.condition.describe(self.threshold_ms),
            1.0,
        ))
    }

    pub fn reset(&mut self) {
        self.state = ConditionState::Clear;
    }
}

/// Per-session debounce state: one timer per sustained condition plus the
/// stateless immediate triggers.
#[derive(Debug, Clone)]
pub struct DebounceEngine {
    no_face: SustainedCondition,
    focus_lost: SustainedCondition,
}

impl Default for DebounceEngine {
    fn default() -> Self {
        Self::from_config(&ProctorConfig::default())
    }
}

impl DebounceEngine {
    pub fn new(no_face_threshold_ms: u64, focus_lost_threshold_ms: u64) -> Self {
        Self {
            no_face: SustainedCondition::new(ConditionType::NoFace, no_face_threshold_ms),
            focus_lost: SustainedCondition::new(ConditionType::FocusLost, focus_lost_threshold_ms),
        }
    }

    pub fn from_config(config: &ProctorConfig) -> Self {
        Self::new(
            config.no_face_sustain.as_millis() as u64,
            config.focus_lost_sustain.as_millis() as u64,
        )
    }

    pub fn state(&self, condition: ConditionType) -> ConditionState {
        match condition {
            ConditionType::NoFace => self.no_face.state(),
            ConditionType::FocusLost => self.focus_lost.state(),
        }
    }

    /// Return every sustained condition to `Clear`.
    pub fn reset(&mut self) {
        self.no_face.reset();
        self.focus_lost.reset();
    }

    /// Process one tick. `now_ms` must be non-decreasing across calls.
    ///
    /// Emission order within a tick: `multiple_faces`, `no_face`,
    /// `focus_lost`, then one `object_detected` per suspicious object in
    /// detector order.
    pub fn step(&mut self, raw: &RawConditions, now_ms: u64) -> Vec<Violation> {
        let mut out = Vec::new();

        if let Some(faces) = raw.faces {
            if faces.multiple_faces {
                out.push(Violation::new(
                    EventType::MultipleFaces,
                    format!("{} faces detected", faces.face_count),
                    1.0,
                ));
            }
            out.extend(self.no_face.observe(faces.no_face, now_ms));
            out.extend(self.focus_lost.observe(faces.unfocused, now_ms));
        }

        for obj in raw.suspicious_objects.iter().flatten() {
            out.push(Violation::new(
                EventType::ObjectDetected,
                format!(
                    "{} detected with {:.1}% confidence",
                    obj.label,
                    obj.confidence * 100.0
                ),
                obj.confidence,
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DetectedObject;
    use crate::evaluator::FaceConditions;

    fn faces(count: u32, unfocused: bool) -> RawConditions {
        RawConditions {
            faces: Some(FaceConditions {
                face_count: count,
                no_face: count == 0,
                multiple_faces: count > 1,
                unfocused,
            }),
            suspicious_objects: Some(vec![]),
        }
    }

    #[test]
    fn clear_to_pending_records_start() {
        let mut cond = SustainedCondition::new(ConditionType::NoFace, 10_000);
        assert!(cond.observe(true, 3_000).is_none());
        assert_eq!(cond.state(), ConditionState::Pending { since_ms: 3_000 });
        assert_eq!(cond.state().pending_since(), Some(3_000));
    }

    #[test]
    fn fires_once_at_threshold() {
        let mut cond = SustainedCondition::new(ConditionType::NoFace, 10_000);
        for t in (0..10_000).step_by(1_000) {
            assert!(cond.observe(true, t).is_none(), "fired early at {t}");
        }
        let v = cond.observe(true, 10_000).expect("fires at threshold");
        assert_eq!(v.event_type, EventType::NoFace);
        assert_eq!(v.details, "No face detected for more than 10 seconds");
        assert_eq!(v.confidence, 1.0);
        assert!(cond.state().fired());

        for t in (11_000..30_000).step_by(1_000) {
            assert!(cond.observe(true, t).is_none(), "re-fired at {t}");
        }
    }

    #[test]
    fn recovery_clears_without_partial_credit() {
        let mut cond = SustainedCondition::new(ConditionType::FocusLost, 5_000);
        for t in (0..5_000).step_by(1_000) {
            assert!(cond.observe(true, t).is_none());
        }
        assert!(cond.observe(false, 5_000).is_none());
        assert_eq!(cond.state(), ConditionState::Clear);

        // A new episode needs the full threshold again.
        for t in (6_000..11_000).step_by(1_000) {
            assert!(cond.observe(true, t).is_none());
        }
        assert!(cond.observe(true, 11_000).is_some());
    }

    #[test]
    fn fired_clears_then_can_fire_again() {
        let mut cond = SustainedCondition::new(ConditionType::FocusLost, 2_000);
        cond.observe(true, 0);
        assert!(cond.observe(true, 2_000).is_some());
        cond.observe(false, 3_000);
        assert_eq!(cond.state(), ConditionState::Clear);
        cond.observe(true, 4_000);
        assert!(cond.observe(true, 6_000).is_some());
    }

    #[test]
    fn zero_threshold_fires_on_first_tick() {
        let mut cond = SustainedCondition::new(ConditionType::NoFace, 0);
        assert!(cond.observe(true, 42).is_some());
        assert_eq!(cond.state(), ConditionState::Fired { since_ms: 42 });
    }

    #[test]
    fn fractional_threshold_is_described_with_one_decimal() {
        let mut cond = SustainedCondition::new(ConditionType::FocusLost, 2_500);
        cond.observe(true, 0);
        let v = cond.observe(true, 2_500).unwrap();
        assert_eq!(v.details, "Candidate looking away for more than 2.5 seconds");
    }

    #[test]
    fn multiple_faces_emit_every_tick_with_count() {
        let mut engine = DebounceEngine::default();
        let out = engine.step(&faces(3, false), 0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].event_type, EventType::MultipleFaces);
        assert_eq!(out[0].details, "3 faces detected");
        assert_eq!(out[0].confidence, 1.0);
        assert_eq!(engine.step(&faces(3, false), 1_000).len(), 1);
    }

    #[test]
    fn objects_emit_one_violation_each() {
        let mut engine = DebounceEngine::default();
        let mut raw = faces(1, false);
        raw.suspicious_objects = Some(vec![
            DetectedObject::new("cell phone", 0.92),
            DetectedObject::new("book", 0.81),
        ]);
        let out = engine.step(&raw, 0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].details, "cell phone detected with 92.0% confidence");
        assert_eq!(out[0].confidence, 0.92);
        assert_eq!(out[1].details, "book detected with 81.0% confidence");
        assert_eq!(out[1].confidence, 0.81);
    }

    #[test]
    fn missing_face_half_leaves_timers_untouched() {
        let mut engine = DebounceEngine::new(10_000, 5_000);
        engine.step(&faces(0, false), 0);
        let pending = engine.state(ConditionType::NoFace);

        let blind = RawConditions {
            faces: None,
            suspicious_objects: Some(vec![]),
        };
        assert!(engine.step(&blind, 1_000).is_empty());
        assert_eq!(engine.state(ConditionType::NoFace), pending);
    }

    #[test]
    fn no_face_resets_focus_timer() {
        let mut engine = DebounceEngine::new(10_000, 5_000);
        engine.step(&faces(1, true), 0);
        assert!(matches!(
            engine.state(ConditionType::FocusLost),
            ConditionState::Pending { .. }
        ));
        engine.step(&faces(0, false), 1_000);
        assert_eq!(engine.state(ConditionType::FocusLost), ConditionState::Clear);
    }

    #[test]
    fn reset_returns_everything_to_clear() {
        let mut engine = DebounceEngine::new(1_000, 1_000);
        engine.step(&faces(0, false), 0);
        engine.step(&faces(0, false), 1_000);
        assert!(engine.state(ConditionType::NoFace).fired());
        engine.reset();
        assert_eq!(engine.state(ConditionType::NoFace), ConditionState::Clear);
        assert_eq!(engine.state(ConditionType::FocusLost), ConditionState::Clear);
    }
}
