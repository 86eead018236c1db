//! Debounce behaviour driven tick by tick through evaluator + engine.

use proctor_core::{
    ConditionEvaluator, ConditionState, ConditionType, DebounceEngine, DetectedObject, FaceReading,
    FrameSignal, Violation,
};
use proctor_store::EventType;

const TICK_MS: u64 = 1_000;

fn empty_room() -> FrameSignal {
    FrameSignal::observed(FaceReading::no_face(), vec![])
}

fn centered() -> FrameSignal {
    FrameSignal::observed(FaceReading::new(1, Some(3.0)), vec![])
}

fn looking_away() -> FrameSignal {
    FrameSignal::observed(FaceReading::new(1, Some(180.0)), vec![])
}

/// Feed `signals` one per tick starting at `start_ms`; returns each
/// violation with the tick time it fired at.
fn drive(
    engine: &mut DebounceEngine,
    start_ms: u64,
    signals: impl IntoIterator<Item = FrameSignal>,
) -> Vec<(u64, Violation)> {
    let evaluator = ConditionEvaluator::default();
    let mut out = Vec::new();
    for (i, signal) in signals.into_iter().enumerate() {
        let now = start_ms + i as u64 * TICK_MS;
        let raw = evaluator.evaluate(&signal);
        out.extend(engine.step(&raw, now).into_iter().map(|v| (now, v)));
    }
    out
}

#[test]
fn no_face_fires_exactly_at_threshold() {
    let mut engine = DebounceEngine::default();

    // 0..=9000 ms: ten ticks, still short of the threshold
    let early = drive(&mut engine, 0, std::iter::repeat_with(empty_room).take(10));
    assert!(early.is_empty());

    let fired = drive(&mut engine, 10_000, [empty_room()]);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].0, 10_000);
    assert_eq!(fired[0].1.event_type, EventType::NoFace);
    assert_eq!(fired[0].1.details, "No face detected for more than 10 seconds");
}

#[test]
fn single_fire_per_episode() {
    let mut engine = DebounceEngine::default();
    let fired = drive(&mut engine, 0, std::iter::repeat_with(empty_room).take(60));
    assert_eq!(fired.len(), 1);
    assert_eq!(
        engine.state(ConditionType::NoFace),
        ConditionState::Fired { since_ms: 0 }
    );
}

#[test]
fn one_recovery_tick_restarts_the_episode() {
    let mut engine = DebounceEngine::default();
    let mut signals: Vec<FrameSignal> = std::iter::repeat_with(empty_room).take(10).collect();
    signals.push(centered());
    signals.extend(std::iter::repeat_with(empty_room).take(11));

    let fired = drive(&mut engine, 0, signals);
    assert_eq!(fired.len(), 1);
    // second episode starts at 11 s and fires 10 s later
    assert_eq!(fired[0].0, 21_000);
}

#[test]
fn recovery_after_firing_allows_a_new_event() {
    let mut engine = DebounceEngine::default();
    let mut signals: Vec<FrameSignal> = std::iter::repeat_with(looking_away).take(6).collect();
    signals.push(centered());
    signals.extend(std::iter::repeat_with(looking_away).take(6));

    let fired: Vec<u64> = drive(&mut engine, 0, signals)
        .into_iter()
        .filter(|(_, v)| v.event_type == EventType::FocusLost)
        .map(|(t, _)| t)
        .collect();
    assert_eq!(fired, vec![5_000, 12_000]);
}

#[test]
fn missing_face_half_does_not_clear() {
    let mut engine = DebounceEngine::default();
    let objects_only = FrameSignal {
        faces: None,
        objects: Some(vec![]),
    };
    let mut signals: Vec<FrameSignal> = std::iter::repeat_with(empty_room).take(5).collect();
    signals.push(objects_only);
    signals.extend(std::iter::repeat_with(empty_room).take(5));

    let fired = drive(&mut engine, 0, signals);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].0, 10_000);
}

#[test]
fn objects_fire_every_tick_with_own_confidence() {
    let mut engine = DebounceEngine::default();
    let signal = FrameSignal::observed(
        FaceReading::new(1, Some(0.0)),
        vec![
            DetectedObject::new("Cell Phone", 0.92),
            DetectedObject::new("book", 0.81),
        ],
    );
    let fired = drive(&mut engine, 0, std::iter::repeat(signal).take(3));
    assert_eq!(fired.len(), 6);
    let confidences: Vec<f64> = fired.iter().map(|(_, v)| v.confidence).collect();
    assert_eq!(confidences, vec![0.92, 0.81, 0.92, 0.81, 0.92, 0.81]);
}

#[test]
fn simultaneous_conditions_emit_in_fixed_order() {
    let mut engine = DebounceEngine::new(0, 0);
    let signal = FrameSignal::observed(
        FaceReading::new(2, Some(400.0)),
        vec![DetectedObject::new("keyboard", 0.6)],
    );
    let kinds: Vec<EventType> = drive(&mut engine, 0, [signal])
        .into_iter()
        .map(|(_, v)| v.event_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            EventType::MultipleFaces,
            EventType::FocusLost,
            EventType::ObjectDetected
        ]
    );
}
