//! Proctor Core: signal-to-event reduction for interview monitoring
//!
//! Turns a stream of per-tick perception results (face count, face offset,
//! detected objects) into discrete, debounced violation events.
//!
//! ## Layer 1 - Monitoring
//!
//! - `sampler`: per-tick frame grab and concurrent detector queries
//! - `evaluator`: stateless mapping of a signal to raw conditions
//! - `debounce`: sustained-condition timers and instantaneous rules
//! - `session` / `controller`: runtime state and lifecycle
//! - `sink`: event stamping, observers and the store writer
//! - `replay`: offline evaluation of recorded signal traces

pub mod config;
pub mod controller;
pub mod debounce;
pub mod domain;
pub mod evaluator;
pub mod metrics;
pub mod obs;
pub mod replay;
pub mod sampler;
pub mod session;
pub mod sink;
pub mod telemetry;

pub use config::ProctorConfig;
pub use controller::{SessionController, SessionSummary};
pub use debounce::{ConditionState, ConditionType, DebounceEngine, SustainedCondition, Violation};
pub use domain::{
    DetectedObject, DetectorError, FaceReading, FaceRegion, Frame, FrameSignal, ProctorError,
    Result,
};
pub use evaluator::{ConditionEvaluator, FaceConditions, RawConditions};
pub use replay::{load_trace, parse_trace, replay_signals, ReplayOutcome, ReplayedViolation};
pub use sampler::{DetectionSampler, FaceDetector, FrameSource, ModelReadiness, ObjectDetector};
pub use session::{
    Counters, FocusStatus, LiveStatus, SessionPhase, SessionRuntimeState, SessionSnapshot,
};
pub use sink::{EventObserver, EventSink};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
