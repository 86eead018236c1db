//! Offline replay of recorded signal traces.
//!
//! A trace is a JSON-lines file with one `FrameSignal` per sampling tick.
//! `{}` (both halves missing) stands for a skipped tick; blank lines are
//! ignored. Replay runs the evaluator and debounce engine exactly as the
//! live detection loop would, with tick `i` observed at `i * sample_interval`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use proctor_store::{EventType, SessionId};

use crate::config::ProctorConfig;
use crate::domain::{FrameSignal, ProctorError, Result};
use crate::evaluator::ConditionEvaluator;
use crate::obs::SessionSpan;
use crate::session::{Counters, SessionRuntimeState};

/// A violation produced during replay, with the tick it fired on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayedViolation {
    pub tick: usize,
    pub at_ms: u64,
    pub event_type: EventType,
    pub details: String,
    pub confidence: f64,
}

/// Summary produced after replaying a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayOutcome {
    pub session_id: SessionId,
    pub ticks: usize,
    pub ticks_skipped: u64,
    /// Virtual session length, `ticks * sample_interval`, in whole seconds.
    pub elapsed_seconds: u64,
    pub counters: Counters,
    pub violations: Vec<ReplayedViolation>,
}

/// Parse a JSON-lines trace.
pub fn parse_trace(input: &str) -> Result<Vec<FrameSignal>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| ProctorError::InvalidTrace {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// Read and parse a JSON-lines trace file.
pub fn load_trace(path: &Path) -> Result<Vec<FrameSignal>> {
    let input = std::fs::read_to_string(path)?;
    parse_trace(&input)
}

/// Replay `signals` through a fresh runtime state.
#[instrument(skip_all, fields(ticks = signals.len()))]
pub fn replay_signals(
    session_id: SessionId,
    config: &ProctorConfig,
    signals: &[FrameSignal],
) -> ReplayOutcome {
    let _span = SessionSpan::enter(session_id.as_str());
    let evaluator = ConditionEvaluator::from_config(config);
    let interval_ms = config.sample_interval.as_millis() as u64;

    let mut state = SessionRuntimeState::new(config);
    state.begin(session_id.clone());

    let mut violations = Vec::new();
    for (tick, signal) in signals.iter().enumerate() {
        if signal.is_empty() {
            state.record_skipped();
            continue;
        }
        let at_ms = tick as u64 * interval_ms;
        let raw = evaluator.evaluate(signal);
        for v in state.apply(&raw, at_ms) {
            violations.push(ReplayedViolation {
                tick,
                at_ms,
                event_type: v.event_type,
                details: v.details,
                confidence: v.confidence,
            });
        }
    }

    let snapshot = state.snapshot();
    ReplayOutcome {
        session_id,
        ticks: signals.len(),
        ticks_skipped: snapshot.ticks_skipped,
        elapsed_seconds: signals.len() as u64 * interval_ms / 1_000,
        counters: snapshot.counters,
        violations,
    }
}
