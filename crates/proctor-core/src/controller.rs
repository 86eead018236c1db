//! Session lifecycle controller.
//!
//! Owns the runtime state of one monitored session and drives it through
//! `NotStarted -> Recording -> Ended`. While recording, three tasks run:
//!
//! - the detection loop (sample, evaluate, debounce, emit)
//! - the session clock (one increment per second)
//! - the event writer (drains the sink queue into the `EventStore`)
//!
//! All condition state lives behind one mutex and is read-modify-written
//! once per tick. `stop()` flips the phase under that mutex before it
//! signals shutdown, so a detector that resolves late finds the session
//! ended and emits nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{instrument, warn, Instrument};

use proctor_store::{
    EventStore, SessionEndReceipt, SessionId, SessionStore, StorageError, ViolationEvent,
};

use crate::config::ProctorConfig;
use crate::domain::{ProctorError, Result};
use crate::evaluator::ConditionEvaluator;
use crate::metrics::METRICS;
use crate::obs;
use crate::sampler::{DetectionSampler, ModelReadiness};
use crate::session::{SessionPhase, SessionRuntimeState, SessionSnapshot};
use crate::sink::{EventObserver, EventSink};

/// Capacity of the live event broadcast; slow subscribers lag, never block.
const LIVE_CHANNEL_CAPACITY: usize = 256;

const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// Result of a successful `stop()`.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub snapshot: SessionSnapshot,
    pub receipt: SessionEndReceipt,
}

struct Running {
    shutdown: watch::Sender<bool>,
    detection: JoinHandle<()>,
    clock: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// Drives one monitored session.
pub struct SessionController {
    config: ProctorConfig,
    sessions: Arc<dyn SessionStore>,
    events: Arc<dyn EventStore>,
    sampler: DetectionSampler,
    evaluator: Arc<ConditionEvaluator>,
    observers: Vec<Arc<dyn EventObserver>>,
    live: broadcast::Sender<ViolationEvent>,
    state: Arc<Mutex<SessionRuntimeState>>,
    // Serialises start/stop; held across their awaits.
    running: tokio::sync::Mutex<Option<Running>>,
}

fn lock(state: &Mutex<SessionRuntimeState>) -> MutexGuard<'_, SessionRuntimeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionController {
    /// The sampler runs with `config.detector_timeout`, whatever timeout it
    /// was built with.
    pub fn new(
        config: ProctorConfig,
        sessions: Arc<dyn SessionStore>,
        events: Arc<dyn EventStore>,
        sampler: DetectionSampler,
    ) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            evaluator: Arc::new(ConditionEvaluator::from_config(&config)),
            state: Arc::new(Mutex::new(SessionRuntimeState::new(&config))),
            sampler: sampler.with_timeout(config.detector_timeout),
            config,
            sessions,
            events,
            observers: Vec::new(),
            live,
            running: tokio::sync::Mutex::new(None),
        }
    }

    /// Register a synchronous observer. Takes effect from the next `start()`.
    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &ProctorConfig {
        &self.config
    }

    pub fn models_ready(&self) -> ModelReadiness {
        self.sampler.readiness()
    }

    pub fn phase(&self) -> SessionPhase {
        lock(&self.state).phase()
    }

    /// Read-only copy of the runtime state.
    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.state).snapshot()
    }

    /// Live feed of emitted events. Receivers that fall behind see
    /// `RecvError::Lagged` rather than slowing the detection loop.
    pub fn subscribe(&self) -> broadcast::Receiver<ViolationEvent> {
        self.live.subscribe()
    }

    /// Begin recording `session_id`.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` unless the controller has never started
    /// - `ModelsNotReady` if either detector is still loading
    /// - `SessionNotFound` if the store does not know the id
    /// - `SessionAlreadyEnded` if the stored session is closed
    #[instrument(skip(self, session_id), fields(session_id = %session_id))]
    pub async fn start(&self, session_id: SessionId) -> Result<()> {
        let mut running = self.running.lock().await;

        let phase = self.phase();
        if phase != SessionPhase::NotStarted {
            return Err(ProctorError::InvalidTransition {
                phase,
                action: "start",
            });
        }

        let readiness = self.models_ready();
        if !readiness.all_ready() {
            return Err(ProctorError::ModelsNotReady {
                faces_ready: readiness.faces,
                objects_ready: readiness.objects,
            });
        }

        let record = match self.sessions.get_session(&session_id).await {
            Ok(record) => record,
            Err(StorageError::SessionNotFound { .. }) => {
                return Err(ProctorError::SessionNotFound(session_id))
            }
            Err(e) => return Err(e.into()),
        };
        if !record.is_open() {
            return Err(ProctorError::SessionAlreadyEnded(session_id));
        }

        lock(&self.state).begin(session_id.clone());
        obs::emit_session_started(session_id.as_str(), &record.candidate_name);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let (sink, writer) =
            EventSink::spawn(session_id.clone(), self.events.clone(), self.observers.clone());
        let sink = sink.with_broadcast(self.live.clone());

        let span = obs::session_span(session_id.as_str());
        let detection = tokio::spawn(
            DetectionLoop {
                sampler: self.sampler.clone(),
                evaluator: self.evaluator.clone(),
                state: self.state.clone(),
                sink,
                interval: self.config.sample_interval,
            }
            .run(shutdown_rx.clone())
            .instrument(span.clone()),
        );
        let clock = tokio::spawn(run_clock(self.state.clone(), shutdown_rx).instrument(span));

        *running = Some(Running {
            shutdown,
            detection,
            clock,
            writer,
        });
        Ok(())
    }

    /// End the recording.
    ///
    /// Local state becomes `Ended` before anything else happens and stays
    /// that way even when the store rejects the close, in which case
    /// `SessionFinalizationFailed` is returned.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<SessionSummary> {
        let mut running = self.running.lock().await;

        let session_id = {
            let mut state = lock(&self.state);
            let phase = state.phase();
            let session_id = match state.session_id() {
                Some(id) if phase == SessionPhase::Recording => id.clone(),
                _ => {
                    return Err(ProctorError::InvalidTransition {
                        phase,
                        action: "stop",
                    })
                }
            };
            state.end();
            session_id
        };

        if let Some(tasks) = running.take() {
            let _ = tasks.shutdown.send(true);
            for (name, handle) in [("detection", tasks.detection), ("clock", tasks.clock)] {
                if let Err(e) = handle.await {
                    warn!(task = name, error = %e, "session task did not shut down cleanly");
                }
            }
            // The detection loop owned the sink; with it gone the writer
            // drains what is queued and exits.
            if let Err(e) = tasks.writer.await {
                warn!(error = %e, "event writer did not shut down cleanly");
            }
        }

        let snapshot = self.snapshot();
        let receipt = match self.sessions.end_session(&session_id).await {
            Ok(receipt) => receipt,
            Err(source) => {
                obs::emit_finalize_error(session_id.as_str(), &source);
                return Err(ProctorError::SessionFinalizationFailed { session_id, source });
            }
        };

        obs::emit_session_ended(
            session_id.as_str(),
            snapshot.elapsed_seconds,
            snapshot.counters.total(),
        );
        METRICS.flush();

        Ok(SessionSummary { snapshot, receipt })
    }
}

struct DetectionLoop {
    sampler: DetectionSampler,
    evaluator: Arc<ConditionEvaluator>,
    state: Arc<Mutex<SessionRuntimeState>>,
    sink: EventSink,
    interval: Duration,
}

impl DetectionLoop {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            if *shutdown.borrow() {
                break;
            }

            let signal = tokio::select! {
                _ = shutdown.changed() => break,
                signal = self.sampler.sample() => signal,
            };
            let now_ms = started.elapsed().as_millis() as u64;

            let violations = {
                let mut state = lock(&self.state);
                match signal {
                    Some(signal) => {
                        METRICS.inc_ticks_sampled();
                        let raw = self.evaluator.evaluate(&signal);
                        state.apply(&raw, now_ms)
                    }
                    None => {
                        METRICS.inc_ticks_skipped();
                        state.record_skipped();
                        obs::emit_tick_skipped(
                            self.sink.session_id().as_str(),
                            "all detectors failed",
                        );
                        Vec::new()
                    }
                }
            };

            for violation in violations {
                self.sink.emit(violation);
            }
        }
    }
}

async fn run_clock(state: Arc<Mutex<SessionRuntimeState>>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + CLOCK_PERIOD, CLOCK_PERIOD);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => lock(&state).tick_clock(),
        }
    }
}
