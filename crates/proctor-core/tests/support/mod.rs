//! Scripted perception layer and store wiring shared by integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use proctor_core::{
    DetectedObject, DetectionSampler, DetectorError, FaceDetector, FaceRegion, Frame, FrameSource,
    ObjectDetector, ProctorConfig, SessionController,
};
use proctor_store::fakes::{MemoryEventStore, MemorySessionStore};
use proctor_store::{NewSession, SessionId, SessionStore};

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

/// Face whose center is the frame center.
pub fn centered_face() -> FaceRegion {
    FaceRegion::new(270.0, 190.0, 100.0, 100.0)
}

/// Face in the top-left corner, well past the default offset threshold.
pub fn corner_face() -> FaceRegion {
    FaceRegion::new(0.0, 0.0, 100.0, 100.0)
}

pub struct Camera;

impl FrameSource for Camera {
    fn latest_frame(&self) -> Option<Frame> {
        Some(Frame::blank(FRAME_WIDTH, FRAME_HEIGHT))
    }
}

pub struct ScriptedFaces {
    ready: AtomicBool,
    failing: AtomicBool,
    delay: Mutex<Duration>,
    regions: Mutex<Vec<FaceRegion>>,
}

impl ScriptedFaces {
    pub fn new(regions: Vec<FaceRegion>) -> Self {
        Self {
            ready: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
            regions: Mutex::new(regions),
        }
    }

    pub fn show(&self, regions: Vec<FaceRegion>) {
        *self.regions.lock().unwrap() = regions;
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl FaceDetector for ScriptedFaces {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn detect_faces(&self, _frame: &Frame) -> Result<Vec<FaceRegion>, DetectorError> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DetectorError::Failed {
                detector: "face",
                reason: "scripted failure".into(),
            });
        }
        Ok(self.regions.lock().unwrap().clone())
    }
}

pub struct ScriptedObjects {
    ready: AtomicBool,
    failing: AtomicBool,
    objects: Mutex<Vec<DetectedObject>>,
}

impl ScriptedObjects {
    pub fn new(objects: Vec<DetectedObject>) -> Self {
        Self {
            ready: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            objects: Mutex::new(objects),
        }
    }

    pub fn show(&self, objects: Vec<DetectedObject>) {
        *self.objects.lock().unwrap() = objects;
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectDetector for ScriptedObjects {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn detect_objects(&self, _frame: &Frame) -> Result<Vec<DetectedObject>, DetectorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DetectorError::Failed {
                detector: "object",
                reason: "scripted failure".into(),
            });
        }
        Ok(self.objects.lock().unwrap().clone())
    }
}

/// A controller wired to scripted detectors and in-memory stores, with one
/// open session already created.
pub struct Rig {
    pub controller: SessionController,
    pub sessions: Arc<MemorySessionStore>,
    pub events: Arc<MemoryEventStore>,
    pub faces: Arc<ScriptedFaces>,
    pub objects: Arc<ScriptedObjects>,
    pub session_id: SessionId,
}

pub async fn rig(faces: Vec<FaceRegion>) -> Rig {
    rig_with_config(ProctorConfig::default(), faces).await
}

pub async fn rig_with_config(config: ProctorConfig, faces: Vec<FaceRegion>) -> Rig {
    let sampler_timeout = config.detector_timeout;
    rig_with_sampler_timeout(config, faces, sampler_timeout).await
}

/// Like `rig_with_config`, but the sampler is built with its own timeout
/// before the controller sees the config.
pub async fn rig_with_sampler_timeout(
    config: ProctorConfig,
    faces: Vec<FaceRegion>,
    sampler_timeout: Duration,
) -> Rig {
    let sessions = Arc::new(MemorySessionStore::new());
    let events = Arc::new(MemoryEventStore::new());
    let face_detector = Arc::new(ScriptedFaces::new(faces));
    let object_detector = Arc::new(ScriptedObjects::new(vec![]));

    let record = sessions
        .create_session(NewSession::new("Ada Lovelace", "Grace Hopper"))
        .await
        .unwrap();

    let sampler = DetectionSampler::new(
        Arc::new(Camera),
        face_detector.clone(),
        object_detector.clone(),
        sampler_timeout,
    );
    let controller = SessionController::new(config, sessions.clone(), events.clone(), sampler);

    Rig {
        controller,
        sessions,
        events,
        faces: face_detector,
        objects: object_detector,
        session_id: record.id,
    }
}
