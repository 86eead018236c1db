//! Detection sampler: grabs the latest frame and queries the perception
//! layer once per tick.
//!
//! The face and object queries run concurrently, each bounded by the soft
//! detector timeout and each with its own failure handling. A failed query
//! drops only its half of the tick; if both fail the tick is skipped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DetectedObject, DetectorError, FaceReading, FaceRegion, Frame, FrameSignal};
use crate::metrics::METRICS;
use crate::obs;

/// Source of the most recent video frame (camera, stream, test feed).
pub trait FrameSource: Send + Sync {
    /// Latest frame, or `None` when the camera has nothing yet.
    fn latest_frame(&self) -> Option<Frame>;
}

/// Face detection model.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Whether the model has finished loading.
    fn is_ready(&self) -> bool;

    async fn detect_faces(&self, frame: &Frame) -> Result<Vec<FaceRegion>, DetectorError>;
}

/// Object detection model.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Whether the model has finished loading.
    fn is_ready(&self) -> bool;

    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<DetectedObject>, DetectorError>;
}

/// Readiness of both perception models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelReadiness {
    pub faces: bool,
    pub objects: bool,
}

impl ModelReadiness {
    pub fn all_ready(&self) -> bool {
        self.faces && self.objects
    }
}

/// Produces one `FrameSignal` per call from the frame source and detectors.
#[derive(Clone)]
pub struct DetectionSampler {
    frames: Arc<dyn FrameSource>,
    faces: Arc<dyn FaceDetector>,
    objects: Arc<dyn ObjectDetector>,
    timeout: Duration,
}

impl DetectionSampler {
    pub fn new(
        frames: Arc<dyn FrameSource>,
        faces: Arc<dyn FaceDetector>,
        objects: Arc<dyn ObjectDetector>,
        timeout: Duration,
    ) -> Self {
        Self {
            frames,
            faces,
            objects,
            timeout,
        }
    }

    /// Replace the per-query soft timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn readiness(&self) -> ModelReadiness {
        ModelReadiness {
            faces: self.faces.is_ready(),
            objects: self.objects.is_ready(),
        }
    }

    /// Sample one tick. `None` means the tick is skipped: both detectors
    /// failed and nothing may be mutated.
    pub async fn sample(&self) -> Option<FrameSignal> {
        let Some(frame) = self.frames.latest_frame() else {
            return Some(FrameSignal::without_frame());
        };

        let (faces, objects) = tokio::join!(self.query_faces(&frame), self.query_objects(&frame));

        let faces = faces
            .map(|regions| FaceReading::from_regions(&regions, &frame))
            .map_err(|e| {
                METRICS.inc_detector_failures();
                obs::emit_detector_failure("face", &e);
            })
            .ok();
        let objects = objects
            .map_err(|e| {
                METRICS.inc_detector_failures();
                obs::emit_detector_failure("object", &e);
            })
            .ok();

        let signal = FrameSignal { faces, objects };
        if signal.is_empty() {
            None
        } else {
            Some(signal)
        }
    }

    async fn query_faces(&self, frame: &Frame) -> Result<Vec<FaceRegion>, DetectorError> {
        if !self.faces.is_ready() {
            return Err(DetectorError::NotReady { detector: "face" });
        }
        match tokio::time::timeout(self.timeout, self.faces.detect_faces(frame)).await {
            Ok(result) => result,
            Err(_) => Err(DetectorError::TimedOut {
                detector: "face",
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    async fn query_objects(&self, frame: &Frame) -> Result<Vec<DetectedObject>, DetectorError> {
        if !self.objects.is_ready() {
            return Err(DetectorError::NotReady { detector: "object" });
        }
        match tokio::time::timeout(self.timeout, self.objects.detect_objects(frame)).await {
            Ok(result) => result,
            Err(_) => Err(DetectorError::TimedOut {
                detector: "object",
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
