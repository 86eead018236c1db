//! Per-tick perception signals.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A captured video frame handed to the detectors. Pixel layout is owned by
/// the media layer; the core only needs the dimensions.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Frame of the given size with no pixel payload (tests, synthetic feeds).
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, Vec::<u8>::new())
    }

    pub fn center(&self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Axis-aligned face bounding box in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// A labeled object reported by the object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    /// Detector confidence in `0.0..=1.0`.
    pub confidence: f64,
}

impl DetectedObject {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Face half of a tick: how many faces, and how far the dominant one sits
/// from the frame center.
///
/// Invariant: `count == 0` implies `primary_offset` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "FaceReadingRepr")]
pub struct FaceReading {
    count: u32,
    primary_offset: Option<f64>,
}

#[derive(Deserialize)]
struct FaceReadingRepr {
    count: u32,
    #[serde(default)]
    primary_offset: Option<f64>,
}

impl From<FaceReadingRepr> for FaceReading {
    fn from(repr: FaceReadingRepr) -> Self {
        FaceReading::new(repr.count, repr.primary_offset)
    }
}

impl FaceReading {
    /// Build a reading; an offset supplied alongside a zero count is dropped.
    pub fn new(count: u32, primary_offset: Option<f64>) -> Self {
        let primary_offset = if count == 0 { None } else { primary_offset };
        Self {
            count,
            primary_offset,
        }
    }

    pub fn no_face() -> Self {
        Self::new(0, None)
    }

    /// Reduce detector output to a reading. The dominant face is the one with
    /// the largest bounding box; its offset is the Euclidean distance between
    /// its center and the frame center.
    pub fn from_regions(regions: &[FaceRegion], frame: &Frame) -> Self {
        let dominant = regions
            .iter()
            .max_by(|a, b| a.area().total_cmp(&b.area()));
        let offset = dominant.map(|face| {
            let (fx, fy) = face.center();
            let (cx, cy) = frame.center();
            ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt()
        });
        Self::new(regions.len() as u32, offset)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn primary_offset(&self) -> Option<f64> {
        self.primary_offset
    }
}

/// Raw, unfiltered output of one sampling tick.
///
/// Each half is `None` when its detector failed for this tick. A tick where
/// both halves failed is never produced; the sampler skips it instead.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSignal {
    #[serde(default)]
    pub faces: Option<FaceReading>,
    #[serde(default)]
    pub objects: Option<Vec<DetectedObject>>,
}

impl FrameSignal {
    /// Fully observed tick.
    pub fn observed(faces: FaceReading, objects: Vec<DetectedObject>) -> Self {
        Self {
            faces: Some(faces),
            objects: Some(objects),
        }
    }

    /// Reading used when no video frame is available: zero faces, no
    /// objects, no offset.
    pub fn without_frame() -> Self {
        Self::observed(FaceReading::no_face(), Vec::new())
    }

    /// Whether neither detector produced anything this tick.
    pub fn is_empty(&self) -> bool {
        self.faces.is_none() && self.objects.is_none()
    }

    pub fn face_count(&self) -> Option<u32> {
        self.faces.map(|f| f.count())
    }
}
