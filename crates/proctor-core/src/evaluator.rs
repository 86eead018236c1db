//! Condition evaluation: one `FrameSignal` in, raw condition flags out.
//!
//! Pure and stateless. Debouncing happens downstream in `debounce`.

use crate::config::ProctorConfig;
use crate::domain::{DetectedObject, FrameSignal};

/// Face-derived flags for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceConditions {
    pub face_count: u32,
    pub no_face: bool,
    pub multiple_faces: bool,
    pub unfocused: bool,
}

/// Raw (undebounced) conditions for one tick.
///
/// Each half is `None` when its detector produced nothing this tick. A
/// missing face half leaves sustained conditions untouched; a missing object
/// half leaves the last observed objects in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawConditions {
    pub faces: Option<FaceConditions>,
    pub suspicious_objects: Option<Vec<DetectedObject>>,
}

/// Classifies frame signals against the configured thresholds.
#[derive(Debug, Clone)]
pub struct ConditionEvaluator {
    offset_threshold: f64,
    suspicious_labels: Vec<String>,
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::from_config(&ProctorConfig::default())
    }
}

impl ConditionEvaluator {
    pub fn new<I, S>(offset_threshold: f64, suspicious_labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            offset_threshold,
            suspicious_labels: suspicious_labels
                .into_iter()
                .map(|l| l.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ProctorConfig) -> Self {
        Self::new(config.offset_threshold, &config.suspicious_labels)
    }

    /// Case-insensitive substring match against the suspicious label list.
    pub fn is_suspicious(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.suspicious_labels
            .iter()
            .any(|needle| label.contains(needle.as_str()))
    }

    pub fn evaluate(&self, signal: &FrameSignal) -> RawConditions {
        let faces = signal.faces.map(|reading| {
            let count = reading.count();
            let unfocused = count >= 1
                && reading
                    .primary_offset()
                    .map(|offset| offset > self.offset_threshold)
                    .unwrap_or(false);
            FaceConditions {
                face_count: count,
                no_face: count == 0,
                multiple_faces: count > 1,
                unfocused,
            }
        });

        let suspicious_objects = signal.objects.as_ref().map(|objects| {
            objects
                .iter()
                .filter(|obj| self.is_suspicious(&obj.label))
                .cloned()
                .collect()
        });

        RawConditions {
            faces,
            suspicious_objects,
        }
    }
}
