//! Domain models for the monitoring core.
//!
//! - `FrameSignal`: raw per-tick perception output
//! - `ProctorError` / `DetectorError`: error taxonomy

pub mod error;
pub mod signal;

pub use error::{DetectorError, ProctorError, Result};
pub use signal::{DetectedObject, FaceReading, FaceRegion, Frame, FrameSignal};
