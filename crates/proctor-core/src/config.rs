//! Monitoring configuration.
//!
//! Defaults reproduce the reference behaviour: sample once per second, flag
//! a face more than 100 px off-center, no face for 10 s, looking away for 5 s.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_OFFSET_THRESHOLD: f64 = 100.0;
pub const DEFAULT_NO_FACE_SUSTAIN_MS: u64 = 10_000;
pub const DEFAULT_FOCUS_LOST_SUSTAIN_MS: u64 = 5_000;
pub const DEFAULT_SUSPICIOUS_LABELS: [&str; 5] = ["cell phone", "book", "laptop", "keyboard", "mouse"];

/// Tunables for the sampler, evaluator and debounce engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProctorConfig {
    /// Cadence of the detection loop
    pub sample_interval: Duration,
    /// Soft per-call bound on detector latency
    pub detector_timeout: Duration,
    /// Face-center distance beyond which the candidate counts as unfocused
    pub offset_threshold: f64,
    /// How long "no face" must persist before an event
    pub no_face_sustain: Duration,
    /// How long "unfocused" must persist before an event
    pub focus_lost_sustain: Duration,
    /// Object labels that raise `object_detected` (case-insensitive substring)
    pub suspicious_labels: Vec<String>,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        let sample_interval = Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS);
        ProctorConfig {
            sample_interval,
            detector_timeout: sample_interval,
            offset_threshold: DEFAULT_OFFSET_THRESHOLD,
            no_face_sustain: Duration::from_millis(DEFAULT_NO_FACE_SUSTAIN_MS),
            focus_lost_sustain: Duration::from_millis(DEFAULT_FOCUS_LOST_SUSTAIN_MS),
            suspicious_labels: DEFAULT_SUSPICIOUS_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

impl ProctorConfig {
    /// Build from `PROCTOR_*` environment variables over the defaults.
    ///
    /// The detector timeout follows the sample interval unless set explicitly.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(interval) = env_millis("PROCTOR_SAMPLE_INTERVAL_MS") {
            config.sample_interval = interval;
            config.detector_timeout = interval;
        }
        if let Some(timeout) = env_millis("PROCTOR_DETECTOR_TIMEOUT_MS") {
            config.detector_timeout = timeout;
        }
        if let Some(threshold) = std::env::var("PROCTOR_OFFSET_THRESHOLD")
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
        {
            config.offset_threshold = threshold;
        }
        if let Some(sustain) = env_millis("PROCTOR_NO_FACE_SUSTAIN_MS") {
            config.no_face_sustain = sustain;
        }
        if let Some(sustain) = env_millis("PROCTOR_FOCUS_LOST_SUSTAIN_MS") {
            config.focus_lost_sustain = sustain;
        }
        if let Ok(labels) = std::env::var("PROCTOR_SUSPICIOUS_LABELS") {
            let labels: Vec<String> = labels
                .split(',')
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
            if !labels.is_empty() {
                config.suspicious_labels = labels;
            }
        }
        config
    }

    /// Set the sample interval; the detector timeout tracks it.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self.detector_timeout = interval;
        self
    }

    pub fn with_detector_timeout(mut self, timeout: Duration) -> Self {
        self.detector_timeout = timeout;
        self
    }

    pub fn with_offset_threshold(mut self, threshold: f64) -> Self {
        self.offset_threshold = threshold;
        self
    }

    pub fn with_no_face_sustain(mut self, sustain: Duration) -> Self {
        self.no_face_sustain = sustain;
        self
    }

    pub fn with_focus_lost_sustain(mut self, sustain: Duration) -> Self {
        self.focus_lost_sustain = sustain;
        self
    }

    pub fn with_suspicious_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suspicious_labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_thresholds() {
        let config = ProctorConfig::default();
        assert_eq!(config.sample_interval, Duration::from_secs(1));
        assert_eq!(config.detector_timeout, config.sample_interval);
        assert_eq!(config.offset_threshold, 100.0);
        assert_eq!(config.no_face_sustain, Duration::from_secs(10));
        assert_eq!(config.focus_lost_sustain, Duration::from_secs(5));
        assert_eq!(config.suspicious_labels.len(), 5);
    }

    #[test]
    fn sample_interval_builder_moves_timeout() {
        let config = ProctorConfig::default().with_sample_interval(Duration::from_millis(250));
        assert_eq!(config.detector_timeout, Duration::from_millis(250));

        let config = config.with_detector_timeout(Duration::from_millis(100));
        assert_eq!(config.sample_interval, Duration::from_millis(250));
        assert_eq!(config.detector_timeout, Duration::from_millis(100));
    }

    #[test]
    fn label_builder_accepts_str_slices() {
        let config = ProctorConfig::default().with_suspicious_labels(["tablet", "headphones"]);
        assert_eq!(config.suspicious_labels, vec!["tablet", "headphones"]);
    }
}
