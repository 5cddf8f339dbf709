use serde::{Deserialize, Serialize};

use crate::{counter::CountingLine, error::Error};

/// Immutable settings for one counting run. Owned by whatever settings store
/// the caller wires up; the core only validates and reads it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Boundary whose crossing increments the count.
    pub line: CountingLine,
    /// Detector class to count (2 is "car" in COCO ordering).
    pub class: u32,
    /// Detections at or below this confidence are dropped before tracking.
    pub confidence_threshold: f64,
    /// Consecutive matches before a track is trusted for counting.
    pub min_hits: u32,
    /// Frames a track may go unmatched before it is destroyed.
    pub max_age: u32,
    /// Minimum IoU for a detection/track pair to associate.
    pub iou_threshold: f64,
    /// Consecutive per-frame detector failures tolerated before the run
    /// aborts instead of silently under-counting.
    pub max_detection_failures: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            line: CountingLine::horizontal(400.0, 6.0),
            class: 2,
            confidence_threshold: 0.5,
            min_hits: 3,
            max_age: 20,
            iou_threshold: 0.3,
            max_detection_failures: 30,
        }
    }
}

impl RunConfig {
    /// Rejects malformed settings before a run starts; nothing here is
    /// checked again mid-run.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.line.a.is_finite() || !self.line.b.is_finite() {
            return Err(Error::Config("line coefficients must be finite".into()));
        }
        if !self.line.tolerance.is_finite() || self.line.tolerance <= 0.0 {
            return Err(Error::Config(format!(
                "line tolerance must be positive, got {}",
                self.line.tolerance
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::Config(format!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..1.0).contains(&self.iou_threshold) {
            return Err(Error::Config(format!(
                "iou threshold must be within [0, 1), got {}",
                self.iou_threshold
            )));
        }
        if self.min_hits == 0 {
            return Err(Error::Config("min_hits must be at least 1".into()));
        }
        if self.max_age == 0 {
            return Err(Error::Config("max_age must be at least 1".into()));
        }
        Ok(())
    }
}
