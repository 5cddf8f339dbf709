use image::RgbImage;

use crate::{detection::Detection, error::Result};

/// Detection source seam: given a frame, produce candidate boxes. Model
/// inference lives behind this trait, outside the core. A failed call is
/// recoverable for a bounded number of consecutive frames (the tracker
/// coasts on predictions), after which the runner aborts.
pub trait Detector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>>;
}

/// Replays a fixed per-frame detection script. Frames past the end of the
/// script yield no detections. Useful for tests and offline replays of
/// dumped detector output.
pub struct ScriptedDetector {
    script: Vec<Vec<Detection>>,
    cursor: usize,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
        let detections = self.script.get(self.cursor).cloned().unwrap_or_default();
        self.cursor += 1;
        Ok(detections)
    }
}
