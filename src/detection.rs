use serde::{Deserialize, Serialize};

use crate::bbox::BBox;

/// One candidate object box for a single frame. Produced by the detection
/// source, filtered, consumed by the association step, then dropped.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    pub score: f64,
    pub class: u32,
}

impl Detection {
    /// Filter applied before tracking: right class and strictly above the
    /// confidence threshold, matching the upstream detector contract.
    pub fn passes(&self, class: u32, confidence_threshold: f64) -> bool {
        self.class == class && self.score > confidence_threshold
    }
}
