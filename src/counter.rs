use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::tracker::Track;

/// The counting boundary `a*x - y + b = 0` with a tolerance band, in pixel
/// coordinates. A horizontal line at `y` is the special case `a = 0, b = y`.
/// Immutable for the duration of a run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CountingLine {
    pub a: f64,
    pub b: f64,
    pub tolerance: f64,
}

impl CountingLine {
    pub fn new(a: f64, b: f64, tolerance: f64) -> Self {
        Self { a, b, tolerance }
    }

    pub fn horizontal(y: f64, tolerance: f64) -> Self {
        Self::new(0.0, y, tolerance)
    }

    /// Perpendicular distance from a point to the line.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        (self.a * x - y + self.b).abs() / (self.a * self.a + 1.0).sqrt()
    }

    /// True when the point sits inside the tolerance band.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.distance(x, y) <= self.tolerance
    }

    /// y coordinate of the line at a given x, for rendering.
    pub fn y_at(&self, x: f64) -> f64 {
        self.a * x + self.b
    }
}

/// Counts each track at most once as its box center enters the line's
/// tolerance band. A track lingering or jittering inside the band for many
/// frames still counts once, and a count is never revoked.
pub struct CrossingCounter {
    line: CountingLine,
    counted: HashSet<u32>,
}

impl CrossingCounter {
    pub fn new(line: CountingLine) -> Self {
        Self {
            line,
            counted: HashSet::new(),
        }
    }

    /// Checks one confirmed track against the line. Returns true only the
    /// first time this track ID crosses.
    pub fn observe(&mut self, track: &Track) -> bool {
        let (x, y) = track.bbox.center();
        if !self.line.contains(x, y) {
            return false;
        }

        let newly_counted = self.counted.insert(track.id);
        if newly_counted {
            debug!("track {} crossed the line, count now {}", track.id, self.counted.len());
        }
        newly_counted
    }

    pub fn count(&self) -> usize {
        self.counted.len()
    }

    pub fn line(&self) -> &CountingLine {
        &self.line
    }
}
