use log::debug;
use serde::Serialize;

use crate::{
    associate::associate_detections_to_tracks, bbox::BBox, config::RunConfig,
    detection::Detection, kalman_box_tracker::KalmanBoxTracker,
};

/// Snapshot of a confirmed track, as handed to the counter and renderer.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Track {
    pub id: u32,
    pub bbox: BBox,
}

/// Owns the set of live tracks for one run. Creates, confirms, ages out and
/// destroys tracks frame by frame; only confirmed tracks leave the registry.
///
/// Track IDs come from a per-run monotone counter and are never reused
/// within the run.
pub struct SortTracker {
    trackers: Vec<KalmanBoxTracker>,
    next_id: u32,
    min_hits: u32,
    max_age: u32,
    iou_threshold: f64,
}

impl SortTracker {
    pub fn new(min_hits: u32, max_age: u32, iou_threshold: f64) -> Self {
        Self {
            trackers: Vec::new(),
            next_id: 0,
            min_hits,
            max_age,
            iou_threshold,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.min_hits, config.max_age, config.iou_threshold)
    }

    /// Runs the fixed per-frame protocol: predict, associate, correct,
    /// destroy stale tracks, spawn new ones, confirm. Returns the confirmed
    /// tracks after this frame.
    pub fn update(&mut self, detections: &[Detection]) -> Vec<Track> {
        let predictions: Vec<BBox> = self
            .trackers
            .iter_mut()
            .map(|tracker| tracker.predict())
            .collect();

        let association =
            associate_detections_to_tracks(detections, &predictions, self.iou_threshold);

        for &(detection_index, tracker_index) in &association.matched {
            self.trackers[tracker_index].update(detections[detection_index].bbox);
        }

        let before = self.trackers.len();
        self.trackers
            .retain(|tracker| tracker.time_since_update() <= self.max_age);
        if self.trackers.len() < before {
            debug!("destroyed {} stale track(s)", before - self.trackers.len());
        }

        for &detection_index in &association.unmatched_detections {
            let id = self.next_id;
            self.next_id += 1;
            self.trackers
                .push(KalmanBoxTracker::new(id, detections[detection_index].bbox));
            debug!("spawned track {id}");
        }

        for tracker in &mut self.trackers {
            if tracker.hits() >= self.min_hits {
                tracker.confirm();
            }
        }

        self.confirmed_tracks()
    }

    pub fn confirmed_tracks(&self) -> Vec<Track> {
        self.trackers
            .iter()
            .filter(|tracker| tracker.is_confirmed())
            .map(|tracker| Track {
                id: tracker.id(),
                bbox: tracker.bbox(),
            })
            .collect()
    }

    /// Number of live tracks, confirmed or not.
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
