use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// Smallest scale/aspect the state reconstruction will accept. Keeps a
/// degenerate (zero-area) box from turning into NaN downstream.
const MIN_SCALE: f64 = 1e-6;

/// Axis-aligned box in pixel coordinates, corners `(x_1, y_1)`-`(x_2, y_2)`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x_1: f64,
    pub y_1: f64,
    pub x_2: f64,
    pub y_2: f64,
}

impl BBox {
    pub fn new(x_1: f64, y_1: f64, x_2: f64, y_2: f64) -> Self {
        if x_1 > x_2 || y_1 > y_2 {
            return BBox::default();
        }
        BBox { x_1, y_1, x_2, y_2 }
    }

    /// Rebuilds a box from the leading `[cx, cy, s, r]` rows of the motion
    /// state, where `s` is the area and `r` the aspect ratio.
    pub fn from_state_vector(state_vector: SVector<f64, 7>) -> Self {
        let s = state_vector[2].max(MIN_SCALE);
        let r = state_vector[3].max(MIN_SCALE);
        let w = (s * r).sqrt();
        let h = s / w;

        Self::new(
            state_vector[0] - w / 2.0,
            state_vector[1] - h / 2.0,
            state_vector[0] + w / 2.0,
            state_vector[1] + h / 2.0,
        )
    }

    /// Observation form `[cx, cy, area, aspect]` fed to the Kalman filter.
    pub fn to_observation_vector(&self) -> SVector<f64, 4> {
        let w = (self.x_2 - self.x_1).max(0.0);
        let h = (self.y_2 - self.y_1).max(0.0);

        let cx = self.x_1 + w / 2.0;
        let cy = self.y_1 + h / 2.0;
        let area = w * h;
        let r = w / h.max(MIN_SCALE);

        SVector::<f64, 4>::new(cx, cy, area, r)
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x_1 + self.x_2) / 2.0, (self.y_1 + self.y_2) / 2.0)
    }

    pub fn area(&self) -> f64 {
        ((self.x_2 - self.x_1) * (self.y_2 - self.y_1)).max(0.0)
    }

    pub fn iou(&self, other: &Self) -> f64 {
        let iwidth = (self.x_2.min(other.x_2) - self.x_1.max(other.x_1)).max(0.0);
        let iheight = (self.y_2.min(other.y_2) - self.y_1.max(other.y_1)).max(0.0);
        let iarea = iwidth * iheight;

        let union = self.area() + other.area() - iarea;

        if union == 0.0 {
            return 0.0;
        }

        iarea / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_new_bbox_returns_zero_bbox() {
        let bbox = BBox::new(3.0, 4.0, 2.0, 5.0);

        assert_eq!(bbox, BBox::default());
    }

    #[test]
    fn test_iou_of_disjoint_boxes_is_zero() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(20.0, 20.0, 30.0, 30.0);

        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_of_identical_boxes_is_one() {
        let a = BBox::new(5.0, 5.0, 15.0, 25.0);

        assert!((a.iou(&a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_iou_of_partially_overlapping_boxes() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 0.0, 15.0, 10.0);

        // overlap 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_observation_round_trip() {
        let bbox = BBox::new(10.0, 20.0, 50.0, 60.0);
        let mut state = SVector::<f64, 7>::zeros();
        state
            .fixed_rows_mut::<4>(0)
            .copy_from(&bbox.to_observation_vector());

        let rebuilt = BBox::from_state_vector(state);

        assert!((rebuilt.x_1 - bbox.x_1).abs() < 1e-9);
        assert!((rebuilt.y_2 - bbox.y_2).abs() < 1e-9);
    }

    #[test]
    fn test_zero_area_box_does_not_produce_nan() {
        let bbox = BBox::new(5.0, 5.0, 5.0, 5.0);
        let mut state = SVector::<f64, 7>::zeros();
        state
            .fixed_rows_mut::<4>(0)
            .copy_from(&bbox.to_observation_vector());

        let rebuilt = BBox::from_state_vector(state);

        assert!(rebuilt.x_1.is_finite());
        assert!(rebuilt.y_1.is_finite());
        assert!(rebuilt.area() >= 0.0);
    }

    #[test]
    fn test_center() {
        let bbox = BBox::new(0.0, 10.0, 10.0, 30.0);

        assert_eq!(bbox.center(), (5.0, 20.0));
    }
}
