use std::collections::HashSet;

use itertools::iproduct;
use pathfinding::prelude::{Matrix, kuhn_munkres_min};

use crate::{bbox::BBox, detection::Detection};

// used to convert small float costs to integers since the weight matrix of
// the hungarian algorithm only accepts integers.
const COST_MULTIPLIER: f64 = 10000.0;

/// Result of matching one frame's detections against the registry's
/// predicted boxes. Indices refer back into the input slices.
#[derive(Debug, Default, PartialEq)]
pub struct Association {
    pub matched: Vec<(usize, usize)>,
    pub unmatched_detections: Vec<usize>,
    pub unmatched_tracks: Vec<usize>,
}

/// Globally optimal one-to-one matching between detections and predicted
/// track boxes, cost `1 - IoU`, solved with the Kuhn-Munkres algorithm.
///
/// Pairs whose IoU falls below `iou_threshold` are rejected even when the
/// assignment picked them; both sides are then reported unmatched. No
/// detection is ever assigned to two tracks or vice versa.
pub fn associate_detections_to_tracks(
    detections: &[Detection],
    predictions: &[BBox],
    iou_threshold: f64,
) -> Association {
    if detections.is_empty() || predictions.is_empty() {
        return Association {
            matched: Vec::new(),
            unmatched_detections: (0..detections.len()).collect(),
            unmatched_tracks: (0..predictions.len()).collect(),
        };
    }

    let cost = iou_cost_matrix(detections, predictions);

    // kuhn_munkres_min needs rows <= columns, so flip the matrix when
    // detections outnumber tracks and map the indices back afterwards.
    let transpose = cost.rows > cost.columns;
    let weights = if transpose { cost.transposed() } else { cost };
    let (_, assignment) = kuhn_munkres_min(&weights);
    let assigned: HashSet<usize> = assignment.iter().copied().collect();

    let mut association = Association::default();

    for column in 0..weights.columns {
        if !assigned.contains(&column) {
            if transpose {
                association.unmatched_detections.push(column);
            } else {
                association.unmatched_tracks.push(column);
            }
        }
    }

    for (row, &column) in assignment.iter().enumerate() {
        let (detection_index, track_index) = if transpose {
            (column, row)
        } else {
            (row, column)
        };

        if detections[detection_index].bbox.iou(&predictions[track_index]) < iou_threshold {
            association.unmatched_detections.push(detection_index);
            association.unmatched_tracks.push(track_index);
        } else {
            association.matched.push((detection_index, track_index));
        }
    }

    association
}

fn iou_cost_matrix(detections: &[Detection], predictions: &[BBox]) -> Matrix<i64> {
    let mut matrix = Matrix::new(detections.len(), predictions.len(), 0i64);

    for (i, j) in iproduct!(0..detections.len(), 0..predictions.len()) {
        let iou = detections[i].bbox.iou(&predictions[j]);
        matrix[(i, j)] = ((1.0 - iou) * COST_MULTIPLIER) as i64;
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(x_1: f64, y_1: f64, x_2: f64, y_2: f64) -> Detection {
        Detection {
            bbox: BBox::new(x_1, y_1, x_2, y_2),
            score: 0.9,
            class: 2,
        }
    }

    #[test]
    fn test_empty_inputs_are_a_no_op() {
        let association = associate_detections_to_tracks(&[], &[], 0.3);

        assert_eq!(association, Association::default());
    }

    #[test]
    fn test_zero_tracks_leaves_all_detections_unmatched() {
        let detections = vec![detection(0.0, 0.0, 10.0, 10.0), detection(20.0, 0.0, 30.0, 10.0)];

        let association = associate_detections_to_tracks(&detections, &[], 0.3);

        assert_eq!(association.unmatched_detections, vec![0, 1]);
        assert!(association.matched.is_empty());
    }

    #[test]
    fn test_zero_detections_leaves_all_tracks_unmatched() {
        let predictions = vec![BBox::new(0.0, 0.0, 10.0, 10.0)];

        let association = associate_detections_to_tracks(&[], &predictions, 0.3);

        assert_eq!(association.unmatched_tracks, vec![0]);
        assert!(association.matched.is_empty());
    }

    #[test]
    fn test_clear_overlap_is_matched() {
        let detections = vec![detection(0.0, 0.0, 10.0, 10.0), detection(100.0, 0.0, 110.0, 10.0)];
        let predictions = vec![BBox::new(1.0, 0.0, 11.0, 10.0)];

        let association = associate_detections_to_tracks(&detections, &predictions, 0.3);

        assert_eq!(association.matched, vec![(0, 0)]);
        assert_eq!(association.unmatched_detections, vec![1]);
        assert!(association.unmatched_tracks.is_empty());
    }

    #[test]
    fn test_low_iou_assignment_is_gated_out() {
        let detections = vec![detection(50.0, 50.0, 60.0, 60.0)];
        let predictions = vec![BBox::new(0.0, 0.0, 10.0, 10.0)];

        let association = associate_detections_to_tracks(&detections, &predictions, 0.3);

        assert!(association.matched.is_empty());
        assert_eq!(association.unmatched_detections, vec![0]);
        assert_eq!(association.unmatched_tracks, vec![0]);
    }

    #[test]
    fn test_matching_is_one_to_one_under_overlap() {
        // Two detections both overlap both predictions; the solver must
        // still hand out distinct pairs, preferring the tighter fits.
        let detections = vec![detection(0.0, 0.0, 10.0, 10.0), detection(4.0, 0.0, 14.0, 10.0)];
        let predictions = vec![
            BBox::new(1.0, 0.0, 11.0, 10.0),
            BBox::new(5.0, 0.0, 15.0, 10.0),
        ];

        let association = associate_detections_to_tracks(&detections, &predictions, 0.1);

        assert_eq!(association.matched.len(), 2);
        let detection_indices: HashSet<usize> =
            association.matched.iter().map(|&(d, _)| d).collect();
        let track_indices: HashSet<usize> = association.matched.iter().map(|&(_, t)| t).collect();
        assert_eq!(detection_indices.len(), 2);
        assert_eq!(track_indices.len(), 2);
        assert!(association.matched.contains(&(0, 0)));
        assert!(association.matched.contains(&(1, 1)));
    }

    #[test]
    fn test_more_detections_than_tracks() {
        let detections = vec![
            detection(0.0, 0.0, 10.0, 10.0),
            detection(40.0, 0.0, 50.0, 10.0),
            detection(80.0, 0.0, 90.0, 10.0),
        ];
        let predictions = vec![BBox::new(40.0, 0.0, 50.0, 10.0)];

        let association = associate_detections_to_tracks(&detections, &predictions, 0.3);

        assert_eq!(association.matched, vec![(1, 0)]);
        let mut unmatched = association.unmatched_detections.clone();
        unmatched.sort_unstable();
        assert_eq!(unmatched, vec![0, 2]);
    }

    #[test]
    fn test_more_tracks_than_detections() {
        let detections = vec![detection(40.0, 0.0, 50.0, 10.0)];
        let predictions = vec![
            BBox::new(0.0, 0.0, 10.0, 10.0),
            BBox::new(40.0, 0.0, 50.0, 10.0),
            BBox::new(80.0, 0.0, 90.0, 10.0),
        ];

        let association = associate_detections_to_tracks(&detections, &predictions, 0.3);

        assert_eq!(association.matched, vec![(0, 1)]);
        let mut unmatched = association.unmatched_tracks.clone();
        unmatched.sort_unstable();
        assert_eq!(unmatched, vec![0, 2]);
    }
}
