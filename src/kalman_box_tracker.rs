use kfilter::{
    Kalman1M, KalmanPredict, measurement::LinearMeasurement, system::LinearNoInputSystem,
};
use nalgebra::{SMatrix, SVector};

use crate::bbox::BBox;

type BoxFilter =
    Kalman1M<f64, 7, 0, 4, LinearNoInputSystem<f64, 7>, LinearMeasurement<f64, 7, 4>>;

/// One tracked vehicle: a constant-velocity Kalman estimate of the box
/// center, area and aspect ratio, plus the lifecycle bookkeeping the
/// registry uses to confirm and age out tracks.
///
/// The cached `bbox` is only ever rewritten from the motion state; the
/// detection boxes themselves go through the filter.
pub struct KalmanBoxTracker {
    filter: BoxFilter,
    id: u32,
    bbox: BBox,
    hits: u32,
    age: u32,
    time_since_update: u32,
    confirmed: bool,
}

impl KalmanBoxTracker {
    /// Starts a track at the given detection box. IDs are handed out by the
    /// registry so they stay unique per run.
    #[allow(non_snake_case)]
    pub fn new(id: u32, bbox: BBox) -> Self {
        let z = bbox.to_observation_vector();

        // State [cx, cy, s, r, vcx, vcy, vs]: identity transition with
        // velocity coupling on center and scale, aspect ratio held constant.
        let mut F = SMatrix::<f64, 7, 7>::identity();
        F[(0, 4)] = 1.0;
        F[(1, 5)] = 1.0;
        F[(2, 6)] = 1.0;
        let Q_diag = SVector::<f64, 7>::from_vec(vec![1.0, 1.0, 1.0, 1.0, 0.01, 0.01, 0.0001]);
        let Q = SMatrix::<f64, 7, 7>::from_diagonal(&Q_diag);
        let mut x_initial = SVector::<f64, 7>::zeros();
        x_initial.fixed_rows_mut::<4>(0).copy_from(&z);
        let system = LinearNoInputSystem::new(F, Q, x_initial);

        // High initial uncertainty on the unobserved velocities.
        let P_diag =
            SVector::<f64, 7>::from_vec(vec![10.0, 10.0, 10.0, 10.0, 10000.0, 10000.0, 10000.0]);
        let P = SMatrix::<f64, 7, 7>::from_diagonal(&P_diag);

        let H = SMatrix::<f64, 4, 7>::identity();
        let R_diag = SVector::<f64, 4>::new(1.0, 1.0, 10.0, 10.0);
        let R = SMatrix::from_diagonal(&R_diag);
        let measurement = LinearMeasurement::new(H, R, z);

        let filter = Kalman1M::new_custom(system, P, measurement);

        Self {
            filter,
            id,
            bbox,
            hits: 1,
            age: 0,
            time_since_update: 0,
            confirmed: false,
        }
    }

    /// Advances the motion state one frame and returns the predicted box.
    /// A missed frame breaks the consecutive-hit streak.
    pub fn predict(&mut self) -> BBox {
        if self.time_since_update > 0 {
            self.hits = 0;
        }
        self.age += 1;
        self.time_since_update += 1;
        self.bbox = BBox::from_state_vector(self.filter.predict().clone_owned());
        self.bbox
    }

    /// Fuses a matched detection into the state estimate.
    pub fn update(&mut self, bbox: BBox) {
        self.hits += 1;
        self.time_since_update = 0;
        self.filter.update(bbox.to_observation_vector());
    }

    pub fn confirm(&mut self) {
        self.confirmed = true;
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}
