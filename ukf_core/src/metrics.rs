//! Accuracy metrics: RMSE of [px, py, vx, vy] against ground truth.

use crate::types::StateVec;
use serde::{Deserialize, Serialize};

/// Ground-truth kinematics at a measurement time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub px: f64,
    pub py: f64,
    pub vx: f64,
    pub vy: f64,
}

impl GroundTruth {
    pub fn as_array(&self) -> [f64; 4] {
        [self.px, self.py, self.vx, self.vy]
    }
}

/// Project a CTRV state onto [px, py, vx, vy].
pub fn cartesian_estimate(state: &StateVec) -> [f64; 4] {
    let v = state[2];
    let yaw = state[3];
    [state[0], state[1], v * yaw.cos(), v * yaw.sin()]
}

/// Accumulated squared errors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RmseAccumulator {
    /// Number of (estimate, truth) pairs
    pub n: u64,
    /// Per-component sum of squared errors
    pub sum_sq: [f64; 4],
}

impl RmseAccumulator {
    pub fn accumulate(&mut self, state: &StateVec, truth: &GroundTruth) {
        let est = cartesian_estimate(state);
        for (acc, (e, t)) in self.sum_sq.iter_mut().zip(est.iter().zip(truth.as_array())) {
            let d = e - t;
            *acc += d * d;
        }
        self.n += 1;
    }

    /// RMSE per component [px, py, vx, vy]; zeros when nothing was accumulated.
    pub fn rmse(&self) -> [f64; 4] {
        if self.n == 0 {
            return [0.0; 4];
        }
        self.sum_sq.map(|s| (s / self.n as f64).sqrt())
    }

    pub fn merge(&mut self, other: &RmseAccumulator) {
        self.n += other.n;
        for (a, b) in self.sum_sq.iter_mut().zip(other.sum_sq) {
            *a += b;
        }
    }
}
