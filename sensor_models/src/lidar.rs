//! Lidar: linear position observation z = [px, py].

use crate::observation::{ObservationModel, N_X};
use nalgebra::{Matrix2, SMatrix, Vector2};
use serde::{Deserialize, Serialize};

/// Lidar measurement vector [px, py]
pub type LidarVec = Vector2<f64>;
/// 2×2 lidar measurement covariance
pub type LidarCov = Matrix2<f64>;
/// 2×5 observation matrix
pub type LidarH = SMatrix<f64, 2, N_X>;

/// Lidar noise parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarParams {
    /// Position noise std dev along x (meters)
    pub std_px: f64,
    /// Position noise std dev along y (meters)
    pub std_py: f64,
}

impl Default for LidarParams {
    fn default() -> Self {
        Self {
            std_px: 0.15,
            std_py: 0.15,
        }
    }
}

impl LidarParams {
    pub fn new(std_px: f64, std_py: f64) -> Self {
        Self { std_px, std_py }
    }

    /// Observation matrix H selecting (px, py) from the state.
    pub fn h_matrix() -> LidarH {
        #[rustfmt::skip]
        let h = LidarH::new(
            1., 0., 0., 0., 0.,
            0., 1., 0., 0., 0.,
        );
        h
    }
}

impl ObservationModel for LidarParams {
    type Z = LidarVec;
    type R = LidarCov;

    fn r_matrix(&self) -> LidarCov {
        LidarCov::from_diagonal(&Vector2::new(
            self.std_px * self.std_px,
            self.std_py * self.std_py,
        ))
    }

    fn apply(&self, state: &[f64; N_X]) -> LidarVec {
        LidarVec::new(state[0], state[1])
    }

    fn residual(&self, measured: &LidarVec, predicted: &LidarVec) -> LidarVec {
        measured - predicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::SVector;

    #[test]
    fn h_selects_position() {
        let x = SVector::<f64, N_X>::new(4.0, -2.0, 7.0, 0.3, 0.1);
        let z = LidarParams::h_matrix() * x;
        assert_eq!(z, LidarVec::new(4.0, -2.0));
        assert_eq!(LidarParams::default().apply(&[4.0, -2.0, 7.0, 0.3, 0.1]), z);
    }

    #[test]
    fn r_is_diagonal_variance() {
        let r = LidarParams::new(0.1, 0.2).r_matrix();
        assert!((r[(0, 0)] - 0.01).abs() < 1e-12);
        assert!((r[(1, 1)] - 0.04).abs() < 1e-12);
        assert_eq!(r[(0, 1)], 0.0);
        assert_eq!(r[(1, 0)], 0.0);
    }
}
