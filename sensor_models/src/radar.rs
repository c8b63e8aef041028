//! Radar: polar observation z = [rho, phi, rho_dot].
//!
//! h(x):
//! - rho     = √(px² + py²)            (floored at [`RANGE_FLOOR`])
//! - phi     = atan2(py, px)           (0 when rho is floored)
//! - rho_dot = (px·v·cos ψ + py·v·sin ψ) / rho

use crate::angle::normalize_angle;
use crate::observation::{ObservationModel, N_X};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Radar measurement vector [rho, phi, rho_dot]
pub type RadarVec = Vector3<f64>;
/// 3×3 radar measurement covariance
pub type RadarCov = Matrix3<f64>;

/// Smallest range used by the measurement function. Below it the bearing is
/// undefined, so it is forced to 0.
pub const RANGE_FLOOR: f64 = 0.001;

/// Radar noise parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarParams {
    /// Range noise std dev (meters)
    pub std_rho: f64,
    /// Bearing noise std dev (radians)
    pub std_phi: f64,
    /// Range-rate noise std dev (m/s)
    pub std_rho_dot: f64,
}

impl Default for RadarParams {
    fn default() -> Self {
        Self {
            std_rho: 0.3,
            std_phi: 0.03,
            std_rho_dot: 0.3,
        }
    }
}

impl RadarParams {
    pub fn new(std_rho: f64, std_phi: f64, std_rho_dot: f64) -> Self {
        Self {
            std_rho,
            std_phi,
            std_rho_dot,
        }
    }
}

/// Convert polar [rho, phi] to cartesian (x, y) in the sensor frame.
pub fn polar_to_cartesian(rho: f64, phi: f64) -> (f64, f64) {
    (rho * phi.cos(), rho * phi.sin())
}

impl ObservationModel for RadarParams {
    type Z = RadarVec;
    type R = RadarCov;

    fn r_matrix(&self) -> RadarCov {
        RadarCov::from_diagonal(&Vector3::new(
            self.std_rho * self.std_rho,
            self.std_phi * self.std_phi,
            self.std_rho_dot * self.std_rho_dot,
        ))
    }

    fn apply(&self, state: &[f64; N_X]) -> RadarVec {
        let [px, py, v, yaw, _] = *state;

        let mut rho = (px * px + py * py).sqrt();
        let phi = if rho < RANGE_FLOOR {
            rho = RANGE_FLOOR;
            0.0
        } else {
            py.atan2(px)
        };
        let rho_dot = (px * v * yaw.cos() + py * v * yaw.sin()) / rho;

        RadarVec::new(rho, phi, rho_dot)
    }

    fn residual(&self, measured: &RadarVec, predicted: &RadarVec) -> RadarVec {
        let mut diff = measured - predicted;
        diff[1] = normalize_angle(diff[1]);
        diff
    }
}
