//! Observation model trait and the sensor modality tag.
//!
//! # State layout seen by the sensors
//! x = [px, py, v, yaw, yaw_rate]ᵀ  (5-dimensional CTRV state)

use serde::{Deserialize, Serialize};
use std::fmt;

/// CTRV state dimension.
pub const N_X: usize = 5;

/// Which sensor produced a reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Cartesian position sensor, z = [px, py]
    Lidar,
    /// Polar sensor, z = [rho, phi, rho_dot]
    Radar,
}

impl SensorKind {
    /// Degrees of freedom of the reading (also the NIS χ² dof).
    pub fn dim(self) -> usize {
        match self {
            SensorKind::Lidar => 2,
            SensorKind::Radar => 3,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Lidar => f.write_str("lidar"),
            SensorKind::Radar => f.write_str("radar"),
        }
    }
}

/// A sensor's measurement function and noise model.
pub trait ObservationModel {
    /// Measurement vector
    type Z;
    /// Measurement noise covariance
    type R;

    /// Measurement noise covariance R
    fn r_matrix(&self) -> Self::R;
    /// Map a state to its expected measurement h(x)
    fn apply(&self, state: &[f64; N_X]) -> Self::Z;
    /// `measured − predicted`, with any angular component wrapped.
    fn residual(&self, measured: &Self::Z, predicted: &Self::Z) -> Self::Z;
}
