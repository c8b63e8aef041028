//! Fundamental types used across the workspace.

use nalgebra::{SMatrix, SVector};
use sensor_models::{LidarVec, RadarVec};
use serde::{Deserialize, Serialize};

pub use sensor_models::{SensorKind, N_X};

// ---------------------------------------------------------------------------
// Dimensions. Everything below is a fixed-size nalgebra type, so a dimension
// mismatch is a compile error and nothing ever allocates.
// ---------------------------------------------------------------------------

/// Augmented state dimension: state + [nu_a, nu_yawdd]
pub const N_AUG: usize = 7;

/// Number of sigma points
pub const N_SIGMA: usize = 2 * N_AUG + 1;

/// Lidar measurement dimension
pub const N_Z_LIDAR: usize = 2;

/// Radar measurement dimension
pub const N_Z_RADAR: usize = 3;

/// CTRV state vector: [px, py, v, yaw, yaw_rate]
pub type StateVec = SVector<f64, N_X>;

/// 5×5 state covariance
pub type StateCov = SMatrix<f64, N_X, N_X>;

/// Augmented state vector: [px, py, v, yaw, yaw_rate, nu_a, nu_yawdd]
pub type AugStateVec = SVector<f64, N_AUG>;

/// 7×7 augmented covariance
pub type AugStateCov = SMatrix<f64, N_AUG, N_AUG>;

/// Augmented sigma points, one per column
pub type AugSigmaPoints = SMatrix<f64, N_AUG, N_SIGMA>;

/// Sigma points propagated through the process model, one per column
pub type SigmaPoints = SMatrix<f64, N_X, N_SIGMA>;

/// Sigma points mapped into radar measurement space
pub type RadarSigmaPoints = SMatrix<f64, N_Z_RADAR, N_SIGMA>;

/// State/radar-measurement cross covariance
pub type RadarCrossCov = SMatrix<f64, N_X, N_Z_RADAR>;

/// Sigma-point weights
pub type Weights = SVector<f64, N_SIGMA>;

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// One sensor reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Sensor timestamp in microseconds; non-decreasing across a stream
    pub timestamp_us: i64,
    /// Raw reading, tagged by modality
    pub value: MeasurementValue,
}

/// The raw reading carried by a [`Measurement`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sensor", rename_all = "lowercase")]
pub enum MeasurementValue {
    /// Cartesian position (meters)
    Lidar { px: f64, py: f64 },
    /// Range (m), bearing (rad) and range rate (m/s)
    Radar { rho: f64, phi: f64, rho_dot: f64 },
}

impl Measurement {
    pub fn lidar(timestamp_us: i64, px: f64, py: f64) -> Self {
        Self {
            timestamp_us,
            value: MeasurementValue::Lidar { px, py },
        }
    }

    pub fn radar(timestamp_us: i64, rho: f64, phi: f64, rho_dot: f64) -> Self {
        Self {
            timestamp_us,
            value: MeasurementValue::Radar { rho, phi, rho_dot },
        }
    }

    pub fn sensor(&self) -> SensorKind {
        self.value.sensor()
    }
}

impl MeasurementValue {
    pub fn sensor(&self) -> SensorKind {
        match self {
            MeasurementValue::Lidar { .. } => SensorKind::Lidar,
            MeasurementValue::Radar { .. } => SensorKind::Radar,
        }
    }

    /// The reading as a lidar vector, if it is one.
    pub fn as_lidar(&self) -> Option<LidarVec> {
        match *self {
            MeasurementValue::Lidar { px, py } => Some(LidarVec::new(px, py)),
            MeasurementValue::Radar { .. } => None,
        }
    }

    /// The reading as a radar vector, if it is one.
    pub fn as_radar(&self) -> Option<RadarVec> {
        match *self {
            MeasurementValue::Radar { rho, phi, rho_dot } => Some(RadarVec::new(rho, phi, rho_dot)),
            MeasurementValue::Lidar { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigma_count_matches_augmented_dim() {
        assert_eq!(N_SIGMA, 15);
        assert_eq!(N_AUG, N_X + 2);
    }

    #[test]
    fn measurement_json_is_tagged() {
        let m = Measurement::radar(1_000, 2.0, 0.1, -0.5);
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"sensor\":\"radar\""), "{json}");
        let back: Measurement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn reading_accessors() {
        let m = Measurement::lidar(0, 1.0, 2.0);
        assert_eq!(m.sensor(), SensorKind::Lidar);
        assert_eq!(m.value.as_lidar(), Some(LidarVec::new(1.0, 2.0)));
        assert_eq!(m.value.as_radar(), None);
    }
}
