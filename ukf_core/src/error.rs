//! Error type for the filter.

use sensor_models::SensorKind;
use std::fmt;
use thiserror::Error;

/// Step of the filter that produced non-finite numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Prediction,
    LidarUpdate,
    RadarUpdate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Prediction => f.write_str("prediction"),
            Stage::LidarUpdate => f.write_str("lidar update"),
            Stage::RadarUpdate => f.write_str("radar update"),
        }
    }
}

/// Errors that can occur while filtering.
///
/// All of them leave the belief as it was before the failing call when they
/// come out of [`UnscentedKalmanFilter::process_measurement`]; the caller
/// decides whether to keep going or reset.
///
/// [`UnscentedKalmanFilter::process_measurement`]: crate::ukf::UnscentedKalmanFilter::process_measurement
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter has not been initialized by a first measurement")]
    NotInitialized,

    #[error("radar update needs sigma points from a prediction of the current belief")]
    NoPrediction,

    #[error("augmented covariance is not positive definite (Cholesky failed)")]
    CovarianceNotPositiveDefinite,

    #[error("{sensor} innovation covariance is singular")]
    SingularInnovation { sensor: SensorKind },

    #[error("non-finite values produced during {stage}")]
    NonFinite { stage: Stage },
}

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;
