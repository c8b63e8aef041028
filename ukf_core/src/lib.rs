//! `ukf_core`: Unscented Kalman filter for lidar/radar fusion.
//!
//! # Module layout
//! - [`types`]      : Dimensions, fixed-size state/covariance types, measurements
//! - [`error`]      : Filter error type
//! - [`sigma`]      : Sigma-point weights, augmented sigma points, moment reconstruction
//! - [`ctrv`]       : CTRV process model and process-noise parameters
//! - [`ukf`]        : The estimator (initialize / predict / lidar + radar update)
//! - [`consistency`]: NIS χ² consistency statistics
//! - [`metrics`]    : RMSE against ground truth

pub mod consistency;
pub mod ctrv;
pub mod error;
pub mod metrics;
pub mod sigma;
pub mod types;
pub mod ukf;

pub use consistency::{NisMonitor, NisStats, CHI2_95};
pub use ctrv::ProcessNoise;
pub use error::{FilterError, Result, Stage};
pub use metrics::{GroundTruth, RmseAccumulator};
pub use sensor_models::{LidarParams, RadarParams, SensorKind};
pub use types::{Measurement, MeasurementValue, StateCov, StateVec};
pub use ukf::{InitialPrior, StepOutcome, UkfConfig, UnscentedKalmanFilter};
