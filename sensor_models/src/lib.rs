//! `sensor_models`: Lidar and radar observation models, noise parameters and
//! angle utilities shared by the filter and the simulator.

pub mod angle;
pub mod lidar;
pub mod observation;
pub mod radar;

pub use angle::normalize_angle;
pub use lidar::{LidarCov, LidarParams, LidarVec};
pub use observation::{ObservationModel, SensorKind, N_X};
pub use radar::{RadarCov, RadarParams, RadarVec};
