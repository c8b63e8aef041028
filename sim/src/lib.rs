//! `sim`: Scenario simulator: CTRV target, lidar/radar readings, logs, datasets.

pub mod dataset;
pub mod replay;
pub mod run;
pub mod scenarios;
pub mod sensor_sim;
pub mod target;

pub use dataset::{load_dataset, read_dataset};
pub use replay::{load_log, save_log, MeasurementLog, MeasurementRecord};
pub use run::{run_filter, RunReport, StepEstimate};
pub use scenarios::{Scenario, ScenarioKind};
pub use sensor_sim::{SensorSimulator, SimSensor};
pub use target::{MotionSpec, Target};
