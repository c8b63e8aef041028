//! Measurement logs: serialize/deserialize recorded runs for offline replay.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use ukf_core::{GroundTruth, Measurement};

/// One reading with the true kinematics at its timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub measurement: Measurement,
    pub ground_truth: GroundTruth,
}

/// A full recorded run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeasurementLog {
    pub scenario_name: String,
    pub seed: u64,
    /// Records in chronological order
    pub records: Vec<MeasurementRecord>,
}

/// Save a log to a JSON file.
pub fn save_log(log: &MeasurementLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load a log from a JSON file.
pub fn load_log(path: &Path) -> anyhow::Result<MeasurementLog> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let reader = BufReader::new(file);
    let log: MeasurementLog = serde_json::from_reader(reader)
        .with_context(|| format!("parsing log file {}", path.display()))?;
    Ok(log)
}
