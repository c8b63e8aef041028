//! Driving loop: feed records to a filter and collect evaluation metrics.

use crate::replay::MeasurementRecord;
use sensor_models::SensorKind;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ukf_core::{NisMonitor, RmseAccumulator, StepOutcome, UkfConfig, UnscentedKalmanFilter};

/// Estimate after one processed record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepEstimate {
    pub timestamp_us: i64,
    pub sensor: SensorKind,
    /// [px, py, v, yaw, yaw_rate]
    pub state: [f64; 5],
    /// NIS of this step; 0 when the step did not update
    pub nis: f64,
}

/// Summary of a run over one record stream.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub records: usize,
    pub updates: usize,
    pub skipped: usize,
    /// Filter resets after numerical failures
    pub resets: usize,
    pub rmse: RmseAccumulator,
    pub nis: NisMonitor,
    /// Per-step estimates, only when requested
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub estimates: Vec<StepEstimate>,
}

impl RunReport {
    /// Fold another run's counters and metrics into this one (estimates are dropped).
    pub fn merge(&mut self, other: &RunReport) {
        self.records += other.records;
        self.updates += other.updates;
        self.skipped += other.skipped;
        self.resets += other.resets;
        self.rmse.merge(&other.rmse);
        self.nis.merge(&other.nis);
    }
}

/// Process `records` in order with a fresh filter.
///
/// A step that fails numerically is logged, the filter is reset and the next
/// record re-initializes it. RMSE is accumulated after every step that leaves
/// the filter initialized.
pub fn run_filter(config: &UkfConfig, records: &[MeasurementRecord], keep_estimates: bool) -> RunReport {
    let mut ukf = UnscentedKalmanFilter::new(config.clone());
    let mut report = RunReport {
        records: records.len(),
        ..Default::default()
    };

    for record in records {
        let meas = &record.measurement;
        let nis = match ukf.process_measurement(meas) {
            Ok(StepOutcome::Initialized { .. }) => 0.0,
            Ok(StepOutcome::Updated { sensor, nis }) => {
                report.updates += 1;
                report.nis.record(sensor, nis);
                nis
            }
            Ok(StepOutcome::Skipped { .. }) => {
                report.skipped += 1;
                0.0
            }
            Err(e) => {
                warn!(timestamp_us = meas.timestamp_us, sensor = %meas.sensor(), error = %e, "resetting filter");
                ukf.reset();
                report.resets += 1;
                continue;
            }
        };

        report.rmse.accumulate(ukf.state(), &record.ground_truth);
        if keep_estimates {
            let x = ukf.state();
            report.estimates.push(StepEstimate {
                timestamp_us: meas.timestamp_us,
                sensor: meas.sensor(),
                state: [x[0], x[1], x[2], x[3], x[4]],
                nis,
            });
        }
    }

    let rmse = report.rmse.rmse();
    info!(
        records = report.records,
        updates = report.updates,
        resets = report.resets,
        rmse_px = rmse[0],
        rmse_py = rmse[1],
        rmse_vx = rmse[2],
        rmse_vy = rmse[3],
        "run complete"
    );
    report
}
