//! NIS consistency check.
//!
//! # Criterion
//! NIS = νᵀ S⁻¹ ν is χ²-distributed with dof = measurement dimension when the
//! filter's noise assumptions hold. A consistent filter exceeds the 95%
//! threshold on roughly 5% of updates and averages ≈ dof.
//!
//! # Threshold table (95%)
//! dof=2 (lidar): χ²(0.95, 2) ≈ 5.991
//! dof=3 (radar): χ²(0.95, 3) ≈ 7.815

use sensor_models::SensorKind;
use serde::{Deserialize, Serialize};

/// χ²(0.95, d) indexed by dimension [0..=5].
pub const CHI2_95: [f64; 6] = [0.0, 3.841, 5.991, 7.815, 9.488, 11.070];

/// Running NIS statistics for one sensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NisStats {
    pub sensor: SensorKind,
    /// Number of NIS samples
    pub count: u64,
    /// Sum of NIS samples
    pub sum: f64,
    /// Samples above χ²(0.95, dof)
    pub above_95: u64,
}

impl NisStats {
    pub fn new(sensor: SensorKind) -> Self {
        Self {
            sensor,
            count: 0,
            sum: 0.0,
            above_95: 0,
        }
    }

    pub fn threshold_95(&self) -> f64 {
        CHI2_95[self.sensor.dim()]
    }

    pub fn record(&mut self, nis: f64) {
        self.count += 1;
        self.sum += nis;
        if nis > self.threshold_95() {
            self.above_95 += 1;
        }
    }

    /// Mean NIS; expected ≈ dof.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    /// Fraction of samples above the 95% threshold; expected ≈ 0.05.
    pub fn fraction_above_95(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.above_95 as f64 / self.count as f64
    }

    /// Fold another accumulator for the same sensor into this one.
    pub fn merge(&mut self, other: &NisStats) {
        debug_assert_eq!(self.sensor, other.sensor);
        self.count += other.count;
        self.sum += other.sum;
        self.above_95 += other.above_95;
    }
}

/// NIS statistics for both sensors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NisMonitor {
    pub lidar: NisStats,
    pub radar: NisStats,
}

impl Default for NisMonitor {
    fn default() -> Self {
        Self {
            lidar: NisStats::new(SensorKind::Lidar),
            radar: NisStats::new(SensorKind::Radar),
        }
    }
}

impl NisMonitor {
    pub fn record(&mut self, sensor: SensorKind, nis: f64) {
        self.stats_mut(sensor).record(nis);
    }

    pub fn stats(&self, sensor: SensorKind) -> &NisStats {
        match sensor {
            SensorKind::Lidar => &self.lidar,
            SensorKind::Radar => &self.radar,
        }
    }

    fn stats_mut(&mut self, sensor: SensorKind) -> &mut NisStats {
        match sensor {
            SensorKind::Lidar => &mut self.lidar,
            SensorKind::Radar => &mut self.radar,
        }
    }

    pub fn merge(&mut self, other: &NisMonitor) {
        self.lidar.merge(&other.lidar);
        self.radar.merge(&other.radar);
    }
}
