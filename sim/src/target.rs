//! Ground-truth target motion.
//!
//! The target carries a CTRV state [px, py, v, yaw, yaw_rate] and a
//! `MotionSpec` describing how speed and turn rate evolve. Integration is
//! exact for piecewise-constant acceleration and turn rate.

use serde::{Deserialize, Serialize};
use ukf_core::GroundTruth;

/// Describes target motion over time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MotionSpec {
    /// Constant speed and heading.
    ConstantVelocity,
    /// Constant speed, constant yaw rate `omega` (rad/s).
    ConstantTurn { omega: f64 },
    /// Longitudinal acceleration `accel` (m/s²) while turning at `omega`.
    Accelerate { accel: f64, omega: f64 },
    /// Switch motion model at given sim times.
    /// `segments` is sorted by time ascending: [(t_start, MotionSpec), ...].
    /// The active spec is the last one whose t_start <= current_t.
    Segmented {
        segments: Vec<(f64, Box<MotionSpec>)>,
    },
}

impl MotionSpec {
    /// (acceleration, yaw rate) in effect at time `t`.
    fn controls(&self, t: f64) -> (f64, f64) {
        match self {
            MotionSpec::ConstantVelocity => (0.0, 0.0),
            MotionSpec::ConstantTurn { omega } => (0.0, *omega),
            MotionSpec::Accelerate { accel, omega } => (*accel, *omega),
            MotionSpec::Segmented { segments } => segments
                .iter()
                .filter(|(t_start, _)| *t_start <= t)
                .last()
                .map_or((0.0, 0.0), |(_, spec)| spec.controls(t)),
        }
    }
}

/// A simulated target with ground-truth state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Target {
    /// True state [px, py, v, yaw, yaw_rate]
    pub state: [f64; 5],
    pub motion: MotionSpec,
}

impl Target {
    pub fn new(px: f64, py: f64, speed: f64, heading: f64, motion: MotionSpec) -> Self {
        let (_, omega) = motion.controls(0.0);
        Self {
            state: [px, py, speed, heading, omega],
            motion,
        }
    }

    /// Propagate the true state by `dt` seconds from time `t`.
    pub fn step(&mut self, t: f64, dt: f64) {
        let (accel, omega) = self.motion.controls(t);
        let [px, py, v, yaw, _] = self.state;

        // Sub-steps keep the accelerating turn accurate; speed is clamped at zero.
        const SUBSTEPS: usize = 10;
        let h = dt / SUBSTEPS as f64;
        let (mut px, mut py, mut v, mut yaw) = (px, py, v, yaw);
        for _ in 0..SUBSTEPS {
            let v_mid = (v + 0.5 * accel * h).max(0.0);
            if omega.abs() > 1e-9 {
                px += v_mid / omega * ((yaw + omega * h).sin() - yaw.sin());
                py += v_mid / omega * (yaw.cos() - (yaw + omega * h).cos());
            } else {
                px += v_mid * yaw.cos() * h;
                py += v_mid * yaw.sin() * h;
            }
            v = (v + accel * h).max(0.0);
            yaw += omega * h;
        }

        self.state = [px, py, v, yaw, omega];
    }

    pub fn ground_truth(&self) -> GroundTruth {
        let [px, py, v, yaw, _] = self.state;
        GroundTruth {
            px,
            py,
            vx: v * yaw.cos(),
            vy: v * yaw.sin(),
        }
    }
}
