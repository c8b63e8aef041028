//! CTRV ("constant turn rate and velocity magnitude") process model.
//!
//! ## State vector
//! x = [px, py, v, ψ, ψ̇]ᵀ
//!
//! ## Deterministic part, integrated over Δt
//! |ψ̇| > ε:  px += v/ψ̇ · (sin(ψ + ψ̇Δt) − sin ψ)
//!           py += v/ψ̇ · (cos ψ − cos(ψ + ψ̇Δt))
//! else:     px += v·Δt·cos ψ,  py += v·Δt·sin ψ
//! ψ += ψ̇·Δt, v and ψ̇ constant.
//!
//! ## Noise part (augmented sigma-point components ν_a, ν_ψ̈)
//! px += ½Δt²·cos ψ·ν_a,  py += ½Δt²·sin ψ·ν_a,  v += Δt·ν_a
//! ψ  += ½Δt²·ν_ψ̈,       ψ̇ += Δt·ν_ψ̈

use crate::types::{AugSigmaPoints, AugStateVec, SigmaPoints, StateVec, N_SIGMA};
use serde::{Deserialize, Serialize};

/// Below this yaw-rate magnitude the straight-line integral is used.
pub const YAW_RATE_EPSILON: f64 = 0.001;

/// Process noise standard deviations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessNoise {
    /// Longitudinal acceleration noise std dev (m/s²)
    pub std_a: f64,
    /// Yaw acceleration noise std dev (rad/s²)
    pub std_yawdd: f64,
}

impl Default for ProcessNoise {
    fn default() -> Self {
        Self {
            std_a: 1.0,
            std_yawdd: 1.0,
        }
    }
}

impl ProcessNoise {
    pub fn new(std_a: f64, std_yawdd: f64) -> Self {
        Self { std_a, std_yawdd }
    }
}

/// Propagate one augmented point over `dt` seconds.
pub fn propagate(point: &AugStateVec, dt: f64) -> StateVec {
    let px = point[0];
    let py = point[1];
    let v = point[2];
    let yaw = point[3];
    let yawd = point[4];
    let nu_a = point[5];
    let nu_yawdd = point[6];

    let (mut px_p, mut py_p) = if yawd.abs() > YAW_RATE_EPSILON {
        (
            px + v / yawd * ((yaw + yawd * dt).sin() - yaw.sin()),
            py + v / yawd * (yaw.cos() - (yaw + yawd * dt).cos()),
        )
    } else {
        (px + v * dt * yaw.cos(), py + v * dt * yaw.sin())
    };
    let mut v_p = v;
    let mut yaw_p = yaw + yawd * dt;
    let mut yawd_p = yawd;

    let half_dt2 = 0.5 * dt * dt;
    px_p += half_dt2 * yaw.cos() * nu_a;
    py_p += half_dt2 * yaw.sin() * nu_a;
    v_p += dt * nu_a;
    yaw_p += half_dt2 * nu_yawdd;
    yawd_p += dt * nu_yawdd;

    StateVec::new(px_p, py_p, v_p, yaw_p, yawd_p)
}

/// Propagate every augmented sigma point; the result is the predicted
/// sigma-point matrix the radar update reuses.
pub fn predict_sigma_points(aug: &AugSigmaPoints, dt: f64) -> SigmaPoints {
    let mut predicted = SigmaPoints::zeros();
    for i in 0..N_SIGMA {
        let point = aug.column(i).into_owned();
        predicted.set_column(i, &propagate(&point, dt));
    }
    predicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn aug(px: f64, py: f64, v: f64, yaw: f64, yawd: f64) -> AugStateVec {
        AugStateVec::from_column_slice(&[px, py, v, yaw, yawd, 0.0, 0.0])
    }

    #[test]
    fn straight_line() {
        let next = propagate(&aug(1.0, 2.0, 4.0, 0.0, 0.0), 0.5);
        assert_abs_diff_eq!(next, StateVec::new(3.0, 2.0, 4.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn quarter_turn() {
        // v = 1, ψ̇ = π/2 for 1 s: quarter circle of radius 2/π
        let next = propagate(&aug(0.0, 0.0, 1.0, 0.0, FRAC_PI_2), 1.0);
        assert_abs_diff_eq!(next[0], 2.0 / PI, epsilon = 1e-12);
        assert_abs_diff_eq!(next[1], 2.0 / PI, epsilon = 1e-12);
        assert_abs_diff_eq!(next[3], FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(next[4], FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn tiny_yaw_rate_matches_zero() {
        let a = propagate(&aug(1.0, 1.0, 5.0, 0.7, 1e-10), 0.1);
        let b = propagate(&aug(1.0, 1.0, 5.0, 0.7, 0.0), 0.1);
        assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-9);
        assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-9);
    }

    #[test]
    fn branches_agree_at_threshold() {
        let above = propagate(&aug(0.0, 0.0, 1.0, 0.3, 1.1 * YAW_RATE_EPSILON), 0.1);
        let below = propagate(&aug(0.0, 0.0, 1.0, 0.3, 0.9 * YAW_RATE_EPSILON), 0.1);
        assert_abs_diff_eq!(above[0], below[0], epsilon = 1e-5);
        assert_abs_diff_eq!(above[1], below[1], epsilon = 1e-5);
    }

    #[test]
    fn noise_injection() {
        let mut p = aug(0.0, 0.0, 1.0, 0.0, 0.0);
        p[5] = 1.0;
        p[6] = 2.0;
        let next = propagate(&p, 2.0);
        // px: v·dt + ½dt²·ν_a = 2 + 2
        assert_abs_diff_eq!(next[0], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[2], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[3], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[4], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_dt_is_identity_on_state() {
        let mut p = aug(1.0, -2.0, 3.0, 0.4, 0.5);
        p[5] = 0.7;
        p[6] = -0.3;
        let next = propagate(&p, 0.0);
        assert_abs_diff_eq!(next, StateVec::new(1.0, -2.0, 3.0, 0.4, 0.5), epsilon = 1e-15);
    }

    #[test]
    fn predicts_every_column() {
        let mut points = AugSigmaPoints::zeros();
        for i in 0..N_SIGMA {
            points.set_column(i, &aug(i as f64, 0.0, 1.0, 0.0, 0.0));
        }
        let predicted = predict_sigma_points(&points, 1.0);
        for i in 0..N_SIGMA {
            assert_abs_diff_eq!(predicted[(0, i)], i as f64 + 1.0, epsilon = 1e-12);
        }
    }
}
