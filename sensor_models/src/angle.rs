//! Angle wrapping.

use std::f64::consts::{PI, TAU};

/// Wrap an angle (radians) into the half-open interval `(−π, π]`.
///
/// Every heading or bearing *difference* must go through this before it is
/// squared into a covariance or multiplied by a gain.
pub fn normalize_angle(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}
