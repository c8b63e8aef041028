//! Sigma points for the augmented CTRV state.
//!
//! # Spread and weights
//! λ = 3 − n_aug, points x̄ and x̄ ± √(λ + n_aug)·Lᵢ where L·Lᵀ = P_aug.
//!
//! w₀ = λ / (λ + n_aug),  wᵢ = 1 / (2(λ + n_aug))  for i = 1..2·n_aug.
//! With n_aug = 7 the centre weight is negative (−4/3); the weights still
//! sum to one.

use crate::ctrv::ProcessNoise;
use crate::error::{FilterError, Result};
use crate::types::{
    AugSigmaPoints, AugStateCov, AugStateVec, SigmaPoints, StateCov, StateVec, Weights, N_AUG,
    N_X,
};
use sensor_models::normalize_angle;

/// Spreading parameter λ
pub const LAMBDA: f64 = 3.0 - N_AUG as f64;

/// Row of the heading in the state vector.
pub const YAW_INDEX: usize = 3;

/// Sigma-point weights, identical for mean and covariance.
pub fn weights() -> Weights {
    let mut w = Weights::repeat(0.5 / (LAMBDA + N_AUG as f64));
    w[0] = LAMBDA / (LAMBDA + N_AUG as f64);
    w
}

/// Build the augmented sigma points for mean `x` and covariance `p`.
///
/// The process-noise variances occupy the two extra diagonal entries of the
/// augmented covariance; cross terms with the state are zero.
pub fn augmented_sigma_points(
    x: &StateVec,
    p: &StateCov,
    noise: &ProcessNoise,
) -> Result<AugSigmaPoints> {
    let mut x_aug = AugStateVec::zeros();
    x_aug.fixed_rows_mut::<N_X>(0).copy_from(x);

    let mut p_aug = AugStateCov::zeros();
    p_aug.fixed_view_mut::<N_X, N_X>(0, 0).copy_from(p);
    p_aug[(N_X, N_X)] = noise.std_a * noise.std_a;
    p_aug[(N_X + 1, N_X + 1)] = noise.std_yawdd * noise.std_yawdd;

    let l = p_aug
        .cholesky()
        .ok_or(FilterError::CovarianceNotPositiveDefinite)?
        .l();

    let spread = (LAMBDA + N_AUG as f64).sqrt();
    let mut points = AugSigmaPoints::zeros();
    points.set_column(0, &x_aug);
    for i in 0..N_AUG {
        let offset = l.column(i) * spread;
        points.set_column(i + 1, &(x_aug + offset));
        points.set_column(i + 1 + N_AUG, &(x_aug - offset));
    }
    Ok(points)
}

/// Weighted mean of the predicted sigma points.
pub fn weighted_mean(points: &SigmaPoints, weights: &Weights) -> StateVec {
    points * weights
}

/// Weighted covariance of the predicted sigma points about `mean`, heading
/// differences wrapped into (−π, π].
pub fn weighted_covariance(points: &SigmaPoints, mean: &StateVec, weights: &Weights) -> StateCov {
    let mut p = StateCov::zeros();
    for (i, col) in points.column_iter().enumerate() {
        let mut diff = col - mean;
        diff[YAW_INDEX] = normalize_angle(diff[YAW_INDEX]);
        p += weights[i] * diff * diff.transpose();
    }
    p
}

/// Column `i` of a sigma-point matrix as a plain array, the layout the
/// observation models take.
pub fn state_column(points: &SigmaPoints, i: usize) -> [f64; N_X] {
    std::array::from_fn(|r| points[(r, i)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::N_SIGMA;
    use approx::assert_abs_diff_eq;

    fn sample_belief() -> (StateVec, StateCov) {
        let x = StateVec::new(5.7441, 1.3800, 2.2049, 0.5015, 0.3528);
        #[rustfmt::skip]
        let p = StateCov::new(
             0.0043, -0.0013,  0.0030, -0.0022, -0.0020,
            -0.0013,  0.0077,  0.0011,  0.0071,  0.0060,
             0.0030,  0.0011,  0.0054,  0.0007,  0.0008,
            -0.0022,  0.0071,  0.0007,  0.0098,  0.0100,
            -0.0020,  0.0060,  0.0008,  0.0100,  0.0123,
        );
        (x, p)
    }

    #[test]
    fn weights_sum_to_one() {
        let w = weights();
        assert_abs_diff_eq!(w.sum(), 1.0, epsilon = 1e-12);
        assert!(w[0] < 0.0);
        for i in 1..N_SIGMA {
            assert_abs_diff_eq!(w[i], 1.0 / 6.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn sigma_points_are_symmetric_about_mean() {
        let (x, p) = sample_belief();
        let noise = ProcessNoise::new(0.2, 0.2);
        let points = augmented_sigma_points(&x, &p, &noise).unwrap();

        for r in 0..N_X {
            assert_abs_diff_eq!(points[(r, 0)], x[r]);
        }
        assert_eq!(points[(N_X, 0)], 0.0);
        for i in 1..=N_AUG {
            let mid = (points.column(i) + points.column(i + N_AUG)) * 0.5;
            assert_abs_diff_eq!(mid, points.column(0).into_owned(), epsilon = 1e-12);
        }
    }

    #[test]
    fn known_augmented_column() {
        // √3 · √(std_a²) on the acceleration-noise axis
        let (x, p) = sample_belief();
        let noise = ProcessNoise::new(0.2, 0.2);
        let points = augmented_sigma_points(&x, &p, &noise).unwrap();
        assert_abs_diff_eq!(points[(N_X, N_X + 1)], 3f64.sqrt() * 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(points[(N_X, N_X + 1 + N_AUG)], -(3f64.sqrt()) * 0.2, epsilon = 1e-12);
    }

    #[test]
    fn recovers_moments() {
        // Unscented transform through the identity reproduces mean and covariance.
        let (x, p) = sample_belief();
        let noise = ProcessNoise::new(0.5, 0.3);
        let aug = augmented_sigma_points(&x, &p, &noise).unwrap();
        let points = SigmaPoints::from_fn(|r, c| aug[(r, c)]);

        let w = weights();
        let mean = weighted_mean(&points, &w);
        assert_abs_diff_eq!(mean, x, epsilon = 1e-12);
        let cov = weighted_covariance(&points, &mean, &w);
        assert_abs_diff_eq!(cov, p, epsilon = 1e-12);
    }

    #[test]
    fn not_positive_definite_is_an_error() {
        let x = StateVec::zeros();
        let p = StateCov::from_diagonal(&StateVec::new(1.0, -1.0, 1.0, 1.0, 1.0));
        let err = augmented_sigma_points(&x, &p, &ProcessNoise::default()).unwrap_err();
        assert_eq!(err, FilterError::CovarianceNotPositiveDefinite);
    }

    #[test]
    fn nan_covariance_is_an_error() {
        let x = StateVec::zeros();
        let mut p = StateCov::identity();
        p[(2, 2)] = f64::NAN;
        assert!(augmented_sigma_points(&x, &p, &ProcessNoise::default()).is_err());
    }

    #[test]
    fn state_column_matches_matrix() {
        let points = SigmaPoints::from_fn(|r, c| (r * 100 + c) as f64);
        assert_eq!(state_column(&points, 7), [7.0, 107.0, 207.0, 307.0, 407.0]);
    }
}
