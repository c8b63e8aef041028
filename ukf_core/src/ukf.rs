//! Unscented Kalman filter over the CTRV model, fusing lidar and radar.
//!
//! # Processing steps per measurement
//! 1. First measurement of any modality: initialize mean and covariance from
//!    the reading, no prediction or correction.
//! 2. Modality disabled: zero its NIS, discard the reading.
//! 3. Predict to the measurement timestamp (augmented sigma points through
//!    the CTRV model, moments reconstructed from the propagated points).
//! 4. Correct: linear Kalman update for lidar, unscented update for radar
//!    reusing the sigma points stored by step 3.
//!
//! Steps 3–4 are one transaction: if either fails the belief is restored.

use crate::ctrv::{self, ProcessNoise};
use crate::error::{FilterError, Result, Stage};
use crate::sigma::{self, YAW_INDEX};
use crate::types::{
    Measurement, MeasurementValue, RadarCrossCov, RadarSigmaPoints, SigmaPoints, StateCov,
    StateVec, Weights, N_SIGMA,
};
use sensor_models::radar::polar_to_cartesian;
use sensor_models::{
    normalize_angle, LidarParams, LidarVec, ObservationModel, RadarParams, RadarVec, SensorKind,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Prior used for the state components a single reading cannot observe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialPrior {
    /// Initial speed (m/s)
    pub v: f64,
    /// Initial heading (rad)
    pub yaw: f64,
    /// Initial yaw rate (rad/s)
    pub yaw_rate: f64,
    /// Speed variance
    pub var_v: f64,
    /// Heading variance
    pub var_yaw: f64,
    /// Yaw-rate variance
    pub var_yaw_rate: f64,
    /// Position variance after a first radar reading, as a fraction of the
    /// range variance. A coarse heuristic; tune per dataset.
    pub radar_position_scale: f64,
}

impl Default for InitialPrior {
    fn default() -> Self {
        let var_yaw = PI * PI / 64.0;
        Self {
            v: 3.0,
            yaw: 0.0,
            yaw_rate: 0.1,
            var_v: 1.0,
            var_yaw,
            var_yaw_rate: var_yaw / 10.0,
            radar_position_scale: 0.5,
        }
    }
}

/// Filter configuration. Fixed for the lifetime of the filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UkfConfig {
    /// When false, lidar readings are discarded (except to initialize)
    pub use_lidar: bool,
    /// When false, radar readings are discarded (except to initialize)
    pub use_radar: bool,
    pub process_noise: ProcessNoise,
    pub lidar: LidarParams,
    pub radar: RadarParams,
    pub prior: InitialPrior,
}

impl Default for UkfConfig {
    fn default() -> Self {
        Self {
            use_lidar: true,
            use_radar: true,
            process_noise: ProcessNoise::default(),
            lidar: LidarParams::default(),
            radar: RadarParams::default(),
            prior: InitialPrior::default(),
        }
    }
}

impl UkfConfig {
    pub fn is_enabled(&self, sensor: SensorKind) -> bool {
        match sensor {
            SensorKind::Lidar => self.use_lidar,
            SensorKind::Radar => self.use_radar,
        }
    }
}

// ---------------------------------------------------------------------------
// Belief
// ---------------------------------------------------------------------------

/// Everything a predict/update transaction mutates. Plain fixed-size data,
/// so a snapshot is a copy.
#[derive(Clone, Copy, Debug)]
struct Belief {
    x: StateVec,
    p: StateCov,
    /// Sigma points from the last prediction (radar update input)
    sigma_pred: SigmaPoints,
    /// True while `sigma_pred` describes the current (x, p)
    predicted: bool,
    timestamp_us: i64,
}

impl Belief {
    fn empty() -> Self {
        Self {
            x: StateVec::zeros(),
            p: StateCov::zeros(),
            sigma_pred: SigmaPoints::zeros(),
            predicted: false,
            timestamp_us: 0,
        }
    }
}

/// What [`UnscentedKalmanFilter::process_measurement`] did with a reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// The reading initialized the filter
    Initialized { sensor: SensorKind },
    /// Predict + correct ran; `nis` is the new statistic for `sensor`
    Updated { sensor: SensorKind, nis: f64 },
    /// The modality is disabled; the reading was discarded
    Skipped { sensor: SensorKind },
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// CTRV unscented Kalman filter.
#[derive(Clone, Debug)]
pub struct UnscentedKalmanFilter {
    config: UkfConfig,
    weights: Weights,
    belief: Belief,
    initialized: bool,
    nis_lidar: f64,
    nis_radar: f64,
}

impl Default for UnscentedKalmanFilter {
    fn default() -> Self {
        Self::new(UkfConfig::default())
    }
}

impl UnscentedKalmanFilter {
    pub fn new(config: UkfConfig) -> Self {
        Self {
            config,
            weights: sigma::weights(),
            belief: Belief::empty(),
            initialized: false,
            nis_lidar: 0.0,
            nis_radar: 0.0,
        }
    }

    pub fn config(&self) -> &UkfConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// State mean [px, py, v, yaw, yaw_rate]
    pub fn state(&self) -> &StateVec {
        &self.belief.x
    }

    pub fn covariance(&self) -> &StateCov {
        &self.belief.p
    }

    /// Timestamp (µs) the belief refers to
    pub fn timestamp_us(&self) -> i64 {
        self.belief.timestamp_us
    }

    pub fn predicted_sigma_points(&self) -> &SigmaPoints {
        &self.belief.sigma_pred
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Latest lidar NIS (2 dof)
    pub fn nis_lidar(&self) -> f64 {
        self.nis_lidar
    }

    /// Latest radar NIS (3 dof)
    pub fn nis_radar(&self) -> f64 {
        self.nis_radar
    }

    pub fn nis(&self, sensor: SensorKind) -> f64 {
        match sensor {
            SensorKind::Lidar => self.nis_lidar,
            SensorKind::Radar => self.nis_radar,
        }
    }

    fn set_nis(&mut self, sensor: SensorKind, nis: f64) {
        match sensor {
            SensorKind::Lidar => self.nis_lidar = nis,
            SensorKind::Radar => self.nis_radar = nis,
        }
    }

    /// Forget the belief; the next measurement initializes again.
    pub fn reset(&mut self) {
        self.belief = Belief::empty();
        self.initialized = false;
        self.nis_lidar = 0.0;
        self.nis_radar = 0.0;
    }

    /// Consume one measurement: initialize, skip, or predict + correct.
    pub fn process_measurement(&mut self, meas: &Measurement) -> Result<StepOutcome> {
        let sensor = meas.sensor();

        if !self.initialized {
            self.initialize(meas);
            return Ok(StepOutcome::Initialized { sensor });
        }

        if !self.config.is_enabled(sensor) {
            self.set_nis(sensor, 0.0);
            debug!(%sensor, timestamp_us = meas.timestamp_us, "sensor disabled, reading discarded");
            return Ok(StepOutcome::Skipped { sensor });
        }

        let snapshot = self.belief;
        let dt = (meas.timestamp_us - self.belief.timestamp_us) as f64 / 1_000_000.0;

        let result = self.predict(dt).and_then(|()| match meas.value {
            MeasurementValue::Lidar { px, py } => self.update_lidar(&LidarVec::new(px, py)),
            MeasurementValue::Radar { rho, phi, rho_dot } => {
                self.update_radar(&RadarVec::new(rho, phi, rho_dot))
            }
        });

        match result {
            Ok(nis) => {
                self.belief.timestamp_us = meas.timestamp_us;
                Ok(StepOutcome::Updated { sensor, nis })
            }
            Err(err) => {
                self.belief = snapshot;
                warn!(%sensor, timestamp_us = meas.timestamp_us, error = %err, "step failed, belief restored");
                Err(err)
            }
        }
    }

    fn initialize(&mut self, meas: &Measurement) {
        let prior = &self.config.prior;

        let mut x = StateVec::new(0.0, 0.0, prior.v, prior.yaw, prior.yaw_rate);
        let mut p = StateCov::identity();
        p[(2, 2)] = prior.var_v;
        p[(3, 3)] = prior.var_yaw;
        p[(4, 4)] = prior.var_yaw_rate;

        match meas.value {
            MeasurementValue::Radar { rho, phi, .. } => {
                let (px, py) = polar_to_cartesian(rho, phi);
                let std_rho = self.config.radar.std_rho;
                x[0] = px;
                x[1] = py;
                p[(0, 0)] = std_rho * std_rho * prior.radar_position_scale;
                p[(1, 1)] = std_rho * std_rho * prior.radar_position_scale;
                self.nis_radar = 0.0;
            }
            MeasurementValue::Lidar { px, py } => {
                let lidar = &self.config.lidar;
                x[0] = px;
                x[1] = py;
                p[(0, 0)] = lidar.std_px * lidar.std_px;
                p[(1, 1)] = lidar.std_py * lidar.std_py;
                self.nis_lidar = 0.0;
            }
        }

        self.belief = Belief {
            x,
            p,
            sigma_pred: SigmaPoints::zeros(),
            predicted: false,
            timestamp_us: meas.timestamp_us,
        };
        self.initialized = true;
        debug!(sensor = %meas.sensor(), timestamp_us = meas.timestamp_us, px = x[0], py = x[1], "filter initialized");
    }

    /// Time update by `dt` seconds. Overwrites mean, covariance and the
    /// stored predicted sigma points; the belief timestamp is left to the
    /// caller.
    pub fn predict(&mut self, dt: f64) -> Result<()> {
        self.ensure_initialized()?;
        if dt < 0.0 {
            warn!(dt, "negative time step, measurements are out of order");
        }

        let aug = sigma::augmented_sigma_points(
            &self.belief.x,
            &self.belief.p,
            &self.config.process_noise,
        )?;
        let sigma_pred = ctrv::predict_sigma_points(&aug, dt);
        let x = sigma::weighted_mean(&sigma_pred, &self.weights);
        let p = sigma::weighted_covariance(&sigma_pred, &x, &self.weights);
        ensure_finite(&x, &p, Stage::Prediction)?;

        self.belief.x = x;
        self.belief.p = p;
        self.belief.sigma_pred = sigma_pred;
        self.belief.predicted = true;
        Ok(())
    }

    /// Linear Kalman update with a lidar reading. Returns the lidar NIS.
    pub fn update_lidar(&mut self, z: &LidarVec) -> Result<f64> {
        self.ensure_initialized()?;
        if !self.config.use_lidar {
            self.nis_lidar = 0.0;
            return Ok(0.0);
        }

        let lidar = &self.config.lidar;
        let h = LidarParams::h_matrix();
        let x = self.belief.x;
        let p = self.belief.p;

        // Innovation: y = z − H·x
        let y = lidar.residual(z, &(h * x));

        // S = H·P·Hᵀ + R
        let hp = h * p;
        let s = hp * h.transpose() + lidar.r_matrix();
        let s_inv = s.try_inverse().ok_or(FilterError::SingularInnovation {
            sensor: SensorKind::Lidar,
        })?;

        // K = P·Hᵀ·S⁻¹
        let k = hp.transpose() * s_inv;

        let new_x = x + k * y;
        let new_p = symmetrize(p - k * hp);
        ensure_finite(&new_x, &new_p, Stage::LidarUpdate)?;

        let nis = y.dot(&(s_inv * y));
        self.belief.x = new_x;
        self.belief.p = new_p;
        self.belief.predicted = false;
        self.nis_lidar = nis;
        Ok(nis)
    }

    /// Unscented update with a radar reading, using the sigma points of the
    /// preceding prediction. Returns the radar NIS.
    pub fn update_radar(&mut self, z: &RadarVec) -> Result<f64> {
        self.ensure_initialized()?;
        if !self.config.use_radar {
            self.nis_radar = 0.0;
            return Ok(0.0);
        }
        if !self.belief.predicted {
            return Err(FilterError::NoPrediction);
        }

        let radar = &self.config.radar;
        let sigma_pred = &self.belief.sigma_pred;
        let x = self.belief.x;

        // Sigma points in measurement space
        let mut z_sig = RadarSigmaPoints::zeros();
        for i in 0..N_SIGMA {
            z_sig.set_column(i, &radar.apply(&sigma::state_column(sigma_pred, i)));
        }

        // Weighted mean taken relative to the centre point, so a bearing fan
        // straddling ±π averages correctly.
        let z_center = z_sig.column(0).into_owned();
        let mut z_pred = z_center;
        for i in 1..N_SIGMA {
            z_pred += self.weights[i] * radar.residual(&z_sig.column(i).into_owned(), &z_center);
        }
        z_pred[1] = normalize_angle(z_pred[1]);

        // Innovation covariance S and cross covariance Tc
        let mut s = radar.r_matrix();
        let mut tc = RadarCrossCov::zeros();
        for i in 0..N_SIGMA {
            let dz = radar.residual(&z_sig.column(i).into_owned(), &z_pred);
            let mut dx = sigma_pred.column(i) - x;
            dx[YAW_INDEX] = normalize_angle(dx[YAW_INDEX]);

            s += self.weights[i] * dz * dz.transpose();
            tc += self.weights[i] * dx * dz.transpose();
        }

        let s_inv = s.try_inverse().ok_or(FilterError::SingularInnovation {
            sensor: SensorKind::Radar,
        })?;
        let k = tc * s_inv;
        let y = radar.residual(z, &z_pred);

        let new_x = x + k * y;
        let new_p = symmetrize(self.belief.p - tc * k.transpose());
        ensure_finite(&new_x, &new_p, Stage::RadarUpdate)?;

        let nis = y.dot(&(s_inv * y));
        self.belief.x = new_x;
        self.belief.p = new_p;
        self.belief.predicted = false;
        self.nis_radar = nis;
        Ok(nis)
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(FilterError::NotInitialized)
        }
    }
}

fn symmetrize(p: StateCov) -> StateCov {
    (p + p.transpose()) * 0.5
}

fn ensure_finite(x: &StateVec, p: &StateCov, stage: Stage) -> Result<()> {
    if x.iter().chain(p.iter()).all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(FilterError::NonFinite { stage })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
