//! 1€ filter (Casiez, Roussel, Vogel 2012): a low-pass filter whose cutoff
//! rises with the filtered speed of the signal.

use core::f64::consts::PI;

use super::{frame_dt_s, nan_fallback, Kinematics, PointSmoother};
use crate::{
    config::OneEuroConfig,
    error::{require_non_negative, require_positive, ConfigError},
    types::{Point2, SmoothInput, SmoothedObservation},
};

/// `1 / (1 + tau / t_e)` with `tau = 1 / (2π·cutoff)` and `t_e = 1 / rate`.
pub(crate) fn smoothing_alpha(rate_hz: f64, cutoff_hz: f64) -> f64 {
    let te = 1.0 / rate_hz;
    let tau = 1.0 / (2.0 * PI * cutoff_hz);
    1.0 / (1.0 + tau / te)
}

#[derive(Clone, Copy, Debug, Default)]
struct LowPass {
    hat_prev: f64,
    initialized: bool,
}

impl LowPass {
    fn filter(&mut self, value: f64, alpha: f64) -> f64 {
        let hat = if self.initialized {
            alpha * value + (1.0 - alpha) * self.hat_prev
        } else {
            self.initialized = true;
            value
        };
        self.hat_prev = hat;
        hat
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct OneEuroAxis {
    value: LowPass,
    derivative: LowPass,
}

impl OneEuroAxis {
    /// Returns the filtered value and the filtered derivative (units/s).
    fn filter(&mut self, x: f64, rate_hz: f64, config: &OneEuroConfig) -> (f64, f64) {
        let dx = if self.value.initialized {
            (x - self.value.hat_prev) * rate_hz
        } else {
            0.0
        };
        let edx = self
            .derivative
            .filter(dx, smoothing_alpha(rate_hz, config.d_cutoff));
        let cutoff = config.min_cutoff + config.beta * edx.abs();
        let filtered = self.value.filter(x, smoothing_alpha(rate_hz, cutoff));
        (filtered, edx)
    }
}

#[derive(Clone, Debug)]
pub struct OneEuroSmoother {
    config: OneEuroConfig,
    x: OneEuroAxis,
    y: OneEuroAxis,
    rate_hz: f64,
    last_ts_ms: Option<u64>,
    last: Option<Kinematics>,
}

impl OneEuroSmoother {
    pub fn new(config: OneEuroConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            x: OneEuroAxis::default(),
            y: OneEuroAxis::default(),
            rate_hz: config.frequency_hz,
            last_ts_ms: None,
            last: None,
        })
    }

    pub fn config(&self) -> &OneEuroConfig {
        &self.config
    }

    /// Current sampling-rate estimate.
    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }
}

impl PointSmoother for OneEuroSmoother {
    fn smooth(&mut self, input: SmoothInput) -> SmoothedObservation {
        let Some(point) = input.point else {
            return SmoothedObservation::passthrough(input);
        };

        if let Some(dt) = frame_dt_s(self.last_ts_ms, input.ts_ms, self.config.min_dt_s) {
            self.rate_hz = 1.0 / dt;
        }
        self.last_ts_ms = Some(input.ts_ms);

        let (fx, dx) = self.x.filter(point.x, self.rate_hz, &self.config);
        let (fy, dy) = self.y.filter(point.y, self.rate_hz, &self.config);
        let raw = Point2::new(fx, fy);
        let velocity = Point2::new(dx, dy);
        if raw.is_nan() || velocity.is_nan() {
            return nan_fallback(self, "one_euro", input);
        }

        let position = raw.clamp_unit();
        self.last = Some(Kinematics { position, velocity });
        SmoothedObservation {
            ts_ms: input.ts_ms,
            position: Some(position),
            velocity: Some(velocity),
            predicted: None,
        }
    }

    fn reset(&mut self) {
        self.x = OneEuroAxis::default();
        self.y = OneEuroAxis::default();
        self.rate_hz = self.config.frequency_hz;
        self.last_ts_ms = None;
        self.last = None;
    }

    /// `param1` is the minimum cutoff (Hz), `param2` is beta.
    fn set_params(&mut self, param1: f64, param2: f64) -> Result<(), ConfigError> {
        require_positive("one_euro.min_cutoff", param1)?;
        require_non_negative("one_euro.beta", param2)?;
        self.config.min_cutoff = param1;
        self.config.beta = param2;
        Ok(())
    }

    fn kinematics(&self) -> Option<Kinematics> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother() -> OneEuroSmoother {
        OneEuroSmoother::new(OneEuroConfig::default()).expect("default config")
    }

    #[test]
    fn alpha_matches_closed_form() {
        // rate 60 Hz, cutoff 1 Hz: tau = 0.159.., te = 0.0166..
        let alpha = smoothing_alpha(60.0, 1.0);
        let expected = 1.0 / (1.0 + (1.0 / (2.0 * PI)) * 60.0);
        assert!((alpha - expected).abs() < 1e-12);
        assert!(alpha > 0.0 && alpha < 1.0);
    }

    #[test]
    fn constant_input_converges_to_value() {
        let mut f = smoother();
        let _ = f.smooth(SmoothInput::at(0, 0.2, 0.9));
        let mut last = None;
        for i in 1..=300u64 {
            last = f.smooth(SmoothInput::at(i * 16, 0.7, 0.3)).position;
        }
        let p = last.expect("position");
        assert!((p.x - 0.7).abs() < 1e-3, "x = {}", p.x);
        assert!((p.y - 0.3).abs() < 1e-3, "y = {}", p.y);
        let v = f.kinematics().expect("state").velocity;
        assert!(v.length() < 1e-2);
    }

    #[test]
    fn first_sample_is_returned_unfiltered() {
        let mut f = smoother();
        let out = f.smooth(SmoothInput::at(100, 0.42, 0.58));
        assert_eq!(out.position, Some(Point2::new(0.42, 0.58)));
        assert_eq!(out.velocity, Some(Point2::ZERO));
    }

    #[test]
    fn frequency_is_reestimated_from_timestamps() {
        let mut f = smoother();
        let _ = f.smooth(SmoothInput::at(0, 0.5, 0.5));
        let _ = f.smooth(SmoothInput::at(20, 0.5, 0.5));
        assert!((f.rate_hz() - 50.0).abs() < 1e-9);

        // Duplicate timestamp floors dt instead of dividing by zero.
        let _ = f.smooth(SmoothInput::at(20, 0.5, 0.5));
        assert!((f.rate_hz() - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn higher_beta_tracks_fast_motion_more_closely() {
        let mut slow = smoother();
        let mut fast = smoother();
        fast.set_params(1.0, 5.0).expect("valid params");

        let mut slow_out = 0.0;
        let mut fast_out = 0.0;
        for i in 0..10u64 {
            let x = 0.1 + 0.08 * i as f64;
            slow_out = slow.smooth(SmoothInput::at(i * 16, x, 0.5)).position.unwrap().x;
            fast_out = fast.smooth(SmoothInput::at(i * 16, x, 0.5)).position.unwrap().x;
        }
        let target = 0.1 + 0.08 * 9.0;
        assert!((target - fast_out).abs() < (target - slow_out).abs());
    }

    #[test]
    fn invalid_params_are_rejected_without_mutation() {
        let mut f = smoother();
        assert!(f.set_params(0.0, 0.1).is_err());
        assert!(f.set_params(1.0, -0.1).is_err());
        assert!(OneEuroSmoother::new(OneEuroConfig {
            frequency_hz: 0.0,
            ..OneEuroConfig::default()
        })
        .is_err());
        assert_eq!(f.config().min_cutoff, OneEuroConfig::default().min_cutoff);
    }
}
