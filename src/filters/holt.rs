//! Brown's double-exponential smoothing used as a linear-trend predictor.

use super::{frame_dt_s, nan_fallback, Kinematics, PointSmoother};
use crate::{
    config::HoltConfig,
    error::ConfigError,
    types::{Point2, SmoothInput, SmoothedObservation},
};

#[derive(Clone, Copy, Debug, PartialEq)]
struct HoltStats {
    /// Single-smoothed statistic S'.
    single: Point2,
    /// Double-smoothed statistic S''.
    double: Point2,
}

impl HoltStats {
    fn seeded(value: Point2) -> Self {
        Self {
            single: value,
            double: value,
        }
    }

    fn update(&mut self, value: Point2, alpha: f64) {
        let blend = |new: f64, old: f64| alpha * new + (1.0 - alpha) * old;
        self.single = Point2::new(
            blend(value.x, self.single.x),
            blend(value.y, self.single.y),
        );
        self.double = Point2::new(
            blend(self.single.x, self.double.x),
            blend(self.single.y, self.double.y),
        );
    }

    /// `b0 = 2S' - S''`.
    fn intercept(&self) -> Point2 {
        Point2::new(
            2.0 * self.single.x - self.double.x,
            2.0 * self.single.y - self.double.y,
        )
    }

    /// `b1 = α/(1-α) · (S' - S'')`, in units per frame.
    fn trend(&self, alpha: f64) -> Point2 {
        let gain = alpha / (1.0 - alpha);
        self.single.sub(self.double).scale(gain)
    }
}

#[derive(Clone, Debug)]
pub struct HoltSmoother {
    config: HoltConfig,
    stats: Option<HoltStats>,
    last_ts_ms: Option<u64>,
    last: Option<Kinematics>,
}

impl HoltSmoother {
    /// Fails when `alpha` is outside the open interval `(0, 1)`.
    pub fn new(config: HoltConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            stats: None,
            last_ts_ms: None,
            last: None,
        })
    }

    pub fn config(&self) -> &HoltConfig {
        &self.config
    }

    /// Forecast `horizon_ms` ahead of the last frame, unclamped.
    pub fn forecast(&self, horizon_ms: f64) -> Option<Point2> {
        self.last
            .map(|k| k.position.add_scaled(k.velocity, horizon_ms / 1_000.0))
    }
}

impl PointSmoother for HoltSmoother {
    fn smooth(&mut self, input: SmoothInput) -> SmoothedObservation {
        let Some(point) = input.point else {
            return SmoothedObservation::passthrough(input);
        };
        let value = point.xy();

        let dt = frame_dt_s(self.last_ts_ms, input.ts_ms, self.config.min_dt_s);
        self.last_ts_ms = Some(input.ts_ms);

        let (raw, velocity) = match (self.stats.as_mut(), dt) {
            (Some(stats), Some(dt)) => {
                stats.update(value, self.config.alpha);
                let per_frame = stats.trend(self.config.alpha);
                (stats.intercept(), per_frame.scale(1.0 / dt))
            }
            _ => {
                self.stats = Some(HoltStats::seeded(value));
                (value, Point2::ZERO)
            }
        };
        if raw.is_nan() || velocity.is_nan() {
            return nan_fallback(self, "holt", input);
        }

        let position = raw.clamp_unit();
        let predicted = raw
            .add_scaled(velocity, self.config.prediction_ms / 1_000.0)
            .clamp_unit();
        self.last = Some(Kinematics { position, velocity });
        SmoothedObservation {
            ts_ms: input.ts_ms,
            position: Some(position),
            velocity: Some(velocity),
            predicted: Some(predicted),
        }
    }

    fn reset(&mut self) {
        self.stats = None;
        self.last_ts_ms = None;
        self.last = None;
    }

    /// `param1` is alpha, `param2` the forecast horizon in ms.
    fn set_params(&mut self, param1: f64, param2: f64) -> Result<(), ConfigError> {
        let next = HoltConfig {
            alpha: param1,
            prediction_ms: param2,
            ..self.config
        };
        next.validate()?;
        self.config = next;
        Ok(())
    }

    fn kinematics(&self) -> Option<Kinematics> {
        self.last
    }
}
