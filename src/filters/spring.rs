//! Substepped spring-damper integrator. A unit-mass body is pulled toward
//! the observed fingertip and damped linearly; the body's position is the
//! smoothed cursor.

use tracing::info;

use super::{frame_dt_s, nan_fallback, Kinematics, PointSmoother};
use crate::{
    config::{SpringConfig, SpringMode},
    error::{require_non_negative, require_ordered, require_positive, ConfigError},
    types::{Point2, SmoothInput, SmoothedObservation},
};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Body {
    position: Point2,
    velocity: Point2,
}

impl Body {
    const AT_REST: Body = Body {
        position: Point2::NEUTRAL,
        velocity: Point2::ZERO,
    };
}

#[derive(Clone, Debug)]
pub struct SpringSmoother {
    config: SpringConfig,
    ready: bool,
    seeded: bool,
    body: Body,
    target: Point2,
    last_ts_ms: Option<u64>,
    last: Option<Kinematics>,
}

impl SpringSmoother {
    pub fn new(config: SpringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ready: false,
            seeded: false,
            body: Body::AT_REST,
            target: Point2::NEUTRAL,
            last_ts_ms: None,
            last: None,
        })
    }

    /// Prepares the integrator. Frames smoothed before this completes pass
    /// through unfiltered.
    pub async fn init(&mut self) {
        self.mark_ready();
    }

    pub(crate) fn mark_ready(&mut self) {
        if self.ready {
            return;
        }
        self.body = Body::AT_REST;
        self.target = Point2::NEUTRAL;
        self.ready = true;
        info!(
            mode = self.config.mode.as_str(),
            substeps = self.config.substeps,
            "spring integrator ready"
        );
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    fn stiffness(&self) -> f64 {
        match self.config.mode {
            SpringMode::Adaptive => {
                let speed = self.body.velocity.length();
                (self.config.min_stiffness + self.config.speed_coefficient * speed)
                    .clamp(self.config.min_stiffness, self.config.max_stiffness)
            }
            SpringMode::Smoothed | SpringMode::Predictive => self.config.stiffness,
        }
    }

    fn step(&mut self, dt_s: f64) {
        let substeps = self.config.substeps.max(1);
        let h = dt_s / f64::from(substeps);
        let damping = 1.0 / (1.0 + self.config.damping * h);
        for _ in 0..substeps {
            let k = self.stiffness();
            let pull = self.target.sub(self.body.position);
            self.body.velocity = self.body.velocity.add_scaled(pull, k * h).scale(damping);
            self.body.position = self.body.position.add_scaled(self.body.velocity, h);
        }
        if self.body.velocity.length() < self.config.dead_zone {
            self.body.velocity = Point2::ZERO;
        }
    }
}

impl PointSmoother for SpringSmoother {
    fn smooth(&mut self, input: SmoothInput) -> SmoothedObservation {
        if !self.ready {
            return SmoothedObservation::passthrough(input);
        }
        let Some(point) = input.point else {
            return SmoothedObservation::passthrough(input);
        };
        let target = point.xy();
        if !target.is_finite() {
            return SmoothedObservation::passthrough(input);
        }
        self.target = target;

        match frame_dt_s(self.last_ts_ms, input.ts_ms, self.config.min_dt_s) {
            Some(dt) if self.seeded => self.step(dt.min(self.config.max_dt_s)),
            _ => {
                self.body = Body {
                    position: target,
                    velocity: Point2::ZERO,
                };
                self.seeded = true;
            }
        }
        self.last_ts_ms = Some(input.ts_ms);

        if self.body.position.is_nan() || self.body.velocity.is_nan() {
            return nan_fallback(self, "spring", input);
        }

        let position = self.body.position.clamp_unit();
        let velocity = self.body.velocity;
        let predicted = self
            .body
            .position
            .add_scaled(velocity, self.config.prediction_ms / 1_000.0)
            .clamp_unit();
        self.last = Some(Kinematics { position, velocity });

        let (position, predicted) = match self.config.mode {
            SpringMode::Predictive => (predicted, Some(predicted)),
            SpringMode::Smoothed | SpringMode::Adaptive => (position, None),
        };
        SmoothedObservation {
            ts_ms: input.ts_ms,
            position: Some(position),
            velocity: Some(velocity),
            predicted,
        }
    }

    /// Re-centers the body; an initialized integrator stays initialized.
    fn reset(&mut self) {
        self.body = Body::AT_REST;
        self.target = Point2::NEUTRAL;
        self.seeded = false;
        self.last_ts_ms = None;
        self.last = None;
    }

    /// `param1` is a 1€-style minimum cutoff, `param2` a 1€-style beta.
    /// They scale the rest stiffness and the adaptive speed coefficient.
    fn set_params(&mut self, param1: f64, param2: f64) -> Result<(), ConfigError> {
        require_positive("spring.min_cutoff", param1)?;
        require_non_negative("spring.beta", param2)?;
        let stiffness = param1 * self.config.stiffness_per_cutoff;
        require_ordered(
            "spring.min_stiffness",
            stiffness,
            "spring.max_stiffness",
            self.config.max_stiffness,
        )?;
        self.config.stiffness = stiffness;
        self.config.min_stiffness = stiffness;
        self.config.speed_coefficient = param2 * self.config.stiffness_per_beta;
        Ok(())
    }

    fn kinematics(&self) -> Option<Kinematics> {
        self.last
    }
}
