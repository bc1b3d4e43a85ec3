//! Cursor smoothing and short-horizon prediction.
//!
//! Three interchangeable strategies share one contract ([`PointSmoother`]):
//! a 1€ adaptive low-pass filter, a substepped spring-damper integrator and a
//! double-exponential (Holt/Brown) trend predictor. All of them clamp their
//! output into `[0, 1]`, pass frames without a fingertip straight through and
//! reset themselves instead of propagating NaN.

mod bank;
mod holt;
mod one_euro;
mod spring;
#[cfg(test)]
mod tests;

pub use bank::SmootherBank;
pub use holt::HoltSmoother;
pub use one_euro::OneEuroSmoother;
pub use spring::SpringSmoother;

use tracing::warn;

use crate::{
    config::{PointerConfig, SmootherKind},
    error::ConfigError,
    types::{Point2, SmoothInput, SmoothedObservation, TrajectoryPoint},
};

/// Below this distance a target counts as reached.
pub const TTI_EPSILON: f64 = 1e-6;

/// Last emitted position and velocity of a smoother.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Kinematics {
    pub position: Point2,
    /// Units per second.
    pub velocity: Point2,
}

pub trait PointSmoother {
    fn smooth(&mut self, input: SmoothInput) -> SmoothedObservation;

    /// Clears all history.
    fn reset(&mut self);

    /// Maps two generic tuning knobs onto strategy internals.
    fn set_params(&mut self, param1: f64, param2: f64) -> Result<(), ConfigError>;

    fn kinematics(&self) -> Option<Kinematics>;

    /// Milliseconds until `target` is reached at the current velocity.
    fn calculate_tti(&self, target: Point2) -> f64 {
        time_to_impact(self.kinematics(), target)
    }

    fn trajectory(&self, duration_ms: f64, steps: usize) -> Trajectory {
        Trajectory::new(self.kinematics(), duration_ms, steps)
    }

    fn predicted_trajectory(&self, duration_ms: f64, steps: usize) -> Vec<TrajectoryPoint> {
        self.trajectory(duration_ms, steps).collect()
    }
}

pub fn time_to_impact(state: Option<Kinematics>, target: Point2) -> f64 {
    let Some(state) = state else {
        return f64::INFINITY;
    };

    let to_target = target.sub(state.position);
    let distance = to_target.length();
    if distance < TTI_EPSILON {
        return 0.0;
    }

    let closing_speed = state.velocity.dot(to_target) / distance;
    if !(closing_speed > 0.0) {
        return f64::INFINITY;
    }
    distance / closing_speed * 1_000.0
}

/// Constant-velocity extrapolation, sampled at `steps` evenly spaced offsets
/// up to `duration_ms`. Cloning restarts it.
#[derive(Clone, Debug)]
pub struct Trajectory {
    state: Option<Kinematics>,
    duration_ms: f64,
    steps: usize,
    next: usize,
}

impl Trajectory {
    pub fn new(state: Option<Kinematics>, duration_ms: f64, steps: usize) -> Self {
        let usable = duration_ms.is_finite() && duration_ms > 0.0;
        Self {
            state,
            duration_ms,
            steps: if usable && state.is_some() { steps } else { 0 },
            next: 1,
        }
    }
}

impl Iterator for Trajectory {
    type Item = TrajectoryPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.steps {
            return None;
        }
        let state = self.state?;
        let t_ms = self.duration_ms * self.next as f64 / self.steps as f64;
        self.next += 1;
        let p = state
            .position
            .add_scaled(state.velocity, t_ms / 1_000.0)
            .clamp_unit();
        Some(TrajectoryPoint {
            x: p.x,
            y: p.y,
            t_ms,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.steps + 1).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Trajectory {}

/// Seconds between two frames, floored at `min_dt_s`. `None` on the first frame.
pub(crate) fn frame_dt_s(last_ts_ms: Option<u64>, ts_ms: u64, min_dt_s: f64) -> Option<f64> {
    last_ts_ms.map(|last| (ts_ms.saturating_sub(last) as f64 / 1_000.0).max(min_dt_s))
}

pub(crate) fn nan_fallback<S: PointSmoother + ?Sized>(
    smoother: &mut S,
    name: &'static str,
    input: SmoothInput,
) -> SmoothedObservation {
    warn!(smoother = name, ts_ms = input.ts_ms, "NaN in smoother output, resetting");
    smoother.reset();
    SmoothedObservation::passthrough(input)
}

/// Strategy selected by [`SmootherKind`].
#[derive(Clone, Debug)]
pub enum Smoother {
    OneEuro(OneEuroSmoother),
    Spring(SpringSmoother),
    Holt(HoltSmoother),
}

impl Smoother {
    pub fn from_config(config: &PointerConfig) -> Result<Self, ConfigError> {
        Self::build(config.smoother, config)
    }

    pub fn build(kind: SmootherKind, config: &PointerConfig) -> Result<Self, ConfigError> {
        Ok(match kind {
            SmootherKind::OneEuro => Self::OneEuro(OneEuroSmoother::new(config.one_euro)?),
            SmootherKind::Spring => Self::Spring(SpringSmoother::new(config.spring)?),
            SmootherKind::Holt => Self::Holt(HoltSmoother::new(config.holt)?),
        })
    }

    pub fn kind(&self) -> SmootherKind {
        match self {
            Self::OneEuro(_) => SmootherKind::OneEuro,
            Self::Spring(_) => SmootherKind::Spring,
            Self::Holt(_) => SmootherKind::Holt,
        }
    }

    /// Only the spring integrator needs initialization; the others are
    /// ready on construction.
    pub async fn init(&mut self) {
        if let Self::Spring(spring) = self {
            spring.init().await;
        }
    }

    pub fn is_ready(&self) -> bool {
        match self {
            Self::Spring(spring) => spring.is_ready(),
            _ => true,
        }
    }

    fn inner(&self) -> &dyn PointSmoother {
        match self {
            Self::OneEuro(s) => s,
            Self::Spring(s) => s,
            Self::Holt(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PointSmoother {
        match self {
            Self::OneEuro(s) => s,
            Self::Spring(s) => s,
            Self::Holt(s) => s,
        }
    }
}

impl PointSmoother for Smoother {
    fn smooth(&mut self, input: SmoothInput) -> SmoothedObservation {
        self.inner_mut().smooth(input)
    }

    fn reset(&mut self) {
        self.inner_mut().reset();
    }

    fn set_params(&mut self, param1: f64, param2: f64) -> Result<(), ConfigError> {
        self.inner_mut().set_params(param1, param2)
    }

    fn kinematics(&self) -> Option<Kinematics> {
        self.inner().kinematics()
    }
}
