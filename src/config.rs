use core::str::FromStr;

use crate::error::{require_non_negative, require_ordered, require_positive, ConfigError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SmootherKind {
    #[default]
    OneEuro,
    Spring,
    Holt,
}

impl SmootherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneEuro => "one_euro",
            Self::Spring => "spring",
            Self::Holt => "holt",
        }
    }
}

impl FromStr for SmootherKind {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "one_euro" | "oneeuro" | "1euro" => Ok(Self::OneEuro),
            "spring" | "physics" => Ok(Self::Spring),
            "holt" | "double_exponential" => Ok(Self::Holt),
            other => Err(ConfigError::UnknownSmoother(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpringMode {
    #[default]
    Smoothed,
    Predictive,
    Adaptive,
}

impl SpringMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smoothed => "smoothed",
            Self::Predictive => "predictive",
            Self::Adaptive => "adaptive",
        }
    }
}

impl FromStr for SpringMode {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "smoothed" => Ok(Self::Smoothed),
            "predictive" => Ok(Self::Predictive),
            "adaptive" => Ok(Self::Adaptive),
            other => Err(ConfigError::UnknownSpringMode(other.to_string())),
        }
    }
}

/// 1€ filter tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OneEuroConfig {
    /// Hz. Lower is smoother at rest.
    pub min_cutoff: f64,
    /// Speed coefficient. Higher means less lag during fast motion.
    pub beta: f64,
    /// Hz, cutoff of the derivative filter.
    pub d_cutoff: f64,
    /// Initial sampling rate guess, replaced by `1/dt` once timestamps flow.
    pub frequency_hz: f64,
    pub min_dt_s: f64,
}

impl OneEuroConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("one_euro.min_cutoff", self.min_cutoff)?;
        require_non_negative("one_euro.beta", self.beta)?;
        require_positive("one_euro.d_cutoff", self.d_cutoff)?;
        require_positive("one_euro.frequency_hz", self.frequency_hz)?;
        require_positive("one_euro.min_dt_s", self.min_dt_s)
    }
}

/// Spring-damper integrator tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    pub mode: SpringMode,
    /// Pull toward the target, per second squared (unit mass).
    pub stiffness: f64,
    /// Linear damping, per second.
    pub damping: f64,
    pub substeps: u32,
    /// Look-ahead added to the output in predictive mode.
    pub prediction_ms: f64,
    pub min_stiffness: f64,
    pub max_stiffness: f64,
    /// Extra stiffness per unit/s of body speed in adaptive mode.
    pub speed_coefficient: f64,
    /// `set_params` multiplier: `min_stiffness = min_cutoff * stiffness_per_cutoff`.
    pub stiffness_per_cutoff: f64,
    /// `set_params` multiplier: `speed_coefficient = beta * stiffness_per_beta`.
    pub stiffness_per_beta: f64,
    /// Speeds below this (units/s) snap to rest.
    pub dead_zone: f64,
    pub min_dt_s: f64,
    pub max_dt_s: f64,
}

impl SpringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("spring.stiffness", self.stiffness)?;
        require_non_negative("spring.damping", self.damping)?;
        if self.substeps == 0 {
            return Err(ConfigError::OutOfRange {
                field: "spring.substeps",
                value: 0.0,
                expected: "at least 1",
            });
        }
        require_non_negative("spring.prediction_ms", self.prediction_ms)?;
        require_positive("spring.min_stiffness", self.min_stiffness)?;
        require_positive("spring.max_stiffness", self.max_stiffness)?;
        require_ordered(
            "spring.min_stiffness",
            self.min_stiffness,
            "spring.max_stiffness",
            self.max_stiffness,
        )?;
        require_non_negative("spring.speed_coefficient", self.speed_coefficient)?;
        require_positive("spring.stiffness_per_cutoff", self.stiffness_per_cutoff)?;
        require_non_negative("spring.stiffness_per_beta", self.stiffness_per_beta)?;
        require_non_negative("spring.dead_zone", self.dead_zone)?;
        require_positive("spring.min_dt_s", self.min_dt_s)?;
        require_positive("spring.max_dt_s", self.max_dt_s)?;
        require_ordered(
            "spring.min_dt_s",
            self.min_dt_s,
            "spring.max_dt_s",
            self.max_dt_s,
        )
    }
}

/// Double-exponential (Holt/Brown) predictor tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoltConfig {
    /// Smoothing factor, strictly inside `(0, 1)`.
    pub alpha: f64,
    /// Forecast horizon for the predicted position.
    pub prediction_ms: f64,
    pub min_dt_s: f64,
}

impl HoltConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "holt.alpha",
                value: self.alpha,
                expected: "a value in the open interval (0, 1)",
            });
        }
        require_non_negative("holt.prediction_ms", self.prediction_ms)?;
        require_positive("holt.min_dt_s", self.min_dt_s)
    }
}

/// Palm facing thresholds, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PalmGateConfig {
    /// Become facing below this angle.
    pub arm_deg: f64,
    /// Stop facing at or above this angle.
    pub disarm_deg: f64,
    /// Hard cancel at or above this angle, regardless of hysteresis.
    pub cancel_deg: f64,
}

impl PalmGateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("palm_gate.arm_deg", self.arm_deg),
            ("palm_gate.disarm_deg", self.disarm_deg),
            ("palm_gate.cancel_deg", self.cancel_deg),
        ] {
            if !(0.0..=180.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "degrees within [0, 180]",
                });
            }
        }
        require_ordered(
            "palm_gate.arm_deg",
            self.arm_deg,
            "palm_gate.disarm_deg",
            self.disarm_deg,
        )?;
        require_ordered(
            "palm_gate.disarm_deg",
            self.disarm_deg,
            "palm_gate.cancel_deg",
            self.cancel_deg,
        )
    }
}

/// Windows used to classify runs of `None` gestures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionConfig {
    pub none_debounce_ms: u64,
    pub long_none_ms: u64,
    pub typical_transition_ms: u64,
    /// Confidence reached at the end of the short-run ramp and where the
    /// long-run decay starts.
    pub jitter_ceiling: f64,
    /// Time constant of the exponential decay past `long_none_ms`.
    pub disengage_decay_ms: u64,
}

impl TransitionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive(
            "transition.none_debounce_ms",
            self.none_debounce_ms as f64,
        )?;
        if self.long_none_ms <= self.none_debounce_ms {
            return Err(ConfigError::Ordering {
                lower: "transition.none_debounce_ms",
                upper: "transition.long_none_ms",
            });
        }
        require_ordered(
            "transition.none_debounce_ms",
            self.none_debounce_ms as f64,
            "transition.typical_transition_ms",
            self.typical_transition_ms as f64,
        )?;
        require_ordered(
            "transition.typical_transition_ms",
            self.typical_transition_ms as f64,
            "transition.long_none_ms",
            self.long_none_ms as f64,
        )?;
        if !(self.jitter_ceiling > 0.0 && self.jitter_ceiling <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "transition.jitter_ceiling",
                value: self.jitter_ceiling,
                expected: "a value within (0, 1]",
            });
        }
        require_positive(
            "transition.disengage_decay_ms",
            self.disengage_decay_ms as f64,
        )
    }
}

/// Gesture state machine timing and confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FsmConfig {
    pub min_confidence: f64,
    pub arm_stable_ms: u64,
    pub cmd_window_ms: u64,
    /// Magnitude of the wheel delta emitted while zooming.
    pub wheel_delta: f64,
}

impl FsmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::OutOfRange {
                field: "fsm.min_confidence",
                value: self.min_confidence,
                expected: "a value within [0, 1]",
            });
        }
        if self.cmd_window_ms <= self.arm_stable_ms {
            return Err(ConfigError::Ordering {
                lower: "fsm.arm_stable_ms",
                upper: "fsm.cmd_window_ms",
            });
        }
        require_positive("fsm.wheel_delta", self.wheel_delta)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerConfig {
    pub smoother: SmootherKind,
    pub one_euro: OneEuroConfig,
    pub spring: SpringConfig,
    pub holt: HoltConfig,
    pub palm_gate: PalmGateConfig,
    pub transition: TransitionConfig,
    pub fsm: FsmConfig,
}

impl PointerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.one_euro.validate()?;
        self.spring.validate()?;
        self.holt.validate()?;
        self.palm_gate.validate()?;
        self.transition.validate()?;
        self.fsm.validate()
    }
}

include!(concat!(env!("OUT_DIR"), "/pointer_config.rs"));

pub fn active_config() -> &'static PointerConfig {
    &DEFAULT_POINTER_CONFIG
}

impl Default for PointerConfig {
    fn default() -> Self {
        DEFAULT_POINTER_CONFIG
    }
}

impl Default for OneEuroConfig {
    fn default() -> Self {
        DEFAULT_POINTER_CONFIG.one_euro
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        DEFAULT_POINTER_CONFIG.spring
    }
}

impl Default for HoltConfig {
    fn default() -> Self {
        DEFAULT_POINTER_CONFIG.holt
    }
}

impl Default for PalmGateConfig {
    fn default() -> Self {
        DEFAULT_POINTER_CONFIG.palm_gate
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        DEFAULT_POINTER_CONFIG.transition
    }
}

impl Default for FsmConfig {
    fn default() -> Self {
        DEFAULT_POINTER_CONFIG.fsm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_defaults_validate() {
        let config = PointerConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.smoother, SmootherKind::OneEuro);
        assert_eq!(config.fsm.arm_stable_ms, 200);
        assert_eq!(config.fsm.cmd_window_ms, 500);
        assert_eq!(config.palm_gate.arm_deg, 25.0);
        assert_eq!(config.palm_gate.disarm_deg, 35.0);
        assert_eq!(config.palm_gate.cancel_deg, 70.0);
        assert_eq!(config.spring.substeps, 4);
        assert_eq!(config.transition.jitter_ceiling, 0.3);
        assert_eq!(config.transition.disengage_decay_ms, 200);
    }

    #[test]
    fn spring_dt_bounds_must_be_finite() {
        let cfg = SpringConfig {
            max_dt_s: f64::INFINITY,
            ..SpringConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                field: "spring.max_dt_s",
                ..
            })
        ));
    }

    #[test]
    fn transition_decay_tunables_are_checked() {
        for jitter_ceiling in [0.0, 1.5, f64::NAN] {
            let cfg = TransitionConfig {
                jitter_ceiling,
                ..TransitionConfig::default()
            };
            assert!(cfg.validate().is_err(), "ceiling {jitter_ceiling}");
        }
        let cfg = TransitionConfig {
            disengage_decay_ms: 0,
            ..TransitionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_smoother_fails_at_selection() {
        let err = "kalman".parse::<SmootherKind>().expect_err("should fail");
        assert_eq!(err, ConfigError::UnknownSmoother("kalman".into()));
        assert_eq!("Spring".parse::<SmootherKind>(), Ok(SmootherKind::Spring));
        assert!("bouncy".parse::<SpringMode>().is_err());
    }

    #[test]
    fn holt_alpha_must_be_strictly_inside_unit_interval() {
        for alpha in [0.0, 1.0, -0.2, f64::NAN] {
            let cfg = HoltConfig {
                alpha,
                ..HoltConfig::default()
            };
            assert!(cfg.validate().is_err(), "alpha {alpha} should be rejected");
        }
    }

    #[test]
    fn gate_thresholds_must_be_ordered() {
        let cfg = PalmGateConfig {
            arm_deg: 40.0,
            ..PalmGateConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Ordering {
                lower: "palm_gate.arm_deg",
                upper: "palm_gate.disarm_deg",
            })
        );
    }
}
