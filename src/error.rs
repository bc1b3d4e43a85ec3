use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} = {value} is out of range, expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("{lower} must not exceed {upper}")]
    Ordering {
        lower: &'static str,
        upper: &'static str,
    },
    #[error("unknown smoother `{0}`, expected one of one_euro, spring, holt")]
    UnknownSmoother(String),
    #[error("unknown spring mode `{0}`, expected one of smoothed, predictive, adaptive")]
    UnknownSpringMode(String),
    #[error("unknown gesture label `{0}`")]
    UnknownGesture(String),
    #[error("unknown hand `{0}`, expected left, right or none")]
    UnknownHand(String),
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "a finite value > 0",
        })
    }
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "a finite value >= 0",
        })
    }
}

pub(crate) fn require_ordered(
    lower: &'static str,
    lower_value: f64,
    upper: &'static str,
    upper_value: f64,
) -> Result<(), ConfigError> {
    if lower_value <= upper_value {
        Ok(())
    } else {
        Err(ConfigError::Ordering { lower, upper })
    }
}
