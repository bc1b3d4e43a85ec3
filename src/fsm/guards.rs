//! Side-effect-free predicates over the incoming frame and the context.

use super::types::{FsmContext, FsmInput};
use crate::{config::FsmConfig, types::GestureLabel};

/// Tracked, facing, confident `Open_Palm`.
pub fn baseline_ok(config: &FsmConfig, input: &FsmInput) -> bool {
    returning_to_baseline(input) && input.confidence >= config.min_confidence
}

/// The baseline pose has been held for at least `arm_stable_ms`.
pub fn baseline_stable(config: &FsmConfig, context: &FsmContext, now_ms: u64) -> bool {
    context
        .baseline_stable_at
        .is_some_and(|since| now_ms.saturating_sub(since) >= config.arm_stable_ms)
}

/// A command may still be accepted in this arm cycle.
pub fn command_window_ok(config: &FsmConfig, context: &FsmContext, now_ms: u64) -> bool {
    context.armed_from_baseline
        && context
            .baseline_stable_at
            .is_some_and(|since| now_ms.saturating_sub(since) <= config.cmd_window_ms)
}

pub fn tracking_lost(input: &FsmInput) -> bool {
    !input.tracking_ok
}

pub fn palm_not_facing(input: &FsmInput) -> bool {
    !input.palm_facing
}

/// Like [`baseline_ok`] without the confidence floor.
pub fn returning_to_baseline(input: &FsmInput) -> bool {
    input.tracking_ok && input.palm_facing && input.label == GestureLabel::OpenPalm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palm(ts_ms: u64, confidence: f64) -> FsmInput {
        FsmInput {
            ts_ms,
            tracking_ok: true,
            palm_facing: true,
            label: GestureLabel::OpenPalm,
            confidence,
            position: None,
        }
    }

    #[test]
    fn baseline_requires_confidence_but_return_does_not() {
        let config = FsmConfig::default();
        assert!(baseline_ok(&config, &palm(0, 0.7)));
        assert!(!baseline_ok(&config, &palm(0, 0.69)));
        assert!(returning_to_baseline(&palm(0, 0.1)));

        let away = FsmInput {
            palm_facing: false,
            ..palm(0, 0.9)
        };
        assert!(!baseline_ok(&config, &away));
        assert!(palm_not_facing(&away));
    }

    #[test]
    fn stability_and_window_bounds_are_inclusive() {
        let config = FsmConfig::default();
        let context = FsmContext {
            baseline_stable_at: Some(1_000),
            armed_from_baseline: true,
            ..FsmContext::default()
        };
        assert!(!baseline_stable(&config, &context, 1_199));
        assert!(baseline_stable(&config, &context, 1_200));
        assert!(command_window_ok(&config, &context, 1_500));
        assert!(!command_window_ok(&config, &context, 1_501));

        let stale = FsmContext {
            armed_from_baseline: false,
            ..context
        };
        assert!(!command_window_ok(&config, &stale, 1_100));
        assert!(!baseline_stable(&config, &FsmContext::default(), 5_000));
    }
}
