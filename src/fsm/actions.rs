use super::types::{Action, ActionKind, FsmContext, GestureStateId, PointerButton};
use crate::{config::FsmConfig, types::GestureLabel};

fn button_of(state: GestureStateId) -> Option<PointerButton> {
    match state {
        GestureStateId::DownCommit => Some(PointerButton::Primary),
        GestureStateId::DownNav => Some(PointerButton::Auxiliary),
        _ => None,
    }
}

fn wheel_delta(label: GestureLabel, config: &FsmConfig) -> f64 {
    match label {
        GestureLabel::ThumbUp => -config.wheel_delta,
        GestureLabel::ThumbDown => config.wheel_delta,
        _ => 0.0,
    }
}

/// Maps one step of the machine onto exactly one pointer intent by comparing
/// the state before and after the frame. `label` is the label the machine
/// saw on this frame.
pub fn derive_action(
    before: GestureStateId,
    after: GestureStateId,
    context: &FsmContext,
    label: GestureLabel,
    config: &FsmConfig,
) -> Action {
    let position = context.last_position;
    let kind = match (before, after) {
        (GestureStateId::Armed, next) if next.is_down() => match button_of(next) {
            Some(button) => ActionKind::Down { button, position },
            None => ActionKind::None,
        },
        (prev, GestureStateId::Armed) if prev.is_down() => match button_of(prev) {
            Some(button) => ActionKind::Up { button, position },
            None => ActionKind::None,
        },
        (prev, GestureStateId::Disarmed) if prev.is_down() => ActionKind::Cancel,
        (_, GestureStateId::Zoom) => ActionKind::Wheel {
            delta_y: wheel_delta(label, config),
            ctrl: true,
        },
        (_, GestureStateId::Arming) => ActionKind::None,
        (prev, next) if prev == next => match position {
            Some(position) => ActionKind::Move { position },
            None => ActionKind::None,
        },
        _ => ActionKind::None,
    };
    Action { state: after, kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point2;

    fn at(x: f64, y: f64) -> FsmContext {
        FsmContext {
            last_position: Some(Point2::new(x, y)),
            ..FsmContext::default()
        }
    }

    #[test]
    fn button_edges() {
        let config = FsmConfig::default();
        let ctx = at(0.2, 0.3);
        let down = derive_action(
            GestureStateId::Armed,
            GestureStateId::DownNav,
            &ctx,
            GestureLabel::Victory,
            &config,
        );
        assert_eq!(down.label(), "down(1)");
        assert_eq!(down.state, GestureStateId::DownNav);

        let up = derive_action(
            GestureStateId::DownCommit,
            GestureStateId::Armed,
            &ctx,
            GestureLabel::OpenPalm,
            &config,
        );
        assert_eq!(
            up.kind,
            ActionKind::Up {
                button: PointerButton::Primary,
                position: Some(Point2::new(0.2, 0.3)),
            }
        );
    }

    #[test]
    fn abnormal_exit_cancels_only_from_button_states() {
        let config = FsmConfig::default();
        let ctx = at(0.5, 0.5);
        for from in [GestureStateId::DownCommit, GestureStateId::DownNav] {
            let action =
                derive_action(from, GestureStateId::Disarmed, &ctx, GestureLabel::None, &config);
            assert_eq!(action.kind, ActionKind::Cancel);
        }
        for from in [GestureStateId::Zoom, GestureStateId::Armed, GestureStateId::Arming] {
            let action =
                derive_action(from, GestureStateId::Disarmed, &ctx, GestureLabel::None, &config);
            assert!(action.is_none(), "{from:?}");
        }
    }

    #[test]
    fn zoom_wheels_by_thumb_direction() {
        let config = FsmConfig::default();
        let ctx = at(0.5, 0.5);
        let wheel = |label| {
            derive_action(GestureStateId::Zoom, GestureStateId::Zoom, &ctx, label, &config).kind
        };
        assert_eq!(
            wheel(GestureLabel::ThumbUp),
            ActionKind::Wheel {
                delta_y: -100.0,
                ctrl: true
            }
        );
        assert_eq!(
            wheel(GestureLabel::ThumbDown),
            ActionKind::Wheel {
                delta_y: 100.0,
                ctrl: true
            }
        );
        assert_eq!(
            wheel(GestureLabel::None),
            ActionKind::Wheel {
                delta_y: 0.0,
                ctrl: true
            }
        );
    }

    #[test]
    fn steady_states_move_and_arming_is_silent() {
        let config = FsmConfig::default();
        let moving = derive_action(
            GestureStateId::Armed,
            GestureStateId::Armed,
            &at(0.1, 0.9),
            GestureLabel::OpenPalm,
            &config,
        );
        assert_eq!(
            moving.kind,
            ActionKind::Move {
                position: Point2::new(0.1, 0.9)
            }
        );

        let nowhere = derive_action(
            GestureStateId::Disarmed,
            GestureStateId::Disarmed,
            &FsmContext::default(),
            GestureLabel::None,
            &config,
        );
        assert!(nowhere.is_none());

        let arming = derive_action(
            GestureStateId::Arming,
            GestureStateId::Arming,
            &at(0.1, 0.9),
            GestureLabel::OpenPalm,
            &config,
        );
        assert!(arming.is_none());
    }
}
