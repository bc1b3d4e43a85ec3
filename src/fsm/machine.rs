use statig::prelude::*;

use super::{
    events::GestureEvent,
    guards,
    types::{FsmContext, FsmInput, GestureStateId, TransitionReason},
};
use crate::{config::FsmConfig, types::GestureLabel};

#[derive(Clone, Copy, Debug)]
pub(super) struct GestureMachine {
    pub(super) config: FsmConfig,
    pub(super) context: FsmContext,
    pub(super) state_id: GestureStateId,
}

#[derive(Clone, Copy, Debug, Default)]
pub(super) struct DispatchContext {
    pub(super) reason: TransitionReason,
}

impl GestureMachine {
    pub(super) fn new(config: FsmConfig) -> Self {
        Self {
            config,
            context: FsmContext::default(),
            state_id: GestureStateId::Disarmed,
        }
    }

    fn goto(
        &mut self,
        dispatch: &mut DispatchContext,
        next: GestureStateId,
        reason: TransitionReason,
    ) -> Outcome<State> {
        self.state_id = next;
        dispatch.reason = reason;
        Transition(match next {
            GestureStateId::Disarmed => State::disarmed(),
            GestureStateId::Arming => State::arming(),
            GestureStateId::Armed => State::armed(),
            GestureStateId::DownCommit => State::down_commit(),
            GestureStateId::DownNav => State::down_nav(),
            GestureStateId::Zoom => State::zoom(),
        })
    }

    fn stay(&mut self, input: &FsmInput) -> Outcome<State> {
        self.update_position(input);
        Handled
    }

    fn observe(&mut self, input: &FsmInput) {
        self.context.current_ts = input.ts_ms;
    }

    fn update_position(&mut self, input: &FsmInput) {
        if let Some(position) = input.position {
            self.context.last_position = Some(position);
        }
    }

    fn clear_flags(&mut self) {
        self.context.baseline_stable_at = None;
        self.context.armed_from_baseline = false;
    }

    fn drop_to_disarmed(
        &mut self,
        dispatch: &mut DispatchContext,
        reason: TransitionReason,
    ) -> Outcome<State> {
        self.clear_flags();
        self.goto(dispatch, GestureStateId::Disarmed, reason)
    }

    fn back_to_armed(&mut self, dispatch: &mut DispatchContext, input: &FsmInput) -> Outcome<State> {
        self.context.armed_from_baseline = false;
        self.context.baseline_stable_at = Some(input.ts_ms);
        self.update_position(input);
        self.goto(
            dispatch,
            GestureStateId::Armed,
            TransitionReason::ReturnToBaseline,
        )
    }

    /// Shared row set of `DOWN_COMMIT` and `DOWN_NAV`.
    fn held_button(&mut self, dispatch: &mut DispatchContext, input: &FsmInput) -> Outcome<State> {
        if guards::tracking_lost(input) {
            return self.drop_to_disarmed(dispatch, TransitionReason::TrackingLost);
        }
        if guards::returning_to_baseline(input) {
            return self.back_to_armed(dispatch, input);
        }
        if guards::palm_not_facing(input) {
            return self.drop_to_disarmed(dispatch, TransitionReason::PalmNotFacing);
        }
        self.stay(input)
    }
}

#[state_machine(initial = "State::disarmed()")]
impl GestureMachine {
    #[state(superstate = "session")]
    fn disarmed(&mut self, context: &mut DispatchContext, event: &GestureEvent) -> Outcome<State> {
        let GestureEvent::Frame(input) = event else {
            return Super;
        };
        self.observe(input);
        if guards::baseline_ok(&self.config, input) {
            self.context.baseline_stable_at = Some(input.ts_ms);
            self.update_position(input);
            return self.goto(
                context,
                GestureStateId::Arming,
                TransitionReason::BaselineSeen,
            );
        }
        self.stay(input)
    }

    #[state(superstate = "session")]
    fn arming(&mut self, context: &mut DispatchContext, event: &GestureEvent) -> Outcome<State> {
        let GestureEvent::Frame(input) = event else {
            return Super;
        };
        self.observe(input);
        if !guards::baseline_ok(&self.config, input) {
            self.context.baseline_stable_at = None;
            return self.goto(
                context,
                GestureStateId::Disarmed,
                TransitionReason::BaselineLost,
            );
        }
        if guards::baseline_stable(&self.config, &self.context, input.ts_ms) {
            self.context.armed_from_baseline = true;
            self.update_position(input);
            return self.goto(
                context,
                GestureStateId::Armed,
                TransitionReason::BaselineStable,
            );
        }
        self.stay(input)
    }

    #[state(superstate = "session")]
    fn armed(&mut self, context: &mut DispatchContext, event: &GestureEvent) -> Outcome<State> {
        let GestureEvent::Frame(input) = event else {
            return Super;
        };
        self.observe(input);
        if guards::tracking_lost(input) {
            return self.drop_to_disarmed(context, TransitionReason::TrackingLost);
        }
        if guards::palm_not_facing(input) {
            return self.drop_to_disarmed(context, TransitionReason::PalmNotFacing);
        }

        let in_window = guards::command_window_ok(&self.config, &self.context, input.ts_ms);
        let command = match input.label {
            GestureLabel::PointingUp => Some((GestureStateId::DownCommit, TransitionReason::Commit)),
            GestureLabel::Victory => Some((GestureStateId::DownNav, TransitionReason::Navigate)),
            GestureLabel::ThumbUp | GestureLabel::ThumbDown => {
                Some((GestureStateId::Zoom, TransitionReason::Zoom))
            }
            _ => None,
        };
        match command {
            Some((next, reason)) if in_window => {
                self.update_position(input);
                self.goto(context, next, reason)
            }
            _ => self.stay(input),
        }
    }

    #[state(superstate = "session")]
    fn down_commit(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureEvent,
    ) -> Outcome<State> {
        let GestureEvent::Frame(input) = event else {
            return Super;
        };
        self.observe(input);
        self.held_button(context, input)
    }

    #[state(superstate = "session")]
    fn down_nav(&mut self, context: &mut DispatchContext, event: &GestureEvent) -> Outcome<State> {
        let GestureEvent::Frame(input) = event else {
            return Super;
        };
        self.observe(input);
        self.held_button(context, input)
    }

    #[state(superstate = "session")]
    fn zoom(&mut self, context: &mut DispatchContext, event: &GestureEvent) -> Outcome<State> {
        let GestureEvent::Frame(input) = event else {
            return Super;
        };
        self.observe(input);
        if guards::tracking_lost(input) {
            return self.drop_to_disarmed(context, TransitionReason::TrackingLost);
        }
        if guards::returning_to_baseline(input) {
            return self.back_to_armed(context, input);
        }
        self.stay(input)
    }

    #[superstate]
    fn session(&mut self, context: &mut DispatchContext, event: &GestureEvent) -> Outcome<State> {
        match event {
            GestureEvent::Disarm { ts_ms } => {
                self.context = FsmContext {
                    current_ts: *ts_ms,
                    ..FsmContext::default()
                };
                self.goto(context, GestureStateId::Disarmed, TransitionReason::Disarm)
            }
            GestureEvent::Frame(_) => Handled,
        }
    }
}
