use statig::blocking::IntoStateMachineExt as _;
use tracing::debug;

use super::{
    actions::derive_action,
    events::GestureEvent,
    machine::{DispatchContext, GestureMachine},
    types::{Action, FsmContext, FsmInput, GestureStateId, TransitionReason},
};
use crate::{config::FsmConfig, error::ConfigError, types::GestureLabel};

/// Result of feeding one event to the machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FsmStep {
    pub before: GestureStateId,
    pub after: GestureStateId,
    pub reason: TransitionReason,
    pub action: Action,
    pub context: FsmContext,
}

impl FsmStep {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

pub struct GestureFsm {
    machine: statig::blocking::StateMachine<GestureMachine>,
}

impl Default for GestureFsm {
    fn default() -> Self {
        Self {
            machine: GestureMachine::new(FsmConfig::default()).state_machine(),
        }
    }
}

impl GestureFsm {
    pub fn new(config: FsmConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            machine: GestureMachine::new(config).state_machine(),
        })
    }

    pub fn config(&self) -> &FsmConfig {
        &self.machine.inner().config
    }

    pub fn state(&self) -> GestureStateId {
        self.machine.inner().state_id
    }

    pub fn context(&self) -> &FsmContext {
        &self.machine.inner().context
    }

    pub fn frame(&mut self, input: FsmInput) -> FsmStep {
        self.apply(GestureEvent::Frame(input), input.label)
    }

    pub fn disarm(&mut self, ts_ms: u64) -> FsmStep {
        self.apply(GestureEvent::Disarm { ts_ms }, GestureLabel::None)
    }

    fn apply(&mut self, event: GestureEvent, label: GestureLabel) -> FsmStep {
        let before = self.state();
        let mut dispatch = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut dispatch);
        let after = self.state();
        let context = *self.context();

        if before != after {
            debug!(
                ts_ms = event.ts_ms(),
                from = before.as_str(),
                to = after.as_str(),
                reason = dispatch.reason.as_str(),
                "gesture state changed"
            );
        }

        FsmStep {
            before,
            after,
            reason: dispatch.reason,
            action: derive_action(before, after, &context, label, self.config()),
            context,
        }
    }
}
