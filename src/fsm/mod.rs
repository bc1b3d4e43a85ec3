//! Gesture state machine: turns per-frame pose observations into exactly one
//! pointer intent per frame.

pub mod actions;
pub mod engine;
pub mod events;
pub mod guards;
mod machine;
pub mod types;

pub use actions::derive_action;
pub use engine::{FsmStep, GestureFsm};
pub use events::GestureEvent;
pub use types::{
    Action, ActionKind, FsmContext, FsmInput, GestureStateId, PointerButton, TransitionReason,
};
