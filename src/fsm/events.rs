use super::types::FsmInput;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    Frame(FsmInput),
    /// Forces `DISARMED` from any state and clears the context.
    Disarm { ts_ms: u64 },
}

impl GestureEvent {
    pub fn ts_ms(&self) -> u64 {
        match self {
            Self::Frame(input) => input.ts_ms,
            Self::Disarm { ts_ms } => *ts_ms,
        }
    }
}
