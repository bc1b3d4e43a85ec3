use crate::types::{GestureLabel, Point2};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GestureStateId {
    #[default]
    Disarmed,
    Arming,
    Armed,
    DownCommit,
    DownNav,
    Zoom,
}

impl GestureStateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disarmed => "DISARMED",
            Self::Arming => "ARMING",
            Self::Armed => "ARMED",
            Self::DownCommit => "DOWN_COMMIT",
            Self::DownNav => "DOWN_NAV",
            Self::Zoom => "ZOOM",
        }
    }

    /// A button is held.
    pub fn is_down(&self) -> bool {
        matches!(self, Self::DownCommit | Self::DownNav)
    }

    /// A command is in progress.
    pub fn is_active(&self) -> bool {
        self.is_down() || matches!(self, Self::Zoom)
    }
}

/// Cross-frame memory of the machine. Cleared on every drop to `DISARMED`
/// that the transition table marks as clearing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FsmContext {
    pub baseline_stable_at: Option<u64>,
    pub armed_from_baseline: bool,
    pub last_position: Option<Point2>,
    pub current_ts: u64,
}

/// Payload of one `FRAME` event: already gated, debounced and smoothed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FsmInput {
    pub ts_ms: u64,
    pub tracking_ok: bool,
    pub palm_facing: bool,
    pub label: GestureLabel,
    pub confidence: f64,
    pub position: Option<Point2>,
}

impl FsmInput {
    pub fn lost(ts_ms: u64) -> Self {
        Self {
            ts_ms,
            tracking_ok: false,
            palm_facing: false,
            label: GestureLabel::None,
            confidence: 0.0,
            position: None,
        }
    }
}

/// Which table row fired on the last event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransitionReason {
    #[default]
    Hold,
    BaselineSeen,
    BaselineLost,
    BaselineStable,
    TrackingLost,
    PalmNotFacing,
    Commit,
    Navigate,
    Zoom,
    ReturnToBaseline,
    Disarm,
}

impl TransitionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::BaselineSeen => "baseline_seen",
            Self::BaselineLost => "baseline_lost",
            Self::BaselineStable => "baseline_stable",
            Self::TrackingLost => "tracking_lost",
            Self::PalmNotFacing => "palm_not_facing",
            Self::Commit => "commit",
            Self::Navigate => "navigate",
            Self::Zoom => "zoom",
            Self::ReturnToBaseline => "return_to_baseline",
            Self::Disarm => "disarm",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Button 0, used for commit.
    Primary,
    /// Button 1, used for navigation.
    Auxiliary,
}

impl PointerButton {
    pub fn index(&self) -> u8 {
        match self {
            Self::Primary => 0,
            Self::Auxiliary => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActionKind {
    None,
    Move {
        position: Point2,
    },
    Down {
        button: PointerButton,
        position: Option<Point2>,
    },
    Up {
        button: PointerButton,
        position: Option<Point2>,
    },
    Cancel,
    Wheel {
        delta_y: f64,
        ctrl: bool,
    },
}

/// One pointer intent; `state` is the machine state after the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Action {
    pub state: GestureStateId,
    pub kind: ActionKind,
}

impl Action {
    pub fn none(state: GestureStateId) -> Self {
        Self {
            state,
            kind: ActionKind::None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            ActionKind::None => "none",
            ActionKind::Move { .. } => "move",
            ActionKind::Down { .. } => "down",
            ActionKind::Up { .. } => "up",
            ActionKind::Cancel => "cancel",
            ActionKind::Wheel { .. } => "wheel",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self.kind, ActionKind::None)
    }

    /// Compact form used by replay traces, e.g. `down(0)` or `wheel(-100)`.
    pub fn label(&self) -> String {
        match self.kind {
            ActionKind::Down { button, .. } => format!("down({})", button.index()),
            ActionKind::Up { button, .. } => format!("up({})", button.index()),
            ActionKind::Wheel { delta_y, .. } => format!("wheel({delta_y})"),
            _ => self.name().to_string(),
        }
    }
}
