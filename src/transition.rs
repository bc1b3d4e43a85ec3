//! Classifies runs of `None` gestures as either transition noise between two
//! named gestures or genuine disengagement.

use crate::{config::TransitionConfig, error::ConfigError, types::GestureLabel};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureTransitionState {
    pub last_valid_gesture: Option<GestureLabel>,
    pub none_entered_at: Option<u64>,
    pub last_valid_gesture_ts: Option<u64>,
    pub none_frame_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionPrediction {
    pub likely_next: Option<GestureLabel>,
    pub confidence: f64,
    pub ms_in_none: u64,
    pub is_disengagement: bool,
    pub should_debounce: bool,
    pub state: GestureTransitionState,
}

/// Hand-authored successor table keyed on the last named gesture.
pub fn likely_next(after: GestureLabel) -> Option<GestureLabel> {
    match after {
        GestureLabel::OpenPalm => Some(GestureLabel::PointingUp),
        GestureLabel::PointingUp
        | GestureLabel::Victory
        | GestureLabel::ThumbUp
        | GestureLabel::ThumbDown
        | GestureLabel::ClosedFist
        | GestureLabel::ILoveYou => Some(GestureLabel::OpenPalm),
        GestureLabel::None => None,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TransitionPredictor {
    config: TransitionConfig,
}

impl TransitionPredictor {
    pub fn new(config: TransitionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn process(
        &self,
        state: GestureTransitionState,
        gesture: GestureLabel,
        ts_ms: u64,
    ) -> TransitionPrediction {
        if !gesture.is_none() {
            return TransitionPrediction {
                likely_next: likely_next(gesture),
                confidence: 1.0,
                ms_in_none: 0,
                is_disengagement: false,
                should_debounce: false,
                state: GestureTransitionState {
                    last_valid_gesture: Some(gesture),
                    none_entered_at: None,
                    last_valid_gesture_ts: Some(ts_ms),
                    none_frame_count: 0,
                },
            };
        }

        // A run that just started is dated from the last named gesture.
        let entered = state
            .none_entered_at
            .or(state.last_valid_gesture_ts)
            .unwrap_or(ts_ms);
        let ms_in_none = ts_ms.saturating_sub(entered);
        let (confidence, is_disengagement, should_debounce) = self.classify(ms_in_none);

        TransitionPrediction {
            likely_next: state.last_valid_gesture.and_then(likely_next),
            confidence,
            ms_in_none,
            is_disengagement,
            should_debounce,
            state: GestureTransitionState {
                none_entered_at: Some(entered),
                none_frame_count: state.none_frame_count.saturating_add(1),
                ..state
            },
        }
    }

    /// `(confidence, is_disengagement, should_debounce)` for a `None` run.
    pub fn classify(&self, ms_in_none: u64) -> (f64, bool, bool) {
        let ms = ms_in_none as f64;
        let debounce = self.config.none_debounce_ms as f64;
        let long = self.config.long_none_ms as f64;
        let typical = self.config.typical_transition_ms as f64;
        let ceiling = self.config.jitter_ceiling;
        let decay = self.config.disengage_decay_ms as f64;

        if ms < debounce {
            (ceiling * ms / debounce, false, true)
        } else if ms >= long {
            (ceiling * (-(ms - long) / decay).exp(), true, false)
        } else {
            let distance = (ms - typical) / typical;
            (0.5 + 0.5 * (-2.0 * distance * distance).exp(), false, true)
        }
    }
}
