//! Per-frame driver: palm gate, transition predictor and smoother feed the
//! gesture machine, which yields one [`Action`] per observation.

use tracing::debug;

use crate::{
    config::PointerConfig,
    error::ConfigError,
    filters::{PointSmoother, Smoother},
    fsm::{Action, ActionKind, FsmInput, FsmStep, GestureFsm, GestureStateId, TransitionReason},
    palm_gate::{PalmGate, PalmGateOutput, PalmGateState},
    transition::{GestureTransitionState, TransitionPrediction, TransitionPredictor},
    types::{GestureLabel, Point2, RawObservation, SmoothInput, SmoothedObservation},
};

/// Target rectangle in client pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Maps a normalized point into client pixels.
    pub fn to_client(&self, point: Point2) -> ClientPoint {
        let p = point.clamp_unit();
        ClientPoint {
            x: self.left + p.x * self.width,
            y: self.top + p.y * self.height,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClientPoint {
    pub x: f64,
    pub y: f64,
}

/// Emission boundary: turns actions into platform pointer or wheel events.
pub trait PointerSink {
    fn emit(&mut self, action: &Action, bounds: Bounds);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordedEvent {
    pub action: Action,
    pub client: Option<ClientPoint>,
}

/// Keeps every non-`none` action with its client position.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<RecordedEvent>,
}

impl PointerSink for RecordingSink {
    fn emit(&mut self, action: &Action, bounds: Bounds) {
        if action.is_none() {
            return;
        }
        let position = match action.kind {
            ActionKind::Move { position } => Some(position),
            ActionKind::Down { position, .. } | ActionKind::Up { position, .. } => position,
            ActionKind::None | ActionKind::Cancel | ActionKind::Wheel { .. } => None,
        };
        self.events.push(RecordedEvent {
            action: *action,
            client: position.map(|p| bounds.to_client(p)),
        });
    }
}

/// Diagnostics for one processed frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineTrace {
    pub ts_ms: u64,
    pub before: GestureStateId,
    pub after: GestureStateId,
    pub reason: TransitionReason,
    pub palm_angle: f64,
    pub facing: bool,
    pub hard_cancel: bool,
    pub raw_label: GestureLabel,
    pub effective_label: GestureLabel,
    pub debounced: bool,
    pub transition_confidence: f64,
    pub ms_in_none: u64,
    pub position: Option<Point2>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineOutput {
    pub action: Action,
    pub smoothed: SmoothedObservation,
    pub trace: PipelineTrace,
}

pub struct PointerPipeline {
    config: PointerConfig,
    gate: PalmGate,
    gate_state: PalmGateState,
    predictor: TransitionPredictor,
    transition_state: GestureTransitionState,
    last_valid: Option<(GestureLabel, f64)>,
    smoother: Smoother,
    fsm: GestureFsm,
    last_ts_ms: u64,
}

impl PointerPipeline {
    pub fn new(config: PointerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            gate: PalmGate::new(config.palm_gate)?,
            gate_state: PalmGateState::default(),
            predictor: TransitionPredictor::new(config.transition)?,
            transition_state: GestureTransitionState::default(),
            last_valid: None,
            smoother: Smoother::from_config(&config)?,
            fsm: GestureFsm::new(config.fsm)?,
            last_ts_ms: 0,
        })
    }

    pub async fn init(&mut self) {
        self.smoother.init().await;
    }

    pub fn config(&self) -> &PointerConfig {
        &self.config
    }

    pub fn state(&self) -> GestureStateId {
        self.fsm.state()
    }

    pub fn smoother(&self) -> &Smoother {
        &self.smoother
    }

    pub fn smoother_mut(&mut self) -> &mut Smoother {
        &mut self.smoother
    }

    pub fn process(&mut self, observation: &RawObservation) -> PipelineOutput {
        let obs = observation.sanitized();
        let ts_ms = obs.ts_ms;
        self.last_ts_ms = ts_ms;

        let gate = self.gate_frame(&obs);
        let prediction = self
            .predictor
            .process(self.transition_state, obs.label, ts_ms);
        self.transition_state = prediction.state;
        let (label, confidence, debounced) = self.effective_label(&obs, &prediction);

        let tip = if obs.tracking_ok { obs.pointer_tip() } else { None };
        let smoothed = self.smoother.smooth(SmoothInput::new(ts_ms, tip));

        let input = FsmInput {
            ts_ms,
            tracking_ok: obs.tracking_ok,
            palm_facing: gate.is_facing,
            label,
            confidence,
            position: smoothed.position,
        };
        let step = if gate.should_cancel && self.fsm.state().is_active() {
            debug!(ts_ms, angle = gate.palm_angle, "hard cancel aborts active gesture");
            self.fsm.disarm(ts_ms)
        } else {
            self.fsm.frame(input)
        };

        PipelineOutput {
            action: step.action,
            smoothed,
            trace: trace_of(ts_ms, &step, &gate, &obs, label, debounced, &prediction),
        }
    }

    /// Processes a frame and forwards its action to `sink`.
    pub fn process_into<S: PointerSink + ?Sized>(
        &mut self,
        observation: &RawObservation,
        sink: &mut S,
        bounds: Bounds,
    ) -> PipelineOutput {
        let out = self.process(observation);
        sink.emit(&out.action, bounds);
        out
    }

    /// Forces the machine back to `DISARMED`.
    pub fn disarm(&mut self, ts_ms: u64) -> FsmStep {
        self.last_ts_ms = ts_ms;
        self.fsm.disarm(ts_ms)
    }

    /// Clears every component's history and disarms.
    pub fn reset(&mut self) {
        self.gate_state = PalmGateState::default();
        self.transition_state = GestureTransitionState::default();
        self.last_valid = None;
        self.smoother.reset();
        let _ = self.fsm.disarm(self.last_ts_ms);
    }

    fn gate_frame(&mut self, obs: &RawObservation) -> PalmGateOutput {
        let out = self
            .gate
            .process(self.gate_state, obs.landmarks.as_ref(), obs.ts_ms);
        self.gate_state = out.state;
        if obs.landmarks.is_some() {
            return out;
        }
        PalmGateOutput {
            is_facing: obs.palm_facing,
            ..out
        }
    }

    fn effective_label(
        &mut self,
        obs: &RawObservation,
        prediction: &TransitionPrediction,
    ) -> (GestureLabel, f64, bool) {
        if !obs.label.is_none() {
            self.last_valid = Some((obs.label, obs.confidence));
            return (obs.label, obs.confidence, false);
        }
        match self.last_valid {
            Some((label, confidence)) if prediction.should_debounce && obs.tracking_ok => {
                (label, confidence, true)
            }
            _ => (obs.label, obs.confidence, false),
        }
    }
}

fn trace_of(
    ts_ms: u64,
    step: &FsmStep,
    gate: &PalmGateOutput,
    obs: &RawObservation,
    effective_label: GestureLabel,
    debounced: bool,
    prediction: &TransitionPrediction,
) -> PipelineTrace {
    PipelineTrace {
        ts_ms,
        before: step.before,
        after: step.after,
        reason: step.reason,
        palm_angle: gate.palm_angle,
        facing: gate.is_facing,
        hard_cancel: gate.should_cancel,
        raw_label: obs.label,
        effective_label,
        debounced,
        transition_confidence: prediction.confidence,
        ms_in_none: prediction.ms_in_none,
        position: step.context.last_position,
    }
}
