//! Hand-landmark to pointer-event core: cursor smoothing and prediction, a
//! palm-orientation gate, a gesture-transition predictor and the gesture
//! state machine that decides move/down/up/cancel/wheel per frame.

pub mod config;
pub mod error;
pub mod filters;
pub mod fsm;
pub mod palm_gate;
pub mod pipeline;
pub mod transition;
pub mod types;

pub use config::{active_config, PointerConfig, SmootherKind, SpringMode};
pub use error::ConfigError;
pub use filters::{PointSmoother, Smoother, SmootherBank};
pub use fsm::{Action, ActionKind, GestureFsm, GestureStateId};
pub use pipeline::{Bounds, PipelineOutput, PointerPipeline, PointerSink, RecordingSink};
pub use types::{GestureLabel, HandId, HandLandmarks, Landmark, Point2, RawObservation};
