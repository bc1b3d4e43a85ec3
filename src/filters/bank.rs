use std::collections::BTreeMap;

use super::{PointSmoother, Smoother};
use crate::{
    config::{PointerConfig, SmootherKind},
    error::ConfigError,
    types::{HandLandmarks, SmoothInput, SmoothedObservation, LANDMARK_COUNT},
};

/// One smoother per tracked point, keyed by landmark index. Smoothers are
/// created on first use from a single kind and configuration.
#[derive(Clone, Debug)]
pub struct SmootherBank {
    kind: SmootherKind,
    config: PointerConfig,
    ready: bool,
    smoothers: BTreeMap<usize, Smoother>,
}

impl SmootherBank {
    pub fn new(kind: SmootherKind, config: PointerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            kind,
            config,
            ready: false,
            smoothers: BTreeMap::new(),
        })
    }

    pub fn kind(&self) -> SmootherKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.smoothers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smoothers.is_empty()
    }

    /// Initializes existing smoothers and every smoother created afterwards.
    pub async fn init(&mut self) {
        for smoother in self.smoothers.values_mut() {
            smoother.init().await;
        }
        self.ready = true;
    }

    pub fn get(&self, key: usize) -> Option<&Smoother> {
        self.smoothers.get(&key)
    }

    pub fn smooth_point(&mut self, key: usize, input: SmoothInput) -> SmoothedObservation {
        match self.entry(key) {
            Some(smoother) => smoother.smooth(input),
            None => SmoothedObservation::passthrough(input),
        }
    }

    pub fn smooth_landmarks(
        &mut self,
        ts_ms: u64,
        landmarks: &HandLandmarks,
    ) -> [SmoothedObservation; LANDMARK_COUNT] {
        let mut out = [SmoothedObservation::default(); LANDMARK_COUNT];
        for (key, (slot, landmark)) in out.iter_mut().zip(landmarks.iter()).enumerate() {
            *slot = self.smooth_point(key, SmoothInput::new(ts_ms, Some(*landmark)));
        }
        out
    }

    pub fn reset(&mut self) {
        for smoother in self.smoothers.values_mut() {
            smoother.reset();
        }
    }

    fn entry(&mut self, key: usize) -> Option<&mut Smoother> {
        if !self.smoothers.contains_key(&key) {
            // Config was validated in `new`, so construction cannot fail here.
            let mut smoother = Smoother::build(self.kind, &self.config).ok()?;
            if self.ready {
                mark_ready(&mut smoother);
            }
            self.smoothers.insert(key, smoother);
        }
        self.smoothers.get_mut(&key)
    }
}

/// Synchronous counterpart of [`Smoother::init`] for lazily created entries.
fn mark_ready(smoother: &mut Smoother) {
    if let Smoother::Spring(spring) = smoother {
        spring.mark_ready();
    }
}
