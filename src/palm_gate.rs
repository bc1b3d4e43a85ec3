//! Palm-orientation gate: is the palm facing the camera, with hysteresis
//! between arming and disarming and a hard cancel on a fast roll-away.

use tracing::debug;

use crate::{
    config::PalmGateConfig,
    error::ConfigError,
    types::{HandLandmarks, INDEX_MCP, PINKY_MCP, WRIST},
};

/// Angle reported when no usable palm normal exists.
pub const DEGENERATE_ANGLE_DEG: f64 = 180.0;

const TOWARD_CAMERA: [f64; 3] = [0.0, 0.0, -1.0];
const MIN_NORMAL_LENGTH: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PalmGateState {
    pub is_facing: bool,
    pub last_palm_angle: f64,
    pub last_update_ts: Option<u64>,
}

impl Default for PalmGateState {
    fn default() -> Self {
        Self {
            is_facing: false,
            last_palm_angle: DEGENERATE_ANGLE_DEG,
            last_update_ts: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PalmGateOutput {
    pub is_facing: bool,
    /// Degrees between the palm normal and the camera axis.
    pub palm_angle: f64,
    pub should_cancel: bool,
    pub state: PalmGateState,
}

fn sub3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot3(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Angle in degrees between the palm normal (wrist→index-MCP ×
/// wrist→pinky-MCP) and the `(0, 0, -1)` camera axis. `None` when the
/// landmarks are non-finite or collinear.
pub fn palm_angle_deg(landmarks: &HandLandmarks) -> Option<f64> {
    let wrist = landmarks.get(WRIST)?.xyz();
    let index = landmarks.get(INDEX_MCP)?.xyz();
    let pinky = landmarks.get(PINKY_MCP)?.xyz();
    if wrist
        .iter()
        .chain(index.iter())
        .chain(pinky.iter())
        .any(|v| !v.is_finite())
    {
        return None;
    }

    let normal = cross3(sub3(index, wrist), sub3(pinky, wrist));
    let length = dot3(normal, normal).sqrt();
    if !(length > MIN_NORMAL_LENGTH) {
        return None;
    }
    let unit = normal.map(|v| v / length);
    let cos = dot3(unit, TOWARD_CAMERA).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Stateless gate; the caller threads [`PalmGateState`] through frames.
#[derive(Clone, Copy, Debug)]
pub struct PalmGate {
    config: PalmGateConfig,
}

impl PalmGate {
    pub fn new(config: PalmGateConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PalmGateConfig {
        &self.config
    }

    pub fn process(
        &self,
        state: PalmGateState,
        landmarks: Option<&HandLandmarks>,
        ts_ms: u64,
    ) -> PalmGateOutput {
        match landmarks.and_then(palm_angle_deg) {
            Some(angle) => self.apply_angle(state, angle, ts_ms),
            None => self.degenerate(state, ts_ms),
        }
    }

    /// Hysteresis step for an already computed angle.
    pub fn apply_angle(&self, state: PalmGateState, angle: f64, ts_ms: u64) -> PalmGateOutput {
        let is_facing = if state.is_facing {
            angle < self.config.disarm_deg
        } else {
            angle < self.config.arm_deg
        };
        let should_cancel = angle >= self.config.cancel_deg;

        if is_facing != state.is_facing {
            debug!(ts_ms, angle, is_facing, "palm gate flipped");
        }
        if should_cancel && state.last_palm_angle < self.config.cancel_deg {
            debug!(ts_ms, angle, "palm rolled past cancel threshold");
        }

        PalmGateOutput {
            is_facing,
            palm_angle: angle,
            should_cancel,
            state: PalmGateState {
                is_facing,
                last_palm_angle: angle,
                last_update_ts: Some(ts_ms),
            },
        }
    }

    fn degenerate(&self, state: PalmGateState, ts_ms: u64) -> PalmGateOutput {
        if state.is_facing {
            debug!(ts_ms, "palm gate lost landmarks");
        }
        PalmGateOutput {
            is_facing: false,
            palm_angle: DEGENERATE_ANGLE_DEG,
            should_cancel: false,
            state: PalmGateState {
                is_facing: false,
                last_palm_angle: DEGENERATE_ANGLE_DEG,
                last_update_ts: Some(ts_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, LANDMARK_COUNT};

    fn gate() -> PalmGate {
        PalmGate::new(PalmGateConfig::default()).expect("default thresholds")
    }

    /// Hand whose palm normal is tilted `tilt_deg` away from the camera axis.
    fn hand_tilted(tilt_deg: f64) -> HandLandmarks {
        let (sin, cos) = tilt_deg.to_radians().sin_cos();
        let mut points = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        points[INDEX_MCP] = Landmark::new(0.6, 0.5, 0.0);
        points[PINKY_MCP] = Landmark::new(0.5, 0.5 - 0.1 * cos, 0.1 * sin);
        HandLandmarks(points)
    }

    fn run(angles: &[f64]) -> Vec<bool> {
        let gate = gate();
        let mut state = PalmGateState::default();
        angles
            .iter()
            .enumerate()
            .map(|(i, &angle)| {
                let out = gate.apply_angle(state, angle, i as u64 * 16);
                state = out.state;
                out.is_facing
            })
            .collect()
    }

    #[test]
    fn geometry_recovers_tilt() {
        for tilt in [0.0, 20.0, 45.0, 90.0, 150.0] {
            let angle = palm_angle_deg(&hand_tilted(tilt)).expect("angle");
            assert!((angle - tilt).abs() < 1e-6, "tilt {tilt} gave {angle}");
        }
    }

    #[test]
    fn dead_band_does_not_arm() {
        assert_eq!(run(&[30.0, 30.0, 30.0]), vec![false, false, false]);
    }

    #[test]
    fn armed_gate_holds_inside_dead_band() {
        assert_eq!(run(&[20.0, 30.0, 30.0]), vec![true, true, true]);
        assert_eq!(run(&[20.0, 34.9, 35.0, 30.0]), vec![true, true, false, false]);
    }

    #[test]
    fn oscillation_inside_dead_band_never_toggles() {
        let wobble: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 26.0 } else { 34.0 }).collect();
        assert!(run(&wobble).iter().all(|facing| !facing));

        let mut armed = vec![10.0];
        armed.extend(wobble);
        assert!(run(&armed).iter().all(|facing| *facing));
    }

    #[test]
    fn hard_cancel_ignores_hysteresis() {
        let gate = gate();
        let facing = gate.apply_angle(PalmGateState::default(), 10.0, 0);
        let rolled = gate.apply_angle(facing.state, 75.0, 16);
        assert!(rolled.should_cancel);
        assert!(!rolled.is_facing);

        let mid = gate.apply_angle(PalmGateState::default(), 69.9, 0);
        assert!(!mid.should_cancel);
        assert!(gate.apply_angle(mid.state, 70.0, 16).should_cancel);
    }

    #[test]
    fn process_uses_landmark_geometry() {
        let gate = gate();
        let out = gate.process(PalmGateState::default(), Some(&hand_tilted(10.0)), 5);
        assert!(out.is_facing);
        assert!((out.palm_angle - 10.0).abs() < 1e-6);
        assert_eq!(out.state.last_update_ts, Some(5));
    }

    #[test]
    fn degenerate_input_is_not_facing_and_never_cancels() {
        let gate = gate();
        let armed = gate.apply_angle(PalmGateState::default(), 5.0, 0).state;

        let missing = gate.process(armed, None, 16);
        assert!(!missing.is_facing);
        assert_eq!(missing.palm_angle, DEGENERATE_ANGLE_DEG);
        assert!(!missing.should_cancel);

        let flat = HandLandmarks([Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT]);
        let collinear = gate.process(armed, Some(&flat), 32);
        assert_eq!(collinear.palm_angle, DEGENERATE_ANGLE_DEG);
        assert!(!collinear.should_cancel);

        let mut broken = hand_tilted(0.0);
        broken.0[WRIST].z = f64::NAN;
        assert!(palm_angle_deg(&broken).is_none());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let config = PalmGateConfig {
            disarm_deg: 80.0,
            ..PalmGateConfig::default()
        };
        assert!(PalmGate::new(config).is_err());
    }
}
