use core::str::FromStr;

use crate::error::ConfigError;

pub const LANDMARK_COUNT: usize = 21;
pub const WRIST: usize = 0;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const PINKY_MCP: usize = 17;

/// Normalized 2D point; both axes nominally in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const NEUTRAL: Point2 = Point2 { x: 0.5, y: 0.5 };
    pub const ZERO: Point2 = Point2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn is_nan(self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }

    pub fn clamp_unit(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }

    pub fn sub(self, other: Point2) -> Point2 {
        Point2::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, k: f64) -> Point2 {
        Point2::new(self.x * k, self.y * k)
    }

    pub fn add_scaled(self, v: Point2, k: f64) -> Point2 {
        Point2::new(self.x + v.x * k, self.y + v.y * k)
    }

    pub fn dot(self, other: Point2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }
}

/// One landmark as reported by the perception model.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: Option<f64>,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn xy(self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    pub fn xyz(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// The 21 hand landmarks of one detection, in model order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandLandmarks(pub [Landmark; LANDMARK_COUNT]);

impl HandLandmarks {
    /// Returns `None` when fewer than 21 landmarks are supplied.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        if points.len() < LANDMARK_COUNT {
            return None;
        }
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        out.copy_from_slice(&points[..LANDMARK_COUNT]);
        Some(Self(out))
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.0.get(index).copied()
    }

    pub fn index_tip(&self) -> Landmark {
        self.0[INDEX_TIP]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.0.iter()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HandId {
    Left,
    Right,
    #[default]
    None,
}

impl HandId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::None => "none",
        }
    }
}

impl FromStr for HandId {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "none" | "" => Ok(Self::None),
            other => Err(ConfigError::UnknownHand(other.to_string())),
        }
    }
}

/// Closed set of gesture classes produced by the recognizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    OpenPalm,
    PointingUp,
    Victory,
    ThumbUp,
    ThumbDown,
    ClosedFist,
    ILoveYou,
    #[default]
    None,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 8] = [
        Self::OpenPalm,
        Self::PointingUp,
        Self::Victory,
        Self::ThumbUp,
        Self::ThumbDown,
        Self::ClosedFist,
        Self::ILoveYou,
        Self::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPalm => "Open_Palm",
            Self::PointingUp => "Pointing_Up",
            Self::Victory => "Victory",
            Self::ThumbUp => "Thumb_Up",
            Self::ThumbDown => "Thumb_Down",
            Self::ClosedFist => "Closed_Fist",
            Self::ILoveYou => "ILoveYou",
            Self::None => "None",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_zoom(&self) -> bool {
        matches!(self, Self::ThumbUp | Self::ThumbDown)
    }
}

impl FromStr for GestureLabel {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConfigError::UnknownGesture(trimmed.to_string()))
    }
}

/// One sensing-collaborator output for one video frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawObservation {
    pub ts_ms: u64,
    pub hand: HandId,
    pub tracking_ok: bool,
    /// The sensing collaborator's own facing flag. Used only when landmarks
    /// are missing; otherwise the palm gate recomputes facing from geometry.
    pub palm_facing: bool,
    pub label: GestureLabel,
    pub confidence: f64,
    pub index_tip: Option<Landmark>,
    pub landmarks: Option<HandLandmarks>,
}

impl RawObservation {
    pub fn no_hand(ts_ms: u64) -> Self {
        Self {
            ts_ms,
            hand: HandId::None,
            tracking_ok: false,
            palm_facing: false,
            label: GestureLabel::None,
            confidence: 0.0,
            index_tip: None,
            landmarks: None,
        }
    }

    /// Clamps per-frame values into their documented ranges. Non-finite
    /// confidence becomes zero; a non-finite fingertip is dropped.
    pub fn sanitized(mut self) -> Self {
        self.confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self
            .index_tip
            .is_some_and(|tip| !(tip.x.is_finite() && tip.y.is_finite()))
        {
            self.index_tip = None;
        }
        self
    }

    /// Fingertip used for the cursor: explicit tip first, then landmark 8.
    pub fn pointer_tip(&self) -> Option<Landmark> {
        self.index_tip
            .or_else(|| self.landmarks.map(|hand| hand.index_tip()))
    }
}

/// Input contract of every smoothing strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothInput {
    pub ts_ms: u64,
    pub point: Option<Landmark>,
}

impl SmoothInput {
    pub const fn new(ts_ms: u64, point: Option<Landmark>) -> Self {
        Self { ts_ms, point }
    }

    pub fn at(ts_ms: u64, x: f64, y: f64) -> Self {
        Self {
            ts_ms,
            point: Some(Landmark::new(x, y, 0.0)),
        }
    }
}

/// Per-frame smoother output.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothedObservation {
    pub ts_ms: u64,
    pub position: Option<Point2>,
    /// Units per second.
    pub velocity: Option<Point2>,
    pub predicted: Option<Point2>,
}

impl SmoothedObservation {
    /// Unfiltered frame: the raw point clamped into range, no velocity.
    pub fn passthrough(input: SmoothInput) -> Self {
        let position = input
            .point
            .map(Landmark::xy)
            .filter(|p| p.is_finite())
            .map(Point2::clamp_unit);
        Self {
            ts_ms: input.ts_ms,
            position,
            velocity: None,
            predicted: None,
        }
    }
}

/// One sample of a constant-velocity extrapolation; `t_ms` is the offset
/// from the last observed frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryPoint {
    pub x: f64,
    pub y: f64,
    pub t_ms: f64,
}
