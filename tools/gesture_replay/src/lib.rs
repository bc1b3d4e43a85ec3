use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{bail, Context, Result};
use palm_pointer::{
    pipeline::{ClientPoint, RecordingSink},
    types::{HandId, INDEX_MCP, INDEX_TIP, LANDMARK_COUNT, PINKY_MCP},
    Action, Bounds, GestureLabel, GestureStateId, HandLandmarks, Landmark, PointerConfig,
    PointerPipeline, RawObservation,
};

pub mod config;
pub mod logging;

pub const TRACE_HEADER: &str = "frame,ms,tracking,palm_facing,label,confidence,x,y";

/// One recorded frame. `palm_deg`, when present, is turned into a synthetic
/// landmark set so the palm gate sees real geometry. Without a `hand` column
/// a tracked frame is reported as the right hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayFrame {
    pub ms: u64,
    pub tracking: bool,
    pub palm_facing: bool,
    pub label: GestureLabel,
    pub confidence: f64,
    pub tip: Option<(f64, f64)>,
    pub palm_deg: Option<f64>,
    pub hand: Option<HandId>,
}

impl ReplayFrame {
    pub fn to_observation(&self) -> RawObservation {
        let index_tip = self.tip.map(|(x, y)| Landmark::new(x, y, 0.0));
        let landmarks = self
            .palm_deg
            .map(|deg| hand_with_palm_angle(deg, index_tip.unwrap_or_default()));
        RawObservation {
            ts_ms: self.ms,
            hand: match self.hand {
                Some(hand) => hand,
                None if self.tracking => HandId::Right,
                None => HandId::None,
            },
            tracking_ok: self.tracking,
            palm_facing: self.palm_facing,
            label: self.label,
            confidence: self.confidence,
            index_tip,
            landmarks,
        }
    }
}

/// Landmarks whose palm normal sits `palm_deg` away from the camera axis.
pub fn hand_with_palm_angle(palm_deg: f64, tip: Landmark) -> HandLandmarks {
    let (sin, cos) = palm_deg.to_radians().sin_cos();
    let mut points = [Landmark::new(0.5, 0.7, 0.0); LANDMARK_COUNT];
    points[INDEX_MCP] = Landmark::new(0.6, 0.7, 0.0);
    points[PINKY_MCP] = Landmark::new(0.5, 0.7 - 0.1 * cos, 0.1 * sin);
    points[INDEX_TIP] = tip;
    HandLandmarks(points)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayRow {
    pub ms: u64,
    pub state: GestureStateId,
    pub action: Action,
    pub client: Option<ClientPoint>,
}

impl ReplayRow {
    /// Button edges, cancels and wheel steps; everything but `none` and `move`.
    pub fn is_significant(&self) -> bool {
        !matches!(self.action.name(), "none" | "move")
    }
}

pub fn replay(
    config: PointerConfig,
    frames: &[ReplayFrame],
    bounds: Bounds,
) -> Result<Vec<ReplayRow>> {
    let mut pipeline = PointerPipeline::new(config).context("invalid pointer config")?;
    embassy_futures::block_on(pipeline.init());

    let mut sink = RecordingSink::default();
    let mut rows = Vec::with_capacity(frames.len());
    for frame in frames {
        let recorded = sink.events.len();
        let out = pipeline.process_into(&frame.to_observation(), &mut sink, bounds);
        let client = sink.events.get(recorded).and_then(|event| event.client);
        rows.push(ReplayRow {
            ms: frame.ms,
            state: out.trace.after,
            action: out.action,
            client,
        });
    }
    Ok(rows)
}

pub fn significant_labels(rows: &[ReplayRow]) -> Vec<String> {
    rows.iter()
        .filter(|row| row.is_significant())
        .map(|row| row.action.label())
        .collect()
}

pub fn parse_trace(path: &Path) -> Result<Vec<ReplayFrame>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line =
            line_result.with_context(|| format!("failed to read {}:{line_no}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(TRACE_HEADER) {
            continue;
        }
        let frame = parse_frame(trimmed)
            .with_context(|| format!("{}:{line_no} invalid trace line", path.display()))?;
        if let Some(frame) = frame {
            out.push(frame);
        }
    }

    if out.windows(2).any(|pair| pair[1].ms < pair[0].ms) {
        bail!("{}: timestamps must be non-decreasing", path.display());
    }
    Ok(out)
}

/// Parses one CSV row; rows not tagged `frame` are skipped. Trailing
/// `palm_deg` and `hand` columns are optional.
pub fn parse_frame(line: &str) -> Result<Option<ReplayFrame>> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.first() != Some(&"frame") {
        return Ok(None);
    }
    if parts.len() < 8 {
        bail!("expected at least 8 columns, got {}", parts.len());
    }

    let ms = parts[1]
        .parse::<u64>()
        .with_context(|| format!("invalid ms '{}'", parts[1]))?;
    let tracking = parse_flag(parts[2], "tracking")?;
    let palm_facing = parse_flag(parts[3], "palm_facing")?;
    let label = parts[4]
        .parse::<GestureLabel>()
        .with_context(|| format!("invalid label '{}'", parts[4]))?;
    let confidence = parts[5]
        .parse::<f64>()
        .with_context(|| format!("invalid confidence '{}'", parts[5]))?;
    let tip = match (parts[6], parts[7]) {
        ("", "") => None,
        (x, y) => Some((
            x.parse::<f64>().with_context(|| format!("invalid x '{x}'"))?,
            y.parse::<f64>().with_context(|| format!("invalid y '{y}'"))?,
        )),
    };
    let palm_deg = match parts.get(8) {
        None | Some(&"") => None,
        Some(raw) => Some(
            raw.parse::<f64>()
                .with_context(|| format!("invalid palm_deg '{raw}'"))?,
        ),
    };

    let hand = match parts.get(9) {
        None | Some(&"") => None,
        Some(raw) => Some(
            raw.parse::<HandId>()
                .with_context(|| format!("invalid hand '{raw}'"))?,
        ),
    };

    Ok(Some(ReplayFrame {
        ms,
        tracking,
        palm_facing,
        label,
        confidence,
        tip,
        palm_deg,
        hand,
    }))
}

fn parse_flag(raw: &str, field: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => bail!("invalid {field} '{other}'"),
    }
}

/// One action label per line, e.g. `down(0)`, `cancel`, `wheel(-100)`.
pub fn parse_expected(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut labels = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line =
            line_result.with_context(|| format!("failed to read {}:{line_no}", path.display()))?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }
        labels.push(token.to_ascii_lowercase());
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rows_parse_with_optional_columns() {
        let frame = parse_frame("frame,120,1,0,Pointing_Up,0.92,0.4,0.55,12.5")
            .expect("valid")
            .expect("frame row");
        assert_eq!(frame.ms, 120);
        assert!(frame.tracking && !frame.palm_facing);
        assert_eq!(frame.label, GestureLabel::PointingUp);
        assert_eq!(frame.tip, Some((0.4, 0.55)));
        assert_eq!(frame.palm_deg, Some(12.5));

        let lost = parse_frame("frame,140,0,0,None,0,,").expect("valid").expect("row");
        assert_eq!(lost.tip, None);
        assert_eq!(lost.palm_deg, None);

        assert!(parse_frame("note,1,2").expect("skipped").is_none());
        assert!(parse_frame("frame,1,1,1,Wave,0.9,0.1,0.1").is_err());
        assert!(parse_frame("frame,1,maybe,1,None,0.9,0.1,0.1").is_err());
    }

    #[test]
    fn hand_column_is_optional() {
        let left = parse_frame("frame,0,1,1,Open_Palm,0.9,0.5,0.5,,left")
            .expect("valid")
            .expect("row");
        assert_eq!(left.palm_deg, None);
        assert_eq!(left.hand, Some(HandId::Left));
        assert_eq!(left.to_observation().hand, HandId::Left);

        let implied = parse_frame("frame,0,1,1,Open_Palm,0.9,0.5,0.5")
            .expect("valid")
            .expect("row");
        assert_eq!(implied.to_observation().hand, HandId::Right);

        let err = parse_frame("frame,0,1,1,Open_Palm,0.9,0.5,0.5,10,both")
            .expect_err("unknown hand");
        assert!(format!("{err:#}").contains("unknown hand `both`"));
    }

    #[test]
    fn synthetic_hand_carries_the_tip() {
        let frame = ReplayFrame {
            ms: 0,
            tracking: true,
            palm_facing: false,
            label: GestureLabel::OpenPalm,
            confidence: 0.9,
            tip: Some((0.25, 0.75)),
            palm_deg: Some(15.0),
            hand: None,
        };
        let obs = frame.to_observation();
        let hand = obs.landmarks.expect("landmarks");
        assert_eq!(hand.index_tip().xy(), palm_pointer::Point2::new(0.25, 0.75));
        let angle = palm_pointer::palm_gate::palm_angle_deg(&hand).expect("angle");
        assert!((angle - 15.0).abs() < 1e-6);
    }
}
