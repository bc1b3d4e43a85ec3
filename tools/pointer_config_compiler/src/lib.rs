use std::{fmt::Write as _, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigCompilerError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("validation error: {0}")]
    Validation(String),
}

pub const SMOOTHER_KINDS: [&str; 3] = ["one_euro", "spring", "holt"];
pub const SPRING_MODES: [&str; 3] = ["smoothed", "predictive", "adaptive"];

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PointerConfigFile {
    pub smoother: String,
    pub one_euro: OneEuroSection,
    pub spring: SpringSection,
    pub holt: HoltSection,
    pub palm_gate: PalmGateSection,
    pub transition: TransitionSection,
    pub fsm: FsmSection,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OneEuroSection {
    pub min_cutoff: f64,
    pub beta: f64,
    pub d_cutoff: f64,
    pub frequency_hz: f64,
    pub min_dt_s: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SpringSection {
    pub mode: String,
    pub stiffness: f64,
    pub damping: f64,
    pub substeps: u32,
    pub prediction_ms: f64,
    pub min_stiffness: f64,
    pub max_stiffness: f64,
    pub speed_coefficient: f64,
    pub stiffness_per_cutoff: f64,
    pub stiffness_per_beta: f64,
    pub dead_zone: f64,
    pub min_dt_s: f64,
    pub max_dt_s: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HoltSection {
    pub alpha: f64,
    pub prediction_ms: f64,
    pub min_dt_s: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PalmGateSection {
    pub arm_deg: f64,
    pub disarm_deg: f64,
    pub cancel_deg: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TransitionSection {
    pub none_debounce_ms: u64,
    pub long_none_ms: u64,
    pub typical_transition_ms: u64,
    pub jitter_ceiling: f64,
    pub disengage_decay_ms: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FsmSection {
    pub min_confidence: f64,
    pub arm_stable_ms: u64,
    pub cmd_window_ms: u64,
    pub wheel_delta: f64,
}

pub fn parse_config_str(raw: &str) -> Result<PointerConfigFile, ConfigCompilerError> {
    toml::from_str(raw).map_err(|e| ConfigCompilerError::Parse(e.to_string()))
}

pub fn parse_config_file(path: &Path) -> Result<PointerConfigFile, ConfigCompilerError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ConfigCompilerError::Io(format!("{}: {e}", path.display())))?;
    parse_config_str(&raw)
}

/// Every float in the file, by dotted key. TOML admits `inf` and `nan`,
/// which would render as invalid Rust.
fn float_fields(config: &PointerConfigFile) -> [(&'static str, f64); 25] {
    let e = &config.one_euro;
    let s = &config.spring;
    let h = &config.holt;
    let g = &config.palm_gate;
    [
        ("one_euro.min_cutoff", e.min_cutoff),
        ("one_euro.beta", e.beta),
        ("one_euro.d_cutoff", e.d_cutoff),
        ("one_euro.frequency_hz", e.frequency_hz),
        ("one_euro.min_dt_s", e.min_dt_s),
        ("spring.stiffness", s.stiffness),
        ("spring.damping", s.damping),
        ("spring.prediction_ms", s.prediction_ms),
        ("spring.min_stiffness", s.min_stiffness),
        ("spring.max_stiffness", s.max_stiffness),
        ("spring.speed_coefficient", s.speed_coefficient),
        ("spring.stiffness_per_cutoff", s.stiffness_per_cutoff),
        ("spring.stiffness_per_beta", s.stiffness_per_beta),
        ("spring.dead_zone", s.dead_zone),
        ("spring.min_dt_s", s.min_dt_s),
        ("spring.max_dt_s", s.max_dt_s),
        ("holt.alpha", h.alpha),
        ("holt.prediction_ms", h.prediction_ms),
        ("holt.min_dt_s", h.min_dt_s),
        ("palm_gate.arm_deg", g.arm_deg),
        ("palm_gate.disarm_deg", g.disarm_deg),
        ("palm_gate.cancel_deg", g.cancel_deg),
        ("transition.jitter_ceiling", config.transition.jitter_ceiling),
        ("fsm.min_confidence", config.fsm.min_confidence),
        ("fsm.wheel_delta", config.fsm.wheel_delta),
    ]
}

pub fn validate_config(config: &PointerConfigFile) -> Result<(), ConfigCompilerError> {
    if let Some((name, value)) = float_fields(config)
        .into_iter()
        .find(|(_, value)| !value.is_finite())
    {
        return invalid(format!("{name} must be finite, got {value}"));
    }

    if !SMOOTHER_KINDS.contains(&config.smoother.as_str()) {
        return invalid(format!(
            "smoother must be one of {}, got `{}`",
            SMOOTHER_KINDS.join(", "),
            config.smoother
        ));
    }

    let one_euro = &config.one_euro;
    if !(one_euro.min_cutoff > 0.0) {
        return invalid("one_euro.min_cutoff must be > 0");
    }
    if !(one_euro.d_cutoff > 0.0) {
        return invalid("one_euro.d_cutoff must be > 0");
    }
    if !(one_euro.frequency_hz > 0.0) {
        return invalid("one_euro.frequency_hz must be > 0");
    }
    if !(one_euro.beta >= 0.0) {
        return invalid("one_euro.beta must be >= 0");
    }
    if !(one_euro.min_dt_s > 0.0) {
        return invalid("one_euro.min_dt_s must be > 0");
    }

    let spring = &config.spring;
    if !SPRING_MODES.contains(&spring.mode.as_str()) {
        return invalid(format!(
            "spring.mode must be one of {}, got `{}`",
            SPRING_MODES.join(", "),
            spring.mode
        ));
    }
    if spring.substeps == 0 {
        return invalid("spring.substeps must be >= 1");
    }
    if !(spring.stiffness > 0.0) || !(spring.min_stiffness > 0.0) {
        return invalid("spring stiffness fields must be > 0");
    }
    if !(spring.stiffness_per_cutoff > 0.0) {
        return invalid("spring.stiffness_per_cutoff must be > 0");
    }
    if spring.max_stiffness < spring.min_stiffness {
        return invalid("spring.max_stiffness must be >= spring.min_stiffness");
    }
    let non_negative = [
        spring.damping,
        spring.prediction_ms,
        spring.speed_coefficient,
        spring.stiffness_per_beta,
        spring.dead_zone,
    ];
    if non_negative.iter().any(|v| !(*v >= 0.0)) {
        return invalid(
            "spring damping, prediction, coefficient and dead_zone fields must be >= 0",
        );
    }
    if !(spring.min_dt_s > 0.0) {
        return invalid("spring.min_dt_s must be > 0");
    }
    if spring.max_dt_s < spring.min_dt_s {
        return invalid("spring.max_dt_s must be >= spring.min_dt_s");
    }

    let holt = &config.holt;
    if !(holt.alpha > 0.0 && holt.alpha < 1.0) {
        return invalid("holt.alpha must be in the open interval (0, 1)");
    }
    if !(holt.prediction_ms >= 0.0) {
        return invalid("holt.prediction_ms must be >= 0");
    }
    if !(holt.min_dt_s > 0.0) {
        return invalid("holt.min_dt_s must be > 0");
    }

    let gate = &config.palm_gate;
    for (name, value) in [
        ("arm_deg", gate.arm_deg),
        ("disarm_deg", gate.disarm_deg),
        ("cancel_deg", gate.cancel_deg),
    ] {
        if !(0.0..=180.0).contains(&value) {
            return invalid(format!("palm_gate.{name} must be within [0, 180]"));
        }
    }
    if gate.arm_deg > gate.disarm_deg {
        return invalid("palm_gate.arm_deg must be <= palm_gate.disarm_deg");
    }
    if gate.disarm_deg > gate.cancel_deg {
        return invalid("palm_gate.disarm_deg must be <= palm_gate.cancel_deg");
    }

    let transition = &config.transition;
    if transition.none_debounce_ms == 0 {
        return invalid("transition.none_debounce_ms must be > 0");
    }
    if transition.long_none_ms <= transition.none_debounce_ms {
        return invalid("transition.long_none_ms must be > transition.none_debounce_ms");
    }
    if transition.typical_transition_ms < transition.none_debounce_ms
        || transition.typical_transition_ms > transition.long_none_ms
    {
        return invalid(
            "transition.typical_transition_ms must lie between none_debounce_ms and long_none_ms",
        );
    }
    if !(transition.jitter_ceiling > 0.0 && transition.jitter_ceiling <= 1.0) {
        return invalid("transition.jitter_ceiling must be within (0, 1]");
    }
    if transition.disengage_decay_ms == 0 {
        return invalid("transition.disengage_decay_ms must be > 0");
    }

    let fsm = &config.fsm;
    if !(0.0..=1.0).contains(&fsm.min_confidence) {
        return invalid("fsm.min_confidence must be within [0, 1]");
    }
    if fsm.cmd_window_ms <= fsm.arm_stable_ms {
        return invalid("fsm.cmd_window_ms must be > fsm.arm_stable_ms");
    }
    if !(fsm.wheel_delta > 0.0) {
        return invalid("fsm.wheel_delta must be > 0");
    }

    Ok(())
}

fn invalid(msg: impl Into<String>) -> Result<(), ConfigCompilerError> {
    Err(ConfigCompilerError::Validation(msg.into()))
}

pub fn smoother_variant(kind: &str) -> &'static str {
    match kind {
        "spring" => "Spring",
        "holt" => "Holt",
        _ => "OneEuro",
    }
}

pub fn spring_mode_variant(mode: &str) -> &'static str {
    match mode {
        "predictive" => "Predictive",
        "adaptive" => "Adaptive",
        _ => "Smoothed",
    }
}

fn float(value: f64) -> String {
    format!("{value:?}")
}

pub fn render_generated_config(config: &PointerConfigFile) -> String {
    let mut out = String::new();
    let e = &config.one_euro;
    let s = &config.spring;
    let h = &config.holt;
    let g = &config.palm_gate;
    let t = &config.transition;
    let f = &config.fsm;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "// @generated by pointer_config_compiler. Do not edit.");
    let _ = writeln!(
        out,
        "pub const DEFAULT_POINTER_CONFIG: PointerConfig = PointerConfig {{"
    );
    let _ = writeln!(
        out,
        "    smoother: SmootherKind::{},",
        smoother_variant(&config.smoother)
    );
    let _ = writeln!(out, "    one_euro: OneEuroConfig {{");
    let _ = writeln!(out, "        min_cutoff: {},", float(e.min_cutoff));
    let _ = writeln!(out, "        beta: {},", float(e.beta));
    let _ = writeln!(out, "        d_cutoff: {},", float(e.d_cutoff));
    let _ = writeln!(out, "        frequency_hz: {},", float(e.frequency_hz));
    let _ = writeln!(out, "        min_dt_s: {},", float(e.min_dt_s));
    let _ = writeln!(out, "    }},");
    let _ = writeln!(out, "    spring: SpringConfig {{");
    let _ = writeln!(
        out,
        "        mode: SpringMode::{},",
        spring_mode_variant(&s.mode)
    );
    let _ = writeln!(out, "        stiffness: {},", float(s.stiffness));
    let _ = writeln!(out, "        damping: {},", float(s.damping));
    let _ = writeln!(out, "        substeps: {},", s.substeps);
    let _ = writeln!(out, "        prediction_ms: {},", float(s.prediction_ms));
    let _ = writeln!(out, "        min_stiffness: {},", float(s.min_stiffness));
    let _ = writeln!(out, "        max_stiffness: {},", float(s.max_stiffness));
    let _ = writeln!(
        out,
        "        speed_coefficient: {},",
        float(s.speed_coefficient)
    );
    let _ = writeln!(
        out,
        "        stiffness_per_cutoff: {},",
        float(s.stiffness_per_cutoff)
    );
    let _ = writeln!(
        out,
        "        stiffness_per_beta: {},",
        float(s.stiffness_per_beta)
    );
    let _ = writeln!(out, "        dead_zone: {},", float(s.dead_zone));
    let _ = writeln!(out, "        min_dt_s: {},", float(s.min_dt_s));
    let _ = writeln!(out, "        max_dt_s: {},", float(s.max_dt_s));
    let _ = writeln!(out, "    }},");
    let _ = writeln!(out, "    holt: HoltConfig {{");
    let _ = writeln!(out, "        alpha: {},", float(h.alpha));
    let _ = writeln!(out, "        prediction_ms: {},", float(h.prediction_ms));
    let _ = writeln!(out, "        min_dt_s: {},", float(h.min_dt_s));
    let _ = writeln!(out, "    }},");
    let _ = writeln!(out, "    palm_gate: PalmGateConfig {{");
    let _ = writeln!(out, "        arm_deg: {},", float(g.arm_deg));
    let _ = writeln!(out, "        disarm_deg: {},", float(g.disarm_deg));
    let _ = writeln!(out, "        cancel_deg: {},", float(g.cancel_deg));
    let _ = writeln!(out, "    }},");
    let _ = writeln!(out, "    transition: TransitionConfig {{");
    let _ = writeln!(out, "        none_debounce_ms: {},", t.none_debounce_ms);
    let _ = writeln!(out, "        long_none_ms: {},", t.long_none_ms);
    let _ = writeln!(
        out,
        "        typical_transition_ms: {},",
        t.typical_transition_ms
    );
    let _ = writeln!(out, "        jitter_ceiling: {},", float(t.jitter_ceiling));
    let _ = writeln!(out, "        disengage_decay_ms: {},", t.disengage_decay_ms);
    let _ = writeln!(out, "    }},");
    let _ = writeln!(out, "    fsm: FsmConfig {{");
    let _ = writeln!(out, "        min_confidence: {},", float(f.min_confidence));
    let _ = writeln!(out, "        arm_stable_ms: {},", f.arm_stable_ms);
    let _ = writeln!(out, "        cmd_window_ms: {},", f.cmd_window_ms);
    let _ = writeln!(out, "        wheel_delta: {},", float(f.wheel_delta));
    let _ = writeln!(out, "    }},");
    let _ = writeln!(out, "}};");
    out
}

pub fn generate_from_path(path: &Path) -> Result<String, ConfigCompilerError> {
    let config = parse_config_file(path)?;
    validate_config(&config)?;
    Ok(render_generated_config(&config))
}
