use std::path::Path;

use anyhow::{Context, Result};
use palm_pointer::{
    config::{FsmConfig, HoltConfig, OneEuroConfig, PalmGateConfig, SpringConfig, TransitionConfig},
    PointerConfig,
};
use pointer_config_compiler::{parse_config_file, validate_config, PointerConfigFile};

/// Runtime override: the same TOML schema that build.rs compiles in.
/// Without a path the built-in defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<PointerConfig> {
    let Some(path) = path else {
        return Ok(PointerConfig::default());
    };
    let file = parse_config_file(path)?;
    validate_config(&file).with_context(|| format!("{} failed validation", path.display()))?;
    let config = pointer_config_from_file(&file)?;
    config
        .validate()
        .with_context(|| format!("{} is out of range", path.display()))?;
    Ok(config)
}

pub fn pointer_config_from_file(file: &PointerConfigFile) -> Result<PointerConfig> {
    Ok(PointerConfig {
        smoother: file.smoother.parse()?,
        one_euro: OneEuroConfig {
            min_cutoff: file.one_euro.min_cutoff,
            beta: file.one_euro.beta,
            d_cutoff: file.one_euro.d_cutoff,
            frequency_hz: file.one_euro.frequency_hz,
            min_dt_s: file.one_euro.min_dt_s,
        },
        spring: SpringConfig {
            mode: file.spring.mode.parse()?,
            stiffness: file.spring.stiffness,
            damping: file.spring.damping,
            substeps: file.spring.substeps,
            prediction_ms: file.spring.prediction_ms,
            min_stiffness: file.spring.min_stiffness,
            max_stiffness: file.spring.max_stiffness,
            speed_coefficient: file.spring.speed_coefficient,
            stiffness_per_cutoff: file.spring.stiffness_per_cutoff,
            stiffness_per_beta: file.spring.stiffness_per_beta,
            dead_zone: file.spring.dead_zone,
            min_dt_s: file.spring.min_dt_s,
            max_dt_s: file.spring.max_dt_s,
        },
        holt: HoltConfig {
            alpha: file.holt.alpha,
            prediction_ms: file.holt.prediction_ms,
            min_dt_s: file.holt.min_dt_s,
        },
        palm_gate: PalmGateConfig {
            arm_deg: file.palm_gate.arm_deg,
            disarm_deg: file.palm_gate.disarm_deg,
            cancel_deg: file.palm_gate.cancel_deg,
        },
        transition: TransitionConfig {
            none_debounce_ms: file.transition.none_debounce_ms,
            long_none_ms: file.transition.long_none_ms,
            typical_transition_ms: file.transition.typical_transition_ms,
            jitter_ceiling: file.transition.jitter_ceiling,
            disengage_decay_ms: file.transition.disengage_decay_ms,
        },
        fsm: FsmConfig {
            min_confidence: file.fsm.min_confidence,
            arm_stable_ms: file.fsm.arm_stable_ms,
            cmd_window_ms: file.fsm.cmd_window_ms,
            wheel_delta: file.fsm.wheel_delta,
        },
    })
}
