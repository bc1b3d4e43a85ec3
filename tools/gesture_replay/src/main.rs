use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use gesture_replay::{
    config::load_config,
    logging::{init_tracing, Logger},
    parse_expected, parse_trace, replay, significant_labels, ReplayRow,
};
use palm_pointer::{ActionKind, Bounds, SmootherKind};
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "gesture_replay")]
#[command(about = "Replay a recorded hand-landmark trace through the pointer pipeline")]
struct Cli {
    /// CSV trace: frame,ms,tracking,palm_facing,label,confidence,x,y[,palm_deg[,hand]]
    trace: PathBuf,
    /// Expected button/cancel/wheel sequence, one label per line.
    #[arg(long)]
    expect: Option<PathBuf>,
    /// TOML overrides using the config/pointer.toml schema.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the smoother selected by the config.
    #[arg(long)]
    smoother: Option<SmootherKind>,
    #[arg(long, default_value_t = 1920.0)]
    width: f64,
    #[arg(long, default_value_t = 1080.0)]
    height: f64,
    /// Only print button, cancel and wheel rows.
    #[arg(long)]
    significant_only: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut logger = Logger::from_env()?;

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(kind) = cli.smoother {
        config.smoother = kind;
    }

    let frames = parse_trace(&cli.trace)?;
    if frames.is_empty() {
        logger.warn(format!("{} holds no frame rows", cli.trace.display()));
    }
    logger.event(
        "info",
        "replay started",
        json!({
            "trace": cli.trace.display().to_string(),
            "frames": frames.len(),
            "smoother": config.smoother.as_str(),
        }),
    );

    let rows = replay(config, &frames, Bounds::new(0.0, 0.0, cli.width, cli.height))?;

    println!("action,ms,state,kind,x,y,delta_y");
    for row in rows
        .iter()
        .filter(|row| !cli.significant_only || row.is_significant())
    {
        println!("{}", format_row(row));
    }

    let actual = significant_labels(&rows);
    logger.event(
        "info",
        "replay finished",
        json!({ "rows": rows.len(), "significant": actual }),
    );

    if let Some(expect_path) = &cli.expect {
        let expected = parse_expected(expect_path)?;
        if actual != expected {
            logger.error(format!("expected actions: {}", expected.join(",")));
            logger.error(format!("actual actions:   {}", actual.join(",")));
            bail!("action sequence mismatch");
        }
        logger.info(format!("{} actions match {}", actual.len(), expect_path.display()));
    }

    Ok(())
}

fn format_row(row: &ReplayRow) -> String {
    let (x, y) = row
        .client
        .map(|p| (format!("{:.1}", p.x), format!("{:.1}", p.y)))
        .unwrap_or_default();
    let delta_y = match row.action.kind {
        ActionKind::Wheel { delta_y, .. } => format!("{delta_y}"),
        _ => String::new(),
    };
    format!(
        "action,{},{},{},{x},{y},{delta_y}",
        row.ms,
        row.state.as_str(),
        row.action.label(),
    )
}
