use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Result;
use serde_json::{json, Value};

pub const LOG_JSON_PATH_ENV: &str = "GESTURE_REPLAY_LOG_JSON_PATH";
const DEFAULT_FILTER: &str = "palm_pointer=info,gesture_replay=info";

/// Human output goes to stderr through `tracing`; `RUST_LOG` overrides the
/// default filter. Stdout is reserved for the action table.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Optional JSON-lines event log, one `{ts_ms, level, msg, ...}` object per
/// line.
pub struct Logger {
    json_file: Option<File>,
}

impl Logger {
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(LOG_JSON_PATH_ENV).ok();
        Self::new(path.map(PathBuf::from))
    }

    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let json_file = match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                Some(OpenOptions::new().create(true).append(true).open(path)?)
            }
            None => None,
        };
        Ok(Self { json_file })
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        tracing::info!("{}", message.as_ref());
        self.event("info", message.as_ref(), Value::Null);
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        tracing::warn!("{}", message.as_ref());
        self.event("warn", message.as_ref(), Value::Null);
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        tracing::error!("{}", message.as_ref());
        self.event("error", message.as_ref(), Value::Null);
    }

    /// Appends one record; `fields` is merged in when it is an object.
    pub fn event(&mut self, level: &str, message: &str, fields: Value) {
        let Some(file) = &mut self.json_file else {
            return;
        };

        let ts_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut entry = json!({
            "ts_ms": ts_ms,
            "level": level,
            "msg": message,
        });
        if let (Value::Object(extra), Some(map)) = (fields, entry.as_object_mut()) {
            map.extend(extra);
        }

        let _ = writeln!(file, "{entry}");
        let _ = file.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    #[test]
    fn records_are_one_json_object_per_line() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir()
            .join(format!("gesture_replay_log_{}_{nanos}", std::process::id()))
            .join("events.jsonl");

        let mut logger = Logger::new(Some(path.clone())).expect("open log");
        logger.event("info", "replay started", json!({ "frames": 12 }));
        logger.event("warn", "mismatch", Value::Null);
        drop(logger);

        let raw = fs::read_to_string(&path).expect("read log");
        let lines: Vec<Value> = raw
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[0]["msg"], "replay started");
        assert_eq!(lines[0]["frames"], 12);
        assert!(lines[1]["ts_ms"].as_u64().is_some());

        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn without_a_path_nothing_is_written() {
        let mut logger = Logger::new(None).expect("no file");
        logger.event("info", "dropped", Value::Null);
        assert!(logger.json_file.is_none());
    }
}
