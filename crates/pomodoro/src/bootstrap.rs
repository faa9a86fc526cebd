use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use pomodoro_core::settings::app_dir;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name used when a TUI view logs to the default location.
const DEFAULT_LOG_FILE: &str = "pomodoro.log";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.pomodoro/` and `~/.pomodoro/logs/` exist; returns the former.
pub fn ensure_directories() -> anyhow::Result<PathBuf> {
    let dir = app_dir();
    ensure_directories_in(&dir)?;
    Ok(dir)
}

/// Create `base` and its `logs/` subdirectory, including missing parents.
pub fn ensure_directories_in(base: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(base.join("logs"))
        .with_context(|| format!("failed to create {}", base.display()))?;
    Ok(())
}

/// Where to log when `--log-file` was not given.
///
/// Full-screen views would be corrupted by stderr output, so they log to
/// `logs/pomodoro.log` under `app_dir`. The export view keeps stderr.
pub fn default_log_file(view: &str, app_dir: &Path) -> Option<PathBuf> {
    match view {
        "timer" | "report" => Some(app_dir.join("logs").join(DEFAULT_LOG_FILE)),
        _ => None,
    }
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to an [`EnvFilter`] directive.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Writes to `log_file` (appending, no ANSI colours) when given, otherwise to
/// stderr. Unrecognised levels fall back to `info`.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, stderr_layer) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            (None, Some(layer))
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
