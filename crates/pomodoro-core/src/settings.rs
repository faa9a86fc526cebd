use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-user application directory under `$HOME`.
pub const APP_DIR_NAME: &str = ".pomodoro";

/// Return `~/.pomodoro`, falling back to `./.pomodoro` without a home dir.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Pomodoro study timer with session log and study reports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pomodoro",
    about = "Pomodoro study timer with session log and study reports",
    version
)]
pub struct Settings {
    /// View mode
    #[arg(long, default_value = "timer", value_parser = ["timer", "report", "export"])]
    pub view: String,

    /// Subject to attribute completed work sessions to
    #[arg(long)]
    pub subject: Option<String>,

    /// Topic within the subject
    #[arg(long)]
    pub topic: Option<String>,

    /// Work session length in minutes (1-60)
    #[arg(long, default_value = "25", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub work_minutes: u32,

    /// Break length in minutes (1-30)
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=30))]
    pub break_minutes: u32,

    /// Timezone used for "today" (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "auto"])]
    pub theme: String,

    /// Session log file (defaults to ~/.pomodoro/sessions.json)
    #[arg(long, env = "POMODORO_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Output path for the exported report
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Export format
    #[arg(long, default_value = "html", value_parser = ["html", "json"])]
    pub format: String,

    /// Student name shown in the report header
    #[arg(long)]
    pub student: Option<String>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.pomodoro/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<String>,
}

impl LastUsedParams {
    /// Default path: `~/.pomodoro/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR_NAME).join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable {}", path.display());
            Self::default()
        })
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation. Accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "failed to clear saved configuration");
            }
            return Self::resolve_auto_values(settings, None);
        }

        let last = LastUsedParams::load_from(config_path);
        let last_timezone = last.timezone.filter(|tz| is_usable_timezone(tz));

        // CLI always wins. The export-only flags (output, format) are never
        // loaded from last-used.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if settings.subject.is_none() {
            settings.subject = last.subject;
        }
        if settings.topic.is_none() {
            settings.topic = last.topic;
        }
        // NOTE: clap stores the arg id using the *field name* (underscores).
        if !is_arg_explicitly_set(&matches, "work_minutes") {
            if let Some(v) = last.work_minutes.filter(|m| (1..=60).contains(m)) {
                settings.work_minutes = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "break_minutes") {
            if let Some(v) = last.break_minutes.filter(|m| (1..=30).contains(m)) {
                settings.break_minutes = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last_timezone.clone() {
                settings.timezone = v;
            }
        }
        if settings.student.is_none() {
            settings.student = last.student;
        }

        settings = Self::resolve_auto_values(settings, last_timezone);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!(error = %e, "failed to persist last-used settings");
        }

        settings
    }

    /// Session log location: `--data-file` or `~/.pomodoro/sessions.json`.
    pub fn sessions_path(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| app_dir().join("sessions.json"))
    }

    /// Export destination: `--output` or `pomodoro-report.<format>` in the
    /// working directory.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("pomodoro-report.{}", self.format)))
    }

    /// Name for the report header, `"User"` when none was given.
    pub fn student_name(&self) -> &str {
        self.student
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("User")
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    ///
    /// An unknown timezone name is replaced by `fallback_timezone`, or by the
    /// system timezone, so it is never persisted.
    fn resolve_auto_values(mut settings: Settings, fallback_timezone: Option<String>) -> Settings {
        if !is_usable_timezone(&settings.timezone) {
            tracing::warn!(
                "unrecognised timezone \"{}\", keeping {}",
                settings.timezone,
                fallback_timezone.as_deref().unwrap_or("auto")
            );
            settings.timezone = fallback_timezone.unwrap_or_else(|| "auto".to_string());
        }

        if settings.timezone.eq_ignore_ascii_case("auto") {
            let system = crate::time_utils::get_system_timezone();
            settings.timezone = if crate::time_utils::validate_timezone(&system) {
                system
            } else {
                "UTC".to_string()
            };
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            // A one-shot export is not remembered as the default view.
            view: Some(s.view.clone()).filter(|v| v != "export"),
            subject: s.subject.clone(),
            topic: s.topic.clone(),
            work_minutes: Some(s.work_minutes),
            break_minutes: Some(s.break_minutes),
            theme: Some(s.theme.clone()),
            timezone: Some(s.timezone.clone()),
            student: s.student.clone(),
        }
    }
}

/// `"auto"` or a recognised IANA name.
fn is_usable_timezone(name: &str) -> bool {
    name.eq_ignore_ascii_case("auto") || crate::time_utils::validate_timezone(name)
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
