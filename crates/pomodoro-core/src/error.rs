use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the Pomodoro tracker.
#[derive(Error, Debug)]
pub enum PomodoroError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A stored session could not be turned into a valid record.
    #[error("Malformed session record: {0}")]
    MalformedRecord(String),

    /// A timer length fell outside its allowed range.
    #[error("Invalid {kind} duration {minutes}: must be between {min} and {max} minutes")]
    InvalidDuration {
        kind: &'static str,
        minutes: u32,
        min: u32,
        max: u32,
    },

    /// Subject or topic was blank when a focus was required.
    #[error("Both subject and topic are required")]
    MissingFocus,

    /// A report was requested but the log holds no valid sessions.
    #[error("No sessions to generate a report from (malformed records skipped: {skipped_count})")]
    EmptyReport { skipped_count: usize },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the pomodoro crates.
pub type Result<T> = std::result::Result<T, PomodoroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = PomodoroError::FileRead {
            path: PathBuf::from("/some/sessions.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/sessions.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_file_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = PomodoroError::FileWrite {
            path: PathBuf::from("/ro/report.html"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to write file /ro/report.html"));
        assert!(msg.contains("read-only"));
    }

    #[test]
    fn test_error_display_malformed_record() {
        let err = PomodoroError::MalformedRecord("duration is not finite".to_string());
        assert_eq!(
            err.to_string(),
            "Malformed session record: duration is not finite"
        );
    }

    #[test]
    fn test_error_display_invalid_duration() {
        let err = PomodoroError::InvalidDuration {
            kind: "work",
            minutes: 90,
            min: 1,
            max: 60,
        };
        assert_eq!(
            err.to_string(),
            "Invalid work duration 90: must be between 1 and 60 minutes"
        );
    }

    #[test]
    fn test_error_display_missing_focus() {
        assert_eq!(
            PomodoroError::MissingFocus.to_string(),
            "Both subject and topic are required"
        );
    }

    #[test]
    fn test_error_display_empty_report() {
        let err = PomodoroError::EmptyReport { skipped_count: 2 };
        assert_eq!(
            err.to_string(),
            "No sessions to generate a report from (malformed records skipped: 2)"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = PomodoroError::Config("session file is not a JSON array".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: session file is not a JSON array"
        );
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: PomodoroError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
