//! Session log persistence.
//!
//! The aggregator never touches storage directly: callers hand it a snapshot
//! obtained from a [`SessionStore`]. The JSON file store keeps the log as a
//! single array of session objects in insertion order.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pomodoro_core::error::{PomodoroError, Result};
use pomodoro_core::models::{SessionRecord, StoredSession};
use serde_json::Value;
use tracing::{debug, info, warn};

// ── SessionStore ──────────────────────────────────────────────────────────────

/// Append-only session log.
pub trait SessionStore: Send + Sync {
    /// Full ordered snapshot of the log.
    fn load(&self) -> Result<Vec<StoredSession>>;

    /// Append a newly completed session.
    fn append(&self, record: &SessionRecord) -> Result<()>;
}

// ── JsonSessionStore ──────────────────────────────────────────────────────────

/// Session log stored as a JSON array on disk.
#[derive(Debug)]
pub struct JsonSessionStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw array elements. A missing or blank file is an empty log.
    fn load_values(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            debug!("session log {} does not exist yet", self.path.display());
            return Ok(Vec::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|source| PomodoroError::FileRead {
                path: self.path.clone(),
                source,
            })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Array(items) => Ok(items),
            other => Err(PomodoroError::Config(format!(
                "session log {} holds a JSON {} instead of an array",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn write_values(&self, items: &[Value]) -> Result<()> {
        let write_err = |source: std::io::Error| PomodoroError::FileWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(items)?;

        // Write to a temp file then rename for atomicity.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl SessionStore for JsonSessionStore {
    fn load(&self) -> Result<Vec<StoredSession>> {
        let sessions: Vec<StoredSession> = self
            .load_values()?
            .into_iter()
            .map(StoredSession::from_value)
            .collect();
        debug!(
            "loaded {} sessions from {}",
            sessions.len(),
            self.path.display()
        );
        Ok(sessions)
    }

    fn append(&self, record: &SessionRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        // Existing elements are kept verbatim, including ones that fail
        // validation, so appending never destroys data.
        let mut items = self.load_values()?;
        items.push(serde_json::to_value(StoredSession::from(record))?);
        self.write_values(&items)?;

        info!(
            subject = %record.subject,
            topic = %record.topic,
            minutes = record.duration_minutes,
            "session recorded"
        );
        Ok(())
    }
}

// ── MemorySessionStore ────────────────────────────────────────────────────────

/// In-process session log.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing (possibly malformed) entries.
    pub fn with_sessions(sessions: Vec<StoredSession>) -> Self {
        Self {
            sessions: Mutex::new(sessions),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Vec<StoredSession>> {
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn append(&self, record: &SessionRecord) -> Result<()> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(StoredSession::from(record));
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Load a snapshot, treating an unreadable log as empty.
///
/// Used by views that must keep running when the log is damaged; the error is
/// logged.
pub fn load_or_empty(store: &dyn SessionStore) -> Vec<StoredSession> {
    store.load().unwrap_or_else(|e| {
        warn!(error = %e, "could not load session log; continuing with none");
        Vec::new()
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    fn record(subject: &str, topic: &str, minute: u32) -> SessionRecord {
        SessionRecord::new(
            subject,
            topic,
            25,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, minute, 0).unwrap(),
        )
    }

    #[test]
    fn test_missing_file_is_empty_log() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSessionStore::new(tmp.path().join("sessions.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_blank_file_is_empty_log() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sessions.json");
        std::fs::write(&path, "  \n").unwrap();
        assert!(JsonSessionStore::new(path).load().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_load_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSessionStore::new(tmp.path().join("nested").join("sessions.json"));

        store.append(&record("Math", "Algebra", 0)).unwrap();
        store.append(&record("Physics", "Optics", 30)).unwrap();

        let loaded: Vec<SessionRecord> = store
            .load()
            .unwrap()
            .iter()
            .map(|s| s.validate().unwrap())
            .collect();
        assert_eq!(
            loaded,
            vec![record("Math", "Algebra", 0), record("Physics", "Optics", 30)]
        );
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_tolerates_corrupt_elements() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sessions.json");
        let doc = json!([
            {"subject": "Math", "topic": "Algebra", "duration": 25, "timestamp": 1_705_312_800_000_i64},
            "garbage",
            {"subject": "Math", "topic": "Algebra", "duration": null, "timestamp": 1_705_312_800_000_i64}
        ]);
        std::fs::write(&path, doc.to_string()).unwrap();

        let sessions = JsonSessionStore::new(path).load().unwrap();
        assert_eq!(sessions.len(), 3);
        assert!(sessions[0].validate().is_ok());
        assert!(sessions[1].validate().is_err());
        assert!(sessions[2].validate().is_err());
    }

    #[test]
    fn test_append_keeps_corrupt_elements_verbatim() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sessions.json");
        std::fs::write(&path, r#"[{"weird": true}]"#).unwrap();

        let store = JsonSessionStore::new(&path);
        store.append(&record("Math", "Algebra", 0)).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let items = raw.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], json!({"weird": true}));
        assert_eq!(items[1]["subject"], "Math");
        assert_eq!(items[1]["duration"], 25);
    }

    #[test]
    fn test_non_array_document_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sessions.json");
        std::fs::write(&path, r#"{"sessions": []}"#).unwrap();

        let err = JsonSessionStore::new(path).load().unwrap_err();
        assert!(matches!(err, PomodoroError::Config(_)));
        assert!(err.to_string().contains("object instead of an array"));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sessions.json");
        std::fs::write(&path, "[{").unwrap();

        let err = JsonSessionStore::new(path).load().unwrap_err();
        assert!(matches!(err, PomodoroError::JsonParse(_)));
    }

    #[test]
    fn test_load_or_empty_swallows_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sessions.json");
        std::fs::write(&path, "42").unwrap();
        assert!(load_or_empty(&JsonSessionStore::new(path)).is_empty());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new();
        assert!(store.is_empty());
        store.append(&record("Math", "Algebra", 5)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.load().unwrap()[0].validate().unwrap(),
            record("Math", "Algebra", 5)
        );
    }
}
