use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{PomodoroError, Result};
use crate::time_utils;

/// One completed work interval.
///
/// Records are immutable once created and only ever appended to the session
/// log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Subject studied during the interval.
    pub subject: String,
    /// Topic within the subject.
    pub topic: String,
    /// Work length configured when the interval was recorded.
    pub duration_minutes: u32,
    /// Instant the work phase reached zero.
    pub timestamp: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(
        subject: impl Into<String>,
        topic: impl Into<String>,
        duration_minutes: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            topic: topic.into(),
            duration_minutes,
            timestamp,
        }
    }

    /// Grouping key for this record.
    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.subject.clone(), self.topic.clone())
    }
}

/// The on-disk shape of a session.
///
/// Every field is accepted as loosely as possible so that a single corrupt
/// entry can be loaded, counted and skipped instead of failing the whole
/// log. Call [`StoredSession::validate`] to obtain a [`SessionRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub topic: String,
    /// Minutes; expected to be a positive whole number.
    #[serde(default)]
    pub duration: Value,
    /// Epoch milliseconds.
    #[serde(default)]
    pub timestamp: Value,
    /// ISO-8601 rendering of the timestamp, used when `timestamp` is absent.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub date: Value,
}

impl StoredSession {
    /// Build from an arbitrary JSON element, never failing.
    ///
    /// Elements that do not even look like a session object come back as an
    /// empty `StoredSession`, which [`validate`](Self::validate) rejects.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<StoredSession>(value) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::debug!(error = %e, "session element is not an object");
                Self::default()
            }
        }
    }

    /// Convert into a validated [`SessionRecord`].
    pub fn validate(&self) -> Result<SessionRecord> {
        let duration_minutes = parse_duration(&self.duration)?;
        let timestamp = self.parse_timestamp()?;
        Ok(SessionRecord {
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            duration_minutes,
            timestamp,
        })
    }

    fn parse_timestamp(&self) -> Result<DateTime<Utc>> {
        if !self.timestamp.is_null() {
            let millis = number_like(&self.timestamp).ok_or_else(|| {
                PomodoroError::MalformedRecord(format!(
                    "timestamp {} is not a number",
                    self.timestamp
                ))
            })?;
            return time_utils::datetime_from_millis(millis).ok_or_else(|| {
                PomodoroError::MalformedRecord(format!("timestamp {} is out of range", millis))
            });
        }

        match &self.date {
            Value::Null => Err(PomodoroError::MalformedRecord(
                "timestamp is missing".to_string(),
            )),
            Value::String(date) => time_utils::parse_iso_utc(date).ok_or_else(|| {
                PomodoroError::MalformedRecord(format!("date \"{}\" is not parseable", date))
            }),
            other => Err(PomodoroError::MalformedRecord(format!(
                "date {} is not a string",
                other
            ))),
        }
    }
}

impl From<&SessionRecord> for StoredSession {
    fn from(record: &SessionRecord) -> Self {
        StoredSession {
            subject: record.subject.clone(),
            topic: record.topic.clone(),
            duration: Value::from(record.duration_minutes),
            timestamp: Value::from(record.timestamp.timestamp_millis()),
            date: Value::from(
                record
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        }
    }
}

/// Composite `(subject, topic)` grouping key.
///
/// Matching is exact and case-sensitive. The two parts are never joined into
/// a single string, so a subject containing `" - "` cannot collide with
/// another pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub subject: String,
    pub topic: String,
}

impl GroupKey {
    pub fn new(subject: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            topic: topic.into(),
        }
    }

    /// Two-line chart label: `"subject\ntopic"`.
    pub fn chart_label(&self) -> String {
        format!("{}\n{}", self.subject, self.topic)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.subject, self.topic)
    }
}

/// The subject/topic pair the timer is currently attributing work to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTarget {
    pub subject: String,
    pub topic: String,
}

impl FocusTarget {
    /// Trim both parts; fails with [`PomodoroError::MissingFocus`] if either
    /// ends up empty.
    pub fn new(subject: &str, topic: &str) -> Result<Self> {
        let subject = subject.trim();
        let topic = topic.trim();
        if subject.is_empty() || topic.is_empty() {
            return Err(PomodoroError::MissingFocus);
        }
        Ok(Self {
            subject: subject.to_string(),
            topic: topic.to_string(),
        })
    }

    /// Build a record for a work phase of `minutes` that ended at `at`.
    pub fn record(&self, minutes: u32, at: DateTime<Utc>) -> SessionRecord {
        SessionRecord::new(self.subject.clone(), self.topic.clone(), minutes, at)
    }
}

impl fmt::Display for FocusTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.subject, self.topic)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Numbers and numeric strings; everything else is `None`.
fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_duration(value: &Value) -> Result<u32> {
    let minutes = number_like(value).ok_or_else(|| {
        PomodoroError::MalformedRecord(format!("duration {} is not a number", value))
    })?;

    if !minutes.is_finite() {
        return Err(PomodoroError::MalformedRecord(format!(
            "duration {} is not finite",
            minutes
        )));
    }
    if minutes <= 0.0 || minutes.fract() != 0.0 || minutes > f64::from(u32::MAX) {
        return Err(PomodoroError::MalformedRecord(format!(
            "duration {} is not a positive whole number of minutes",
            minutes
        )));
    }
    Ok(minutes as u32)
}
