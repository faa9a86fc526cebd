//! Study report aggregation.
//!
//! Turns a snapshot of the session log into today / rolling-week / all-time
//! totals and per `(subject, topic)` groups. Pure: the same records, instant
//! and timezone always give the same report.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, warn};

use pomodoro_core::formatting::{format_hours_minutes, minutes_to_hours};
use pomodoro_core::models::{GroupKey, SessionRecord, StoredSession};
use pomodoro_core::time_utils::is_same_local_day;

/// Length of the rolling week window.
pub const WEEK_WINDOW_DAYS: i64 = 7;

// ── SubjectTopicGroup ─────────────────────────────────────────────────────────

/// All sessions sharing one `(subject, topic)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectTopicGroup {
    pub key: GroupKey,
    /// Sessions in insertion order.
    pub sessions: Vec<SessionRecord>,
    pub total_minutes: u64,
    pub session_count: usize,
}

impl SubjectTopicGroup {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            sessions: Vec::new(),
            total_minutes: 0,
            session_count: 0,
        }
    }

    fn add(&mut self, record: SessionRecord) {
        self.total_minutes += u64::from(record.duration_minutes);
        self.session_count += 1;
        self.sessions.push(record);
    }

    /// Sessions sorted most recent first; equal timestamps keep insertion
    /// order.
    pub fn newest_first(&self) -> Vec<&SessionRecord> {
        let mut sorted: Vec<&SessionRecord> = self.sessions.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }

    /// Total time rounded to hundredths of an hour.
    pub fn hours(&self) -> f64 {
        minutes_to_hours(self.total_minutes)
    }

    /// Total time as `"Xh Ym"`.
    pub fn formatted_total(&self) -> String {
        format_hours_minutes(self.total_minutes)
    }
}

// ── Render-facing shapes ──────────────────────────────────────────────────────

/// One bar of the hours-per-group chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDatum {
    /// `"subject\ntopic"`.
    pub label: String,
    pub hours: f64,
}

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub subject: String,
    pub topic: String,
    pub sessions: usize,
    pub time: String,
}

// ── StudyReport ───────────────────────────────────────────────────────────────

/// Aggregated view of the session log at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyReport {
    pub generated_at: DateTime<Utc>,
    /// IANA name of the zone "today" was evaluated in.
    pub timezone: String,
    /// Number of valid records aggregated.
    pub total_sessions: usize,
    pub today_sessions: Vec<SessionRecord>,
    pub week_sessions: Vec<SessionRecord>,
    pub total_minutes: u64,
    pub today_minutes: u64,
    pub week_minutes: u64,
    /// Groups in first-seen key order.
    pub groups: Vec<SubjectTopicGroup>,
    /// Records dropped because they failed validation.
    pub skipped_count: usize,
}

impl StudyReport {
    /// Hours per group, in group order.
    pub fn chart_series(&self) -> Vec<ChartDatum> {
        self.groups
            .iter()
            .map(|g| ChartDatum {
                label: g.key.chart_label(),
                hours: g.hours(),
            })
            .collect()
    }

    /// Summary table rows, in group order.
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        self.groups
            .iter()
            .map(|g| SummaryRow {
                subject: g.key.subject.clone(),
                topic: g.key.topic.clone(),
                sessions: g.session_count,
                time: g.formatted_total(),
            })
            .collect()
    }

    pub fn group(&self, key: &GroupKey) -> Option<&SubjectTopicGroup> {
        self.groups.iter().find(|g| &g.key == key)
    }
}

// ── ReportOutcome ─────────────────────────────────────────────────────────────

/// Result of an aggregation run.
///
/// `NoData` means there is nothing to render; callers show a message
/// instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    NoData { skipped_count: usize },
    Ready(StudyReport),
}

impl ReportOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, ReportOutcome::NoData { .. })
    }

    pub fn skipped_count(&self) -> usize {
        match self {
            ReportOutcome::NoData { skipped_count } => *skipped_count,
            ReportOutcome::Ready(report) => report.skipped_count,
        }
    }

    pub fn report(&self) -> Option<&StudyReport> {
        match self {
            ReportOutcome::Ready(report) => Some(report),
            ReportOutcome::NoData { .. } => None,
        }
    }

    pub fn into_report(self) -> Option<StudyReport> {
        match self {
            ReportOutcome::Ready(report) => Some(report),
            ReportOutcome::NoData { .. } => None,
        }
    }
}

// ── ReportAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that builds [`StudyReport`]s.
pub struct ReportAggregator;

impl ReportAggregator {
    /// Validate `records` and aggregate the valid ones.
    ///
    /// Malformed records are skipped and counted; they never abort the run.
    pub fn aggregate(records: &[StoredSession], now: DateTime<Utc>, tz: Tz) -> ReportOutcome {
        let (valid, skipped_count) = Self::validate_all(records);
        Self::aggregate_records(valid, now, tz, skipped_count)
    }

    /// Aggregate records that are already validated.
    ///
    /// `skipped_count` is carried through unchanged.
    pub fn aggregate_records(
        records: Vec<SessionRecord>,
        now: DateTime<Utc>,
        tz: Tz,
        skipped_count: usize,
    ) -> ReportOutcome {
        if records.is_empty() {
            debug!(skipped_count, "no valid sessions to report on");
            return ReportOutcome::NoData { skipped_count };
        }

        let week_start = now - Duration::days(WEEK_WINDOW_DAYS);

        let today_sessions: Vec<SessionRecord> = records
            .iter()
            .filter(|r| is_same_local_day(&r.timestamp, &now, tz))
            .cloned()
            .collect();
        let week_sessions: Vec<SessionRecord> = records
            .iter()
            .filter(|r| r.timestamp >= week_start)
            .cloned()
            .collect();

        let total_minutes = sum_minutes(&records);
        let today_minutes = sum_minutes(&today_sessions);
        let week_minutes = sum_minutes(&week_sessions);
        let total_sessions = records.len();

        // Single pass; the index map remembers where each key first appeared.
        let mut index: HashMap<GroupKey, usize> = HashMap::new();
        let mut groups: Vec<SubjectTopicGroup> = Vec::new();
        for record in records {
            let key = record.key();
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push(SubjectTopicGroup::new(key));
                groups.len() - 1
            });
            groups[slot].add(record);
        }

        debug!(
            total_sessions,
            groups = groups.len(),
            today = today_sessions.len(),
            week = week_sessions.len(),
            skipped_count,
            "study report aggregated"
        );

        ReportOutcome::Ready(StudyReport {
            generated_at: now,
            timezone: tz.name().to_string(),
            total_sessions,
            today_sessions,
            week_sessions,
            total_minutes,
            today_minutes,
            week_minutes,
            groups,
            skipped_count,
        })
    }

    /// Valid sessions recorded on `now`'s local calendar day, in log order.
    pub fn today_sessions(
        records: &[StoredSession],
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Vec<SessionRecord> {
        Self::validate_all(records)
            .0
            .into_iter()
            .filter(|r| is_same_local_day(&r.timestamp, &now, tz))
            .collect()
    }

    /// Split `records` into valid sessions and a count of rejected ones.
    fn validate_all(records: &[StoredSession]) -> (Vec<SessionRecord>, usize) {
        let mut valid = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for (position, stored) in records.iter().enumerate() {
            match stored.validate() {
                Ok(record) => valid.push(record),
                Err(e) => {
                    skipped += 1;
                    warn!(position, error = %e, "skipping malformed session record");
                }
            }
        }
        (valid, skipped)
    }
}

/// Sum of `duration_minutes`.
pub fn sum_minutes(records: &[SessionRecord]) -> u64 {
    records
        .iter()
        .map(|r| u64::from(r.duration_minutes))
        .sum()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
