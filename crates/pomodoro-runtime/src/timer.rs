//! Pomodoro work/break state machine.
//!
//! Driven by one-second ticks from the orchestrator. The machine itself knows
//! nothing about wall-clock time or storage; it only reports phase
//! completions.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pomodoro_core::error::{PomodoroError, Result};
use pomodoro_core::models::{FocusTarget, SessionRecord};

/// Allowed work phase lengths, in minutes.
pub const WORK_MINUTES_RANGE: RangeInclusive<u32> = 1..=60;
/// Allowed break lengths, in minutes.
pub const BREAK_MINUTES_RANGE: RangeInclusive<u32> = 1..=30;

/// Which half of the cycle is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }

    fn next(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }
}

/// Emitted by [`PomodoroTimer::tick`] when a phase runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A work phase finished; `minutes` is the configured work length.
    WorkCompleted { minutes: u32 },
    BreakCompleted,
}

/// Countdown state for one Pomodoro cycle.
#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    work_minutes: u32,
    break_minutes: u32,
    phase: Phase,
    remaining_secs: u32,
    running: bool,
    focus: Option<FocusTarget>,
}

impl PomodoroTimer {
    /// A stopped timer at the start of a work phase.
    pub fn new(work_minutes: u32, break_minutes: u32) -> Result<Self> {
        check_range("work", work_minutes, &WORK_MINUTES_RANGE)?;
        check_range("break", break_minutes, &BREAK_MINUTES_RANGE)?;
        Ok(Self {
            work_minutes,
            break_minutes,
            phase: Phase::Work,
            remaining_secs: work_minutes * 60,
            running: false,
            focus: None,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub fn focus(&self) -> Option<&FocusTarget> {
        self.focus.as_ref()
    }

    /// Full length of the current phase in seconds.
    pub fn phase_total_secs(&self) -> u32 {
        self.phase_length(self.phase)
    }

    // ── Controls ──────────────────────────────────────────────────────────────

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Stop and rewind to the beginning of a work phase.
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.remaining_secs = self.phase_length(Phase::Work);
    }

    /// Change the work length. The countdown is reloaded with the new length
    /// whatever phase is current.
    pub fn set_work_minutes(&mut self, minutes: u32) -> Result<()> {
        check_range("work", minutes, &WORK_MINUTES_RANGE)?;
        self.work_minutes = minutes;
        self.remaining_secs = minutes * 60;
        Ok(())
    }

    /// Change the break length. Only an ongoing break is reloaded.
    pub fn set_break_minutes(&mut self, minutes: u32) -> Result<()> {
        check_range("break", minutes, &BREAK_MINUTES_RANGE)?;
        self.break_minutes = minutes;
        if self.phase == Phase::Break {
            self.remaining_secs = minutes * 60;
        }
        Ok(())
    }

    pub fn set_focus(&mut self, subject: &str, topic: &str) -> Result<()> {
        self.focus = Some(FocusTarget::new(subject, topic)?);
        Ok(())
    }

    // ── Ticking ───────────────────────────────────────────────────────────────

    /// Advance by one second.
    ///
    /// A phase completes on the tick *after* the countdown reached zero; the
    /// phase then flips, the countdown reloads and the timer keeps running.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
            return None;
        }

        let event = match self.phase {
            Phase::Work => TimerEvent::WorkCompleted {
                minutes: self.work_minutes,
            },
            Phase::Break => TimerEvent::BreakCompleted,
        };
        self.phase = self.phase.next();
        self.remaining_secs = self.phase_length(self.phase);
        Some(event)
    }

    /// The record a completion should produce, if any.
    ///
    /// Only finished work phases with a focus set are recorded.
    pub fn session_for(&self, event: TimerEvent, at: DateTime<Utc>) -> Option<SessionRecord> {
        match (event, &self.focus) {
            (TimerEvent::WorkCompleted { minutes }, Some(focus)) => Some(focus.record(minutes, at)),
            _ => None,
        }
    }

    fn phase_length(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes * 60,
            Phase::Break => self.break_minutes * 60,
        }
    }
}

fn check_range(kind: &'static str, minutes: u32, range: &RangeInclusive<u32>) -> Result<()> {
    if range.contains(&minutes) {
        Ok(())
    } else {
        Err(PomodoroError::InvalidDuration {
            kind,
            minutes,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Tick until an event fires, returning it and the number of ticks used.
    fn run_until_event(timer: &mut PomodoroTimer) -> (TimerEvent, u32) {
        for n in 1..=10_000 {
            if let Some(event) = timer.tick() {
                return (event, n);
            }
        }
        panic!("no event within 10000 ticks");
    }

    #[test]
    fn test_new_timer_is_stopped_in_work_phase() {
        let timer = PomodoroTimer::new(25, 5).unwrap();
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining_secs(), 1500);
        assert_eq!(timer.phase_total_secs(), 1500);
        assert!(!timer.is_running());
        assert!(timer.focus().is_none());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(PomodoroTimer::new(0, 5).is_err());
        assert!(PomodoroTimer::new(61, 5).is_err());
        assert!(PomodoroTimer::new(25, 31).is_err());
    }

    #[test]
    fn test_tick_does_nothing_while_paused() {
        let mut timer = PomodoroTimer::new(1, 1).unwrap();
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining_secs(), 60);
    }

    #[test]
    fn test_work_completes_after_length_plus_one_tick() {
        let mut timer = PomodoroTimer::new(1, 2).unwrap();
        timer.start();

        let (event, ticks) = run_until_event(&mut timer);
        assert_eq!(event, TimerEvent::WorkCompleted { minutes: 1 });
        assert_eq!(ticks, 61);
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.remaining_secs(), 120);
        assert!(timer.is_running(), "timer keeps running into the break");
    }

    #[test]
    fn test_break_completes_and_returns_to_work() {
        let mut timer = PomodoroTimer::new(1, 1).unwrap();
        timer.start();
        run_until_event(&mut timer);

        let (event, _) = run_until_event(&mut timer);
        assert_eq!(event, TimerEvent::BreakCompleted);
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining_secs(), 60);
    }

    #[test]
    fn test_reset_restores_work_phase() {
        let mut timer = PomodoroTimer::new(1, 1).unwrap();
        timer.start();
        run_until_event(&mut timer);
        timer.tick();

        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining_secs(), 60);
    }

    #[test]
    fn test_toggle() {
        let mut timer = PomodoroTimer::new(25, 5).unwrap();
        timer.toggle();
        assert!(timer.is_running());
        timer.toggle();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_set_work_minutes_reloads_countdown() {
        let mut timer = PomodoroTimer::new(25, 5).unwrap();
        timer.start();
        timer.tick();
        timer.set_work_minutes(50).unwrap();
        assert_eq!(timer.work_minutes(), 50);
        assert_eq!(timer.remaining_secs(), 3000);
    }

    #[test]
    fn test_set_work_minutes_rejects_out_of_range_unchanged() {
        let mut timer = PomodoroTimer::new(25, 5).unwrap();
        let err = timer.set_work_minutes(61).unwrap_err();
        assert!(matches!(err, PomodoroError::InvalidDuration { max: 60, .. }));
        assert_eq!(timer.work_minutes(), 25);
        assert_eq!(timer.remaining_secs(), 1500);
    }

    #[test]
    fn test_set_break_minutes_only_reloads_during_break() {
        let mut timer = PomodoroTimer::new(1, 5).unwrap();
        timer.set_break_minutes(10).unwrap();
        assert_eq!(timer.remaining_secs(), 60, "work countdown untouched");

        timer.start();
        run_until_event(&mut timer);
        timer.set_break_minutes(3).unwrap();
        assert_eq!(timer.remaining_secs(), 180);
        assert!(timer.set_break_minutes(0).is_err());
    }

    #[test]
    fn test_set_focus_validates() {
        let mut timer = PomodoroTimer::new(25, 5).unwrap();
        assert!(matches!(
            timer.set_focus("Math", " "),
            Err(PomodoroError::MissingFocus)
        ));
        assert!(timer.focus().is_none());

        timer.set_focus(" Math ", "Algebra").unwrap();
        assert_eq!(timer.focus().unwrap().subject, "Math");
    }

    #[test]
    fn test_session_for_work_completion_with_focus() {
        let mut timer = PomodoroTimer::new(25, 5).unwrap();
        timer.set_focus("Math", "Algebra").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();

        let record = timer
            .session_for(TimerEvent::WorkCompleted { minutes: 25 }, at)
            .unwrap();
        assert_eq!(record.subject, "Math");
        assert_eq!(record.duration_minutes, 25);
        assert_eq!(record.timestamp, at);

        assert!(timer.session_for(TimerEvent::BreakCompleted, at).is_none());
    }

    #[test]
    fn test_session_for_without_focus_records_nothing() {
        let timer = PomodoroTimer::new(25, 5).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        assert!(timer
            .session_for(TimerEvent::WorkCompleted { minutes: 25 }, at)
            .is_none());
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::Work.label(), "Work");
        assert_eq!(Phase::Break.label(), "Break");
    }
}
