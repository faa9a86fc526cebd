//! Async timer orchestrator.
//!
//! Drives a [`PomodoroTimer`] from a tokio task. The TUI sends
//! [`TimerCommand`]s through a [`TimerControl`] and receives a
//! [`TimerSnapshot`] after every tick or command, so the two sides never share
//! mutable state. Completed work phases are appended to the [`SessionStore`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use pomodoro_core::models::{FocusTarget, SessionRecord};
use pomodoro_core::time_utils::is_same_local_day;
use pomodoro_data::aggregator::{sum_minutes, ReportAggregator};
use pomodoro_data::store::{load_or_empty, SessionStore};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::timer::{Phase, PomodoroTimer, TimerEvent};

/// Snapshot and command channel capacity.
const CHANNEL_CAPACITY: usize = 16;

// ── Public types ──────────────────────────────────────────────────────────────

/// Requests accepted by the running timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    /// Start when paused, pause when running.
    Toggle,
    Reset,
    SetWorkMinutes(u32),
    SetBreakMinutes(u32),
    SetFocus { subject: String, topic: String },
}

/// Everything the timer view needs for one frame.
#[derive(Debug, Clone)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_secs: u32,
    pub phase_total_secs: u32,
    pub running: bool,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub focus: Option<FocusTarget>,
    /// Sessions recorded on the current local day, in log order.
    pub today_sessions: Vec<SessionRecord>,
    pub today_minutes: u64,
    /// Most recent rejected command or store failure.
    pub last_error: Option<String>,
}

impl TimerSnapshot {
    /// Seconds of the current phase already elapsed.
    pub fn elapsed_secs(&self) -> u32 {
        self.phase_total_secs.saturating_sub(self.remaining_secs)
    }
}

// ── TimerControl ──────────────────────────────────────────────────────────────

/// Sending half of the command channel.
#[derive(Debug, Clone)]
pub struct TimerControl {
    tx: mpsc::Sender<TimerCommand>,
}

impl TimerControl {
    /// Send a command, waiting for channel capacity. Returns `false` once the
    /// timer task has stopped.
    pub async fn send(&self, command: TimerCommand) -> bool {
        self.tx.send(command).await.is_ok()
    }

    /// Non-blocking send for synchronous event loops.
    pub fn try_send(&self, command: TimerCommand) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "timer command dropped");
                false
            }
        }
    }
}

// ── TimerOrchestrator ─────────────────────────────────────────────────────────

/// Background owner of the timer.
pub struct TimerOrchestrator {
    timer: PomodoroTimer,
    store: Arc<dyn SessionStore>,
    tz: Tz,
    tick_interval: Duration,
    today: Vec<SessionRecord>,
    last_error: Option<String>,
}

impl TimerOrchestrator {
    /// `tz` decides which recorded sessions count as "today".
    pub fn new(timer: PomodoroTimer, store: Arc<dyn SessionStore>, tz: Tz) -> Self {
        Self {
            timer,
            store,
            tz,
            tick_interval: Duration::from_secs(1),
            today: Vec::new(),
            last_error: None,
        }
    }

    /// Override the one-second tick. Used by tests.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Spawn the timer loop.
    ///
    /// The loop stops when the snapshot receiver is dropped, when every
    /// [`TimerControl`] is dropped, or on [`TimerHandle::abort`].
    pub fn start(self) -> (TimerControl, mpsc::Receiver<TimerSnapshot>, TimerHandle) {
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let handle = tokio::spawn(async move {
            self.timer_loop(command_rx, snapshot_tx).await;
        });

        (
            TimerControl { tx: command_tx },
            snapshot_rx,
            TimerHandle { handle },
        )
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn timer_loop(
        mut self,
        mut commands: mpsc::Receiver<TimerCommand>,
        tx: mpsc::Sender<TimerSnapshot>,
    ) {
        let now = Utc::now();
        self.today = ReportAggregator::today_sessions(&load_or_empty(&*self.store), now, self.tz);
        debug!(today = self.today.len(), "timer loop starting");

        if tx.send(self.snapshot(now)).await.is_err() {
            return;
        }

        let mut interval = time::interval(self.tick_interval);
        // The first tick fires immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => self.on_tick(),
                command = commands.recv() => match command {
                    Some(command) => {
                        let was_running = self.timer.is_running();
                        self.apply(command);
                        if !was_running && self.timer.is_running() {
                            // A fresh start gets a full first second.
                            interval.reset();
                        }
                    }
                    None => {
                        debug!("timer command channel closed; exiting loop");
                        break;
                    }
                },
            }

            if tx.send(self.snapshot(Utc::now())).await.is_err() {
                debug!("timer snapshot channel closed; exiting loop");
                break;
            }
        }
    }

    fn on_tick(&mut self) {
        let Some(event) = self.timer.tick() else {
            return;
        };

        match self.timer.session_for(event, Utc::now()) {
            Some(record) => self.record(record),
            None => match event {
                TimerEvent::WorkCompleted { minutes } => {
                    info!(minutes, "work phase finished without a subject and topic; not recorded");
                }
                TimerEvent::BreakCompleted => debug!("break finished"),
            },
        }
    }

    fn record(&mut self, record: SessionRecord) {
        match self.store.append(&record) {
            Ok(()) => {
                info!(
                    subject = %record.subject,
                    topic = %record.topic,
                    minutes = record.duration_minutes,
                    "work phase completed"
                );
                self.last_error = None;
                self.today.push(record);
            }
            Err(e) => {
                warn!(error = %e, "failed to record completed session");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn apply(&mut self, command: TimerCommand) {
        debug!(?command, "timer command");
        let result = match command {
            TimerCommand::Start => {
                self.timer.start();
                Ok(())
            }
            TimerCommand::Pause => {
                self.timer.pause();
                Ok(())
            }
            TimerCommand::Toggle => {
                self.timer.toggle();
                Ok(())
            }
            TimerCommand::Reset => {
                self.timer.reset();
                Ok(())
            }
            TimerCommand::SetWorkMinutes(minutes) => self.timer.set_work_minutes(minutes),
            TimerCommand::SetBreakMinutes(minutes) => self.timer.set_break_minutes(minutes),
            TimerCommand::SetFocus { subject, topic } => self.timer.set_focus(&subject, &topic),
        };

        match result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                warn!(error = %e, "timer command rejected");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn snapshot(&mut self, now: DateTime<Utc>) -> TimerSnapshot {
        let tz = self.tz;
        self.today.retain(|r| is_same_local_day(&r.timestamp, &now, tz));

        TimerSnapshot {
            phase: self.timer.phase(),
            remaining_secs: self.timer.remaining_secs(),
            phase_total_secs: self.timer.phase_total_secs(),
            running: self.timer.is_running(),
            work_minutes: self.timer.work_minutes(),
            break_minutes: self.timer.break_minutes(),
            focus: self.timer.focus().cloned(),
            today_sessions: self.today.clone(),
            today_minutes: sum_minutes(&self.today),
            last_error: self.last_error.clone(),
        }
    }
}

// ── TimerHandle ───────────────────────────────────────────────────────────────

/// Handle to the background timer task.
pub struct TimerHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl TimerHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
