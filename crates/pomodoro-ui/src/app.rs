//! Application state and TUI event loops.
//!
//! [`App`] owns the theme, the display timezone and the last timer snapshot.
//! It drives both the live timer screen and the static report screen.

use std::io::{self, Stdout};
use std::time::Duration;

use chrono_tz::Tz;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use pomodoro_data::aggregator::ReportOutcome;
use pomodoro_runtime::orchestrator::{TimerCommand, TimerControl, TimerSnapshot};
use pomodoro_runtime::timer::{BREAK_MINUTES_RANGE, WORK_MINUTES_RANGE};

use crate::report_view;
use crate::themes::Theme;
use crate::timer_view;

/// How long each loop iteration waits for a key press.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// ── FocusPrompt ───────────────────────────────────────────────────────────────

/// Which half of the focus the prompt is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusField {
    Subject,
    Topic,
}

/// Inline subject/topic entry on the timer screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusPrompt {
    pub field: FocusField,
    pub subject: String,
    pub topic: String,
}

impl FocusPrompt {
    /// Start editing, pre-filled with the current focus if there is one.
    pub fn from_snapshot(snapshot: Option<&TimerSnapshot>) -> Self {
        let focus = snapshot.and_then(|s| s.focus.as_ref());
        Self {
            field: FocusField::Subject,
            subject: focus.map(|f| f.subject.clone()).unwrap_or_default(),
            topic: focus.map(|f| f.topic.clone()).unwrap_or_default(),
        }
    }

    fn buffer_mut(&mut self) -> &mut String {
        match self.field {
            FocusField::Subject => &mut self.subject,
            FocusField::Topic => &mut self.topic,
        }
    }

    pub fn to_line<'a>(&self, theme: &Theme) -> Line<'a> {
        let (subject_style, topic_style) = match self.field {
            FocusField::Subject => (theme.value, theme.dim),
            FocusField::Topic => (theme.dim, theme.value),
        };
        Line::from(vec![
            Span::styled("Subject: ", theme.label),
            Span::styled(self.subject.clone(), subject_style),
            Span::styled(" | ", theme.separator),
            Span::styled("Topic: ", theme.label),
            Span::styled(self.topic.clone(), topic_style),
            Span::styled("  (tab switch, enter confirm, esc cancel)", theme.key_hint),
        ])
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state.
pub struct App {
    pub theme: Theme,
    pub tz: Tz,
    pub student: String,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    /// Most recent timer snapshot, `None` until the first one arrives.
    pub last_snapshot: Option<TimerSnapshot>,
    /// First visible line of the report details pane.
    pub scroll: u16,
    /// Open while the user is typing a new subject/topic.
    pub prompt: Option<FocusPrompt>,
}

impl App {
    pub fn new(theme_name: &str, tz: Tz, student: impl Into<String>) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            tz,
            student: student.into(),
            should_quit: false,
            last_snapshot: None,
            scroll: 0,
            prompt: None,
        }
    }

    // ── Public event loops ────────────────────────────────────────────────────

    /// Run the live timer screen.
    ///
    /// Keys are turned into [`TimerCommand`]s; snapshots are drained from
    /// `rx` without blocking. Exits on `q`, `Ctrl+C` or when the timer task
    /// goes away.
    pub async fn run_timer(
        mut self,
        control: TimerControl,
        mut rx: mpsc::Receiver<TimerSnapshot>,
    ) -> io::Result<()> {
        let mut terminal = setup_terminal()?;

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render_timer(frame)) {
                break Err(e);
            }

            match poll_key() {
                Ok(Some(key)) => {
                    if let Some(command) = self.handle_timer_key(key) {
                        control.try_send(command);
                    }
                }
                Ok(None) => {}
                Err(e) => break Err(e),
            }

            loop {
                match rx.try_recv() {
                    Ok(snapshot) => self.last_snapshot = Some(snapshot),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        tracing::warn!("timer task stopped; leaving timer view");
                        self.should_quit = true;
                        break;
                    }
                }
            }

            if self.should_quit {
                break Ok(());
            }
        };

        restore_terminal(&mut terminal)?;
        result
    }

    /// Show a report until `q` / `Ctrl+C`.
    pub async fn run_report(mut self, outcome: ReportOutcome) -> io::Result<()> {
        let mut terminal = setup_terminal()?;

        let result = loop {
            let drawn = terminal.draw(|frame| {
                let area = frame.area();
                report_view::render_outcome(
                    frame,
                    area,
                    &outcome,
                    &self.student,
                    self.tz,
                    &self.theme,
                    self.scroll,
                );
            });
            if let Err(e) = drawn {
                break Err(e);
            }

            match poll_key() {
                Ok(Some(key)) => self.handle_report_key(key),
                Ok(None) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        restore_terminal(&mut terminal)?;
        result
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    /// Map a key on the timer screen to a command, or set `should_quit`.
    pub fn handle_timer_key(&mut self, key: KeyEvent) -> Option<TimerCommand> {
        if is_ctrl_c(&key) {
            self.should_quit = true;
            return None;
        }
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }
        if is_quit(&key) {
            self.should_quit = true;
            return None;
        }
        match key.code {
            KeyCode::Char(' ') => Some(TimerCommand::Toggle),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(TimerCommand::Reset),
            KeyCode::Char('+') | KeyCode::Char('=') => self.work_minutes_step(1),
            KeyCode::Char('-') | KeyCode::Char('_') => self.work_minutes_step(-1),
            KeyCode::Char('b') => self.break_minutes_step(1),
            KeyCode::Char('B') => self.break_minutes_step(-1),
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.prompt = Some(FocusPrompt::from_snapshot(self.last_snapshot.as_ref()));
                None
            }
            _ => None,
        }
    }

    /// Edit the open focus prompt. `Enter` on the topic closes it and yields
    /// [`TimerCommand::SetFocus`]; the timer validates the pair.
    fn handle_prompt_key(&mut self, key: KeyEvent) -> Option<TimerCommand> {
        let prompt = self.prompt.as_mut()?;
        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Tab | KeyCode::BackTab => {
                prompt.field = match prompt.field {
                    FocusField::Subject => FocusField::Topic,
                    FocusField::Topic => FocusField::Subject,
                };
            }
            KeyCode::Enter => match prompt.field {
                FocusField::Subject => prompt.field = FocusField::Topic,
                FocusField::Topic => {
                    let prompt = self.prompt.take()?;
                    return Some(TimerCommand::SetFocus {
                        subject: prompt.subject,
                        topic: prompt.topic,
                    });
                }
            },
            KeyCode::Backspace => {
                prompt.buffer_mut().pop();
            }
            KeyCode::Char(c) => prompt.buffer_mut().push(c),
            _ => {}
        }
        None
    }

    /// Scroll the details pane or quit.
    pub fn handle_report_key(&mut self, key: KeyEvent) {
        if is_quit(&key) {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Home => self.scroll = 0,
            _ => {}
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    /// Work length one step up or down, if it stays within range.
    fn work_minutes_step(&self, delta: i64) -> Option<TimerCommand> {
        let current = self.last_snapshot.as_ref()?.work_minutes;
        let next = u32::try_from(i64::from(current) + delta).ok()?;
        WORK_MINUTES_RANGE
            .contains(&next)
            .then_some(TimerCommand::SetWorkMinutes(next))
    }

    /// Break length one step up or down, if it stays within range.
    fn break_minutes_step(&self, delta: i64) -> Option<TimerCommand> {
        let current = self.last_snapshot.as_ref()?.break_minutes;
        let next = u32::try_from(i64::from(current) + delta).ok()?;
        BREAK_MINUTES_RANGE
            .contains(&next)
            .then_some(TimerCommand::SetBreakMinutes(next))
    }

    fn render_timer(&self, frame: &mut Frame) {
        let area = frame.area();
        match &self.last_snapshot {
            Some(snapshot) => {
                timer_view::render_timer_view(frame, area, snapshot, self.tz, &self.theme);
                if let (Some(prompt), true) = (&self.prompt, area.height > 0) {
                    let row = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
                    frame.render_widget(Paragraph::new(prompt.to_line(&self.theme)), row);
                }
            }
            None => {
                let text = vec![
                    Line::from(""),
                    Line::from(Span::styled("Starting timer...", self.theme.dim)),
                    Line::from(Span::styled("Press 'q' or Ctrl+C to exit", self.theme.dim)),
                ];
                frame.render_widget(
                    Paragraph::new(Text::from(text))
                        .block(Block::default().borders(Borders::ALL).title(" Pomodoro ")),
                    area,
                );
            }
        }
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn is_quit(key: &KeyEvent) -> bool {
    is_ctrl_c(key) || matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
}

/// Wait up to [`POLL_INTERVAL`] for a key press.
fn poll_key() -> io::Result<Option<KeyEvent>> {
    if event::poll(POLL_INTERVAL)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(Some(key));
            }
        }
    }
    Ok(None)
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
