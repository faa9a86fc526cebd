//! Live Pomodoro timer screen.

use chrono_tz::Tz;
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame,
};

use pomodoro_core::formatting::{format_countdown, format_hours_minutes};
use pomodoro_core::time_utils::format_local_time;
use pomodoro_runtime::orchestrator::TimerSnapshot;
use pomodoro_runtime::timer::Phase;

use crate::components::header::Header;
use crate::components::progress_bar::PhaseProgressBar;
use crate::themes::Theme;

pub const TIMER_TITLE: &str = "Pomodoro study tracker";

/// Render the timer screen into `area`.
pub fn render_timer_view(
    frame: &mut Frame,
    area: Rect,
    snapshot: &TimerSnapshot,
    tz: Tz,
    theme: &Theme,
) {
    let lines = build_timer_lines(snapshot, tz, theme);
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

/// Build every line of the timer screen (extracted for testability).
pub fn build_timer_lines<'a>(snapshot: &TimerSnapshot, tz: Tz, theme: &'a Theme) -> Vec<Line<'a>> {
    let mut lines = Header::new(TIMER_TITLE, "timer", tz.name(), theme).to_lines();
    let is_break = snapshot.phase == Phase::Break;

    // ── Countdown ─────────────────────────────────────────────────────────────
    let state = if snapshot.running { "running" } else { "paused" };
    lines.push(Line::from(vec![
        Span::styled(format!("{:<6}", snapshot.phase.label()), theme.phase_style(is_break)),
        Span::styled(format_countdown(snapshot.remaining_secs), theme.countdown),
        Span::styled(format!("  ({state})"), theme.dim),
    ]));

    lines.push(
        PhaseProgressBar::new(
            snapshot.elapsed_secs(),
            snapshot.phase_total_secs,
            is_break,
            theme,
        )
        .to_line(),
    );
    lines.push(Line::from(""));

    // ── Focus and configuration ───────────────────────────────────────────────
    lines.push(match &snapshot.focus {
        Some(focus) => Line::from(vec![
            Span::styled("Focus:   ", theme.label),
            Span::styled(focus.to_string(), theme.value),
        ]),
        None => Line::from(vec![
            Span::styled("Focus:   ", theme.label),
            Span::styled(
                "not set, completed work will not be recorded (press f to set)",
                theme.warning,
            ),
        ]),
    });
    lines.push(Line::from(vec![
        Span::styled("Lengths: ", theme.label),
        Span::styled(format!("work {}m", snapshot.work_minutes), theme.text),
        Span::styled(" | ", theme.separator),
        Span::styled(format!("break {}m", snapshot.break_minutes), theme.text),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Today:   ", theme.label),
        Span::styled(
            format!("{} sessions", snapshot.today_sessions.len()),
            theme.value,
        ),
        Span::styled(" | ", theme.separator),
        Span::styled(format_hours_minutes(snapshot.today_minutes), theme.value),
    ]));

    if let Some(err) = &snapshot.last_error {
        lines.push(Line::from(Span::styled(format!("! {err}"), theme.error)));
    }
    lines.push(Line::from(""));

    // ── Today's sessions, newest at the bottom ────────────────────────────────
    if snapshot.today_sessions.is_empty() {
        lines.push(Line::from(Span::styled("No sessions recorded today", theme.dim)));
    } else {
        for record in &snapshot.today_sessions {
            lines.push(Line::from(vec![
                Span::styled(format_local_time(&record.timestamp, tz), theme.label),
                Span::raw("  "),
                Span::styled(format!("{} - {}", record.subject, record.topic), theme.text),
                Span::styled(format!("  {}m", record.duration_minutes), theme.dim),
            ]));
        }
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "space start/pause | r reset | +/- work | b/B break | f focus | q quit",
        theme.key_hint,
    )));

    lines
}

// ── Tests ──────────────────────────────────────────────────────────────────────
