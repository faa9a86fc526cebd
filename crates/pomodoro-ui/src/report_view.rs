//! Study report screen.
//!
//! Overall statistics, a per subject/topic summary table, an hours-per-group
//! bar chart and the newest-first session list of every group.

use chrono_tz::Tz;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use pomodoro_core::formatting::{format_hours_minutes, format_skipped};
use pomodoro_core::time_utils::format_local_datetime;
use pomodoro_data::aggregator::{ReportOutcome, StudyReport};

use crate::components::header::Header;
use crate::components::progress_bar::HoursBar;
use crate::themes::Theme;

pub const REPORT_TITLE: &str = "Pomodoro study report";

/// Widest chart label before it is cut with an ellipsis.
const CHART_LABEL_WIDTH: usize = 28;

/// Render either the report or the no-data placeholder.
pub fn render_outcome(
    frame: &mut Frame,
    area: Rect,
    outcome: &ReportOutcome,
    student: &str,
    tz: Tz,
    theme: &Theme,
    scroll: u16,
) {
    match outcome {
        ReportOutcome::Ready(report) => {
            render_report_view(frame, area, report, student, tz, theme, scroll)
        }
        ReportOutcome::NoData { skipped_count } => {
            render_no_data(frame, area, *skipped_count, theme)
        }
    }
}

/// Render the full report into `area`. `scroll` offsets the details pane.
pub fn render_report_view(
    frame: &mut Frame,
    area: Rect,
    report: &StudyReport,
    student: &str,
    tz: Tz,
    theme: &Theme,
    scroll: u16,
) {
    let group_count = u16::try_from(report.groups.len()).unwrap_or(u16::MAX);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(4),
            // header + rows + total + borders
            Constraint::Length(group_count.saturating_add(4)),
            Constraint::Length(group_count.saturating_add(2)),
            Constraint::Min(3),
        ])
        .split(area);

    let header = Header::new(REPORT_TITLE, student, tz.name(), theme).to_lines();
    frame.render_widget(Paragraph::new(Text::from(header)), chunks[0]);

    frame.render_widget(
        Paragraph::new(Text::from(build_stats_lines(report, theme))).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(" Overall statistics "),
        ),
        chunks[1],
    );

    render_summary_table(frame, chunks[2], report, theme);

    frame.render_widget(
        Paragraph::new(Text::from(build_chart_lines(report, theme))).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(" Study time by subject & topic "),
        ),
        chunks[3],
    );

    frame.render_widget(
        Paragraph::new(Text::from(build_detail_lines(report, tz, theme)))
            .scroll((scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(" Sessions (j/k to scroll, q to quit) "),
            ),
        chunks[4],
    );
}

/// The two statistics rows.
pub fn build_stats_lines<'a>(report: &StudyReport, theme: &'a Theme) -> Vec<Line<'a>> {
    let mut second = vec![
        Span::styled("Today's time: ", theme.label),
        Span::styled(format_hours_minutes(report.today_minutes), theme.value),
        Span::styled("   This week's time: ", theme.label),
        Span::styled(format_hours_minutes(report.week_minutes), theme.value),
    ];
    if report.skipped_count > 0 {
        second.push(Span::styled(
            format!("   ({})", format_skipped(report.skipped_count)),
            theme.warning,
        ));
    }

    vec![
        Line::from(vec![
            Span::styled("Total sessions: ", theme.label),
            Span::styled(report.total_sessions.to_string(), theme.value),
            Span::styled("   Today's sessions: ", theme.label),
            Span::styled(report.today_sessions.len().to_string(), theme.value),
            Span::styled("   All time: ", theme.label),
            Span::styled(format_hours_minutes(report.total_minutes), theme.value),
        ]),
        Line::from(second),
    ]
}

fn render_summary_table(frame: &mut Frame, area: Rect, report: &StudyReport, theme: &Theme) {
    let header = Row::new(
        ["Subject", "Topic", "Sessions", "Time studied"]
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header)),
    )
    .height(1);

    let mut rows: Vec<Row> = report
        .summary_rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(vec![
                Cell::from(row.subject),
                Cell::from(row.topic),
                Cell::from(row.sessions.to_string()),
                Cell::from(row.time),
            ])
            .style(style)
        })
        .collect();

    rows.push(
        Row::new(vec![
            Cell::from("TOTAL"),
            Cell::from(format!("{} groups", report.groups.len())),
            Cell::from(report.total_sessions.to_string()),
            Cell::from(format_hours_minutes(report.total_minutes)),
        ])
        .style(theme.table_total),
    );

    let widths = [
        Constraint::Percentage(30),
        Constraint::Percentage(40),
        Constraint::Length(10),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(" Summary by subject & topic "),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// One bar per group, scaled against the largest group.
pub fn build_chart_lines<'a>(report: &StudyReport, theme: &'a Theme) -> Vec<Line<'a>> {
    let series = report.chart_series();
    let max_hours = series.iter().map(|d| d.hours).fold(0.0_f64, f64::max);

    series
        .into_iter()
        .map(|datum| {
            let label = truncate_to_width(&datum.label.replace('\n', " / "), CHART_LABEL_WIDTH);
            let mut spans = vec![Span::styled(pad_to_width(&label, CHART_LABEL_WIDTH), theme.label)];
            spans.push(Span::raw(" "));
            spans.extend(HoursBar::new(datum.hours, max_hours, theme).to_line().spans);
            Line::from(spans)
        })
        .collect()
}

/// Per group: a heading, its sessions newest first, and a totals line.
pub fn build_detail_lines<'a>(report: &StudyReport, tz: Tz, theme: &'a Theme) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for group in &report.groups {
        lines.push(Line::from(Span::styled(group.key.to_string(), theme.header)));
        for record in group.newest_first() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {}", format_local_datetime(&record.timestamp, tz)),
                    theme.text,
                ),
                Span::styled(format!("  {}m", record.duration_minutes), theme.value),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("  Total: ", theme.label),
            Span::styled(group.formatted_total(), theme.value),
            Span::styled(" | Sessions: ", theme.label),
            Span::styled(group.session_count.to_string(), theme.value),
        ]));
        lines.push(Line::from(""));
    }
    lines
}

/// Render a placeholder when the log holds nothing to report.
pub fn render_no_data(frame: &mut Frame, area: Rect, skipped_count: usize, theme: &Theme) {
    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled("No sessions to report", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Complete a Pomodoro work phase with a subject and topic first.",
            theme.dim,
        )),
    ];
    if skipped_count > 0 {
        text.push(Line::from(Span::styled(
            format!("{}.", format_skipped(skipped_count)),
            theme.error,
        )));
    }
    text.push(Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)));

    frame.render_widget(
        Paragraph::new(Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Pomodoro report "),
        ),
        area,
    );
}

// ── Text helpers ──────────────────────────────────────────────────────────────

/// Cut `s` to at most `max` display columns, ending in `…` when cut.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Right-pad with spaces to `width` display columns.
fn pad_to_width(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(pad))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
