use crate::themes::Theme;
use pomodoro_core::formatting::percentage;
use ratatui::style::Style;
use ratatui::text::{Line, Span};

/// Configuration controlling visual appearance of a progress bar.
pub struct ProgressBarConfig {
    /// Width in terminal columns of the bar portion (excluding label).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
}

impl Default for ProgressBarConfig {
    fn default() -> Self {
        Self {
            width: 50,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
        }
    }
}

/// Build the filled and empty runs for `fraction` of `config.width`.
fn bar_runs(fraction: f64, config: &ProgressBarConfig) -> (String, String) {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * f64::from(config.width)) as u16;
    let empty = config.width.saturating_sub(filled);
    (
        std::iter::repeat_n(config.filled_char, filled as usize).collect(),
        std::iter::repeat_n(config.empty_char, empty as usize).collect(),
    )
}

// ── PhaseProgressBar ─────────────────────────────────────────────────────────

/// Elapsed share of the current work or break phase.
pub struct PhaseProgressBar<'a> {
    pub elapsed_secs: u32,
    pub total_secs: u32,
    pub is_break: bool,
    pub theme: &'a Theme,
    pub config: ProgressBarConfig,
}

impl<'a> PhaseProgressBar<'a> {
    pub fn new(elapsed_secs: u32, total_secs: u32, is_break: bool, theme: &'a Theme) -> Self {
        Self {
            elapsed_secs,
            total_secs,
            is_break,
            theme,
            config: ProgressBarConfig::default(),
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        let pct = percentage(f64::from(self.elapsed_secs), f64::from(self.total_secs), 0).min(100.0);
        let (filled, empty) = bar_runs(pct / 100.0, &self.config);

        Line::from(vec![
            Span::styled(filled, self.theme.phase_style(self.is_break)),
            Span::styled(empty, self.theme.progress_empty),
            Span::styled(format!(" {pct:.0}%"), self.theme.label),
        ])
    }
}

// ── HoursBar ─────────────────────────────────────────────────────────────────

/// One horizontal bar of the report chart, scaled against the largest group.
pub struct HoursBar<'a> {
    pub hours: f64,
    pub max_hours: f64,
    pub style: Style,
    pub theme: &'a Theme,
    pub config: ProgressBarConfig,
}

impl<'a> HoursBar<'a> {
    pub fn new(hours: f64, max_hours: f64, theme: &'a Theme) -> Self {
        Self {
            hours,
            max_hours,
            style: theme.chart_bar,
            theme,
            config: ProgressBarConfig {
                width: 30,
                empty_char: ' ',
                ..ProgressBarConfig::default()
            },
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        let fraction = if self.max_hours > 0.0 {
            self.hours / self.max_hours
        } else {
            0.0
        };
        let (filled, empty) = bar_runs(fraction, &self.config);

        Line::from(vec![
            Span::styled(filled, self.style),
            Span::raw(empty),
            Span::styled(format!(" {:.2}h", self.hours), self.theme.value),
        ])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
