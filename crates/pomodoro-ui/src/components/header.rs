use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decorative marker placed either side of the application title.
pub const TOMATOES: &str = "● ○ ●";

/// Shared view header rendering four lines:
///
/// 1. Application title, upper-cased, between markers.
/// 2. A 60-column `=` separator.
/// 3. `[ context | timezone ]`, where context is the view name or student.
/// 4. An empty line.
pub struct Header<'a> {
    pub title: &'a str,
    pub context: &'a str,
    pub timezone: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(title: &'a str, context: &'a str, timezone: &'a str, theme: &'a Theme) -> Self {
        Self {
            title,
            context,
            timezone,
            theme,
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);

        vec![
            Line::from(vec![
                Span::styled(TOMATOES, self.theme.phase_work),
                Span::styled(format!(" {} ", self.title.to_uppercase()), self.theme.header),
                Span::styled(TOMATOES, self.theme.phase_work),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.context.to_string(), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.timezone.to_string(), self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}
