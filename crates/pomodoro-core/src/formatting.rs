/// Format a minute total as whole hours plus remaining minutes.
///
/// Zero hours are still shown, so the result always has both parts.
///
/// # Examples
///
/// ```
/// use pomodoro_core::formatting::format_hours_minutes;
///
/// assert_eq!(format_hours_minutes(25),  "0h 25m");
/// assert_eq!(format_hours_minutes(60),  "1h 0m");
/// assert_eq!(format_hours_minutes(135), "2h 15m");
/// assert_eq!(format_hours_minutes(0),   "0h 0m");
/// ```
pub fn format_hours_minutes(minutes: u64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Convert a minute total to hours, rounded to two decimal places.
///
/// # Examples
///
/// ```
/// use pomodoro_core::formatting::minutes_to_hours;
///
/// assert_eq!(minutes_to_hours(90), 1.5);
/// assert_eq!(minutes_to_hours(25), 0.42);
/// assert_eq!(minutes_to_hours(0),  0.0);
/// ```
pub fn minutes_to_hours(minutes: u64) -> f64 {
    round_to(minutes as f64 / 60.0, 2)
}

/// Format a countdown in seconds as `MM:SS`.
///
/// # Examples
///
/// ```
/// use pomodoro_core::formatting::format_countdown;
///
/// assert_eq!(format_countdown(1500), "25:00");
/// assert_eq!(format_countdown(61),   "01:01");
/// assert_eq!(format_countdown(0),    "00:00");
/// ```
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Sentence noting how many malformed records were left out.
///
/// # Examples
///
/// ```
/// use pomodoro_core::formatting::format_skipped;
///
/// assert_eq!(format_skipped(1), "1 malformed record was skipped");
/// assert_eq!(format_skipped(3), "3 malformed records were skipped");
/// ```
pub fn format_skipped(count: usize) -> String {
    if count == 1 {
        "1 malformed record was skipped".to_string()
    } else {
        format!("{count} malformed records were skipped")
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    round_to((part / whole) * 100.0, decimal_places)
}

fn round_to(value: f64, decimal_places: u32) -> f64 {
    let factor = 10_f64.powi(decimal_places as i32);
    // Nudge by a relative epsilon so values like 1.005 round up as in decimal.
    let epsilon = f64::EPSILON * value.abs() * factor;
    ((value * factor) + epsilon).round() / factor
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hours_minutes_under_an_hour() {
        assert_eq!(format_hours_minutes(1), "0h 1m");
        assert_eq!(format_hours_minutes(59), "0h 59m");
    }

    #[test]
    fn test_format_hours_minutes_exact_hours() {
        assert_eq!(format_hours_minutes(120), "2h 0m");
    }

    #[test]
    fn test_format_hours_minutes_large() {
        assert_eq!(format_hours_minutes(10_000), "166h 40m");
    }

    #[test]
    fn test_minutes_to_hours_rounding() {
        assert_eq!(minutes_to_hours(50), 0.83);
        assert_eq!(minutes_to_hours(100), 1.67);
        assert_eq!(minutes_to_hours(1), 0.02);
    }

    #[test]
    fn test_format_countdown_pads() {
        assert_eq!(format_countdown(5), "00:05");
        assert_eq!(format_countdown(3600), "60:00");
    }

    #[test]
    fn test_percentage_basic() {
        let p = percentage(50.0, 200.0, 1);
        assert!((p - 25.0).abs() < 1e-9, "percentage = {p}");
    }

    #[test]
    fn test_percentage_zero_whole() {
        assert_eq!(percentage(10.0, 0.0, 2), 0.0);
    }

    #[test]
    fn test_percentage_rounding() {
        let p = percentage(1.0, 3.0, 2);
        assert!((p - 33.33).abs() < 1e-9, "percentage = {p}");
    }

    #[test]
    fn test_format_skipped_singular_and_plural() {
        assert_eq!(format_skipped(1), "1 malformed record was skipped");
        assert_eq!(format_skipped(0), "0 malformed records were skipped");
        assert_eq!(format_skipped(12), "12 malformed records were skipped");
    }
}
