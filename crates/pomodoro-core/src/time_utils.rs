use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Largest absolute epoch-millisecond value a stored timestamp may carry
/// (±100,000,000 days, the range of an ECMAScript date).
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a timezone setting to a [`Tz`].
///
/// `"auto"` resolves to the system timezone; unknown names fall back to UTC
/// with a warning.
pub fn resolve_timezone(name: &str) -> Tz {
    let name = if name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        name.to_string()
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Convert epoch milliseconds to a UTC [`DateTime`].
///
/// Returns `None` for non-finite values and for anything outside the range
/// a stored session timestamp can legitimately hold.
pub fn datetime_from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    DateTime::from_timestamp_millis(millis.round() as i64)
}

/// Parse an ISO 8601 / RFC 3339 string into UTC.
///
/// Strings without an offset are read as UTC.
pub fn parse_iso_utc(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const FMTS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    FMTS.iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ── Calendar helpers ──────────────────────────────────────────────────────────

/// Calendar date of `dt` as observed in `tz`.
pub fn local_date(dt: &DateTime<Utc>, tz: Tz) -> NaiveDate {
    dt.with_timezone(&tz).date_naive()
}

/// Whether `a` and `b` fall on the same calendar date in `tz`.
pub fn is_same_local_day(a: &DateTime<Utc>, b: &DateTime<Utc>, tz: Tz) -> bool {
    local_date(a, tz) == local_date(b, tz)
}

// ── Display ───────────────────────────────────────────────────────────────────

/// `"2024-01-15 10:30"` in `tz`.
pub fn format_local_datetime(dt: &DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

/// `"10:30"` in `tz`.
pub fn format_local_time(dt: &DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%H:%M").to_string()
}

/// Long-form report date, e.g. `"Monday, January 15, 2024"`.
pub fn format_long_date(dt: &DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%A, %B %-d, %Y").to_string()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone as _, Timelike};

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("America/New_York"));
        assert!(validate_timezone("UTC"));
        assert!(!validate_timezone("Mars/Olympus"));
        assert!(!validate_timezone(""));
    }

    #[test]
    fn test_resolve_timezone_known() {
        assert_eq!(resolve_timezone("Asia/Tokyo"), Tz::Asia__Tokyo);
    }

    #[test]
    fn test_resolve_timezone_invalid_falls_back_to_utc() {
        assert_eq!(resolve_timezone("Invalid/Zone"), Tz::UTC);
    }

    #[test]
    fn test_resolve_timezone_auto_does_not_panic() {
        let _ = resolve_timezone("auto");
        let _ = resolve_timezone("AUTO");
    }

    #[test]
    fn test_datetime_from_millis() {
        let dt = datetime_from_millis(1_705_312_800_000.0).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_datetime_from_millis_rejects_non_finite_and_huge() {
        assert!(datetime_from_millis(f64::NAN).is_none());
        assert!(datetime_from_millis(f64::INFINITY).is_none());
        assert!(datetime_from_millis(1e300).is_none());
    }

    #[test]
    fn test_parse_iso_utc_z_suffix() {
        let dt = parse_iso_utc("2024-01-15T10:30:00.000Z").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_iso_utc_with_offset() {
        let dt = parse_iso_utc("2024-01-15T12:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_iso_utc_naive_is_utc() {
        let dt = parse_iso_utc("2024-01-15 08:15:00").unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_parse_iso_utc_garbage() {
        assert!(parse_iso_utc("").is_none());
        assert!(parse_iso_utc("not-a-date").is_none());
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        // 02:00 UTC on the 15th is still the 14th in New York.
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 2, 0, 0).unwrap();
        assert_eq!(local_date(&dt, Tz::UTC).day(), 15);
        assert_eq!(local_date(&dt, Tz::America__New_York).day(), 14);
    }

    #[test]
    fn test_is_same_local_day_depends_on_zone() {
        let a = Utc.with_ymd_and_hms(2024, 1, 15, 2, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 14, 23, 0, 0).unwrap();
        assert!(!is_same_local_day(&a, &b, Tz::UTC));
        assert!(is_same_local_day(&a, &b, Tz::America__New_York));
    }

    #[test]
    fn test_format_local_datetime() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 1, 12, 5, 0).unwrap();
        assert_eq!(format_local_datetime(&dt, Tz::UTC), "2024-06-01 12:05");
        assert_eq!(
            format_local_datetime(&dt, Tz::America__New_York),
            "2024-06-01 08:05"
        );
    }

    #[test]
    fn test_format_local_time() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 1, 9, 7, 0).unwrap();
        assert_eq!(format_local_time(&dt, Tz::UTC), "09:07");
    }

    #[test]
    fn test_format_long_date() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        assert_eq!(format_long_date(&dt, Tz::UTC), "Monday, January 15, 2024");
    }

    #[test]
    fn test_get_system_timezone_returns_nonempty_string() {
        assert!(!get_system_timezone().is_empty());
    }
}
