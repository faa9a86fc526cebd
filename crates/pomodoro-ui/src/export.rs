//! Standalone report documents.
//!
//! HTML output is a single print-ready page (inline CSS and an inline SVG bar
//! chart, no external assets) so any browser can save it as PDF. JSON output
//! is the serialized [`StudyReport`] plus the student name.

use std::fmt::Write as _;
use std::path::Path;

use chrono_tz::Tz;
use serde::Serialize;
use tracing::info;

use pomodoro_core::error::{PomodoroError, Result};
use pomodoro_core::formatting::{format_hours_minutes, format_skipped};
use pomodoro_core::time_utils::{format_local_datetime, format_long_date};
use pomodoro_data::aggregator::{ChartDatum, ReportOutcome, StudyReport};

/// Bar colours, cycled per group.
const BAR_COLORS: [&str; 6] = [
    "#667eea", "#f49063", "#5ac4a8", "#fac858", "#ff7b90", "#8d9ceb",
];

const CHART_WIDTH: u32 = 650;
const CHART_MIN_HEIGHT: u32 = 250;
const CHART_ROW_HEIGHT: u32 = 50;
const CHART_LABEL_COLUMN: u32 = 170;
const CHART_VALUE_COLUMN: u32 = 60;

// ── ExportFormat ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Json,
}

impl ExportFormat {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(PomodoroError::Config(format!(
                "unknown export format '{other}' (expected html or json)"
            ))),
        }
    }
}

// ── Export entry point ────────────────────────────────────────────────────────

/// Write `outcome` to `path`. A `NoData` outcome is refused with
/// [`PomodoroError::EmptyReport`] and nothing is written.
pub fn export_report(
    outcome: &ReportOutcome,
    format: ExportFormat,
    student: &str,
    tz: Tz,
    path: &Path,
) -> Result<()> {
    let report = match outcome {
        ReportOutcome::Ready(report) => report,
        ReportOutcome::NoData { skipped_count } => {
            return Err(PomodoroError::EmptyReport {
                skipped_count: *skipped_count,
            })
        }
    };

    let document = match format {
        ExportFormat::Html => render_html(report, student, tz),
        ExportFormat::Json => render_json(report, student)?,
    };

    let write_err = |source: std::io::Error| PomodoroError::FileWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, document).map_err(write_err)?;

    info!(
        path = %path.display(),
        format = ?format,
        groups = report.groups.len(),
        "report exported"
    );
    Ok(())
}

// ── JSON ──────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonDocument<'a> {
    student: &'a str,
    #[serde(flatten)]
    report: &'a StudyReport,
}

/// Pretty-printed JSON document.
pub fn render_json(report: &StudyReport, student: &str) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonDocument { student, report })?)
}

// ── HTML ──────────────────────────────────────────────────────────────────────

/// Standalone HTML document. All user-provided text is escaped.
pub fn render_html(report: &StudyReport, student: &str, tz: Tz) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Pomodoro Study Report</title>\n");
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");

    // Header
    let _ = write!(
        html,
        "<div class=\"header\">\n<h1>Pomodoro Study Report</h1>\n\
         <p><strong>Student:</strong> {}</p>\n\
         <p><strong>Generated:</strong> {}</p>\n</div>\n",
        escape_html(student),
        escape_html(&format_long_date(&report.generated_at, tz)),
    );

    // Overall statistics
    html.push_str("<div class=\"page-break\">\n<h2>Overall Statistics</h2>\n<div class=\"stats-row\">\n");
    for (label, value) in [
        ("Total Sessions", report.total_sessions.to_string()),
        ("Today's Sessions", report.today_sessions.len().to_string()),
        ("Today's Study Time", format_hours_minutes(report.today_minutes)),
        ("This Week's Study Time", format_hours_minutes(report.week_minutes)),
    ] {
        let _ = write!(
            html,
            "<div class=\"stat-box\"><div class=\"stat-label\">{label}</div>\
             <div class=\"stat-val\">{value}</div></div>\n"
        );
    }
    html.push_str("</div>\n");
    if report.skipped_count > 0 {
        let _ = writeln!(
            html,
            "<p class=\"note\">{}.</p>",
            format_skipped(report.skipped_count)
        );
    }

    // Summary table
    html.push_str(
        "<h2>Summary by Subject &amp; Topic</h2>\n<table>\n<thead><tr>\
         <th>Subject</th><th>Topic</th><th>Sessions</th><th>Time Studied</th>\
         </tr></thead>\n<tbody>\n",
    );
    for row in report.summary_rows() {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td class=\"center\">{}</td><td class=\"center\">{}</td></tr>",
            escape_html(&row.subject),
            escape_html(&row.topic),
            row.sessions,
            row.time,
        );
    }
    html.push_str("</tbody>\n</table>\n");

    // Chart
    html.push_str("<div class=\"chart-container\">\n<h2>Study Time by Subject &amp; Topic</h2>\n");
    html.push_str(&render_svg_chart(&report.chart_series()));
    html.push_str("</div>\n</div>\n");

    // Details
    html.push_str("<div>\n<h2>Detailed Study Sessions by Subject &amp; Topic</h2>\n");
    for group in &report.groups {
        let _ = write!(
            html,
            "<div class=\"group\">\n<h3>{} - {}</h3>\n<table>\n<thead><tr>\
             <th>Date &amp; Time</th><th class=\"center\">Duration</th></tr></thead>\n<tbody>\n",
            escape_html(&group.key.subject),
            escape_html(&group.key.topic),
        );
        for record in group.newest_first() {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td class=\"center\">{}m</td></tr>",
                format_local_datetime(&record.timestamp, tz),
                record.duration_minutes,
            );
        }
        let _ = write!(
            html,
            "</tbody>\n</table>\n<p class=\"group-total\"><strong>Total:</strong> {} | \
             <strong>Sessions:</strong> {}</p>\n</div>\n",
            group.formatted_total(),
            group.session_count,
        );
    }
    html.push_str("</div>\n");

    html.push_str(
        "<div class=\"footer\"><p>Keep up the great work! Continue your learning journey.</p></div>\n",
    );
    html.push_str("</body>\n</html>\n");
    html
}

/// Horizontal bar chart, one bar per datum, with `N.Nh` value labels.
pub fn render_svg_chart(series: &[ChartDatum]) -> String {
    let rows = series.len() as u32;
    let height = CHART_MIN_HEIGHT.max(rows * CHART_ROW_HEIGHT);
    let plot_width = CHART_WIDTH - CHART_LABEL_COLUMN - CHART_VALUE_COLUMN;
    let row_height = if rows == 0 { height } else { height / rows };
    let bar_height = row_height * 3 / 5;
    let max_hours = series.iter().map(|d| d.hours).fold(0.0_f64, f64::max);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CHART_WIDTH}\" height=\"{height}\" \
         viewBox=\"0 0 {CHART_WIDTH} {height}\" role=\"img\" aria-label=\"Study time in hours\">"
    );

    for (i, datum) in series.iter().enumerate() {
        let row_top = i as u32 * row_height;
        let bar_top = row_top + (row_height - bar_height) / 2;
        let bar_width = if max_hours > 0.0 {
            (datum.hours / max_hours * f64::from(plot_width)).round() as u32
        } else {
            0
        };
        let color = BAR_COLORS[i % BAR_COLORS.len()];
        let mid = row_top + row_height / 2;

        // Two-line label: subject above topic.
        let mut label_lines = datum.label.splitn(2, '\n');
        let subject = label_lines.next().unwrap_or_default();
        let topic = label_lines.next().unwrap_or_default();
        let _ = writeln!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" text-anchor=\"end\" font-size=\"11\">\
             <tspan x=\"{x}\" dy=\"0\">{}</tspan><tspan x=\"{x}\" dy=\"13\">{}</tspan></text>",
            escape_html(subject),
            escape_html(topic),
            x = CHART_LABEL_COLUMN - 8,
            y = mid.saturating_sub(3),
        );
        let _ = writeln!(
            svg,
            "<rect x=\"{CHART_LABEL_COLUMN}\" y=\"{bar_top}\" width=\"{bar_width}\" \
             height=\"{bar_height}\" rx=\"6\" fill=\"{color}\"/>"
        );
        let _ = writeln!(
            svg,
            "<text x=\"{}\" y=\"{}\" font-size=\"11\" font-weight=\"bold\" fill=\"#333\">{:.1}h</text>",
            CHART_LABEL_COLUMN + bar_width + 6,
            mid + 4,
            datum.hours,
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Escape the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = r#"<style>
body { font-family: Arial, sans-serif; color: #333; margin: 0; padding: 0 10px 8px 10px; background: white; }
h1 { color: #667eea; font-size: 22px; margin: 0 0 3px 0; }
h2 { color: #2d3748; font-size: 15px; margin: 8px 0 4px 0; border-bottom: 2px solid #667eea; padding-bottom: 2px; }
h3 { color: #667eea; font-size: 14px; margin: 0 0 6px 0; }
table { width: 100%; border-collapse: collapse; margin: 2px 0; font-size: 11px; }
th { background: #667eea; color: white; padding: 5px; text-align: left; }
td { padding: 4px; border: 1px solid #999; font-size: 10px; }
tr:nth-child(even) { background: #f5f5f5; }
.center { text-align: center; }
.header { border-bottom: 2px solid #667eea; padding-bottom: 4px; }
.header p { margin: 1px 0; font-size: 11px; }
.stats-row { display: grid; grid-template-columns: 1fr 1fr; gap: 6px; margin: 3px 0; }
.stat-box { background: #f9f9f9; padding: 6px; border: 1px solid #e0e0e0; border-radius: 4px; font-size: 11px; }
.stat-val { font-size: 13px; color: #667eea; font-weight: bold; margin-top: 2px; }
.note { color: #c53030; font-size: 11px; }
.page-break { page-break-after: always; }
.chart-container { margin: 10px 0; padding: 12px; background: #f5f7fa; border-radius: 8px; text-align: center; }
.group { margin-bottom: 20px; background: #f9f9f9; padding: 15px; border-left: 4px solid #667eea; border-radius: 4px; }
.group-total { margin: 8px 0 0 0; color: #666; font-size: 12px; }
.footer { margin-top: 20px; text-align: center; border-top: 1px solid #ddd; padding-top: 10px; font-size: 11px; color: #999; }
</style>
"#;

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pomodoro_core::models::{SessionRecord, StoredSession};
    use pomodoro_data::aggregator::ReportAggregator;
    use tempfile::TempDir;

    fn make_outcome() -> ReportOutcome {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let records: Vec<StoredSession> = [
            SessionRecord::new("Math", "Algebra", 25, t0),
            SessionRecord::new("<b>Chem</b>", "Acids & Bases", 50, t0 + Duration::minutes(30)),
            SessionRecord::new("Math", "Algebra", 25, t0 + Duration::hours(1)),
        ]
        .iter()
        .map(StoredSession::from)
        .collect();
        ReportAggregator::aggregate(&records, t0 + Duration::hours(2), Tz::UTC)
    }

    fn make_report() -> StudyReport {
        make_outcome().into_report().unwrap()
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(ExportFormat::from_name("html").unwrap(), ExportFormat::Html);
        assert_eq!(ExportFormat::from_name("JSON").unwrap(), ExportFormat::Json);
        assert!(ExportFormat::from_name("pdf").is_err());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    // ── HTML ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_html_header_and_stats() {
        let html = render_html(&make_report(), "Ada <Lovelace>", Tz::UTC);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<strong>Student:</strong> Ada &lt;Lovelace&gt;"));
        assert!(html.contains("<strong>Generated:</strong> Monday, January 15, 2024"));
        assert!(html.contains("<div class=\"stat-val\">3</div>"));
        assert!(html.contains("<div class=\"stat-val\">1h 40m</div>"));
        assert!(!html.contains("malformed"));
    }

    #[test]
    fn test_html_escapes_user_text() {
        let html = render_html(&make_report(), "Ada", Tz::UTC);
        assert!(!html.contains("<b>Chem</b>"));
        assert!(html.contains("&lt;b&gt;Chem&lt;/b&gt;"));
        assert!(html.contains("Acids &amp; Bases"));
    }

    #[test]
    fn test_html_summary_and_details() {
        let html = render_html(&make_report(), "Ada", Tz::UTC);
        assert!(html.contains(
            "<tr><td>Math</td><td>Algebra</td><td class=\"center\">2</td><td class=\"center\">0h 50m</td></tr>"
        ));

        // Newest session of a group is listed first.
        let newer = html.find("2024-01-15 11:00").unwrap();
        let older = html.find("2024-01-15 10:00").unwrap();
        assert!(newer < older);
        assert!(html.contains("<strong>Total:</strong> 0h 50m | <strong>Sessions:</strong> 2"));
    }

    #[test]
    fn test_html_reports_skipped_records() {
        let mut report = make_report();
        report.skipped_count = 3;
        let html = render_html(&report, "Ada", Tz::UTC);
        assert!(html.contains("3 malformed records were skipped."));

        report.skipped_count = 1;
        let html = render_html(&report, "Ada", Tz::UTC);
        assert!(html.contains("1 malformed record was skipped."));
    }

    // ── SVG chart ─────────────────────────────────────────────────────────────

    #[test]
    fn test_svg_chart_one_bar_per_datum() {
        let series = make_report().chart_series();
        let svg = render_svg_chart(&series);
        assert_eq!(svg.matches("<rect ").count(), 2);
        assert!(svg.contains("fill=\"#667eea\""));
        assert!(svg.contains("fill=\"#f49063\""));
        assert!(svg.contains(">0.8h</text>"));
        assert!(svg.contains("height=\"250\""));
    }

    #[test]
    fn test_svg_chart_grows_with_groups() {
        let series: Vec<ChartDatum> = (0..8)
            .map(|i| ChartDatum {
                label: format!("S{i}\nT{i}"),
                hours: f64::from(i),
            })
            .collect();
        let svg = render_svg_chart(&series);
        assert!(svg.contains("height=\"400\""));
        // Largest value spans the full plot width.
        let plot = CHART_WIDTH - CHART_LABEL_COLUMN - CHART_VALUE_COLUMN;
        assert!(svg.contains(&format!("width=\"{plot}\"")));
        assert!(svg.contains("<tspan x=\"162\" dy=\"13\">T7</tspan>"));
    }

    #[test]
    fn test_svg_chart_empty() {
        let svg = render_svg_chart(&[]);
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<rect ").count(), 0);
    }

    // ── JSON ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_json_document() {
        let json = render_json(&make_report(), "Ada").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["student"], "Ada");
        assert_eq!(value["total_sessions"], 3);
        assert_eq!(value["total_minutes"], 100);
        assert_eq!(value["groups"].as_array().unwrap().len(), 2);
        assert_eq!(value["groups"][0]["key"]["subject"], "Math");
        assert_eq!(value["timezone"], "UTC");
    }

    // ── export_report ─────────────────────────────────────────────────────────

    #[test]
    fn test_export_writes_html_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("report.html");

        export_report(&make_outcome(), ExportFormat::Html, "Ada", Tz::UTC, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Pomodoro Study Report"));
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_export_writes_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        export_report(&make_outcome(), ExportFormat::Json, "Ada", Tz::UTC, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["student"], "Ada");
    }

    #[test]
    fn test_export_refuses_no_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.html");
        let outcome = ReportOutcome::NoData { skipped_count: 1 };

        let err = export_report(&outcome, ExportFormat::Html, "Ada", Tz::UTC, &path).unwrap_err();
        assert!(matches!(err, PomodoroError::EmptyReport { skipped_count: 1 }));
        assert!(!path.exists());
    }
}
