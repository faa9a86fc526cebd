mod bootstrap;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use pomodoro_core::settings::Settings;
use pomodoro_core::time_utils::resolve_timezone;
use pomodoro_data::aggregator::{ReportAggregator, ReportOutcome};
use pomodoro_data::store::{JsonSessionStore, SessionStore};
use pomodoro_runtime::orchestrator::TimerOrchestrator;
use pomodoro_runtime::timer::PomodoroTimer;
use pomodoro_ui::app::App;
use pomodoro_ui::export::{export_report, ExportFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    let app_dir = bootstrap::ensure_directories()?;
    let log_file = settings
        .log_file
        .clone()
        .or_else(|| bootstrap::default_log_file(&settings.view, &app_dir));
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("Pomodoro v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Theme: {}, Timezone: {}",
        settings.view,
        settings.theme,
        settings.timezone
    );

    let tz = resolve_timezone(&settings.timezone);
    let store = Arc::new(JsonSessionStore::new(settings.sessions_path()));
    tracing::debug!("session log at {}", store.path().display());

    match settings.view.as_str() {
        "timer" => run_timer(&settings, tz, store).await?,

        "report" => {
            let outcome = build_outcome(store.as_ref(), tz)?;
            let app = App::new(&settings.theme, tz, settings.student_name());
            app.run_report(outcome).await?;
        }

        "export" => {
            let format = ExportFormat::from_name(&settings.format)?;
            let outcome = build_outcome(store.as_ref(), tz)?;
            let path = settings.output_path();
            export_report(&outcome, format, settings.student_name(), tz, &path)?;
            println!("Report written to {}", path.display());
        }

        unknown => anyhow::bail!("Unknown view mode: {unknown}"),
    }

    Ok(())
}

/// Aggregate the whole session log as of now.
fn build_outcome(store: &dyn SessionStore, tz: Tz) -> Result<ReportOutcome> {
    let records = store.load().context("failed to load the session log")?;
    let outcome = ReportAggregator::aggregate(&records, Utc::now(), tz);
    if outcome.skipped_count() > 0 {
        tracing::warn!(
            skipped = outcome.skipped_count(),
            "some session records were malformed and left out of the report"
        );
    }
    Ok(outcome)
}

async fn run_timer(settings: &Settings, tz: Tz, store: Arc<JsonSessionStore>) -> Result<()> {
    let mut timer = PomodoroTimer::new(settings.work_minutes, settings.break_minutes)?;
    match (settings.subject.as_deref(), settings.topic.as_deref()) {
        (Some(subject), Some(topic)) => {
            if let Err(e) = timer.set_focus(subject, topic) {
                tracing::warn!(error = %e, "ignoring focus; completed work will not be recorded");
            }
        }
        _ => tracing::info!("no subject/topic given; completed work will not be recorded"),
    }

    let orchestrator = TimerOrchestrator::new(timer, store, tz);
    let (control, rx, handle) = orchestrator.start();
    let app = App::new(&settings.theme, tz, settings.student_name());

    // The TUI exits on 'q' / Ctrl+C itself; the OS-level signal covers the
    // case where raw mode has not been entered yet.
    tokio::select! {
        result = app.run_timer(control, rx) => {
            handle.abort();
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; stopping timer");
            handle.abort();
        }
    }

    Ok(())
}
