//! Stderr diagnostics plus the plain-text activity log.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, reload};

/// `[<RFC 3339 UTC>] <message> <fields>` per line, no level or target.
pub struct ActivityFormat;

impl<S, N> FormatEvent<S, N> for ActivityFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "[{}] ", timestamp())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn stderr_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Stderr only; used by commands that must not touch the activity log.
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(stderr_filter())
        .try_init()
        .ok();
}

type ActivityLayer = tracing_subscriber::fmt::Layer<Registry, DefaultFields, ActivityFormat, NonBlocking>;

/// Slot for the activity log layer, filled once startup checks pass so a
/// failed start leaves the previous run's log intact.
pub struct ActivityLog {
    handle: reload::Handle<Option<ActivityLayer>, Registry>,
}

impl ActivityLog {
    /// Truncate `path`, write the startup header and start mirroring events
    /// at INFO and above into it.
    ///
    /// Keep the returned guard alive until shutdown so buffered lines flush.
    pub fn attach(&self, path: &Path) -> Result<WorkerGuard> {
        let (writer, guard) = create_activity_log_writer(path)?;
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .event_format(ActivityFormat)
            .with_writer(writer);
        self.handle
            .reload(Some(layer))
            .context("failed to attach activity log")?;
        Ok(guard)
    }
}

pub(crate) fn deferred_subscriber() -> (impl Subscriber + Send + Sync + 'static, ActivityLog) {
    let (activity, handle) = reload::Layer::new(None::<ActivityLayer>);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter());
    let subscriber = tracing_subscriber::registry()
        .with(activity.with_filter(LevelFilter::INFO))
        .with(stderr_layer);
    (subscriber, ActivityLog { handle })
}

/// Stderr now, activity log once [`ActivityLog::attach`] is called.
pub fn init_with_deferred_activity_log() -> ActivityLog {
    let (subscriber, activity) = deferred_subscriber();
    subscriber.try_init().ok();
    activity
}

/// Truncate `path`, write the startup header, and open a non-blocking
/// appender positioned after it.
pub fn create_activity_log_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("activity log path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;
    std::fs::write(path, format!("--- Bot Startup Log: {} ---\n", timestamp()))
        .with_context(|| format!("failed to reset activity log: {}", path.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
