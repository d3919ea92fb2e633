//! Tracing setup for the bot and the offline CLI.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::{FmtSpan, Writer},
    fmt::time::FormatTime,
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Filter used when `RUST_LOG` is unset. HTTP client internals are noisy at info.
pub const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn,teloxide=warn";

/// UTC timestamps, so log lines line up with the UTC day partitions on disk.
struct UtcSeconds;

impl FormatTime for UtcSeconds {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{} ", chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

fn open_log_file(path: &Path) -> io::Result<Arc<fs::File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Arc::new(file))
}

/// Installs the global subscriber.
///
/// With `log_file`, events go to stdout and the file (parent directories are created).
/// Without, they go to stderr only, which keeps CLI output on stdout clean.
/// Level from `RUST_LOG`, else [`DEFAULT_LOG_FILTER`].
pub fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let writer = match log_file {
        Some(path) => BoxMakeWriter::new(io::stdout.and(open_log_file(path)?)),
        None => BoxMakeWriter::new(io::stderr),
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let event_format = tracing_subscriber::fmt::format()
        .with_timer(UtcSeconds)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(false);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .event_format(event_format)
        .with_span_events(FmtSpan::NONE)
        .with_ansi(false);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}
