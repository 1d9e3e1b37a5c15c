//! Log sink setup
//!
//! Every module logs through `tracing`. This installs the subscriber: stderr
//! output plus an append-only log file with one `[timestamp] [LEVEL] message`
//! line per event.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{Dispatch, Event, Subscriber, warn};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// `[2024-01-31 12:00:00] [INFO] message`
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
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
        let now = chrono::Local::now();
        write!(
            writer,
            "[{}] [{}] ",
            now.format("%Y-%m-%d %H:%M:%S"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Stderr-only dispatcher for the messages logged before the configured sink
/// exists, such as those from loading the config itself
pub fn bootstrap() -> Dispatch {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    Dispatch::new(subscriber)
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured filter. When the log file can't be
/// opened only stderr logging is installed.
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file, open_error) = match open_log_file(&config.path) {
        Ok(file) => (Some(file), None),
        Err(e) => (None, Some(e)),
    };

    // The mutex keeps lines from concurrent writers whole; each line is
    // written with a single append
    let file_layer = file.map(|file| {
        tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    // Installing twice is harmless; the first subscriber stays
    if result.is_err() {
        return;
    }

    if let Some(e) = open_error {
        warn!("Logging to stderr only, can't open {:?}: {}", config.path, e);
    }
}
