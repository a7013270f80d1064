//! Logging bootstrap for mbload binaries
//!
//! Console output goes to stderr so log lines never interleave with the
//! progress and report text printed on stdout. An optional log file receives
//! the same events without ANSI colors (or as JSON lines).

use std::fs;
use std::path::{Path, PathBuf};

use errors::{LoadTestError, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2025-12-02T00:50:44.809123Z [INFO] Starting load test`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Level or full filter spec (e.g. "info", "info,voltage_loadtest=debug")
    pub level: String,
    /// Emit ANSI colors on the console
    pub ansi: bool,
    /// Also write events to this file
    pub log_file: Option<PathBuf>,
    /// Write the log file as JSON lines
    pub json_file: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
            log_file: None,
            json_file: false,
        }
    }
}

/// Parse a level or filter spec into an `EnvFilter`
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| LoadTestError::Logging(format!("invalid log level '{}': {}", level, e)))
}

/// Split a log file path into the (directory, file name) pair tracing-appender wants
fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            LoadTestError::Logging(format!("log file path has no file name: {}", path.display()))
        })?
        .to_string();

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, file_name))
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive until
/// the program exits. It is `None` when no log file was requested.
pub fn init_logging(options: &LoggingOptions) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(&options.level)?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(options.ansi)
        .event_format(BracketedLevelFormat)
        .boxed();

    let (file_layer, guard) = match &options.log_file {
        Some(path) => {
            let (dir, file_name) = split_log_path(path)?;
            fs::create_dir_all(&dir)?;

            let appender = tracing_appender::rolling::never(&dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            let layer = if options.json_file {
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_thread_ids(true)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(BracketedLevelFormat)
                    .boxed()
            };
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoadTestError::Logging(e.to_string()))?;

    if let Some(path) = &options.log_file {
        tracing::debug!("Logging to {}", path.display());
    }

    Ok(guard)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_format_level() {
        assert_eq!(format_level(&Level::INFO), "[INFO]");
        assert_eq!(format_level(&Level::ERROR), "[ERROR]");
        assert_eq!(format_level(&Level::TRACE), "[TRACE]");
    }

    #[test]
    fn test_build_filter() {
        assert!(build_filter("debug").is_ok());
        assert!(build_filter("info,voltage_loadtest=trace").is_ok());
        assert!(matches!(
            build_filter("voltage_loadtest=notalevel"),
            Err(LoadTestError::Logging(_))
        ));
    }

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("logs/run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(name, "run.log");

        let (dir, name) = split_log_path(Path::new("run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "run.log");

        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_default_options() {
        let options = LoggingOptions::default();
        assert_eq!(options.level, "info");
        assert!(options.ansi);
        assert!(options.log_file.is_none());
    }
}
