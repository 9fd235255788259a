//! Dual-sink logging: stdout plus an append-only log file.
//!
//! The subscriber is never installed as the process-wide default. A
//! [`LogContext`] owns a [`Dispatch`] and callers run the monitor inside
//! [`LogContext::scope`], so tests can build as many isolated contexts as they
//! like and read back what each one wrote.
//!
//! ```bash
//! # Silence everything except warnings from the image checks
//! RUST_LOG=warn biw
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;

use crate::core::errors::{Result, WatchError};

/// Timestamp layout shared by both sinks, e.g. `2026-10-18 09:00:00,123`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Append-only log file.
    pub log_file: PathBuf,
    /// Mirror every line to stdout.
    pub enable_stdout: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub default_directive: String,
}

impl LogConfig {
    /// Log to `log_file` and stdout at `info`.
    pub fn new(log_file: impl Into<PathBuf>) -> Self {
        Self {
            log_file: log_file.into(),
            enable_stdout: true,
            default_directive: "info".to_string(),
        }
    }

    /// File sink only; used where stdout belongs to someone else (tests).
    #[must_use]
    pub fn file_only(mut self) -> Self {
        self.enable_stdout = false;
        self
    }
}

/// Constructed logging state for one monitor process.
///
/// Dropping the context flushes the file writer.
pub struct LogContext {
    dispatch: Dispatch,
    log_file: PathBuf,
    _guard: WorkerGuard,
}

impl LogContext {
    /// Build the subscriber stack described by `config`.
    ///
    /// The log file is opened eagerly so an unwritable location fails here
    /// rather than silently dropping lines later.
    pub fn init(config: &LogConfig) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .map_err(|e| WatchError::io(&config.log_file, e))?;
        let (file_writer, guard) = tracing_appender::non_blocking(file);

        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_target(false)
            .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()));

        let stdout_layer = config.enable_stdout.then(|| {
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        });

        let subscriber = tracing_subscriber::registry()
            .with(build_filter(&config.default_directive))
            .with(file_layer)
            .with(stdout_layer);

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            log_file: config.log_file.clone(),
            _guard: guard,
        })
    }

    /// Run `f` with this context as the active subscriber.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Path of the log file this context appends to.
    #[must_use]
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let filter = EnvFilter::new(default_directive);
        // Dependency chatter stays at warn regardless of the default.
        ["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn", "html5ever=warn"]
            .into_iter()
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(filter, EnvFilter::add_directive)
    })
}

#[cfg(test)]
mod tests {
    use super::{LogConfig, LogContext};
    use tracing::{error, info, warn};

    #[test]
    fn lines_land_in_file_with_level_and_timestamp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("image_checker.log");
        let ctx = LogContext::init(&LogConfig::new(&path).file_only()).expect("logger");

        ctx.scope(|| {
            info!("Starting image check...");
            warn!(url = "https://tutor4science.com/a.png", "image failed");
            error!("page unreachable");
        });
        drop(ctx);

        let contents = std::fs::read_to_string(&path).expect("log file");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3, "unexpected log contents: {contents}");
        assert!(lines[0].contains("INFO") && lines[0].contains("Starting image check..."));
        assert!(lines[1].contains("WARN") && lines[1].contains("tutor4science.com/a.png"));
        assert!(lines[2].contains("ERROR"));
        // Leading `YYYY-MM-DD HH:MM:SS,mmm`.
        let stamp = &lines[0][..23];
        assert_eq!(stamp.as_bytes()[4], b'-');
        assert_eq!(stamp.as_bytes()[19], b',');
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("image_checker.log");

        for round in 0..2 {
            let ctx = LogContext::init(&LogConfig::new(&path).file_only()).expect("logger");
            ctx.scope(|| info!(round, "cycle finished"));
        }

        let contents = std::fs::read_to_string(&path).expect("log file");
        assert_eq!(contents.matches("cycle finished").count(), 2);
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("image_checker.log");
        let err = LogContext::init(&LogConfig::new(&path)).err().expect("should fail");
        assert_eq!(err.code(), "BIW-3002");
    }
}
