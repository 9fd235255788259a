//! Top-level CLI definition and startup sequence.

use std::path::Path;

use clap::Parser;
use tracing::{debug, error, info};

use crate::core::config::{LOG_FILE_NAME, WatchConfig, load_dotenv};
use crate::core::errors::Result;
use crate::daemon::loop_main::{LoopExit, MonitorLoop};
use crate::daemon::signals::ShutdownSignal;
use crate::logger::{LogConfig, LogContext};
use crate::monitor::http::ReqwestFetcher;
use crate::notify::email::SmtpNotifier;

/// Broken Image Watch: hourly check of a web page's images, with email alerts.
///
/// Reads EMAIL_SENDER, EMAIL_APP_PASSWORD and EMAIL_RECEIVER from the
/// environment (or a `.env` file in the working directory).
#[derive(Parser)]
#[command(name = "biw", version, about)]
pub struct Cli {}

/// Build logging, then run the monitor until interrupted.
///
/// Configuration and loop failures are logged and end the run normally; only
/// a logger that cannot be constructed is returned as an error.
pub fn run(_cli: &Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let logging = LogContext::init(&LogConfig::new(LOG_FILE_NAME))?;
    logging.scope(|| match monitor() {
        Ok(LoopExit::Interrupted { .. } | LoopExit::Failed { .. }) => {}
        Err(err) => error!(code = err.code(), "Startup failed: {err}"),
    });
    Ok(())
}

fn monitor() -> Result<LoopExit> {
    if load_dotenv(Path::new(".env"))? {
        debug!("loaded .env");
    }
    let config = WatchConfig::from_env()?;
    let shutdown = ShutdownSignal::install()?;
    let fetcher = ReqwestFetcher::new(config.http_timeout)?;
    let notifier = SmtpNotifier::new(config.mail.clone());

    info!(
        url = %config.target_url,
        interval_secs = config.interval.as_secs(),
        min_width = config.threshold.min_width,
        min_height = config.threshold.min_height,
        "Image monitor started"
    );
    Ok(MonitorLoop::new(&config, &fetcher, &notifier, shutdown).run())
}
