//! Runtime configuration: three required environment values plus fixed constants.

#![allow(missing_docs)]

use std::fmt;
use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::core::errors::{Result, WatchError};

/// Page under watch.
pub const TARGET_URL: &str = "https://tutor4science.com/";
/// Mail submission host (STARTTLS on [`SMTP_PORT`]).
pub const SMTP_HOST: &str = "smtp.gmail.com";
pub const SMTP_PORT: u16 = 587;
/// Per-request budget for the page and every image.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Pause between the end of one cycle and the start of the next.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(3600);
/// Images narrower or shorter than this are decorative and never reported.
pub const MIN_WIDTH: u32 = 200;
pub const MIN_HEIGHT: u32 = 200;
/// Log file, created in the working directory and only ever appended to.
pub const LOG_FILE_NAME: &str = "image_checker.log";

pub const ENV_SENDER: &str = "EMAIL_SENDER";
pub const ENV_PASSWORD: &str = "EMAIL_APP_PASSWORD";
pub const ENV_RECEIVER: &str = "EMAIL_RECEIVER";

/// Minimum dimensions for an image to count as main content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub min_width: u32,
    pub min_height: u32,
}

impl Threshold {
    /// True only when both axes meet the minimum.
    #[must_use]
    pub const fn admits(&self, width: u32, height: u32) -> bool {
        width >= self.min_width && height >= self.min_height
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self {
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        }
    }
}

/// Sender credentials and recipient for the broken-image report.
#[derive(Clone)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: String,
    pub password: String,
    pub recipient: String,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Everything one monitor process needs, built once at startup.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub target_url: Url,
    pub http_timeout: Duration,
    pub interval: Duration,
    pub threshold: Threshold,
    pub mail: MailSettings,
}

impl WatchConfig {
    /// Read the three required values from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Absent and whitespace-only values are both rejected with
    /// [`WatchError::MissingEnv`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String> {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(WatchError::MissingEnv { var })
        };

        let sender = required(ENV_SENDER)?;
        let password = required(ENV_PASSWORD)?;
        let recipient = required(ENV_RECEIVER)?;

        let target_url = Url::parse(TARGET_URL).map_err(|e| WatchError::InvalidConfig {
            details: format!("target url {TARGET_URL}: {e}"),
        })?;

        Ok(Self {
            target_url,
            http_timeout: HTTP_TIMEOUT,
            interval: CHECK_INTERVAL,
            threshold: Threshold::default(),
            mail: MailSettings {
                smtp_host: SMTP_HOST.to_string(),
                smtp_port: SMTP_PORT,
                sender,
                password,
                recipient,
            },
        })
    }
}

/// Load `KEY=value` pairs from `path` into the environment when the file exists.
///
/// Variables already present in the environment are left untouched. Returns
/// whether a file was loaded.
pub fn load_dotenv(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(WatchError::InvalidConfig {
            details: format!("{}: {err}", path.display()),
        }),
    }
}
