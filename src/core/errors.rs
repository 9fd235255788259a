//! BIW-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Top-level error type for the image watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("[BIW-1001] missing or empty environment variable {var}")]
    MissingEnv { var: &'static str },

    #[error("[BIW-1002] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[BIW-2001] request to {url} failed: {details}")]
    Http { url: String, details: String },

    #[error("[BIW-2002] request to {url} timed out after {}s", .after.as_secs())]
    Timeout { url: String, after: Duration },

    #[error("[BIW-2003] {url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("[BIW-2101] image at {url} could not be decoded: {details}")]
    ImageDecode { url: String, details: String },

    #[error("[BIW-3001] mail delivery failure in {context}: {details}")]
    Smtp {
        context: &'static str,
        details: String,
    },

    #[error("[BIW-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[BIW-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl WatchError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingEnv { .. } => "BIW-1001",
            Self::InvalidConfig { .. } => "BIW-1002",
            Self::Http { .. } => "BIW-2001",
            Self::Timeout { .. } => "BIW-2002",
            Self::HttpStatus { .. } => "BIW-2003",
            Self::ImageDecode { .. } => "BIW-2101",
            Self::Smtp { .. } => "BIW-3001",
            Self::Io { .. } => "BIW-3002",
            Self::Runtime { .. } => "BIW-3900",
        }
    }

    /// Whether a cycle absorbs this failure and carries on.
    ///
    /// Everything else ends the monitor loop.
    #[must_use]
    pub const fn is_cycle_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Http { .. }
                | Self::Timeout { .. }
                | Self::HttpStatus { .. }
                | Self::ImageDecode { .. }
                | Self::Smtp { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Map a transport-level `reqwest` failure, keeping timeouts distinct.
    #[must_use]
    pub fn from_request(url: &str, timeout: Duration, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                after: timeout,
            }
        } else {
            Self::Http {
                url: url.to_string(),
                details: err.to_string(),
            }
        }
    }
}

impl From<lettre::error::Error> for WatchError {
    fn from(value: lettre::error::Error) -> Self {
        Self::Smtp {
            context: "message builder",
            details: value.to_string(),
        }
    }
}

impl From<lettre::address::AddressError> for WatchError {
    fn from(value: lettre::address::AddressError) -> Self {
        Self::Smtp {
            context: "address parse",
            details: value.to_string(),
        }
    }
}

impl From<lettre::transport::smtp::Error> for WatchError {
    fn from(value: lettre::transport::smtp::Error) -> Self {
        Self::Smtp {
            context: "smtp transport",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WatchError;
    use std::time::Duration;

    #[test]
    fn codes_are_embedded_in_messages() {
        let cases = [
            WatchError::MissingEnv {
                var: "EMAIL_SENDER",
            },
            WatchError::Timeout {
                url: "https://example.com/a.png".to_string(),
                after: Duration::from_secs(10),
            },
            WatchError::HttpStatus {
                url: "https://example.com/a.png".to_string(),
                status: 500,
            },
            WatchError::Runtime {
                details: "boom".to_string(),
            },
        ];
        for err in cases {
            assert!(
                err.to_string().contains(err.code()),
                "message {err} should carry {}",
                err.code()
            );
        }
    }

    #[test]
    fn startup_and_runtime_failures_end_the_loop() {
        assert!(
            !WatchError::MissingEnv {
                var: "EMAIL_RECEIVER"
            }
            .is_cycle_recoverable()
        );
        assert!(
            !WatchError::Runtime {
                details: "selector".to_string()
            }
            .is_cycle_recoverable()
        );
        assert!(
            WatchError::Smtp {
                context: "smtp transport",
                details: "auth".to_string()
            }
            .is_cycle_recoverable()
        );
    }

    #[test]
    fn timeout_message_reports_seconds() {
        let err = WatchError::Timeout {
            url: "https://tutor4science.com/".to_string(),
            after: Duration::from_secs(10),
        };
        assert!(err.to_string().ends_with("timed out after 10s"));
    }
}
