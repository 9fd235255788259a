//! HTTP seam: one blocking GET per call, bounded by a timeout.

use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use crate::core::errors::{Result, WatchError};

/// Status code and raw body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    /// HTTP status code.
    pub status: u16,
    /// Response body; UTF-8 text when it came from [`HttpFetch::get_page`].
    pub bytes: Vec<u8>,
}

impl FetchedBody {
    /// Only a plain 200 counts as a successful fetch.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Fetches a URL. Implementations return `Err` only for transport failures
/// (connect, TLS, timeout); any HTTP status comes back as `Ok`.
pub trait HttpFetch {
    /// Fetch `url` and return its body untouched.
    fn get(&self, url: &Url) -> Result<FetchedBody>;

    /// Fetch a markup document, transcoded to UTF-8 from the charset its
    /// `Content-Type` declares.
    fn get_page(&self, url: &Url) -> Result<FetchedBody> {
        self.get(url)
    }
}

/// Production fetcher backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    /// Build a client whose every request is capped at `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WatchError::Runtime {
                details: format!("http client construction: {e}"),
            })?;
        Ok(Self { client, timeout })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn get(&self, url: &Url) -> Result<FetchedBody> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| WatchError::from_request(url.as_str(), self.timeout, &e))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .map_err(|e| WatchError::from_request(url.as_str(), self.timeout, &e))?;
        Ok(FetchedBody {
            status,
            bytes: bytes.to_vec(),
        })
    }

    fn get_page(&self, url: &Url) -> Result<FetchedBody> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| WatchError::from_request(url.as_str(), self.timeout, &e))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| WatchError::from_request(url.as_str(), self.timeout, &e))?;
        Ok(FetchedBody {
            status,
            bytes: text.into_bytes(),
        })
    }
}
