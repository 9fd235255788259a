//! Image reference extraction from page markup.

use scraper::{Html, Selector};
use url::Url;

use crate::core::errors::{Result, WatchError};

/// Prefix that marks an image embedded directly in the markup.
const INLINE_IMAGE_PREFIX: &str = "data:image";

/// Where an `<img>` points after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Embedded payload; never fetched.
    Inline(String),
    /// Absolute network location.
    Remote(Url),
}

impl ImageRef {
    /// Resolve a raw `src` value against the page it came from.
    ///
    /// Inline sources are kept verbatim and absolute `http(s)` sources are
    /// parsed as-is; anything else is joined onto `base`.
    pub fn resolve(base: &Url, src: &str) -> std::result::Result<Self, url::ParseError> {
        if src.starts_with(INLINE_IMAGE_PREFIX) {
            return Ok(Self::Inline(src.to_string()));
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Url::parse(src).map(Self::Remote);
        }
        base.join(src).map(Self::Remote)
    }

    /// Display form used in logs and notifications.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(src) => src,
            Self::Remote(url) => url.as_str(),
        }
    }
}

/// Every non-empty `<img src>` in document order.
pub fn extract_image_sources(markup: &str) -> Result<Vec<String>> {
    let selector = Selector::parse("img").map_err(|e| WatchError::Runtime {
        details: format!("image selector rejected: {e:?}"),
    })?;
    let document = Html::parse_document(markup);
    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect())
}
