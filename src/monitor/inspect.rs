//! Per-image health classification.

use std::io::Cursor;

use image::{ImageError, ImageReader, Limits};
use tracing::{debug, warn};

use super::http::HttpFetch;
use super::page::ImageRef;
use crate::core::config::Threshold;
use crate::core::errors::WatchError;

/// Outcome of checking one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCheck {
    /// Embedded in the markup; trivially healthy.
    Inline,
    /// Fetched, large enough to matter, and not found corrupt.
    ///
    /// A payload the decoder refuses to expand (allocation limits or an
    /// unsupported pixel layout) lands here too: its header is sound and
    /// nothing shows the pixel data to be damaged.
    Healthy {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Decorative: below the threshold in at least one axis.
    Ignored {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Could not be fetched or decoded.
    ///
    /// `dimensions` is only known when the image header was readable before
    /// the pixel data failed.
    Broken {
        /// Header dimensions, when the header was readable.
        dimensions: Option<(u32, u32)>,
        /// Coded error text for the log.
        reason: String,
    },
}

impl ImageCheck {
    fn broken(err: &WatchError, dimensions: Option<(u32, u32)>) -> Self {
        Self::Broken {
            dimensions,
            reason: err.to_string(),
        }
    }
}

/// Fetch and classify one image.
///
/// Inline images never touch the network. Remote images are measured from
/// their header first; only those meeting `threshold` get a full decode as
/// the integrity pass.
pub fn check_image(fetcher: &dyn HttpFetch, image: &ImageRef, threshold: Threshold) -> ImageCheck {
    let url = match image {
        ImageRef::Inline(_) => return ImageCheck::Inline,
        ImageRef::Remote(url) => url,
    };

    let body = match fetcher.get(url) {
        Ok(body) if body.is_ok() => body,
        Ok(body) => {
            let err = WatchError::HttpStatus {
                url: url.to_string(),
                status: body.status,
            };
            warn!(code = err.code(), url = %url, "Error checking image: {err}");
            return ImageCheck::broken(&err, None);
        }
        Err(err) => {
            warn!(code = err.code(), url = %url, "Error checking image: {err}");
            return ImageCheck::broken(&err, None);
        }
    };

    let check = inspect_bytes(url.as_str(), &body.bytes, threshold);
    match &check {
        ImageCheck::Broken { reason, .. } => {
            warn!(url = %url, "Error checking image: {reason}");
        }
        ImageCheck::Ignored { width, height } => {
            debug!(url = %url, width, height, "small image ignored");
        }
        ImageCheck::Healthy { .. } | ImageCheck::Inline => {}
    }
    check
}

/// Classify an already-fetched image payload.
pub fn inspect_bytes(url: &str, bytes: &[u8], threshold: Threshold) -> ImageCheck {
    inspect_bytes_within(url, bytes, threshold, Limits::default())
}

/// [`inspect_bytes`] with explicit decoder limits for the integrity pass.
pub(crate) fn inspect_bytes_within(
    url: &str,
    bytes: &[u8],
    threshold: Threshold,
    limits: Limits,
) -> ImageCheck {
    let (width, height) = match ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_error(url, e))
        .and_then(|reader| reader.into_dimensions().map_err(|e| decode_error(url, e)))
    {
        Ok(dimensions) => dimensions,
        Err(err) => return ImageCheck::broken(&err, None),
    };

    if !threshold.admits(width, height) {
        return ImageCheck::Ignored { width, height };
    }

    let verified = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)
        .and_then(|mut reader| {
            reader.limits(limits);
            reader.decode()
        });
    match verified {
        Ok(_) => ImageCheck::Healthy { width, height },
        Err(err @ (ImageError::Limits(_) | ImageError::Unsupported(_))) => {
            warn!(url, width, height, "integrity check skipped: {err}");
            ImageCheck::Healthy { width, height }
        }
        Err(err) => ImageCheck::broken(&decode_error(url, err), Some((width, height))),
    }
}

fn decode_error(url: &str, details: impl std::fmt::Display) -> WatchError {
    WatchError::ImageDecode {
        url: url.to_string(),
        details: details.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{png, truncated_png};
    use super::*;
    use crate::core::errors::Result;
    use crate::monitor::http::FetchedBody;
    use std::cell::RefCell;
    use url::Url;

    struct OneShot {
        answer: RefCell<Option<Result<FetchedBody>>>,
        calls: RefCell<usize>,
    }

    impl OneShot {
        fn new(answer: Result<FetchedBody>) -> Self {
            Self {
                answer: RefCell::new(Some(answer)),
                calls: RefCell::new(0),
            }
        }
    }

    impl HttpFetch for OneShot {
        fn get(&self, _url: &Url) -> Result<FetchedBody> {
            *self.calls.borrow_mut() += 1;
            self.answer
                .borrow_mut()
                .take()
                .expect("fetched more than once")
        }
    }

    fn remote(path: &str) -> ImageRef {
        ImageRef::Remote(Url::parse(&format!("https://tutor4science.com{path}")).expect("url"))
    }

    #[test]
    fn inline_images_are_never_fetched() {
        let fetcher = OneShot::new(Ok(FetchedBody {
            status: 500,
            bytes: Vec::new(),
        }));
        let check = check_image(
            &fetcher,
            &ImageRef::Inline("data:image/png;base64,AAAA".to_string()),
            Threshold::default(),
        );
        assert_eq!(check, ImageCheck::Inline);
        assert_eq!(*fetcher.calls.borrow(), 0);
    }

    #[test]
    fn large_valid_image_is_healthy() {
        let fetcher = OneShot::new(Ok(FetchedBody {
            status: 200,
            bytes: png(320, 240),
        }));
        let check = check_image(&fetcher, &remote("/hero.png"), Threshold::default());
        assert_eq!(
            check,
            ImageCheck::Healthy {
                width: 320,
                height: 240
            }
        );
    }

    #[test]
    fn small_image_is_ignored_in_either_axis() {
        for (w, h) in [(50, 50), (199, 400), (400, 199)] {
            let url = "https://tutor4science.com/x.png";
            let check = inspect_bytes(url, &png(w, h), Threshold::default());
            assert_eq!(check, ImageCheck::Ignored { width: w, height: h });
        }
    }

    #[test]
    fn small_corrupt_image_is_still_ignored() {
        let check = inspect_bytes(
            "https://tutor4science.com/icon.png",
            &truncated_png(64, 64),
            Threshold::default(),
        );
        assert!(
            matches!(
                check,
                ImageCheck::Ignored { .. } | ImageCheck::Broken { dimensions: None, .. }
            ),
            "small image must never carry reportable dimensions: {check:?}"
        );
    }

    #[test]
    fn non_200_is_broken_without_dimensions() {
        let fetcher = OneShot::new(Ok(FetchedBody {
            status: 404,
            bytes: png(400, 400),
        }));
        let check = check_image(&fetcher, &remote("/gone.png"), Threshold::default());
        match check {
            ImageCheck::Broken { dimensions, reason } => {
                assert_eq!(dimensions, None);
                assert!(reason.contains("BIW-2003"), "reason: {reason}");
            }
            other => panic!("expected Broken, got {other:?}"),
        }
    }

    #[test]
    fn transport_error_is_broken_without_dimensions() {
        let fetcher = OneShot::new(Err(WatchError::Timeout {
            url: "https://tutor4science.com/slow.png".to_string(),
            after: std::time::Duration::from_secs(10),
        }));
        let check = check_image(&fetcher, &remote("/slow.png"), Threshold::default());
        assert!(matches!(
            check,
            ImageCheck::Broken {
                dimensions: None,
                ..
            }
        ));
    }

    #[test]
    fn non_image_payload_is_broken_without_dimensions() {
        let check = inspect_bytes(
            "https://tutor4science.com/page.html",
            b"<html>not an image</html>",
            Threshold::default(),
        );
        match check {
            ImageCheck::Broken { dimensions, reason } => {
                assert_eq!(dimensions, None);
                assert!(reason.contains("BIW-2101"), "reason: {reason}");
            }
            other => panic!("expected Broken, got {other:?}"),
        }
    }

    #[test]
    fn large_corrupt_image_keeps_header_dimensions() {
        let check = inspect_bytes(
            "https://tutor4science.com/banner.png",
            &truncated_png(400, 300),
            Threshold::default(),
        );
        assert!(
            matches!(
                check,
                ImageCheck::Broken {
                    dimensions: Some((400, 300)),
                    ..
                }
            ),
            "got {check:?}"
        );
    }

    fn limited_to(max_side: u32) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(max_side);
        limits.max_image_height = Some(max_side);
        limits
    }

    #[test]
    fn valid_image_beyond_decoder_limits_is_not_reported() {
        let check = inspect_bytes_within(
            "https://tutor4science.com/poster.png",
            &png(300, 300),
            Threshold::default(),
            limited_to(256),
        );
        assert_eq!(
            check,
            ImageCheck::Healthy {
                width: 300,
                height: 300
            }
        );
    }

    #[test]
    fn corrupt_image_within_decoder_limits_is_still_broken() {
        let check = inspect_bytes_within(
            "https://tutor4science.com/banner.png",
            &truncated_png(300, 300),
            Threshold::default(),
            limited_to(4096),
        );
        assert!(
            matches!(
                check,
                ImageCheck::Broken {
                    dimensions: Some((300, 300)),
                    ..
                }
            ),
            "got {check:?}"
        );
    }
}
