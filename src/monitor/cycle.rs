//! One fetch → parse → check → aggregate → notify pass over the watched page.

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::http::HttpFetch;
use super::inspect::{ImageCheck, check_image};
use super::page::{ImageRef, extract_image_sources};
use crate::core::config::{Threshold, WatchConfig};
use crate::core::errors::{Result, WatchError};
use crate::notify::email::{BrokenImage, Notification, Notifier};

/// What one cycle saw and did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// Local time the cycle began.
    pub started_at: Option<DateTime<Local>>,
    /// Non-empty `src` values found on the page.
    pub images_found: usize,
    /// `data:image` sources, never fetched.
    pub inline: usize,
    /// Main-content images that fetched and decoded.
    pub healthy: usize,
    /// Images below the size threshold.
    pub ignored: usize,
    /// Failed images whose size could not be measured; logged, never mailed.
    pub unmeasured_failures: usize,
    /// Main-content failures included in the notification.
    pub broken: Vec<BrokenImage>,
    /// Why the page itself could not be fetched, if it could not.
    pub page_error: Option<String>,
    /// Whether a notification was handed to the mailer successfully.
    pub notified: bool,
}

impl CycleReport {
    fn tally(&mut self, check: &ImageCheck) {
        match check {
            ImageCheck::Inline => self.inline += 1,
            ImageCheck::Healthy { .. } => self.healthy += 1,
            ImageCheck::Ignored { .. } => self.ignored += 1,
            ImageCheck::Broken { .. } => {}
        }
    }
}

/// Turn a check into a reportable record.
///
/// Only failures whose measured size meets the threshold qualify; a failure
/// with unknown dimensions yields `None`.
#[must_use]
pub fn broken_record(url: &str, check: &ImageCheck, threshold: Threshold) -> Option<BrokenImage> {
    match check {
        ImageCheck::Broken {
            dimensions: Some((width, height)),
            ..
        } if threshold.admits(*width, *height) => Some(BrokenImage {
            url: url.to_string(),
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

/// Run a single cycle.
///
/// Page and image failures are absorbed into the report. The returned `Err`
/// is reserved for failures outside that taxonomy, which end the loop.
pub fn run_cycle(
    config: &WatchConfig,
    fetcher: &dyn HttpFetch,
    notifier: &dyn Notifier,
) -> Result<CycleReport> {
    let mut report = CycleReport {
        started_at: Some(Local::now()),
        ..CycleReport::default()
    };
    info!("Starting image check...");

    let page = match fetcher.get_page(&config.target_url) {
        Ok(body) if body.is_ok() => body,
        Ok(body) => {
            let err = WatchError::HttpStatus {
                url: config.target_url.to_string(),
                status: body.status,
            };
            return Ok(page_failed(report, &err));
        }
        Err(err) if err.is_cycle_recoverable() => return Ok(page_failed(report, &err)),
        Err(err) => return Err(err),
    };

    let sources = extract_image_sources(&page.text())?;
    report.images_found = sources.len();

    for src in &sources {
        let image = match ImageRef::resolve(&config.target_url, src) {
            Ok(image) => image,
            Err(e) => {
                warn!(src = %src, "Skipping unresolvable image source: {e}");
                continue;
            }
        };

        let check = check_image(fetcher, &image, config.threshold);
        report.tally(&check);
        if let ImageCheck::Broken { .. } = check {
            match broken_record(image.as_str(), &check, config.threshold) {
                Some(record) => {
                    warn!(
                        "Broken main image found: {} (size: {}x{})",
                        record.url, record.width, record.height
                    );
                    report.broken.push(record);
                }
                None => report.unmeasured_failures += 1,
            }
        }
    }

    if report.broken.is_empty() {
        info!("All main content images are rendering properly");
    } else {
        let notification = Notification::compose(&config.target_url, &report.broken);
        match notifier.notify(&notification) {
            Ok(()) => {
                report.notified = true;
                info!(
                    recipient = %config.mail.recipient,
                    broken = report.broken.len(),
                    "Email notification sent successfully"
                );
            }
            Err(err) => error!(code = err.code(), "Error sending email: {err}"),
        }
    }

    log_summary(&report);
    Ok(report)
}

fn page_failed(mut report: CycleReport, err: &WatchError) -> CycleReport {
    error!(code = err.code(), "Error checking website: {err}");
    report.page_error = Some(err.to_string());
    log_summary(&report);
    report
}

fn log_summary(report: &CycleReport) {
    info!(
        images_found = report.images_found,
        inline = report.inline,
        healthy = report.healthy,
        ignored = report.ignored,
        unmeasured_failures = report.unmeasured_failures,
        broken = report.broken.len(),
        notified = report.notified,
        page_error = report.page_error.is_some(),
        "cycle complete"
    );
    match serde_json::to_string(report) {
        Ok(json) => debug!(report = %json, "cycle report"),
        Err(e) => debug!("cycle report not serializable: {e}"),
    }
}
