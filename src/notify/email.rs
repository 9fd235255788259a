//! Plaintext broken-image report and its SMTP delivery.

use std::fmt::Write as _;
use std::time::Duration;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::Serialize;
use url::Url;

use crate::core::config::MailSettings;
use crate::core::errors::Result;

/// Opening line of every report body.
const BODY_PREAMBLE: &str =
    "The following images are not rendering properly (only main content images are checked):";

/// Upper bound on each SMTP dialogue step.
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A main-content image that failed to render, with its measured size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenImage {
    /// Resolved image URL.
    pub url: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Subject and body of one cycle's report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Mail subject line.
    pub subject: String,
    /// Plaintext mail body.
    pub body: String,
}

impl Notification {
    /// One `- <url> (size: WxH)` line per broken image, in discovery order.
    #[must_use]
    pub fn compose(page: &Url, broken: &[BrokenImage]) -> Self {
        let mut body = format!("{BODY_PREAMBLE}\n\n");
        for image in broken {
            let _ = writeln!(
                body,
                "- {} (size: {}x{})",
                image.url, image.width, image.height
            );
        }
        Self {
            subject: format!("Broken Images Found on {page}"),
            body,
        }
    }
}

/// Delivers a composed report. Failures are returned, never retried.
pub trait Notifier {
    /// Deliver one report.
    fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Sends reports through an authenticated STARTTLS submission relay.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    settings: MailSettings,
}

impl SmtpNotifier {
    /// Notifier for the given sender, credentials and recipient.
    #[must_use]
    pub fn new(settings: MailSettings) -> Self {
        Self { settings }
    }

    /// Build the RFC 5322 message without touching the network.
    pub fn build_message(&self, notification: &Notification) -> Result<Message> {
        let from: Mailbox = self.settings.sender.parse()?;
        let to: Mailbox = self.settings.recipient.parse()?;
        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(notification.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())?)
    }
}

impl Notifier for SmtpNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        let message = self.build_message(notification)?;
        // One transport per report; the session closes when it drops.
        let mailer = SmtpTransport::starttls_relay(&self.settings.smtp_host)?
            .port(self.settings.smtp_port)
            .credentials(Credentials::new(
                self.settings.sender.clone(),
                self.settings.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();
        mailer.send(&message)?;
        Ok(())
    }
}
