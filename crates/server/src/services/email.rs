//! Email service for submission feedback.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain text templates.

use std::time::Duration;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use super::notifier::{Mailer, Notification, NotificationKind};
use crate::config::EmailConfig;

#[derive(Template)]
#[template(path = "email/submission_approved.html")]
struct SubmissionApprovedHtml<'a> {
    shop_name: &'a str,
    site_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/submission_approved.txt")]
struct SubmissionApprovedText<'a> {
    shop_name: &'a str,
    site_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/submission_rejected.html")]
struct SubmissionRejectedHtml<'a> {
    shop_name: &'a str,
    site_url: &'a str,
    reason: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "email/submission_rejected.txt")]
struct SubmissionRejectedText<'a> {
    shop_name: &'a str,
    site_url: &'a str,
    reason: Option<&'a str>,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered email, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render the feedback email for a notification.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn render_notification(
    notification: &Notification,
    site_url: &str,
) -> Result<RenderedEmail, EmailError> {
    let shop_name = notification.shop_name.as_str();
    match notification.kind {
        NotificationKind::SubmissionApproved => Ok(RenderedEmail {
            subject: format!("Dein Vorschlag \"{shop_name}\" wurde aufgenommen!"),
            text: SubmissionApprovedText {
                shop_name,
                site_url,
            }
            .render()?,
            html: SubmissionApprovedHtml {
                shop_name,
                site_url,
            }
            .render()?,
        }),
        NotificationKind::SubmissionRejected => {
            let reason = notification
                .admin_note
                .as_deref()
                .filter(|note| !note.trim().is_empty());
            Ok(RenderedEmail {
                subject: format!("Dein Vorschlag \"{shop_name}\" konnte nicht aufgenommen werden"),
                text: SubmissionRejectedText {
                    shop_name,
                    site_url,
                    reason,
                }
                .render()?,
                html: SubmissionRejectedHtml {
                    shop_name,
                    site_url,
                    reason,
                }
                .render()?,
            })
        }
    }
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    site_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig, site_url: &str, timeout: Duration) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            site_url: site_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(subject = %subject, "Email sent successfully");
        Ok(())
    }
}

impl Mailer for EmailService {
    async fn deliver(&self, notification: &Notification) -> Result<(), EmailError> {
        let email = render_notification(notification, &self.site_url)?;
        self.send_multipart_email(
            notification.recipient.as_str(),
            &email.subject,
            &email.text,
            &email.html,
        )
        .await
    }
}
