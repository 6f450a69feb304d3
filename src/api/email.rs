//! Email delivery abstractions and message rendering.
//!
//! Account flows hand a rendered [`EmailMessage`] to an [`EmailSender`]; the
//! sender decides how to deliver (HTTP API, SMTP, etc.) and returns `Ok`/`Err`.
//! The default sender for local dev is [`LogEmailSender`], which logs the
//! payload and returns `Ok(())`. Production uses [`ResendEmailSender`].

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::APP_USER_AGENT;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body_html: String,
}

/// Email delivery abstraction used by the account flows.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error so the caller can report failure.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.body_html,
            "email send stub"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Sender backed by the Resend HTTP API.
pub struct ResendEmailSender {
    client: reqwest::Client,
    api_key: SecretString,
    from: String,
}

impl ResendEmailSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: SecretString, from: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .context("failed to build email client")?;
        Ok(Self {
            client,
            api_key,
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = ResendPayload {
            from: &self.from,
            to: [&message.to_email],
            subject: &message.subject,
            html: &message.body_html,
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .context("failed to reach email provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("email provider returned {status}: {body}"));
        }

        Ok(())
    }
}

/// Build the frontend deep link that opens the reset-password dialog.
///
/// # Errors
/// Returns an error if the base URL cannot be parsed.
pub fn build_reset_url(frontend_base_url: &str, token: &str) -> Result<String> {
    build_dialog_url(frontend_base_url, "reset-password", token)
}

/// Build the frontend deep link that opens the verify-email dialog.
///
/// # Errors
/// Returns an error if the base URL cannot be parsed.
pub fn build_verify_url(frontend_base_url: &str, token: &str) -> Result<String> {
    build_dialog_url(frontend_base_url, "verify-email", token)
}

fn build_dialog_url(frontend_base_url: &str, dialog: &str, token: &str) -> Result<String> {
    let mut url = Url::parse(frontend_base_url).context("invalid frontend base URL")?;
    url.query_pairs_mut()
        .append_pair("auth", dialog)
        .append_pair("token", token);
    Ok(url.to_string())
}

#[must_use]
pub fn render_reset_email(name: &str, reset_url: &str) -> EmailMessage {
    let body_html = format!(
        "<p>Hi, {name}!</p>\
         <p>Someone recently requested a password change for your Bakulan \
         account. If this was you, you can set a new password here:</p>\
         <p><a href=\"{reset_url}\">Reset password</a></p>\
         <p>If you don't want to change your password or didn't request \
         this, just ignore and delete this message.</p>"
    );
    EmailMessage {
        to_email: String::new(),
        subject: "Reset Password".to_string(),
        body_html,
    }
}

#[must_use]
pub fn render_verification_email(name: &str, verify_url: &str) -> EmailMessage {
    let body_html = format!(
        "<p>Hi, {name}!</p>\
         <p>Welcome to Bakulan. Please confirm your email address by \
         clicking the link below:</p>\
         <p><a href=\"{verify_url}\">Verify email</a></p>"
    );
    EmailMessage {
        to_email: String::new(),
        subject: "Verify your email".to_string(),
        body_html,
    }
}
