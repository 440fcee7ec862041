use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, warn};

use crate::domain::ports::EmailService;
use crate::utils::error::AppError;

/// Delivers mail through an HTTP email API with bearer authentication.
pub struct HttpEmailService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEmailService {
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::InternalServerError(format!("Failed to build email client: {}", e))
        })?;

        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        let payload = EmailPayload {
            to: recipient,
            subject,
            html: html_body,
        };

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Email service connection error");
                AppError::ExternalServiceError("Email service unavailable".into())
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            error!(%status, body = %text, "Email service rejected message");
            return Err(AppError::ExternalServiceError(format!(
                "Email service responded with {}",
                status
            )));
        }

        Ok(())
    }
}

pub const EMAIL_NOT_CONFIGURED: &str = "Email delivery is not configured";

/// Used when no delivery service is configured. Every send is reported as
/// undelivered so callers never count a dropped message as sent.
pub struct NoopEmailService;

#[async_trait]
impl EmailService for NoopEmailService {
    async fn send(&self, recipient: &str, subject: &str, _html_body: &str) -> Result<(), AppError> {
        warn!(%recipient, %subject, "Email delivery disabled, message dropped");
        Err(AppError::ExternalServiceError(EMAIL_NOT_CONFIGURED.into()))
    }
}
