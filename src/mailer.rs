// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound notification delivery through the Resend HTTP API.

use crate::config::MailConfig;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// Delivery failure.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("mail delivery is not configured")]
    NotConfigured,

    #[error("mail service rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("mail service request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A fully addressed message.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Something that can hand a message to a delivery service.
pub trait Mailer: Send + Sync {
    /// Whether the delivery credential is present.
    fn is_configured(&self) -> bool;

    /// Send `email`; on success returns the service's message id, if any.
    fn send(
        &self,
        email: &OutboundEmail,
    ) -> impl Future<Output = Result<Option<String>, DeliveryError>> + Send;
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: Option<String>,
    name: Option<String>,
}

/// Resend `POST /emails` client.
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ResendMailer {
    pub fn new(config: &MailConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl Mailer for ResendMailer {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, email: &OutboundEmail) -> Result<Option<String>, DeliveryError> {
        let api_key = self.api_key.as_deref().ok_or(DeliveryError::NotConfigured)?;

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: SendResponse = response.json().await?;
            debug!(id = ?body.id, "Mail accepted");
            return Ok(body.id);
        }

        // The error body is best effort; the status alone is enough to fail.
        let message = match response.json::<ApiErrorResponse>().await {
            Ok(ApiErrorResponse {
                message: Some(message),
                ..
            }) => message,
            Ok(ApiErrorResponse {
                name: Some(name), ..
            }) => name,
            _ => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
