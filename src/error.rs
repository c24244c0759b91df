// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission failures and their HTTP rendering.

use crate::mailer::DeliveryError;
use crate::models::ErrorResponse;
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Every way a submission can end without a delivered notification.
///
/// `Display` is the client-facing message.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Too many requests. Please try again later.")]
    QuotaExceeded {
        reset_at: DateTime<Utc>,
        retry_after_secs: u64,
    },

    #[error("Invalid request body")]
    MalformedBody(String),

    #[error("CAPTCHA verification required")]
    CaptchaMissing,

    #[error("CAPTCHA verification failed. Please try again.")]
    CaptchaFailed,

    #[error("Validation failed")]
    Invalid(Vec<String>),

    #[error("Server configuration error")]
    Configuration(String),

    #[error("Failed to send email. Please try again later.")]
    Delivery(#[source] DeliveryError),

    #[error("An unexpected error occurred. Please try again later.")]
    Unexpected(String),
}

impl SubmissionError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::MalformedBody(_)
            | Self::CaptchaMissing
            | Self::CaptchaFailed
            | Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Delivery(_) | Self::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::QuotaExceeded { .. } => "rate_limited",
            Self::MalformedBody(_) => "malformed",
            Self::CaptchaMissing => "captcha_missing",
            Self::CaptchaFailed => "captcha_failed",
            Self::Invalid(_) => "invalid",
            Self::Configuration(_) => "config_error",
            Self::Delivery(_) => "delivery_failed",
            Self::Unexpected(_) => "unexpected",
        }
    }

    /// Internal cause, only ever shown outside production.
    fn detail(&self) -> Option<String> {
        match self {
            Self::MalformedBody(detail)
            | Self::Configuration(detail)
            | Self::Unexpected(detail) => Some(detail.clone()),
            Self::Delivery(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// A failed submission on its way to the client.
#[derive(Debug)]
pub struct Rejection {
    pub error: SubmissionError,
    /// Attach the internal cause as `reason`
    pub disclose: bool,
}

impl Rejection {
    pub fn new(error: SubmissionError, disclose: bool) -> Self {
        Self { error, disclose }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let mut body = ErrorResponse::new(self.error.to_string());

        if self.disclose {
            body.reason = self.error.detail();
        }

        match self.error {
            SubmissionError::QuotaExceeded {
                reset_at,
                retry_after_secs,
            } => {
                let reset_ms = reset_at.timestamp_millis();
                body.reset_time = Some(reset_ms);
                let mut response = (status, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert("Retry-After", HeaderValue::from(retry_after_secs));
                headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
                headers.insert("X-RateLimit-Reset", HeaderValue::from(reset_ms));
                response
            }
            SubmissionError::Invalid(errors) => {
                body.errors = Some(errors);
                (status, Json(body)).into_response()
            }
            _ => (status, Json(body)).into_response(),
        }
    }
}
