// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! Server side of the portfolio contact form. A submission passes through:
//!
//! - Per-client fixed-window rate limiting (3 per 15 minutes default)
//! - Cloudflare Turnstile bot-check, failing closed
//! - Field sanitization and validation with accumulated errors
//! - HTML-escaped owner notification sent through Resend

pub mod captcha;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod models;
pub mod notification;
pub mod submission;
pub mod validator;

pub use captcha::{ChallengeVerifier, TurnstileVerifier};
pub use config::Config;
pub use error::{Rejection, SubmissionError};
pub use limiter::{RateLimitResult, RateLimiter};
pub use mailer::{DeliveryError, Mailer, OutboundEmail, ResendMailer};
pub use submission::ContactService;
pub use validator::{ContactValidator, ValidationResult};
