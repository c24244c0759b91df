// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Bot-check verification against Cloudflare Turnstile.
//!
//! Verification fails closed: an empty token, a missing secret, a network
//! error, a timeout, an unparseable body, or anything but `"success": true`
//! all yield `false`. Nothing is retried.

use crate::config::CaptchaConfig;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

/// Something that can vouch for a challenge token.
pub trait ChallengeVerifier: Send + Sync {
    /// `true` only when the challenge service positively confirms `token`.
    fn verify(&self, token: &str, remote_ip: Option<&str>) -> impl Future<Output = bool> + Send;
}

#[derive(Debug, Serialize)]
struct SiteVerifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remoteip: Option<&'a str>,
}

/// Turnstile `siteverify` client.
pub struct TurnstileVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: Option<String>,
}

impl TurnstileVerifier {
    /// Create a verifier whose requests time out after the configured period.
    pub fn new(config: &CaptchaConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        if config.secret_key.is_none() {
            warn!("TURNSTILE_SECRET_KEY is not set; every CAPTCHA check will fail");
        }

        Ok(Self {
            client,
            verify_url: config.verify_url.clone(),
            secret: config.secret_key.clone(),
        })
    }

    async fn siteverify(&self, secret: &str, token: &str, remote_ip: Option<&str>) -> anyhow::Result<bool> {
        let response = self
            .client
            .post(&self.verify_url)
            .json(&SiteVerifyRequest {
                secret,
                response: token,
                remoteip: remote_ip,
            })
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            anyhow::bail!("siteverify returned {status}");
        }

        let success = body.get("success") == Some(&Value::Bool(true));
        if !success {
            let codes = body.get("error-codes").cloned().unwrap_or_default();
            debug!(error_codes = %codes, "Challenge rejected");
        }
        Ok(success)
    }
}

impl ChallengeVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool {
        if token.trim().is_empty() {
            return false;
        }
        let Some(secret) = self.secret.as_deref() else {
            return false;
        };

        match self.siteverify(secret, token, remote_ip).await {
            Ok(success) => success,
            Err(e) => {
                warn!(error = %e, "Turnstile verification error");
                false
            }
        }
    }
}
