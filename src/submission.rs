// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact submission pipeline.
//!
//! Steps run in a fixed order and the first failure ends the request:
//!
//! 1. rate check (before the body is even parsed)
//! 2. body parse
//! 3. CAPTCHA token presence
//! 4. CAPTCHA verification
//! 5. field validation
//! 6. delivery credential present
//! 7. render and dispatch the notification

use crate::captcha::ChallengeVerifier;
use crate::config::MailConfig;
use crate::error::SubmissionError;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::mailer::{Mailer, OutboundEmail};
use crate::models::ContactSubmission;
use crate::notification;
use crate::validator::ContactValidator;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Client identifier used when no address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// A notification handed to the delivery service.
#[derive(Debug, Clone)]
pub struct Delivered {
    /// Delivery service message id
    pub id: Option<String>,
    /// Rate limit state after this submission
    pub quota: RateLimitResult,
}

pub struct ContactService<V, M> {
    limiter: Arc<RateLimiter>,
    validator: ContactValidator,
    verifier: V,
    mailer: M,
    sender: String,
    recipient: String,
}

impl<V, M> ContactService<V, M>
where
    V: ChallengeVerifier,
    M: Mailer,
{
    pub fn new(
        limiter: Arc<RateLimiter>,
        validator: ContactValidator,
        verifier: V,
        mailer: M,
        mail: &MailConfig,
    ) -> Self {
        Self {
            limiter,
            validator,
            verifier,
            mailer,
            sender: mail.sender.clone(),
            recipient: mail.recipient.clone(),
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Run one submission from `client_id` with the raw JSON `body`.
    pub async fn submit(&self, client_id: &str, body: &[u8]) -> Result<Delivered, SubmissionError> {
        let quota = self.limiter.check(client_id).await;
        if !quota.is_allowed() {
            let retry_after_secs = quota.retry_after_secs(self.limiter.now());
            info!(client = %client_id, retry_after_secs, "Submission rate limited");
            return Err(SubmissionError::QuotaExceeded {
                reset_at: quota.reset_at(),
                retry_after_secs,
            });
        }

        let submission: ContactSubmission = serde_json::from_slice(body).map_err(|e| {
            debug!(client = %client_id, error = %e, "Unparseable submission body");
            SubmissionError::MalformedBody(e.to_string())
        })?;

        let token = submission
            .turnstile_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SubmissionError::CaptchaMissing)?;

        let remote_ip = (client_id != UNKNOWN_CLIENT).then_some(client_id);
        if !self.verifier.verify(token, remote_ip).await {
            info!(client = %client_id, "CAPTCHA verification failed");
            return Err(SubmissionError::CaptchaFailed);
        }

        let validation = self.validator.validate(&submission);
        if !validation.is_valid() {
            debug!(client = %client_id, errors = ?validation.messages(), "Submission invalid");
            return Err(SubmissionError::Invalid(validation.messages()));
        }

        if !self.mailer.is_configured() {
            error!("RESEND_API_KEY is not set; cannot deliver contact submissions");
            return Err(SubmissionError::Configuration(
                "mail delivery credential is not configured".to_string(),
            ));
        }

        let form = self.validator.normalize(&submission);
        let rendered = notification::render(&form);
        let email = OutboundEmail {
            from: self.sender.clone(),
            to: vec![self.recipient.clone()],
            reply_to: form.email,
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
        };

        match self.mailer.send(&email).await {
            Ok(id) => {
                info!(client = %client_id, id = ?id, remaining = quota.remaining(), "Contact notification delivered");
                Ok(Delivered { id, quota })
            }
            Err(e) => {
                warn!(client = %client_id, error = %e, "Contact notification delivery failed");
                Err(SubmissionError::Delivery(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RateLimitConfig, ValidationConfig};
    use crate::mailer::DeliveryError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingVerifier {
        calls: AtomicUsize,
        remote_ips: Mutex<Vec<Option<String>>>,
    }

    impl ChallengeVerifier for CountingVerifier {
        async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.remote_ips.lock().unwrap().push(remote_ip.map(String::from));
            token == "pass"
        }
    }

    #[derive(Default)]
    struct CountingMailer {
        sent: AtomicUsize,
        unconfigured: bool,
    }

    impl Mailer for CountingMailer {
        fn is_configured(&self) -> bool {
            !self.unconfigured
        }

        async fn send(&self, _email: &OutboundEmail) -> Result<Option<String>, DeliveryError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(Some("msg_1".to_string()))
        }
    }

    fn build_service(max_requests: u32, mailer: CountingMailer) -> ContactService<CountingVerifier, CountingMailer> {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests,
            ..Default::default()
        }));
        ContactService::new(
            limiter,
            ContactValidator::new(ValidationConfig::default()),
            CountingVerifier::default(),
            mailer,
            &MailConfig::default(),
        )
    }

    fn body(token: Option<&str>, message: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "message": message,
            "turnstileToken": token,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_happy_path() {
        let service = build_service(3, CountingMailer::default());
        let delivered = service
            .submit("198.51.100.1", &body(Some("pass"), "A perfectly fine message"))
            .await
            .unwrap();
        assert_eq!(delivered.id.as_deref(), Some("msg_1"));
        assert_eq!(delivered.quota.remaining(), 2);
    }

    #[tokio::test]
    async fn test_rate_check_precedes_parsing() {
        let service = build_service(1, CountingMailer::default());

        let first = service.submit("ip", b"not json").await;
        assert!(matches!(first, Err(SubmissionError::MalformedBody(_))));

        let second = service.submit("ip", b"not json").await;
        assert!(matches!(second, Err(SubmissionError::QuotaExceeded { .. })));
    }

    #[tokio::test]
    async fn test_missing_token_skips_verifier() {
        let service = build_service(3, CountingMailer::default());

        let result = service.submit("ip", &body(None, "A perfectly fine message")).await;
        assert!(matches!(result, Err(SubmissionError::CaptchaMissing)));
        let result = service.submit("ip", &body(Some("  "), "A perfectly fine message")).await;
        assert!(matches!(result, Err(SubmissionError::CaptchaMissing)));
        assert_eq!(service.verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_ip_withheld_for_unknown_client() {
        let service = build_service(3, CountingMailer::default());
        let message = "A perfectly fine message";

        assert!(service.submit("203.0.113.9", &body(Some("pass"), message)).await.is_ok());
        assert!(service.submit(UNKNOWN_CLIENT, &body(Some("pass"), message)).await.is_ok());

        let seen = service.verifier.remote_ips.lock().unwrap().clone();
        assert_eq!(seen, vec![Some("203.0.113.9".to_string()), None]);
    }

    #[tokio::test]
    async fn test_failed_captcha_precedes_validation() {
        let service = build_service(3, CountingMailer::default());
        let result = service.submit("ip", &body(Some("fail"), "short")).await;
        assert!(matches!(result, Err(SubmissionError::CaptchaFailed)));
    }

    #[tokio::test]
    async fn test_nothing_sent_when_invalid_or_unconfigured() {
        let service = build_service(3, CountingMailer::default());
        let result = service.submit("ip", &body(Some("pass"), "short")).await;
        assert!(matches!(result, Err(SubmissionError::Invalid(ref e)) if e.len() == 1));
        assert_eq!(service.mailer.sent.load(Ordering::SeqCst), 0);

        let unconfigured = build_service(
            3,
            CountingMailer {
                unconfigured: true,
                ..Default::default()
            },
        );
        let result = unconfigured
            .submit("ip", &body(Some("pass"), "A perfectly fine message"))
            .await;
        assert!(matches!(result, Err(SubmissionError::Configuration(_))));
        assert_eq!(unconfigured.mailer.sent.load(Ordering::SeqCst), 0);
    }
}
