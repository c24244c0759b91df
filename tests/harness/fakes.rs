// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! In-process stand-ins for the bot-check and mail services.

use contact_relay::{ChallengeVerifier, DeliveryError, Mailer, OutboundEmail};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const GOOD_TOKEN: &str = "XXXX.DUMMY.TOKEN.XXXX";

/// Accepts exactly one token.
pub struct FakeVerifier {
    accept: String,
    calls: AtomicUsize,
}

impl FakeVerifier {
    pub fn accepting(token: &str) -> Self {
        Self {
            accept: token.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChallengeVerifier for FakeVerifier {
    async fn verify(&self, token: &str, _remote_ip: Option<&str>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        token == self.accept
    }
}

/// How the fake mail service behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailMode {
    Accept,
    Reject,
    Unconfigured,
    Panic,
}

pub struct FakeMailer {
    mode: MailMode,
    sent: Mutex<Vec<OutboundEmail>>,
}

impl FakeMailer {
    pub fn new(mode: MailMode) -> Self {
        Self {
            mode,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for FakeMailer {
    fn is_configured(&self) -> bool {
        self.mode != MailMode::Unconfigured
    }

    async fn send(&self, email: &OutboundEmail) -> Result<Option<String>, DeliveryError> {
        match self.mode {
            MailMode::Accept => {
                let mut sent = self.sent.lock().unwrap();
                sent.push(email.clone());
                Ok(Some(format!("msg-{}", sent.len())))
            }
            MailMode::Reject => Err(DeliveryError::Rejected {
                status: 403,
                message: "domain is not verified".to_string(),
            }),
            MailMode::Unconfigured => Err(DeliveryError::NotConfigured),
            MailMode::Panic => panic!("mail client exploded"),
        }
    }
}
