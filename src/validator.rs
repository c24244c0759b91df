// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form sanitizer and validator.
//!
//! - Name: 2..=100 characters after sanitization
//! - Email: required, at most 254 characters, well formed, not disposable
//! - Project type: optional, at most 50 characters
//! - Message: 10..=2000 characters after sanitization
//!
//! Sanitization truncates to the field maximum before the length checks, so
//! an overlong name or message is shortened rather than refused. Every field
//! is checked; errors accumulate in field order.

use crate::config::ValidationConfig;
use crate::models::{ContactForm, ContactSubmission};
use email_address::EmailAddress;
use thiserror::Error;
use tracing::debug;

/// A single field-level violation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Name must be at least {min} characters long")]
    NameTooShort { min: usize },

    #[error("Email is required")]
    EmailMissing,

    #[error("Email address is too long (max {max} characters)")]
    EmailTooLong { max: usize },

    #[error("Invalid email format")]
    EmailInvalid,

    #[error("Disposable email addresses are not allowed")]
    EmailDisposable,

    #[error("Project type is too long (max {max} characters)")]
    ProjectTypeTooLong { max: usize },

    #[error("Message must be at least {min} characters long")]
    MessageTooShort { min: usize },
}

/// Outcome of validating one submission. Valid iff no errors were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Human-readable messages, in field order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Strip control characters (keeping `\t`, `\n`, `\r`), trim, and cut to
/// `max_chars` characters.
///
/// Applying it twice gives the same string as applying it once.
pub fn sanitize_input(input: &str, max_chars: usize) -> String {
    let stripped: String = input.chars().filter(|c| !is_stripped_control(*c)).collect();
    let truncated: String = stripped.trim().chars().take(max_chars).collect();
    truncated.trim_end().to_string()
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Contact form validator.
pub struct ContactValidator {
    config: ValidationConfig,
}

impl ContactValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Check every field and collect all violations.
    pub fn validate(&self, submission: &ContactSubmission) -> ValidationResult {
        let mut errors = Vec::new();

        let name = sanitize_input(&submission.name, self.config.name_max_chars);
        if name.chars().count() < self.config.name_min_chars {
            errors.push(FieldError::NameTooShort {
                min: self.config.name_min_chars,
            });
        }

        errors.extend(self.validate_email(&submission.email));

        if let Some(project_type) = submission.project_type.as_deref() {
            if project_type.trim().chars().count() > self.config.project_type_max_chars {
                errors.push(FieldError::ProjectTypeTooLong {
                    max: self.config.project_type_max_chars,
                });
            }
        }

        let message = sanitize_input(&submission.message, self.config.message_max_chars);
        if message.chars().count() < self.config.message_min_chars {
            errors.push(FieldError::MessageTooShort {
                min: self.config.message_min_chars,
            });
        }

        debug!(error_count = errors.len(), "Contact form validated");
        ValidationResult { errors }
    }

    /// Validate an email address on its own.
    pub fn validate_email(&self, email: &str) -> Vec<FieldError> {
        let email = email.trim();
        if email.is_empty() {
            return vec![FieldError::EmailMissing];
        }

        let mut errors = Vec::new();
        if email.chars().count() > self.config.email_max_chars {
            errors.push(FieldError::EmailTooLong {
                max: self.config.email_max_chars,
            });
        }

        if !is_email(email) {
            errors.push(FieldError::EmailInvalid);
        }

        if let Some((_, domain)) = email.rsplit_once('@') {
            if self.is_disposable(domain) {
                debug!(domain = %domain, "Disposable email domain");
                errors.push(FieldError::EmailDisposable);
            }
        }

        errors
    }

    fn is_disposable(&self, domain: &str) -> bool {
        self.config
            .disposable_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(domain))
    }

    /// Sanitized copy of the submission's fields.
    pub fn normalize(&self, submission: &ContactSubmission) -> ContactForm {
        let project_type = submission
            .project_type
            .as_deref()
            .map(|p| sanitize_input(p, self.config.project_type_max_chars))
            .filter(|p| !p.is_empty());

        ContactForm {
            name: sanitize_input(&submission.name, self.config.name_max_chars),
            email: submission.email.trim().to_string(),
            project_type,
            message: sanitize_input(&submission.message, self.config.message_max_chars),
        }
    }
}

/// Address grammar check: a plain `local@domain` with a dotted domain.
/// Display-name forms such as `Ada <ada@example.com>` are refused.
fn is_email(email: &str) -> bool {
    if email.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
        return false;
    }
    if !EmailAddress::is_valid(email) {
        return false;
    }
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            let tld = domain.rsplit('.').next().unwrap_or_default();
            !local.is_empty() && domain.contains('.') && tld.len() >= 2
        }
        None => false,
    }
}
