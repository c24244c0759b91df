// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request and response bodies for the contact endpoint.

use serde::{Deserialize, Serialize};

/// Contact form as posted by the browser.
///
/// Missing text fields deserialize as empty strings so that they surface as
/// field errors rather than as a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub turnstile_token: Option<String>,
}

/// Sanitized form fields, ready to be rendered into a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub project_type: Option<String>,
    pub message: String,
}

/// 200 body.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Body for every non-200 answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            errors: None,
            reset_time: None,
            reason: None,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Public bot-check settings for the browser widget.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaSettings {
    pub site_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_field_names() {
        let body = r#"{"name":"Ada","email":"ada@example.com","projectType":"Web","message":"Hello there!","turnstileToken":"tok"}"#;
        let submission: ContactSubmission = serde_json::from_str(body).unwrap();
        assert_eq!(submission.project_type.as_deref(), Some("Web"));
        assert_eq!(submission.turnstile_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let submission: ContactSubmission = serde_json::from_str("{}").unwrap();
        assert!(submission.name.is_empty());
        assert!(submission.project_type.is_none());
        assert!(submission.turnstile_token.is_none());
    }

    #[test]
    fn test_error_response_omits_empty_fields() {
        let mut body = ErrorResponse::new("Too many requests. Please try again later.");
        body.reset_time = Some(1_700_000_000_000);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["resetTime"], 1_700_000_000_000i64);
        assert!(json.get("errors").is_none());
        assert!(json.get("reason").is_none());
    }
}
