// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay.
//!
//! Every option has a default; secrets have none and are reported as absent
//! so the submission pipeline can fail loudly on a misconfigured deployment.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Configuration for the contact relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Runtime mode; controls error-detail disclosure
    #[serde(default)]
    pub environment: Environment,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Field validation limits
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Bot-check configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Mail delivery configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Origins allowed to call the API from a browser. Empty disables CORS.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    /// Largest accepted request body in bytes (default: 16 KiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    #[default]
    Development,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        })
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum submissions per client per window (default: 3)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 900)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Interval between sweeps of expired entries in seconds (default: 300)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Field limits for contact submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_name_min")]
    pub name_min_chars: usize,
    #[serde(default = "default_name_max")]
    pub name_max_chars: usize,
    #[serde(default = "default_email_max")]
    pub email_max_chars: usize,
    #[serde(default = "default_project_type_max")]
    pub project_type_max_chars: usize,
    #[serde(default = "default_message_min")]
    pub message_min_chars: usize,
    #[serde(default = "default_message_max")]
    pub message_max_chars: usize,

    /// Domains of throwaway mailbox providers that are refused
    #[serde(default = "default_disposable_domains")]
    pub disposable_domains: Vec<String>,
}

/// Bot-check (Cloudflare Turnstile) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Server-side secret; verification fails closed without it
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Public site key handed to the browser widget
    #[serde(default)]
    pub site_key: Option<String>,

    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    #[serde(default = "default_outbound_timeout_ms")]
    pub timeout_ms: u64,
}

/// Mail delivery (Resend) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Delivery API credential
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_mail_api_url")]
    pub api_url: String,

    /// Where notifications are sent
    #[serde(default = "default_recipient")]
    pub recipient: String,

    /// From header used for notifications
    #[serde(default = "default_sender")]
    pub sender: String,

    #[serde(default = "default_outbound_timeout_ms")]
    pub timeout_ms: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

/// Configuration rejected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u64 },

    #[error("invalid bind address {0}")]
    BindAddr(String),
}

/// Longest accepted rate limit window (one year).
pub const MAX_WINDOW_SECS: u64 = 366 * 24 * 60 * 60;

/// Longest accepted pause between sweeps (one day).
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_sweep_interval_secs() -> u64 {
    5 * 60
}

fn default_name_min() -> usize {
    2
}

fn default_name_max() -> usize {
    100
}

fn default_email_max() -> usize {
    254
}

fn default_project_type_max() -> usize {
    50
}

fn default_message_min() -> usize {
    10
}

fn default_message_max() -> usize {
    2000
}

fn default_disposable_domains() -> Vec<String> {
    ["tempmail.com", "guerrillamail.com", "mailinator.com", "10minutemail.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_verify_url() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string()
}

fn default_mail_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_recipient() -> String {
    "contact@example.com".to_string()
}

fn default_sender() -> String {
    "Portfolio Contact <onboarding@resend.dev>".to_string()
}

fn default_outbound_timeout_ms() -> u64 {
    10_000
}

fn default_max_body_bytes() -> usize {
    16 * 1024
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            environment: Environment::default(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            captcha: CaptchaConfig::default(),
            mail: MailConfig::default(),
            metrics: MetricsConfig::default(),
            cors_allowed_origins: Vec::new(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_min_chars: default_name_min(),
            name_max_chars: default_name_max(),
            email_max_chars: default_email_max(),
            project_type_max_chars: default_project_type_max(),
            message_min_chars: default_message_min(),
            message_max_chars: default_message_max(),
            disposable_domains: default_disposable_domains(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            site_key: None,
            verify_url: default_verify_url(),
            timeout_ms: default_outbound_timeout_ms(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_mail_api_url(),
            recipient: default_recipient(),
            sender: default_sender(),
            timeout_ms: default_outbound_timeout_ms(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

// Secrets stay out of debug output.
impl std::fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("site_key", &self.site_key)
            .field("verify_url", &self.verify_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("recipient", &self.recipient)
            .field("sender", &self.sender)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl CaptchaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl MailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Config {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            environment: var("APP_ENV")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            rate_limit: RateLimitConfig {
                max_requests: parse_or(&var, "RATE_LIMIT_MAX", defaults.rate_limit.max_requests),
                window_secs: parse_or(&var, "RATE_LIMIT_WINDOW_SECS", defaults.rate_limit.window_secs),
                sweep_interval_secs: parse_or(
                    &var,
                    "RATE_LIMIT_SWEEP_SECS",
                    defaults.rate_limit.sweep_interval_secs,
                ),
            },
            validation: defaults.validation,
            captcha: CaptchaConfig {
                secret_key: var("TURNSTILE_SECRET_KEY"),
                site_key: var("TURNSTILE_SITE_KEY"),
                verify_url: var("TURNSTILE_VERIFY_URL").unwrap_or(defaults.captcha.verify_url),
                timeout_ms: parse_or(&var, "CAPTCHA_TIMEOUT_MS", defaults.captcha.timeout_ms),
            },
            mail: MailConfig {
                api_key: var("RESEND_API_KEY"),
                api_url: var("RESEND_API_URL").unwrap_or(defaults.mail.api_url),
                recipient: var("CONTACT_EMAIL").unwrap_or(defaults.mail.recipient),
                sender: var("CONTACT_FROM").unwrap_or(defaults.mail.sender),
                timeout_ms: parse_or(&var, "MAIL_TIMEOUT_MS", defaults.mail.timeout_ms),
            },
            metrics: MetricsConfig {
                enabled: parse_or(&var, "METRICS_ENABLED", defaults.metrics.enabled),
                ..defaults.metrics
            },
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            max_body_bytes: parse_or(&var, "MAX_BODY_BYTES", defaults.max_body_bytes),
        }
    }

    /// Check values that would otherwise only fail at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::BindAddr(self.bind_addr.clone()));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_MAX"));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_WINDOW_SECS"));
        }
        if self.rate_limit.sweep_interval_secs == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_SWEEP_SECS"));
        }
        if self.rate_limit.window_secs > MAX_WINDOW_SECS {
            return Err(ConfigError::TooLarge {
                field: "RATE_LIMIT_WINDOW_SECS",
                max: MAX_WINDOW_SECS,
            });
        }
        if self.rate_limit.sweep_interval_secs > MAX_SWEEP_INTERVAL_SECS {
            return Err(ConfigError::TooLarge {
                field: "RATE_LIMIT_SWEEP_SECS",
                max: MAX_SWEEP_INTERVAL_SECS,
            });
        }
        check_url("TURNSTILE_VERIFY_URL", &self.captcha.verify_url)?;
        check_url("RESEND_API_URL", &self.mail.api_url)?;
        Ok(())
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_or<T, V>(var: &V, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, %default, "Unparseable configuration value, using default");
            default
        }),
    }
}
