// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Accepts contact form posts from the portfolio site and forwards them to
//! the owner by email.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `APP_ENV`: `production` hides internal failure reasons
//! - `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS`: quota (default: 3 per 900s)
//! - `TURNSTILE_SECRET_KEY`, `TURNSTILE_SITE_KEY`: bot-check keys
//! - `RESEND_API_KEY`: mail delivery credential
//! - `CONTACT_EMAIL`, `CONTACT_FROM`: notification recipient and sender

use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{
    config::Config,
    handlers::{router, AppState},
    limiter::RateLimiter,
    metrics::Metrics,
    validator::ContactValidator,
    ContactService, ResendMailer, TurnstileVerifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        bind_addr = %config.bind_addr,
        environment = ?config.environment,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        mail_configured = config.mail.api_key.is_some(),
        captcha_configured = config.captcha.secret_key.is_some(),
        "Starting contact relay"
    );

    // Create application state
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
    let sweeper = limiter.spawn_sweeper(config.rate_limit.sweep_interval());

    let verifier = TurnstileVerifier::new(&config.captcha).context("building CAPTCHA client")?;
    let mailer = ResendMailer::new(&config.mail).context("building mail client")?;
    let service = ContactService::new(
        limiter,
        ContactValidator::new(config.validation.clone()),
        verifier,
        mailer,
        &config.mail,
    );

    let state = Arc::new(AppState {
        service,
        metrics: Metrics::new().context("registering metrics")?,
        config: config.clone(),
    });

    let app: Router = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.stop().await;
    info!("Contact relay stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
