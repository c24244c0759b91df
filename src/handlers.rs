// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay service.

use crate::captcha::ChallengeVerifier;
use crate::config::Config;
use crate::error::{Rejection, SubmissionError};
use crate::mailer::Mailer;
use crate::metrics::{Metrics, DELIVERED};
use crate::models::{CaptchaSettings, HealthResponse, SuccessResponse};
use crate::submission::{ContactService, UNKNOWN_CLIENT};
use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

/// Shared application state.
pub struct AppState<V, M> {
    pub service: ContactService<V, M>,
    pub metrics: Metrics,
    pub config: Config,
}

/// Build the service router.
pub fn router<V, M>(state: Arc<AppState<V, M>>) -> Router
where
    V: ChallengeVerifier + 'static,
    M: Mailer + 'static,
{
    let config = &state.config;

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/send", post(submit::<V, M>))
        .route("/api/captcha", get(captcha_settings::<V, M>));

    if config.metrics.enabled {
        app = app.route(&config.metrics.path, get(metrics::<V, M>));
    }

    let production = config.environment.is_production();
    let panic_metrics = state.metrics.clone();
    let mut app = app
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(&panic_metrics, production, panic)
        }))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&config.cors_allowed_origins) {
        app = app.layer(cors);
    }

    app.with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring unusable CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

/// Last-resort answer for a handler that panicked.
fn panic_response(metrics: &Metrics, production: bool, panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".to_string());

    error!(detail = %detail, "Request handler panicked");
    let error = SubmissionError::Unexpected(detail);
    metrics.record(error.outcome());
    Rejection::new(error, !production).into_response()
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-relay",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Public CAPTCHA widget settings.
pub async fn captcha_settings<V, M>(State(state): State<Arc<AppState<V, M>>>) -> Json<CaptchaSettings> {
    Json(CaptchaSettings {
        site_key: state.config.captcha.site_key.clone(),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics<V, M>(State(state): State<Arc<AppState<V, M>>>) -> Response
where
    V: ChallengeVerifier,
    M: Mailer,
{
    state
        .metrics
        .set_rate_limit_entries(state.service.limiter().len().await);

    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Contact form submission endpoint.
///
/// The body is read as raw bytes so the rate check can run before any
/// parsing, and so a malformed body still counts against the quota.
pub async fn submit<V, M>(
    State(state): State<Arc<AppState<V, M>>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    V: ChallengeVerifier,
    M: Mailer,
{
    let client_id = client_identifier(&headers, peer.map(|ConnectInfo(addr)| addr));
    debug!(client = %client_id, bytes = body.len(), "Processing contact submission");

    match state.service.submit(&client_id, &body).await {
        Ok(delivered) => {
            state.metrics.record(DELIVERED);
            let quota = delivered.quota;
            (
                StatusCode::OK,
                [
                    ("X-RateLimit-Remaining", quota.remaining().to_string()),
                    ("X-RateLimit-Reset", quota.reset_time_ms().to_string()),
                ],
                Json(SuccessResponse {
                    success: true,
                    message: "Email sent successfully",
                    id: delivered.id,
                }),
            )
                .into_response()
        }
        Err(error) => {
            state.metrics.record(error.outcome());
            let disclose = !state.config.environment.is_production();
            Rejection::new(error, disclose).into_response()
        }
    }
}

/// Key for rate limiting: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the socket peer, then [`UNKNOWN_CLIENT`].
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header_str("x-forwarded-for")
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header_str("x-real-ip") {
        return real_ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
