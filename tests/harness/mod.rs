// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for driving the contact relay router in-process.
//!
//! Provides fake bot-check and mail services, submission generators, and an
//! outcome tally for abuse simulations.

#![allow(dead_code)]

pub mod fakes;
pub mod generators;
pub mod metrics;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use contact_relay::{
    config::Config,
    handlers::{router, AppState},
    limiter::RateLimiter,
    metrics::Metrics,
    validator::ContactValidator,
    ContactService,
};
use fakes::{FakeMailer, FakeVerifier, MailMode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub type TestState = Arc<AppState<FakeVerifier, FakeMailer>>;

/// Build a router over fake collaborators.
pub fn spawn_app(config: Config, mode: MailMode) -> (Router, TestState) {
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
    let service = ContactService::new(
        limiter,
        ContactValidator::new(config.validation.clone()),
        FakeVerifier::accepting(fakes::GOOD_TOKEN),
        FakeMailer::new(mode),
        &config.mail,
    );
    let state = Arc::new(AppState {
        service,
        metrics: Metrics::new().expect("metrics registry"),
        config,
    });
    (router(state.clone()), state)
}

/// POST a JSON body to `/api/send`, optionally from a forwarded address.
pub async fn post_send(app: &Router, client_ip: Option<&str>, body: &Value) -> Response<Body> {
    post_raw(app, client_ip, serde_json::to_vec(body).expect("serializable body")).await
}

pub async fn post_raw(app: &Router, client_ip: Option<&str>, body: Vec<u8>) -> Response<Body> {
    let mut request = Request::post("/api/send").header("content-type", "application/json");
    if let Some(ip) = client_ip {
        request = request.header("x-forwarded-for", ip);
    }
    app.clone()
        .oneshot(request.body(Body::from(body)).expect("request"))
        .await
        .expect("infallible router")
}

pub async fn get(app: &Router, path: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::get(path).body(Body::empty()).expect("request"))
        .await
        .expect("infallible router")
}

/// Drain a response body as JSON.
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
}
