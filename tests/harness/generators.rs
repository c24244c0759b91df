// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for submission simulations.

use super::fakes::GOOD_TOKEN;
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A well-formed submission carrying a token the fake verifier accepts.
pub fn valid_submission(i: usize) -> Value {
    json!({
        "name": format!("Visitor {i}"),
        "email": format!("visitor{i}@example.com"),
        "projectType": "Web Application",
        "message": format!("Hello, this is enquiry number {i}. Let's build something."),
        "turnstileToken": GOOD_TOKEN,
    })
}

/// The same submission with a token that will not verify.
pub fn bot_submission(i: usize) -> Value {
    let mut body = valid_submission(i);
    body["turnstileToken"] = json!(format!("forged-{i}"));
    body
}

/// Markup and script payloads aimed at the rendered notification.
pub fn injection_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert('x')</script>",
        "<img src=x onerror=alert(1)>",
        "\"><svg onload=alert(1)>",
        "<a href=\"javascript:alert(1)\">click</a>",
        "<iframe src='https://evil.example'></iframe>",
    ]
}
