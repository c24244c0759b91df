// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for the submission pipeline.

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Label used for submissions that reached the owner's inbox.
pub const DELIVERED: &str = "delivered";

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    rate_limit_entries: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new("contact_submissions_total", "Contact submissions by outcome"),
            &["outcome"],
        )?;
        let rate_limit_entries = IntGauge::new(
            "contact_rate_limit_entries",
            "Client identifiers currently tracked by the rate limiter",
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(rate_limit_entries.clone()))?;

        Ok(Self {
            registry,
            submissions,
            rate_limit_entries,
        })
    }

    pub fn record(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    pub fn count(&self, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[outcome]).get()
    }

    pub fn set_rate_limit_entries(&self, entries: usize) {
        self.rate_limit_entries.set(entries as i64);
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_render() {
        let metrics = Metrics::new().unwrap();
        metrics.record(DELIVERED);
        metrics.record("rate_limited");
        metrics.record("rate_limited");
        metrics.set_rate_limit_entries(4);

        assert_eq!(metrics.count("rate_limited"), 2);
        let text = metrics.render().unwrap();
        assert!(text.contains(r#"contact_submissions_total{outcome="delivered"} 1"#));
        assert!(text.contains("contact_rate_limit_entries 4"));
    }
}
