//! Metrics and Monitoring Adapters
//!
//! Provides Prometheus metrics export on :9090 plus a liveness
//! endpoint (/live) via axum 0.7.

pub mod prometheus;

pub use prometheus::MetricsRegistry;
