//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, terminal, file I/O) and hosts
//! the metrics exporter.
//!
//! Adapter categories:
//! - `channels`: Console, browser, sound, email and webhook delivery
//! - `metrics`: Prometheus metrics export and liveness
//! - `source`: JSON snapshot file reader

pub mod channels;
pub mod metrics;
pub mod source;
