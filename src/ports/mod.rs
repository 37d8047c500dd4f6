//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `AlertChannel`: Outbound alert delivery
//! - `OddsSource`: Match predictions and bookmaker prices

pub mod channel;
pub mod odds_source;
