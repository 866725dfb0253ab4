//! Shared domain types for the intake client.
//!
//! Job run identifiers and lifecycle status, upload payloads, and the
//! platform events broadcast to frontends. No I/O lives here.

pub mod events;
pub mod payload;
pub mod types;
