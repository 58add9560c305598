//! Ambient plumbing shared by the Postbox binaries: configuration loading,
//! structured logging, health endpoints and HTTP middleware.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
