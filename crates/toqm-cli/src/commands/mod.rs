//! CLI command implementations.

pub mod common;
pub mod latency;
pub mod route;
pub mod version;
