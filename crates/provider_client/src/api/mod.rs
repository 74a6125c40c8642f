//! Upstream API surface: wire models and the HTTP client.

pub mod client;
pub mod models;
