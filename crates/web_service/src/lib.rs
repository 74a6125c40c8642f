//! web_service - HTTP surface of the chat relay
//!
//! Exposes the `/v1/threads` CRUD surface and the `/v1/chat` streaming
//! endpoint, both scoped to the user id carried by the session cookie.

pub mod auth;
pub mod controllers;
pub mod dto;
pub mod error;
pub mod server;

pub use error::{AppError, Result};
pub use server::{run, AppState};
