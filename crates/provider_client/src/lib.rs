//! provider_client - Upstream provider routing, requests and stream aggregation
//!
//! This crate owns everything between "the user submitted a turn" and "an
//! assistant message exists": picking the upstream endpoint for a model id,
//! building the JSON or multipart request, and turning the provider's
//! newline-delimited JSON response stream into an incrementally updated
//! `Message`.

pub mod api;
pub mod error;
pub mod router;
pub mod stream;

pub use api::client::ProviderClient;
pub use api::models::ChatRequest;
pub use error::UpstreamError;
pub use router::{route, Route};
pub use stream::{StreamAggregator, StreamEvent};
