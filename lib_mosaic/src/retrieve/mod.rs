//! # Data Retrieval Module
//!
//! HTTP clients used by the engine. Retrying is not done at this layer: the
//! enrichment fetcher owns the backoff policy, so every call here is exactly
//! one round trip.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: A small JSON `ApiClient` on top of `reqwest`, which also
//!   serves as the engine's [`EmbedLookup`](crate::enrich::fetcher::EmbedLookup).

/// Generic JSON HTTP client and the embed lookup built on it.
pub mod ky_http;

pub use ky_http::{ApiClient, ApiResponse};
