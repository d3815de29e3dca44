//! # Enrichment
//!
//! Resolving firehose post references into renderable media through the
//! embed service, with bounded exponential backoff.

/// Retry delay schedule.
pub mod backoff;
/// The `EmbedLookup` seam and the retrying fetcher built on it.
pub mod fetcher;

pub use backoff::BackoffPolicy;
pub use fetcher::{EmbedLookup, EnrichError, EnrichmentFetcher, LookupReply};
