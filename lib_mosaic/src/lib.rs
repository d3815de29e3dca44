//! # lib_mosaic
//!
//! The engine behind the live image mosaic: it subscribes to the Bluesky
//! Jetstream firehose, keeps only image posts that carry an allowed hashtag,
//! resolves their images through the embed service and spreads the results
//! across a fixed set of display slots with pause-aware round robin.
//!
//! Rendering is not done here. Whatever draws the mosaic implements
//! [`PresentationSink`](crate::core::sink::PresentationSink) and receives `(slot, item)` placements,
//! evictions, slot rebuilds and pause changes.
//!
//! ## Layout
//! - **`configs`**: engine tunables, slot-count policy and the hashtag allow-list.
//! - **`models`**: serde model of feed frames plus the candidate/display items.
//! - **`filters`**: the pure event filter.
//! - **`enrich`**: bounded exponential backoff and the enrichment fetcher.
//! - **`core`**: engine state, router, pause controller, connection manager and wiring.
//! - **`ingestors`** (feature `ingestors`): the Jetstream WebSocket feed source.
//! - **`retrieve`** (feature `retrieve`): the HTTP client used for embed lookups.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod configs;
pub mod core;
pub mod enrich;
pub mod filters;
pub mod models;

#[cfg(feature = "ingestors")]
pub mod ingestors;
#[cfg(feature = "retrieve")]
pub mod retrieve;

// Re-export the types an embedding host needs to stand the engine up.
pub use crate::configs::{AllowList, EngineConfig, EnrichmentMode, SlotCountPolicy, Viewport};
pub use crate::core::{EngineHandle, MosaicEngine, PresentationSink, RouteOutcome};
pub use crate::models::{CandidateItem, DisplayItem, Media, RawEvent};
