//! # Data Models
//!
//! `feed_event` mirrors the firehose wire format; `items` holds the engine's
//! own candidate and display items.

/// Serde model of Jetstream frames.
pub mod feed_event;
/// Candidate and display items.
pub mod items;

pub use feed_event::{EventKind, Operation, PostRecord, RawEvent};
pub use items::{post_url, CandidateItem, DisplayItem, Media};
