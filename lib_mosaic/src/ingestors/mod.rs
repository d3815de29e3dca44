//! # Feed Ingestors
//!
//! Concrete [`FeedSource`](crate::core::connection_manager::FeedSource)
//! implementations. The connection manager owns the reconnect policy; an
//! ingestor only knows how to open one connection and turn it into a stream
//! of text frames.
//!
//! ## Contained Modules:
//! - **`jetstream_wss`**: WebSocket client for the Bluesky Jetstream firehose.

/// The WebSocket source for the Jetstream firehose.
pub mod jetstream_wss;

pub use jetstream_wss::{subscribe_url, WssFeedSource};
