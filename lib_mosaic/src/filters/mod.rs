//! # Filters
//!
//! Pure predicate/transform stages applied to decoded firehose frames.

/// Shape, operation, embed and hashtag checks.
pub mod event_filter;

pub use event_filter::filter;
