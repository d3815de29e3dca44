//! # Configuration Modules
//!
//! This module aggregates the engine's configuration surface: the tunables
//! and slot-count policy in `config_engine`, and the hashtag allow-list built
//! once at startup in `allow_list`.

/// Engine tunables, enrichment mode, viewport and slot-count policy.
pub mod config_engine;

/// The immutable hashtag allow-list and its named presets.
pub mod allow_list;

pub use allow_list::{normalize_tag, AllowList, PRESET_HASHTAGS};
pub use config_engine::{
    Breakpoint, ConfigError, EngineConfig, EnrichmentMode, SlotCountPolicy, Viewport, MAX_SLOTS,
    MAX_SLOT_CAPACITY,
};
