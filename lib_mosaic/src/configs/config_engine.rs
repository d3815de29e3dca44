//! # Engine Configuration
//!
//! Every tunable the engine reads lives in [`EngineConfig`]. All fields have
//! defaults, so a host can deserialize a partial JSON document and get a
//! working engine. `validate()` is called by the engine before it starts.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::allow_list::AllowList;
use crate::enrich::backoff::BackoffPolicy;

pub const DEFAULT_FEED_URL: &str = "wss://jetstream2.us-east.bsky.network/subscribe";
pub const DEFAULT_EMBED_BASE_URL: &str = "https://embed.bsky.app/";
pub const POST_COLLECTION: &str = "app.bsky.feed.post";
/// Upper bound on items kept per slot.
pub const MAX_SLOT_CAPACITY: usize = 1000;
/// Upper bound on the number of slots any policy produces.
pub const MAX_SLOTS: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("feed URL must not be empty")]
    EmptyFeedUrl,

    #[error("at least one wanted collection is required")]
    NoWantedCollections,

    #[error("slot capacity must be at least 1")]
    ZeroSlotCapacity,

    #[error("slot capacity {0} exceeds the maximum of {max}", max = MAX_SLOT_CAPACITY)]
    SlotCapacityTooLarge(usize),

    #[error("base backoff delay must be greater than zero")]
    ZeroBackoff,

    #[error("session item ceiling must be greater than zero when set")]
    ZeroSessionCeiling,

    #[error("invalid slot-count policy: {0}")]
    InvalidSlotPolicy(String),
}

/// Which shape of content the enrichment lookup returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnrichmentMode {
    /// Embed API returning `{ "images": [{ "url": ... }] }`; one item per image.
    #[default]
    Images,
    /// oEmbed endpoint returning `{ "html": ... }`; one item per post.
    Embed,
}

/// Sizing input for the slot-count policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 800)
    }
}

/// A width threshold: viewports narrower than `max_width` get `slots` slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub max_width: u32,
    pub slots: usize,
}

/// Maps a viewport to a slot count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SlotCountPolicy {
    /// Column layout driven by width breakpoints. Breakpoints are checked in
    /// ascending order; widths at or beyond the last one get `widest`.
    #[serde(rename_all = "camelCase")]
    Breakpoints {
        breakpoints: Vec<Breakpoint>,
        widest: usize,
    },
    /// Square-cell mosaic: `max(min_columns, width / cell_px)` columns and as
    /// many rows of square cells as fit in the height.
    #[serde(rename_all = "camelCase")]
    Grid { cell_px: u32, min_columns: usize },
}

impl Default for SlotCountPolicy {
    fn default() -> Self {
        SlotCountPolicy::Breakpoints {
            breakpoints: vec![
                Breakpoint { max_width: 640, slots: 2 },
                Breakpoint { max_width: 1024, slots: 3 },
                Breakpoint { max_width: 1440, slots: 4 },
                Breakpoint { max_width: 1920, slots: 5 },
            ],
            widest: 6,
        }
    }
}

impl SlotCountPolicy {
    /// The classic mosaic layout: 200px square cells, at least 3 columns.
    pub fn mosaic_grid() -> Self {
        SlotCountPolicy::Grid { cell_px: 200, min_columns: 3 }
    }

    /// Number of slots for the given viewport, at most [`MAX_SLOTS`]. Never
    /// returns zero for a policy that passed `validate()`.
    pub fn slot_count(&self, viewport: Viewport) -> usize {
        let count = match self {
            SlotCountPolicy::Breakpoints { breakpoints, widest } => breakpoints
                .iter()
                .find(|bp| viewport.width < bp.max_width)
                .map(|bp| bp.slots)
                .unwrap_or(*widest),
            SlotCountPolicy::Grid { cell_px, min_columns } => {
                if viewport.width == 0 || *cell_px == 0 {
                    return (*min_columns).max(1);
                }
                let columns = (*min_columns)
                    .max((viewport.width / cell_px) as usize)
                    .min(MAX_SLOTS);
                let cell_width = f64::from(viewport.width) / columns as f64;
                let rows = (f64::from(viewport.height) / cell_width).floor() as usize;
                columns.saturating_mul(rows.clamp(1, MAX_SLOTS))
            }
        };
        count.min(MAX_SLOTS)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SlotCountPolicy::Breakpoints { breakpoints, widest } => {
                if *widest == 0 || breakpoints.iter().any(|bp| bp.slots == 0) {
                    return Err(ConfigError::InvalidSlotPolicy(
                        "every breakpoint needs at least one slot".to_string(),
                    ));
                }
                if breakpoints.windows(2).any(|w| w[0].max_width >= w[1].max_width) {
                    return Err(ConfigError::InvalidSlotPolicy(
                        "breakpoints must be strictly ascending by width".to_string(),
                    ));
                }
                Ok(())
            }
            SlotCountPolicy::Grid { cell_px, min_columns } => {
                if *cell_px == 0 || *min_columns == 0 {
                    return Err(ConfigError::InvalidSlotPolicy(
                        "grid cell size and minimum columns must be non-zero".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Jetstream subscribe endpoint, without query string.
    pub feed_url: String,
    /// Sent as repeated `wantedCollections` query parameters.
    pub wanted_collections: Vec<String>,
    /// Base URL of the embed service used for enrichment.
    pub embed_base_url: String,
    pub enrichment_mode: EnrichmentMode,
    /// Retries after the first enrichment attempt.
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    /// Fixed delay before reconnecting after an unintentional close.
    pub reconnect_delay_ms: u64,
    pub slot_capacity: usize,
    /// Items placed per session before the engine pauses itself.
    pub session_item_ceiling: Option<u64>,
    /// Named hashtag preset (see `PRESET_HASHTAGS`).
    pub preset: Option<String>,
    /// Comma-separated custom hashtags.
    pub tags: Option<String>,
    pub slot_policy: SlotCountPolicy,
    pub initial_viewport: Viewport,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            wanted_collections: vec![POST_COLLECTION.to_string()],
            embed_base_url: DEFAULT_EMBED_BASE_URL.to_string(),
            enrichment_mode: EnrichmentMode::Images,
            max_retries: 5,
            base_backoff_ms: 1000,
            reconnect_delay_ms: 100,
            slot_capacity: 15,
            session_item_ceiling: None,
            preset: None,
            tags: None,
            slot_policy: SlotCountPolicy::default(),
            initial_viewport: Viewport::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_url.trim().is_empty() {
            return Err(ConfigError::EmptyFeedUrl);
        }
        if self.wanted_collections.is_empty() {
            return Err(ConfigError::NoWantedCollections);
        }
        if self.slot_capacity == 0 {
            return Err(ConfigError::ZeroSlotCapacity);
        }
        if self.slot_capacity > MAX_SLOT_CAPACITY {
            return Err(ConfigError::SlotCapacityTooLarge(self.slot_capacity));
        }
        if self.base_backoff_ms == 0 {
            return Err(ConfigError::ZeroBackoff);
        }
        if self.session_item_ceiling == Some(0) {
            return Err(ConfigError::ZeroSessionCeiling);
        }
        self.slot_policy.validate()
    }

    pub fn allow_list(&self) -> AllowList {
        AllowList::from_spec(self.preset.as_deref(), self.tags.as_deref())
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(self.base_backoff_ms), self.max_retries)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_pick_first_wider_threshold() {
        let policy = SlotCountPolicy::default();
        assert_eq!(policy.slot_count(Viewport::new(320, 640)), 2);
        assert_eq!(policy.slot_count(Viewport::new(640, 640)), 3);
        assert_eq!(policy.slot_count(Viewport::new(1280, 800)), 4);
        assert_eq!(policy.slot_count(Viewport::new(1919, 800)), 5);
        assert_eq!(policy.slot_count(Viewport::new(3840, 2160)), 6);
    }

    #[test]
    fn grid_matches_square_cell_layout() {
        let policy = SlotCountPolicy::mosaic_grid();
        // 1000 / 200 = 5 columns of 200px, 600 / 200 = 3 rows.
        assert_eq!(policy.slot_count(Viewport::new(1000, 600)), 15);
        // Narrow screens still get 3 columns of 100px; 450 / 100 = 4 rows.
        assert_eq!(policy.slot_count(Viewport::new(300, 450)), 12);
        // Too short for one full row still yields one row.
        assert_eq!(policy.slot_count(Viewport::new(1000, 50)), 5);
        assert_eq!(policy.slot_count(Viewport::new(0, 0)), 3);
    }

    #[test]
    fn slot_count_is_capped() {
        let huge = Viewport::new(u32::MAX, u32::MAX);
        assert_eq!(SlotCountPolicy::mosaic_grid().slot_count(huge), MAX_SLOTS);
        assert_eq!(
            SlotCountPolicy::Grid { cell_px: 1, min_columns: 1 }.slot_count(huge),
            MAX_SLOTS
        );
        // One pixel wide, four billion tall: a single column of capped rows.
        assert_eq!(
            SlotCountPolicy::Grid { cell_px: 1, min_columns: 1 }.slot_count(Viewport::new(1, u32::MAX)),
            MAX_SLOTS
        );
        let wide = SlotCountPolicy::Breakpoints { breakpoints: vec![], widest: 10_000 };
        assert_eq!(wide.slot_count(huge), MAX_SLOTS);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "slotCapacity": 4, "tags": "cats", "slotPolicy": { "kind": "grid", "cellPx": 100, "minColumns": 2 } }"#,
        )
        .unwrap();
        assert_eq!(config.slot_capacity, 4);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.slot_policy, SlotCountPolicy::Grid { cell_px: 100, min_columns: 2 });
        assert!(config.allow_list().contains("CATS"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let mut config = EngineConfig { slot_capacity: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSlotCapacity));

        config.slot_capacity = usize::MAX;
        assert_eq!(config.validate(), Err(ConfigError::SlotCapacityTooLarge(usize::MAX)));
        config.slot_capacity = MAX_SLOT_CAPACITY;
        assert!(config.validate().is_ok());

        config.slot_capacity = 1;
        config.session_item_ceiling = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroSessionCeiling));

        config.session_item_ceiling = None;
        config.slot_policy = SlotCountPolicy::Breakpoints {
            breakpoints: vec![
                Breakpoint { max_width: 900, slots: 2 },
                Breakpoint { max_width: 600, slots: 1 },
            ],
            widest: 3,
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSlotPolicy(_))));
    }
}
