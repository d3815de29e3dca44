use anyhow::{Context, Result, bail};
use clap::Parser;
use lib_mosaic::configs::{EngineConfig, EnrichmentMode, SlotCountPolicy, Viewport};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "server_mosaic.conf";
const DEFAULT_SESSION_CEILING: u64 = 1000;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Live Bluesky image mosaic engine", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "MOSAIC_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "MOSAIC_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "MOSAIC_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "MOSAIC_FEED_URL", help = "Jetstream subscribe endpoint.")]
    pub feed_url: Option<String>,

    #[clap(long, env = "MOSAIC_EMBED_BASE_URL", help = "Base URL of the embed service.")]
    pub embed_base_url: Option<String>,

    #[clap(long, env = "MOSAIC_ENRICHMENT_MODE", help = "Enrichment mode: images or embed.")]
    pub enrichment_mode: Option<String>,

    #[clap(long, env = "MOSAIC_PRESET", help = "Named hashtag preset (e.g. art).")]
    pub preset: Option<String>,

    #[clap(long, env = "MOSAIC_TAGS", help = "Comma-separated hashtags to allow.")]
    pub tags: Option<String>,

    #[clap(long, env = "MOSAIC_MAX_RETRIES", help = "Enrichment retries after the first attempt.")]
    pub max_retries: Option<u32>,

    #[clap(long, env = "MOSAIC_BASE_BACKOFF_MS", help = "Base delay in milliseconds for enrichment retries.")]
    pub base_backoff_ms: Option<u64>,

    #[clap(long, env = "MOSAIC_RECONNECT_DELAY_MS", help = "Delay in milliseconds before reconnecting the feed.")]
    pub reconnect_delay_ms: Option<u64>,

    #[clap(long, env = "MOSAIC_SLOT_CAPACITY", help = "Items kept per slot before the oldest is evicted.")]
    pub slot_capacity: Option<usize>,

    #[clap(long, env = "MOSAIC_SESSION_CEILING", help = "Items placed per session before pausing automatically.")]
    pub session_item_ceiling: Option<u64>,

    #[clap(long, env = "MOSAIC_LAYOUT", help = "Slot layout: breakpoints or grid.")]
    pub layout: Option<String>,

    #[clap(long, env = "MOSAIC_VIEWPORT_WIDTH", help = "Initial viewport width in pixels.")]
    pub viewport_width: Option<u32>,

    #[clap(long, env = "MOSAIC_VIEWPORT_HEIGHT", help = "Initial viewport height in pixels.")]
    pub viewport_height: Option<u32>,
}

impl Config {
    // 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            feed_url: other.feed_url.or(self.feed_url),
            embed_base_url: other.embed_base_url.or(self.embed_base_url),
            enrichment_mode: other.enrichment_mode.or(self.enrichment_mode),
            preset: other.preset.or(self.preset),
            tags: other.tags.or(self.tags),
            max_retries: other.max_retries.or(self.max_retries),
            base_backoff_ms: other.base_backoff_ms.or(self.base_backoff_ms),
            reconnect_delay_ms: other.reconnect_delay_ms.or(self.reconnect_delay_ms),
            slot_capacity: other.slot_capacity.or(self.slot_capacity),
            session_item_ceiling: other.session_item_ceiling.or(self.session_item_ceiling),
            layout: other.layout.or(self.layout),
            viewport_width: other.viewport_width.or(self.viewport_width),
            viewport_height: other.viewport_height.or(self.viewport_height),
        }
    }

    fn defaults() -> Config {
        Config {
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            session_item_ceiling: Some(DEFAULT_SESSION_CEILING),
            ..Default::default()
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Builds the engine configuration. Unset fields keep the engine defaults.
    pub fn to_engine_config(&self) -> Result<EngineConfig> {
        let mut engine = EngineConfig::default();

        if let Some(url) = &self.feed_url {
            engine.feed_url = url.clone();
        }
        if let Some(url) = &self.embed_base_url {
            engine.embed_base_url = url.clone();
        }
        if let Some(mode) = &self.enrichment_mode {
            engine.enrichment_mode = match mode.to_lowercase().as_str() {
                "images" => EnrichmentMode::Images,
                "embed" => EnrichmentMode::Embed,
                other => bail!("unknown enrichment mode '{}' (expected images or embed)", other),
            };
        }
        if let Some(layout) = &self.layout {
            engine.slot_policy = match layout.to_lowercase().as_str() {
                "breakpoints" => SlotCountPolicy::default(),
                "grid" => SlotCountPolicy::mosaic_grid(),
                other => bail!("unknown layout '{}' (expected breakpoints or grid)", other),
            };
        }

        engine.preset = self.preset.clone();
        engine.tags = self.tags.clone();
        engine.max_retries = self.max_retries.unwrap_or(engine.max_retries);
        engine.base_backoff_ms = self.base_backoff_ms.unwrap_or(engine.base_backoff_ms);
        engine.reconnect_delay_ms = self.reconnect_delay_ms.unwrap_or(engine.reconnect_delay_ms);
        engine.slot_capacity = self.slot_capacity.unwrap_or(engine.slot_capacity);
        engine.session_item_ceiling = self.session_item_ceiling.or(engine.session_item_ceiling);
        engine.initial_viewport = Viewport::new(
            self.viewport_width.unwrap_or(engine.initial_viewport.width),
            self.viewport_height.unwrap_or(engine.initial_viewport.height),
        );

        engine.validate().context("invalid mosaic configuration")?;
        Ok(engine)
    }
}

/// Defaults, then the JSON config file, then environment and CLI.
pub fn load_config() -> Config {
    resolve(Config::parse())
}

fn resolve(cli: Config) -> Config {
    let mut current_config = Config::defaults();

    let config_file_path = cli.config_path.clone().or_else(default_config_path);

    match config_file_path {
        Some(path) => match read_config_file(&path) {
            Ok(file_config) => current_config = current_config.merge(file_config),
            Err(e) => log::warn!("{:#}. Falling back to other sources.", e),
        },
        None => log::info!(
            "Config file {} not found. Using defaults and environment/CLI variables.",
            CONFIG_FILE_NAME
        ),
    }

    current_config.merge(cli)
}

/// `./server_mosaic.conf`, then `<config dir>/mosaic/server_mosaic.conf`.
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("mosaic").join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

fn read_config_file(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse config file: {}", path.display()))
}
