//! # Jetstream Feed Live Test
//!
//! Subscribes to the live firehose through `WssFeedSource`, runs every frame
//! through the event filter and prints the first candidates that pass.
//!
//! Usage: `test_jetstream_feed [count] [tags]`

use futures_util::StreamExt;
use std::time::Duration;

use lib_mosaic::configs::{AllowList, EngineConfig};
use lib_mosaic::core::FeedSource;
use lib_mosaic::filters::filter;
use lib_mosaic::ingestors::WssFeedSource;
use lib_mosaic::models::RawEvent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut args = std::env::args().skip(1);
    let wanted: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(5);
    let allow_list = AllowList::from_spec(None, args.next().as_deref());

    let config = EngineConfig::default();
    let source = WssFeedSource::from_config(&config)?;
    println!("[*] Subscribing to {}", source.url());

    let mut frames = source.connect().await?;
    let (mut seen, mut undecodable, mut found) = (0u64, 0u64, 0usize);

    let run = async {
        while let Some(frame) = frames.next().await {
            let text = frame?;
            seen += 1;
            let event = match RawEvent::from_json(&text) {
                Ok(event) => event,
                Err(e) => {
                    log::debug!("Undecodable frame: {}", e);
                    undecodable += 1;
                    continue;
                }
            };
            if let Some(candidate) = filter(&event, &allow_list) {
                found += 1;
                println!("✅ [{}] {} ({} image refs)", found, candidate.post_url(), candidate.media_refs.len());
                if found >= wanted {
                    break;
                }
            }
        }
        anyhow::Ok(())
    };

    match tokio::time::timeout(Duration::from_secs(120), run).await {
        Ok(result) => result?,
        Err(_) => log::warn!("Timed out before {} candidates arrived.", wanted),
    }

    println!("\nFrames: {} | undecodable: {} | candidates: {}", seen, undecodable, found);
    Ok(())
}
