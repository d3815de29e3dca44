//! # Embed Lookup Live Test
//!
//! Resolves a post through the public embed service with the same
//! `ApiClient` and `EnrichmentFetcher` the engine uses, then prints the
//! display items it produced.
//!
//! Usage: `test_embed_lookup <did> <rkey> [images|embed]`

use lib_mosaic::configs::{EngineConfig, EnrichmentMode};
use lib_mosaic::enrich::{EmbedLookup, EnrichmentFetcher};
use lib_mosaic::models::CandidateItem;
use lib_mosaic::retrieve::ApiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut args = std::env::args().skip(1);
    let (Some(did), Some(rkey)) = (args.next(), args.next()) else {
        eprintln!("usage: test_embed_lookup <did> <rkey> [images|embed]");
        std::process::exit(2);
    };
    let mode = match args.next().as_deref() {
        Some("embed") => EnrichmentMode::Embed,
        _ => EnrichmentMode::Images,
    };

    let config = EngineConfig::default();
    let client = ApiClient::new(&config.embed_base_url)?;
    let fetcher = EnrichmentFetcher::new(client, &config.embed_base_url, mode, config.backoff());

    let candidate = CandidateItem {
        did,
        rkey,
        text: String::new(),
        media_refs: vec![],
    };

    // --- TEST 1: Raw lookup ---
    let url = fetcher.lookup_url(&candidate);
    println!("\n[Test 1] GET {}", url);
    let raw = ApiClient::new(&config.embed_base_url)?.lookup(&url).await?;
    println!("✅ Status: {}", raw.status);
    if raw.body.is_none() {
        log::warn!("Lookup returned no JSON body.");
    }

    // --- TEST 2: Full resolution with backoff ---
    println!("\n[Test 2] Resolving {} ...", candidate.post_url());
    match fetcher.resolve(&candidate).await {
        Ok(items) => {
            println!("✅ {} display item(s):", items.len());
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Err(e) => {
            log::error!("Resolution failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
