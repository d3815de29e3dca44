use anyhow::Result;
use tokio::signal;

mod mosaic_logic;
use mosaic_logic::{config, controls, logger, sink::JsonLinesSink};

use lib_mosaic::core::MosaicEngine;
use lib_mosaic::ingestors::WssFeedSource;
use lib_mosaic::retrieve::ApiClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Explicitly install the default crypto provider for rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = config::load_config();
    logger::setup_logging(&config.log_dir(), config.log_level())?;

    let engine_config = config.to_engine_config()?;
    log::info!("Feed: {} | embeds: {}", engine_config.feed_url, engine_config.embed_base_url);

    let source = WssFeedSource::from_config(&engine_config)?;
    let lookup = ApiClient::new(&engine_config.embed_base_url)?;
    let sink = JsonLinesSink::new(std::io::stdout());

    let (engine, handle) = MosaicEngine::new(&engine_config, source, lookup, sink)?;
    let mut engine_task = tokio::spawn(engine.run());
    controls::spawn(handle.clone())?;

    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut term_signal) => {
                        term_signal.recv().await;
                        log::info!("SIGTERM received, initiating shutdown.");
                    }
                    Err(e) => {
                        log::warn!("Cannot listen for SIGTERM: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
        res = &mut engine_task => {
            let sink = res?;
            log::info!("Engine stopped on request after {} sink events.", sink.written());
            return Ok(());
        }
    }

    let _ = handle.shutdown();
    let sink = engine_task.await?;

    log::info!("Shutdown complete ({} sink events written).", sink.written());
    Ok(())
}
