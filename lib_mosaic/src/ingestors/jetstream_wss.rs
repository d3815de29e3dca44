//! # Jetstream WSS Ingestor
//!
//! Opens a WebSocket to a Jetstream `subscribe` endpoint and yields its text
//! frames. Each frame is one JSON event; binary, ping and pong frames carry
//! nothing the engine reads and are skipped.

use futures_util::{future, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use crate::configs::config_engine::EngineConfig;
use crate::core::connection_manager::{ConnectionError, FeedSource, FrameStream};

/// Builds the subscribe URL with one `wantedCollections` pair per collection.
pub fn subscribe_url(feed_url: &str, wanted_collections: &[String]) -> Result<Url, ConnectionError> {
    let mut url = Url::parse(feed_url).map_err(|e| ConnectionError::InvalidUrl {
        url: feed_url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(ConnectionError::InvalidUrl {
            url: feed_url.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    {
        let mut query = url.query_pairs_mut();
        for collection in wanted_collections {
            query.append_pair("wantedCollections", collection);
        }
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct WssFeedSource {
    url: Url,
}

impl WssFeedSource {
    pub fn new(feed_url: &str, wanted_collections: &[String]) -> Result<Self, ConnectionError> {
        Ok(Self {
            url: subscribe_url(feed_url, wanted_collections)?,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConnectionError> {
        Self::new(&config.feed_url, &config.wanted_collections)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl FeedSource for WssFeedSource {
    async fn connect(&self) -> Result<FrameStream, ConnectionError> {
        log::info!("Connecting to Jetstream: {}", self.url);

        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;
        let (_write, read) = ws_stream.split();

        let frames = read.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                Ok(Message::Close(frame)) => {
                    log::debug!("Jetstream sent close frame: {:?}", frame);
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(ConnectionError::Stream(e.to_string()))),
            })
        });

        Ok(frames.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::config_engine::{DEFAULT_FEED_URL, POST_COLLECTION};

    #[test]
    fn subscribe_url_repeats_wanted_collections() {
        let url = subscribe_url(
            DEFAULT_FEED_URL,
            &[POST_COLLECTION.to_string(), "app.bsky.feed.like".to_string()],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "wss://jetstream2.us-east.bsky.network/subscribe\
             ?wantedCollections=app.bsky.feed.post&wantedCollections=app.bsky.feed.like"
        );
    }

    #[test]
    fn rejects_non_websocket_urls() {
        assert!(matches!(
            subscribe_url("https://jetstream.example/subscribe", &[]),
            Err(ConnectionError::InvalidUrl { .. })
        ));
        assert!(matches!(
            subscribe_url("not a url", &[]),
            Err(ConnectionError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn source_from_default_config() {
        let source = WssFeedSource::from_config(&EngineConfig::default()).unwrap();
        assert_eq!(source.url().query(), Some("wantedCollections=app.bsky.feed.post"));
    }
}
