//! # HTTP Retrieval Utilities
//!
//! A small asynchronous JSON client on top of `reqwest`. Each request is a
//! single GET with a timeout; retrying belongs to the caller.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::enrich::fetcher::{EmbedLookup, LookupReply};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A standardized container for API responses.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The decoded body. `None` for error statuses and for 2xx bodies that
    /// do not decode as `T`.
    pub data: Option<T>,
    /// The raw body returned by the server when the request failed.
    pub error_body: Option<String>,
    pub status: u16,
    /// Whether the status code was in the 2xx range.
    pub success: bool,
}

/// Relative paths are joined onto `base_url`; absolute URLs replace it.
pub struct ApiClient {
    inner: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Creates a new client.
    ///
    /// # Errors
    /// Fails if `base_url` is not a valid absolute URL or the underlying
    /// HTTP client cannot be built.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid base URL '{}' (must be absolute): {}", base_url, e))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("lib_mosaic/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { inner: client, base_url: url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GETs `path` and decodes a JSON body.
    ///
    /// Neither a non-2xx status nor an undecodable 2xx body is an error here:
    /// both come back with `data = None`, so the caller can tell "try again"
    /// from "the server answered with something useless".
    ///
    /// # Errors
    /// Returns an `anyhow::Error` if URL joining or the network round trip
    /// (including reading the body) fails.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<ApiResponse<T>> {
        let full_url = self.base_url.join(path)?;
        let response = self.inner.get(full_url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            let data = match serde_json::from_str::<T>(&text) {
                Ok(data) => Some(data),
                Err(e) => {
                    log::debug!("Undecodable {} body from {}: {}", status.as_u16(), path, e);
                    None
                }
            };
            Ok(ApiResponse {
                data,
                error_body: None,
                status: status.as_u16(),
                success: true,
            })
        } else {
            Ok(ApiResponse {
                data: None,
                error_body: Some(text),
                status: status.as_u16(),
                success: false,
            })
        }
    }
}

impl EmbedLookup for ApiClient {
    async fn lookup(&self, url: &str) -> anyhow::Result<LookupReply> {
        let response = self.get::<Value>(url).await?;
        if !response.success {
            log::trace!(
                "Embed lookup {} returned {}: {}",
                url,
                response.status,
                response.error_body.as_deref().unwrap_or("")
            );
        }
        Ok(LookupReply {
            status: response.status,
            body: response.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::EnrichmentMode;
    use crate::enrich::{BackoffPolicy, EnrichError, EnrichmentFetcher};
    use crate::models::{CandidateItem, Media};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves the same response to every connection and counts requests.
    async fn serve(content_type: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    content_type,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (base, hits)
    }

    fn candidate() -> CandidateItem {
        CandidateItem {
            did: "did:plc:a".to_string(),
            rkey: "r1".to_string(),
            text: String::new(),
            media_refs: vec!["cid".to_string()],
        }
    }

    fn fetcher(base: &str) -> EnrichmentFetcher<ApiClient> {
        let client = ApiClient::new(base).unwrap();
        EnrichmentFetcher::new(
            client,
            base,
            EnrichmentMode::Images,
            BackoffPolicy::new(Duration::from_millis(1), 5),
        )
    }

    #[test]
    fn rejects_relative_base_url() {
        assert!(ApiClient::new("embed.bsky.app").is_err());
    }

    #[test]
    fn absolute_lookup_urls_replace_the_base() {
        let client = ApiClient::new("https://embed.bsky.app/").unwrap();
        let joined = client
            .base_url()
            .join("https://other.example/api/v1/embed?url=https://bsky.app/profile/a/post/b")
            .unwrap();
        assert_eq!(joined.host_str(), Some("other.example"));
        assert_eq!(joined.path(), "/api/v1/embed");
    }

    #[tokio::test]
    async fn html_success_body_is_malformed_without_retry() {
        let (base, hits) = serve("text/html", "<html>not json</html>").await;

        let reply = ApiClient::new(&base).unwrap().lookup(&format!("{base}oembed")).await.unwrap();
        assert_eq!(reply, LookupReply::status(200));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let result = fetcher(&base).resolve(&candidate()).await;
        assert!(matches!(result, Err(EnrichError::Malformed { .. })), "got {result:?}");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn json_success_body_resolves() {
        let (base, hits) = serve("application/json", r#"{"images":[{"url":"https://cdn/1.jpg"}]}"#).await;

        let items = fetcher(&base).resolve(&candidate()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].media, Media::Image("https://cdn/1.jpg".to_string()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
