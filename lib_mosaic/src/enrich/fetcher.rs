//! # Enrichment Fetcher
//!
//! Resolves a [`CandidateItem`] into renderable [`DisplayItem`]s by asking the
//! embed service about the post. Lookups are idempotent GETs, so failures are
//! retried with bounded exponential backoff. A candidate whose retries run
//! out is dropped by the caller; nothing here is fatal.
//!
//! Several resolutions may be in flight at once and they finish in whatever
//! order the network allows. Callers route results in completion order.

use serde_json::Value;
use std::future::Future;
use thiserror::Error;

use super::backoff::BackoffPolicy;
use crate::configs::config_engine::EnrichmentMode;
use crate::models::items::{CandidateItem, DisplayItem, Media};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnrichError {
    #[error("lookup for {url} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("malformed lookup response for {url}: {reason}")]
    Malformed { url: String, reason: String },
}

/// Status and decoded body of one lookup round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupReply {
    pub status: u16,
    pub body: Option<Value>,
}

impl LookupReply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body: Some(body) }
    }

    pub fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One network round trip to the embed service.
///
/// `Err` means a transport failure; HTTP error statuses come back as an `Ok`
/// reply with a non-2xx status.
pub trait EmbedLookup: Send + Sync {
    fn lookup(&self, url: &str) -> impl Future<Output = anyhow::Result<LookupReply>> + Send;
}

pub struct EnrichmentFetcher<L> {
    lookup: L,
    base_url: String,
    mode: EnrichmentMode,
    backoff: BackoffPolicy,
}

impl<L: EmbedLookup> EnrichmentFetcher<L> {
    pub fn new(lookup: L, base_url: &str, mode: EnrichmentMode, backoff: BackoffPolicy) -> Self {
        Self {
            lookup,
            base_url: base_url.trim_end_matches('/').to_string(),
            mode,
            backoff,
        }
    }

    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Lookup URL for a candidate. Depends only on did, rkey and mode.
    pub fn lookup_url(&self, candidate: &CandidateItem) -> String {
        let endpoint = match self.mode {
            EnrichmentMode::Images => "api/v1/embed",
            EnrichmentMode::Embed => "oembed",
        };
        format!("{}/{}?url={}", self.base_url, endpoint, candidate.post_url())
    }

    /// Resolves a candidate into zero or more display items.
    ///
    /// `Ok(vec![])` means the post resolved but carries nothing displayable.
    pub async fn resolve(&self, candidate: &CandidateItem) -> Result<Vec<DisplayItem>, EnrichError> {
        let url = self.lookup_url(candidate);
        let mut retry = 0u32;

        loop {
            let failure = match self.lookup.lookup(&url).await {
                Ok(reply) if reply.is_success() => {
                    return self.extract(&url, reply.body, candidate);
                }
                Ok(reply) => format!("HTTP status {}", reply.status),
                Err(e) => e.to_string(),
            };

            if retry >= self.backoff.max_retries() {
                return Err(EnrichError::Exhausted {
                    url,
                    attempts: retry + 1,
                    last_error: failure,
                });
            }

            let delay = self.backoff.delay_for(retry);
            log::debug!(
                "Lookup for {} failed ({}); retry {}/{} in {}ms",
                url,
                failure,
                retry + 1,
                self.backoff.max_retries(),
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }

    fn extract(
        &self,
        url: &str,
        body: Option<Value>,
        candidate: &CandidateItem,
    ) -> Result<Vec<DisplayItem>, EnrichError> {
        let body = match body {
            Some(Value::Object(map)) => map,
            other => {
                return Err(EnrichError::Malformed {
                    url: url.to_string(),
                    reason: format!("expected a JSON object, got {:?}", other),
                });
            }
        };

        let media: Vec<Media> = match self.mode {
            EnrichmentMode::Images => body
                .get("images")
                .and_then(Value::as_array)
                .map(|images| {
                    images
                        .iter()
                        .filter_map(|img| img.get("url").and_then(Value::as_str))
                        .filter(|u| !u.is_empty())
                        .map(|u| Media::Image(u.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
            EnrichmentMode::Embed => body
                .get("html")
                .and_then(Value::as_str)
                .filter(|html| !html.trim().is_empty())
                .map(|html| vec![Media::Embed(html.to_string())])
                .unwrap_or_default(),
        };

        Ok(media
            .into_iter()
            .map(|m| DisplayItem::new(m, candidate))
            .collect())
    }
}
