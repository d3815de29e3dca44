//! Items flowing between the filter, the enrichment fetcher and the router.

use serde::Serialize;

/// Canonical link back to a post on bsky.app.
pub fn post_url(did: &str, rkey: &str) -> String {
    format!("https://bsky.app/profile/{}/post/{}", did, rkey)
}

/// A post that passed the filter and still needs its media resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub did: String,
    pub rkey: String,
    pub text: String,
    /// Blob CIDs of the attached images, as seen on the firehose.
    pub media_refs: Vec<String>,
}

impl CandidateItem {
    pub fn post_url(&self) -> String {
        post_url(&self.did, &self.rkey)
    }
}

/// Renderable content of a display item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Media {
    Image(String),
    Embed(String),
}

/// A resolved item ready to be placed in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayItem {
    pub media: Media,
    pub post_url: String,
    pub text: String,
}

impl DisplayItem {
    pub fn new(media: Media, candidate: &CandidateItem) -> Self {
        Self {
            media,
            post_url: candidate.post_url(),
            text: candidate.text.clone(),
        }
    }
}
