//! # Jetstream Frame Model
//!
//! Serde model of the JSON frames delivered by the Jetstream firehose. Only
//! the fields the filter reads are modelled; everything else is ignored.
//! Unknown enum values fall into `Other` so new upstream kinds never turn
//! into decode errors.

use serde::Deserialize;

pub const IMAGES_EMBED: &str = "app.bsky.embed.images";
pub const RECORD_WITH_MEDIA_EMBED: &str = "app.bsky.embed.recordWithMedia";
pub const TAG_FEATURE: &str = "app.bsky.richtext.facet#tag";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawEvent {
    /// The actor's DID.
    pub did: String,
    #[serde(default)]
    pub time_us: Option<u64>,
    pub kind: EventKind,
    #[serde(default)]
    pub commit: Option<Commit>,
}

impl RawEvent {
    /// Decodes one text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Commit,
    Identity,
    Account,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Commit {
    pub operation: Operation,
    pub collection: String,
    pub rkey: String,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub record: Option<PostRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "$type", default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub embed: Option<Embed>,
    #[serde(default)]
    pub facets: Vec<Facet>,
}

impl PostRecord {
    /// Hashtags carried by `#tag` facet features, in facet order.
    /// Mentions and links are skipped.
    pub fn hashtags(&self) -> impl Iterator<Item = &str> {
        self.facets
            .iter()
            .flat_map(|facet| facet.features.iter())
            .filter(|feature| feature.feature_type == TAG_FEATURE)
            .filter_map(|feature| feature.tag.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Embed {
    #[serde(rename = "$type")]
    pub embed_type: String,
    #[serde(default)]
    pub images: Vec<EmbedImage>,
    /// Present on `recordWithMedia` embeds.
    #[serde(default)]
    pub media: Option<Box<Embed>>,
}

impl Embed {
    /// The images embed carrying this post's pictures, if any.
    pub fn image_embed(&self) -> Option<&Embed> {
        match self.embed_type.as_str() {
            IMAGES_EMBED => Some(self),
            RECORD_WITH_MEDIA_EMBED => self
                .media
                .as_deref()
                .filter(|media| media.embed_type == IMAGES_EMBED),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbedImage {
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub image: Option<BlobRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlobRef {
    #[serde(rename = "ref", default)]
    pub link: Option<CidLink>,
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CidLink {
    #[serde(rename = "$link")]
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Facet {
    #[serde(default)]
    pub features: Vec<FacetFeature>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FacetFeature {
    #[serde(rename = "$type")]
    pub feature_type: String,
    #[serde(default)]
    pub tag: Option<String>,
}
