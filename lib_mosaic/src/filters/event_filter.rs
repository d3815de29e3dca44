//! # Event Filter
//!
//! Turns a decoded firehose frame into a [`CandidateItem`], or drops it.
//! Rejections are not errors: the firehose carries far more than the mosaic
//! shows, so most frames end here silently. No I/O happens in this module.

use crate::configs::allow_list::AllowList;
use crate::configs::config_engine::POST_COLLECTION;
use crate::models::feed_event::{Embed, EventKind, Operation, RawEvent};
use crate::models::items::CandidateItem;

/// Returns a candidate when the event is a newly created image post that
/// passes the allow-list, `None` otherwise.
pub fn filter(event: &RawEvent, allow_list: &AllowList) -> Option<CandidateItem> {
    if event.kind != EventKind::Commit {
        return None;
    }
    let commit = event.commit.as_ref()?;
    if commit.operation != Operation::Create || commit.collection != POST_COLLECTION {
        return None;
    }
    let record = commit.record.as_ref()?;
    let images = record.embed.as_ref().and_then(Embed::image_embed)?;

    if !allow_list.is_empty() && !record.hashtags().any(|tag| allow_list.contains(tag)) {
        return None;
    }

    let media_refs = images
        .images
        .iter()
        .filter_map(|img| img.image.as_ref()?.link.as_ref())
        .map(|cid| cid.link.clone())
        .collect();

    Some(CandidateItem {
        did: event.did.clone(),
        rkey: commit.rkey.clone(),
        text: record.text.clone(),
        media_refs,
    })
}
