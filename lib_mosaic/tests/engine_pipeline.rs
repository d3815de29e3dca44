//! End-to-end runs of the engine against an in-memory feed and embed service.

use futures_util::stream::{self, StreamExt};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use lib_mosaic::configs::{Breakpoint, EngineConfig, SlotCountPolicy, Viewport};
use lib_mosaic::core::{
    ConnectionError, ConnectionState, EngineHandle, FeedSource, FrameStream, MosaicEngine, SinkEvent,
};
use lib_mosaic::enrich::{EmbedLookup, LookupReply};
use lib_mosaic::models::Media;

/// Replays the same frames on every connection, then stays open.
struct ReplayFeed {
    frames: Vec<String>,
    connects: Arc<AtomicUsize>,
}

impl FeedSource for ReplayFeed {
    async fn connect(&self) -> Result<FrameStream, ConnectionError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let frames: Vec<Result<String, ConnectionError>> = self.frames.iter().cloned().map(Ok).collect();
        Ok(stream::iter(frames).chain(stream::pending()).boxed())
    }
}

/// Answers with one image per post; posts whose rkey starts with "bad" get a 500.
struct FakeEmbed;

impl EmbedLookup for FakeEmbed {
    async fn lookup(&self, url: &str) -> anyhow::Result<LookupReply> {
        let rkey = url.rsplit('/').next().unwrap_or_default();
        if rkey.starts_with("bad") {
            return Ok(LookupReply::status(500));
        }
        Ok(LookupReply::ok(json!({
            "images": [{ "url": format!("https://cdn.test/{rkey}.jpg") }]
        })))
    }
}

fn post(rkey: &str, tag: &str) -> String {
    json!({
        "did": "did:plc:author",
        "time_us": 1_700_000_000_000_000u64,
        "kind": "commit",
        "commit": {
            "operation": "create",
            "collection": "app.bsky.feed.post",
            "rkey": rkey,
            "record": {
                "$type": "app.bsky.feed.post",
                "text": format!("post {rkey}"),
                "embed": {
                    "$type": "app.bsky.embed.images",
                    "images": [{ "alt": "", "image": { "ref": { "$link": "cid" } } }]
                },
                "facets": [{ "features": [{ "$type": "app.bsky.richtext.facet#tag", "tag": tag }] }]
            }
        }
    })
    .to_string()
}

fn config(slots: usize) -> EngineConfig {
    EngineConfig {
        tags: Some("art".to_string()),
        max_retries: 0,
        slot_policy: SlotCountPolicy::Breakpoints {
            breakpoints: vec![],
            widest: slots,
        },
        ..Default::default()
    }
}

struct Harness {
    handle: EngineHandle,
    events: mpsc::UnboundedReceiver<SinkEvent>,
    connects: Arc<AtomicUsize>,
    task: tokio::task::JoinHandle<mpsc::UnboundedSender<SinkEvent>>,
}

fn start(config: &EngineConfig, frames: Vec<String>) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let connects = Arc::new(AtomicUsize::new(0));
    let feed = ReplayFeed {
        frames,
        connects: Arc::clone(&connects),
    };
    let (sink, events) = mpsc::unbounded_channel();
    let (engine, handle) = MosaicEngine::new(config, feed, FakeEmbed, sink).unwrap();
    Harness {
        handle,
        events,
        connects,
        task: tokio::spawn(engine.run()),
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<SinkEvent>) -> SinkEvent {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for a sink event")
        .expect("sink closed")
}

async fn next_slots(events: &mut mpsc::UnboundedReceiver<SinkEvent>, n: usize) -> Vec<usize> {
    let mut slots = Vec::new();
    while slots.len() < n {
        match next_event(events).await {
            SinkEvent::Item { slot, .. } => slots.push(slot),
            other => panic!("expected an item, got {other:?}"),
        }
    }
    slots
}

#[tokio::test]
async fn items_are_spread_round_robin() {
    let mut frames: Vec<String> = (1..=6).map(|n| post(&format!("rk{n}"), "Art")).collect();
    frames.insert(2, post("untagged", "cats"));
    frames.insert(4, "{not json".to_string());

    let mut h = start(&config(3), frames);
    assert_eq!(next_event(&mut h.events).await, SinkEvent::SlotsRebuilt { count: 3 });
    assert_eq!(next_slots(&mut h.events, 6).await, vec![0, 1, 2, 0, 1, 2]);

    h.handle.shutdown().unwrap();
    let sink = h.task.await.unwrap();
    drop(sink);
    assert!(h.events.recv().await.is_none());
}

#[tokio::test]
async fn display_items_point_back_at_the_post() {
    let mut h = start(&config(1), vec![post("rk9", "art")]);
    next_event(&mut h.events).await;

    match next_event(&mut h.events).await {
        SinkEvent::Item { slot, item } => {
            assert_eq!(slot, 0);
            assert_eq!(item.media, Media::Image("https://cdn.test/rk9.jpg".to_string()));
            assert_eq!(item.post_url, "https://bsky.app/profile/did:plc:author/post/rk9");
            assert_eq!(item.text, "post rk9");
        }
        other => panic!("expected an item, got {other:?}"),
    }
}

#[tokio::test]
async fn hovered_slot_is_skipped() {
    let frames = (1..=4).map(|n| post(&format!("rk{n}"), "art")).collect();
    let mut h = start(&config(3), frames);
    h.handle.set_slot_paused(1, true).unwrap();

    next_event(&mut h.events).await;
    assert_eq!(next_slots(&mut h.events, 4).await, vec![0, 2, 0, 2]);
}

#[tokio::test]
async fn pause_closes_feed_and_resume_reconnects() {
    let frames = vec![post("rk1", "art"), post("rk2", "art")];
    let mut h = start(&config(3), frames);
    let mut state = h.handle.connection_state();

    next_event(&mut h.events).await;
    assert_eq!(next_slots(&mut h.events, 2).await, vec![0, 1]);

    h.handle.toggle_pause().unwrap();
    assert_eq!(next_event(&mut h.events).await, SinkEvent::PauseChanged { paused: true });
    timeout(Duration::from_secs(1), state.wait_for(|s| *s == ConnectionState::Closed))
        .await
        .unwrap()
        .unwrap();

    // No reconnect while paused.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.connects.load(Ordering::SeqCst), 1);

    h.handle.toggle_pause().unwrap();
    assert_eq!(next_event(&mut h.events).await, SinkEvent::PauseChanged { paused: false });
    // The cursor survives the pause; the replayed frames continue from slot 2.
    assert_eq!(next_slots(&mut h.events, 2).await, vec![2, 0]);
    assert_eq!(h.connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn session_ceiling_pauses_the_engine() {
    let frames = (1..=5).map(|n| post(&format!("rk{n}"), "art")).collect();
    let mut config = config(3);
    config.session_item_ceiling = Some(3);
    let mut h = start(&config, frames);

    next_event(&mut h.events).await;
    assert_eq!(next_slots(&mut h.events, 3).await, vec![0, 1, 2]);
    assert_eq!(next_event(&mut h.events).await, SinkEvent::PauseChanged { paused: true });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn reconfigure_rebuilds_slots() {
    let config = EngineConfig {
        slot_policy: SlotCountPolicy::Breakpoints {
            breakpoints: vec![Breakpoint { max_width: 1000, slots: 2 }],
            widest: 4,
        },
        initial_viewport: Viewport::new(800, 600),
        ..Default::default()
    };
    let mut h = start(&config, vec![]);

    assert_eq!(next_event(&mut h.events).await, SinkEvent::SlotsRebuilt { count: 2 });
    h.handle.reconfigure(Viewport::new(1280, 800)).unwrap();
    assert_eq!(next_event(&mut h.events).await, SinkEvent::SlotsRebuilt { count: 4 });
}

#[tokio::test]
async fn failed_lookups_are_dropped() {
    let frames = vec![post("bad1", "art"), post("rk2", "art")];
    let mut h = start(&config(2), frames);

    next_event(&mut h.events).await;
    match next_event(&mut h.events).await {
        SinkEvent::Item { slot, item } => {
            assert_eq!(slot, 0);
            assert!(item.post_url.ends_with("/rk2"));
        }
        other => panic!("expected an item, got {other:?}"),
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn dropping_every_handle_stops_the_engine() {
    let h = start(&config(2), vec![]);
    let handle = h.handle.clone();
    drop(h.handle);
    assert!(handle.toggle_pause().is_ok());
    drop(handle);

    timeout(Duration::from_secs(1), h.task).await.unwrap().unwrap();
}

#[test]
fn invalid_config_is_rejected() {
    let config = EngineConfig {
        slot_capacity: 0,
        ..Default::default()
    };
    let feed = ReplayFeed {
        frames: vec![],
        connects: Arc::default(),
    };
    let (sink, _events) = mpsc::unbounded_channel::<SinkEvent>();
    assert!(MosaicEngine::new(&config, feed, FakeEmbed, sink).is_err());
}
