//! # Presentation Sink
//!
//! The engine never draws anything. Whatever renders the mosaic implements
//! [`PresentationSink`] and is told about placements, evictions, slot
//! rebuilds and pause changes, in the order they happen.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::items::DisplayItem;

pub trait PresentationSink {
    /// `item` was inserted at the head of `slot`.
    fn on_item(&mut self, slot: usize, item: &DisplayItem);
    /// `item` was evicted from the tail of `slot`. The renderer is expected
    /// to play its removal transition before dropping the element.
    fn on_evict(&mut self, slot: usize, item: &DisplayItem);
    /// All slots were discarded and `count` empty slots created.
    fn on_slots_rebuilt(&mut self, count: usize);
    fn on_pause_changed(&mut self, paused: bool);
}

/// One sink notification as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SinkEvent {
    Item { slot: usize, item: DisplayItem },
    Evict { slot: usize, item: DisplayItem },
    SlotsRebuilt { count: usize },
    PauseChanged { paused: bool },
}

/// Collects notifications in order.
impl PresentationSink for Vec<SinkEvent> {
    fn on_item(&mut self, slot: usize, item: &DisplayItem) {
        self.push(SinkEvent::Item { slot, item: item.clone() });
    }

    fn on_evict(&mut self, slot: usize, item: &DisplayItem) {
        self.push(SinkEvent::Evict { slot, item: item.clone() });
    }

    fn on_slots_rebuilt(&mut self, count: usize) {
        self.push(SinkEvent::SlotsRebuilt { count });
    }

    fn on_pause_changed(&mut self, paused: bool) {
        self.push(SinkEvent::PauseChanged { paused });
    }
}

/// Forwards notifications to a renderer running on another task. A closed
/// receiver just means nobody is watching any more.
impl PresentationSink for mpsc::UnboundedSender<SinkEvent> {
    fn on_item(&mut self, slot: usize, item: &DisplayItem) {
        let _ = self.send(SinkEvent::Item { slot, item: item.clone() });
    }

    fn on_evict(&mut self, slot: usize, item: &DisplayItem) {
        let _ = self.send(SinkEvent::Evict { slot, item: item.clone() });
    }

    fn on_slots_rebuilt(&mut self, count: usize) {
        let _ = self.send(SinkEvent::SlotsRebuilt { count });
    }

    fn on_pause_changed(&mut self, paused: bool) {
        let _ = self.send(SinkEvent::PauseChanged { paused });
    }
}
