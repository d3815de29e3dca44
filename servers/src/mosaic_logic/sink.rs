//! Presentation sink for a headless host: every notification becomes one
//! JSON line on the wrapped writer, ready to be piped into a renderer.

use lib_mosaic::core::{PresentationSink, SinkEvent};
use lib_mosaic::models::DisplayItem;
use std::io::Write;

pub struct JsonLinesSink<W: Write> {
    out: W,
    written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: SinkEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to encode sink event: {}", e);
                return;
            }
        };
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            log::warn!("Failed to write sink event: {}", e);
            return;
        }
        self.written += 1;
    }
}

impl<W: Write> PresentationSink for JsonLinesSink<W> {
    fn on_item(&mut self, slot: usize, item: &DisplayItem) {
        log::debug!("slot {} <- {}", slot, item.post_url);
        self.emit(SinkEvent::Item { slot, item: item.clone() });
    }

    fn on_evict(&mut self, slot: usize, item: &DisplayItem) {
        self.emit(SinkEvent::Evict { slot, item: item.clone() });
    }

    fn on_slots_rebuilt(&mut self, count: usize) {
        self.emit(SinkEvent::SlotsRebuilt { count });
    }

    fn on_pause_changed(&mut self, paused: bool) {
        log::info!("Mosaic {}.", if paused { "paused" } else { "running" });
        self.emit(SinkEvent::PauseChanged { paused });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_mosaic::models::Media;
    use serde_json::{Value, json};

    #[test]
    fn writes_one_json_line_per_notification() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let item = DisplayItem {
            media: Media::Image("https://cdn.test/a.jpg".to_string()),
            post_url: "https://bsky.app/profile/did:plc:x/post/a".to_string(),
            text: "hi".to_string(),
        };
        sink.on_slots_rebuilt(3);
        sink.on_item(1, &item);
        sink.on_pause_changed(true);
        assert_eq!(sink.written(), 3);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<Value> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines[0], json!({ "event": "slotsRebuilt", "count": 3 }));
        assert_eq!(lines[1]["event"], "item");
        assert_eq!(lines[1]["slot"], 1);
        assert_eq!(lines[1]["item"]["postUrl"], "https://bsky.app/profile/did:plc:x/post/a");
        assert_eq!(lines[2], json!({ "event": "pauseChanged", "paused": true }));
    }
}
