//! # Pause Controller
//!
//! The viewer-facing controls of the engine: global pause, per-slot pause
//! (a viewer hovering a slot) and reconfiguration when the viewport changes.
//!
//! Global pause cuts the pipeline in two places. The feed connection is
//! closed with reconnect suppressed, and every slot is marked paused so the
//! router drops whatever enrichment results are still in flight. While
//! globally paused, per-slot flags are inert: they can be changed but have no
//! effect until the session resumes, and resuming clears them all.

use crate::configs::config_engine::{SlotCountPolicy, Viewport};
use crate::core::engine_state::EngineState;
use crate::core::sink::PresentationSink;

/// The part of the connection manager the pause controller drives.
pub trait FeedSwitch {
    fn start(&mut self);
    fn stop(&mut self);
}

pub struct PauseController {
    policy: SlotCountPolicy,
}

impl PauseController {
    pub fn new(policy: SlotCountPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SlotCountPolicy {
        &self.policy
    }

    /// Flips the global pause flag and returns the new value.
    pub fn toggle_pause<F, S>(&self, state: &mut EngineState, feed: &mut F, sink: &mut S) -> bool
    where
        F: FeedSwitch,
        S: PresentationSink,
    {
        if state.global_paused {
            self.resume(state, feed, sink);
        } else {
            self.pause(state, feed, sink);
        }
        state.global_paused
    }

    /// Pauses the session. No-op when already paused.
    pub fn pause<F, S>(&self, state: &mut EngineState, feed: &mut F, sink: &mut S)
    where
        F: FeedSwitch,
        S: PresentationSink,
    {
        if state.global_paused {
            return;
        }
        state.global_paused = true;
        feed.stop();
        for slot in &mut state.slots {
            slot.set_paused(true);
        }
        log::info!("Mosaic paused after {} items this session.", state.session_items);
        sink.on_pause_changed(true);
    }

    /// Resumes the session: clears slot flags and the session counter, then
    /// opens a fresh connection. No-op when not paused.
    pub fn resume<F, S>(&self, state: &mut EngineState, feed: &mut F, sink: &mut S)
    where
        F: FeedSwitch,
        S: PresentationSink,
    {
        if !state.global_paused {
            return;
        }
        state.global_paused = false;
        for slot in &mut state.slots {
            slot.set_paused(false);
        }
        state.session_items = 0;
        feed.start();
        log::info!("Mosaic resumed.");
        sink.on_pause_changed(false);
    }

    /// Sets one slot's own pause flag. Returns `false` for an unknown slot.
    pub fn set_slot_paused(&self, state: &mut EngineState, slot: usize, paused: bool) -> bool {
        match state.slots.get_mut(slot) {
            Some(s) => {
                s.set_paused(paused);
                true
            }
            None => false,
        }
    }

    /// Rebuilds the slots for a new viewport. Existing contents are
    /// discarded and the cursor goes back to 0; the global pause flag is kept
    /// and, while paused, the fresh slots start out paused too.
    pub fn reconfigure<S: PresentationSink>(&self, state: &mut EngineState, viewport: Viewport, sink: &mut S) -> usize {
        let count = self.policy.slot_count(viewport);
        let discarded = state.total_items();
        state.rebuild_slots(count);
        if state.global_paused {
            for slot in &mut state.slots {
                slot.set_paused(true);
            }
        }
        log::info!(
            "Rebuilt {} slots for {}x{} viewport ({} items discarded).",
            count,
            viewport.width,
            viewport.height,
            discarded
        );
        sink.on_slots_rebuilt(count);
        count
    }
}
