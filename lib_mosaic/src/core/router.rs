//! # Pause-Aware Round-Robin Router
//!
//! The router is the fan-out stage of the engine. Each resolved item goes to
//! exactly one slot, chosen by walking the slots cyclically from the cursor.
//!
//! ## Core Design Principles:
//!
//! 1.  **Fairness**: With no slot paused, N consecutive calls visit every slot
//!     once, in increasing cyclic order starting from the cursor. Because
//!     enrichment finishes out of order, fairness is over arrivals at the
//!     router, not over firehose order.
//!
//! 2.  **Pause Skipping**: Slots whose effective pause state is set (global
//!     pause, or the viewer hovering that slot) are skipped. The cursor moves
//!     to the slot after the one that received the item, so a paused slot is
//!     retried on the next cycle.
//!
//! 3.  **Bounded Slots**: Items are inserted at the head; when a slot goes over
//!     capacity the oldest items are evicted from the tail and reported back so
//!     the presentation layer can animate them out.
//!
//! 4.  **Lossy Exhaustion**: When every slot is paused the item is dropped and
//!     the cursor stays where it was. That is the expected outcome under
//!     global pause, not an error.

use crate::core::engine_state::EngineState;
use crate::models::items::DisplayItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The item went to `slot`. `evicted` lists the items pushed out of that
    /// slot's tail, oldest first. `ceiling_reached` is set on the placement
    /// that brought the session counter up to its ceiling.
    Placed {
        slot: usize,
        evicted: Vec<DisplayItem>,
        ceiling_reached: bool,
    },
    /// Every slot is paused (or there are no slots); the item was dropped.
    AllPaused,
    /// The session ceiling was already reached; the item was dropped.
    CeilingReached,
}

/// Picks the first effectively unpaused slot at or after the cursor, within
/// one full cycle.
pub fn next_open_slot(state: &EngineState) -> Option<usize> {
    let n = state.slot_count();
    (0..n)
        .map(|offset| (state.cursor + offset) % n)
        .find(|&index| !state.is_slot_paused(index))
}

/// Assigns `item` to a slot and advances the cursor past it.
pub fn route(state: &mut EngineState, item: DisplayItem) -> RouteOutcome {
    if let Some(ceiling) = state.session_ceiling {
        if state.session_items >= ceiling {
            return RouteOutcome::CeilingReached;
        }
    }

    let Some(index) = next_open_slot(state) else {
        log::trace!("All {} slots paused; dropping {}", state.slot_count(), item.post_url);
        return RouteOutcome::AllPaused;
    };

    let evicted = state.slots[index].push_newest(item);
    state.cursor = (index + 1) % state.slot_count();
    state.session_items += 1;

    let ceiling_reached = state
        .session_ceiling
        .is_some_and(|ceiling| state.session_items >= ceiling);

    RouteOutcome::Placed {
        slot: index,
        evicted,
        ceiling_reached,
    }
}
