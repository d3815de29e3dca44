//! # Engine State
//!
//! The process-wide state shared by the router and the pause controller:
//! the global pause flag, the ordered slots, the round-robin cursor and the
//! per-session item counter. It is owned by a single engine task and passed
//! by reference to the functions that mutate it, so no locking is involved.

use std::collections::VecDeque;

use crate::models::items::DisplayItem;

/// One bounded display destination. Items are kept most-recent-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    items: VecDeque<DisplayItem>,
    capacity: usize,
    paused: bool,
}

impl Slot {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
            paused: false,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &DisplayItem> {
        self.items.iter()
    }

    pub fn newest(&self) -> Option<&DisplayItem> {
        self.items.front()
    }

    pub fn oldest(&self) -> Option<&DisplayItem> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The slot's own flag. See [`EngineState::is_slot_paused`] for the
    /// effective value.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Inserts at the head and evicts from the tail until back within
    /// capacity. Evicted items are returned oldest-first.
    pub(crate) fn push_newest(&mut self, item: DisplayItem) -> Vec<DisplayItem> {
        self.items.push_front(item);
        let mut evicted = Vec::new();
        while self.items.len() > self.capacity {
            if let Some(old) = self.items.pop_back() {
                evicted.push(old);
            }
        }
        evicted
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub(crate) global_paused: bool,
    pub(crate) slots: Vec<Slot>,
    pub(crate) cursor: usize,
    pub(crate) slot_capacity: usize,
    pub(crate) session_items: u64,
    pub(crate) session_ceiling: Option<u64>,
}

impl EngineState {
    pub fn new(slot_count: usize, slot_capacity: usize, session_ceiling: Option<u64>) -> Self {
        Self {
            global_paused: false,
            slots: (0..slot_count).map(|_| Slot::new(slot_capacity)).collect(),
            cursor: 0,
            slot_capacity,
            session_items: 0,
            session_ceiling,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Index of the slot the next `route` call tries first.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_globally_paused(&self) -> bool {
        self.global_paused
    }

    /// Effective pause state: global pause overrides the slot's own flag.
    /// Out-of-range indices count as paused.
    pub fn is_slot_paused(&self, index: usize) -> bool {
        self.global_paused || self.slots.get(index).map_or(true, Slot::is_paused)
    }

    /// Items placed since the session started or was last resumed.
    pub fn session_items(&self) -> u64 {
        self.session_items
    }

    pub fn session_ceiling(&self) -> Option<u64> {
        self.session_ceiling
    }

    pub fn total_items(&self) -> usize {
        self.slots.iter().map(Slot::len).sum()
    }

    /// Discards every slot and its contents and builds `count` fresh ones.
    /// Resets the cursor; leaves the global pause flag alone.
    pub(crate) fn rebuild_slots(&mut self, count: usize) {
        let capacity = self.slot_capacity;
        self.slots = (0..count).map(|_| Slot::new(capacity)).collect();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::items::Media;

    fn item(n: usize) -> DisplayItem {
        DisplayItem {
            media: Media::Image(format!("https://cdn/{n}.jpg")),
            post_url: format!("https://bsky.app/profile/did:plc:x/post/{n}"),
            text: String::new(),
        }
    }

    #[test]
    fn slot_keeps_most_recent_first() {
        let mut slot = Slot::new(2);
        assert!(slot.push_newest(item(1)).is_empty());
        assert!(slot.push_newest(item(2)).is_empty());
        let evicted = slot.push_newest(item(3));
        assert_eq!(evicted, vec![item(1)]);
        assert_eq!(slot.items().cloned().collect::<Vec<_>>(), vec![item(3), item(2)]);
        assert_eq!(slot.oldest(), Some(&item(2)));
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let mut state = EngineState::new(2, usize::MAX, None);
        assert_eq!(state.slots()[0].capacity(), usize::MAX);
        assert!(state.slots[0].push_newest(item(1)).is_empty());
        assert_eq!(state.total_items(), 1);
    }

    #[test]
    fn global_pause_overrides_slot_flags() {
        let mut state = EngineState::new(2, 3, None);
        state.slots[1].set_paused(true);
        assert!(!state.is_slot_paused(0));
        assert!(state.is_slot_paused(1));
        assert!(state.is_slot_paused(7));

        state.global_paused = true;
        assert!(state.is_slot_paused(0));
        // The slot's own flag is kept, just inert.
        assert!(!state.slots()[0].is_paused());
    }

    #[test]
    fn rebuild_discards_contents_and_resets_cursor() {
        let mut state = EngineState::new(4, 3, None);
        state.slots[2].push_newest(item(1));
        state.cursor = 3;
        state.global_paused = true;
        state.rebuild_slots(6);
        assert_eq!(state.slot_count(), 6);
        assert_eq!(state.total_items(), 0);
        assert_eq!(state.cursor(), 0);
        assert!(state.is_globally_paused());
    }
}
