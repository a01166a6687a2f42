//! Priority-bucketed, capacity-bounded item store.
//!
//! Items live in a slab; each of the `BAG_LEVEL` levels is an intrusive FIFO
//! list threaded through the slab, and a key index deduplicates. Take-out
//! walks the shared [`DISTRIBUTOR`] so higher levels are visited more often,
//! and levels at or above `BAG_THRESHOLD` drain fully once selected.

use std::collections::HashMap;

use crate::budget::{Budget, forget};
use crate::constants::{BAG_LEVEL, BAG_THRESHOLD, EMPTY_BAG_PRIORITY, RELATIVE_THRESHOLD};
use crate::distributor::DISTRIBUTOR;

/// Anything a [`Bag`] can hold: a stable key and a budget.
pub trait Item {
    fn key(&self) -> &str;
    fn budget(&self) -> Budget;
    fn set_budget(&mut self, budget: Budget);

    fn priority(&self) -> f32 {
        self.budget().priority()
    }
}

/// Level for a priority: `clamp(ceil(p·L) − 1, 0, L − 1)`.
pub fn level_of(priority: f32) -> usize {
    let level = (priority * BAG_LEVEL as f32).ceil() as i64 - 1;
    level.clamp(0, BAG_LEVEL as i64 - 1) as usize
}

#[derive(Debug)]
struct Slot<T> {
    item: T,
    level: usize,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Level {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

#[derive(Debug)]
pub struct Bag<T: Item> {
    capacity: usize,
    forget_rate: u32,
    slots: Vec<Option<Slot<T>>>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    levels: Vec<Level>,
    /// Sum of `level + 1` over all items.
    mass: usize,
    level_index: usize,
    current_level: usize,
    current_counter: usize,
}

impl<T: Item> Bag<T> {
    pub fn new(capacity: usize, forget_rate: u32) -> Self {
        Self {
            capacity,
            forget_rate,
            slots: Vec::with_capacity(capacity + 1),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity + 1),
            levels: vec![Level::default(); BAG_LEVEL],
            mass: 0,
            level_index: capacity % BAG_LEVEL,
            current_level: BAG_LEVEL - 1,
            current_counter: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn forget_rate(&self) -> u32 {
        self.forget_rate
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.item)
    }

    /// Mutable access that must not change the item's budget; budget
    /// changes go through `pick_out` and `put_in` so the level stays right.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_mut().map(|slot| &mut slot.item)
    }

    /// Average priority estimated from the level mass. 0.01 when empty.
    pub fn average_priority(&self) -> f32 {
        if self.is_empty() {
            return EMPTY_BAG_PRIORITY;
        }
        let f = self.mass as f32 / (self.len() * BAG_LEVEL) as f32;
        f.min(1.0)
    }

    /// Insert an item, returning whatever did not fit.
    ///
    /// An item whose key is already present is merged into the resident one
    /// and nothing overflows. Otherwise, when the bag is full, the oldest item
    /// of the lowest occupied level is evicted if that level is not above the
    /// incoming one; if every resident ranks higher the incoming item itself
    /// is returned.
    pub fn put_in(&mut self, item: T) -> Option<T> {
        if let Some(&idx) = self.index.get(item.key())
            && let Some(mut resident) = self.remove_at(idx)
        {
            let mut budget = resident.budget();
            budget.merge(&item.budget());
            resident.set_budget(budget);
            self.insert(resident);
            return None;
        }

        let level = level_of(item.priority());
        if self.len() < self.capacity {
            self.insert(item);
            return None;
        }

        let lowest = self.levels.iter().position(|l| l.len > 0);
        match lowest {
            Some(out_level) if out_level <= level => {
                let evicted = self.take_out_first(out_level);
                if let Some(evicted) = &evicted {
                    tracing::trace!(key = evicted.key(), level = out_level, "bag eviction");
                }
                self.insert(item);
                evicted
            }
            _ => {
                tracing::trace!(key = item.key(), level, "bag rejected incoming item");
                Some(item)
            }
        }
    }

    /// Next item by distributor order, or `None` when empty.
    pub fn take_out(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        if self.levels[self.current_level].len == 0 || self.current_counter == 0 {
            self.current_level = DISTRIBUTOR.pick(self.level_index);
            self.level_index = DISTRIBUTOR.next(self.level_index);
            while self.levels[self.current_level].len == 0 {
                self.current_level = DISTRIBUTOR.pick(self.level_index);
                self.level_index = DISTRIBUTOR.next(self.level_index);
            }
            self.current_counter = if self.current_level < BAG_THRESHOLD {
                1
            } else {
                self.levels[self.current_level].len
            };
        }
        let item = self.take_out_first(self.current_level);
        self.current_counter = self.current_counter.saturating_sub(1);
        item
    }

    /// Remove an item by key, bypassing priority order.
    pub fn pick_out(&mut self, key: &str) -> Option<T> {
        let idx = *self.index.get(key)?;
        self.remove_at(idx)
    }

    /// Decay the item's priority, then insert it again.
    pub fn put_back(&mut self, mut item: T) -> Option<T> {
        let mut budget = item.budget();
        forget(&mut budget, self.forget_rate as f32, RELATIVE_THRESHOLD);
        item.set_budget(budget);
        self.put_in(item)
    }

    /// Items from the highest level down, oldest first within a level.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..BAG_LEVEL).rev().flat_map(move |level| {
            let mut cursor = self.levels[level].head;
            std::iter::from_fn(move || {
                let slot = self.slots[cursor?].as_ref()?;
                cursor = slot.next;
                Some(&slot.item)
            })
        })
    }

    // ---------------------------------------------------------------------
    // Slab and level-list plumbing
    // ---------------------------------------------------------------------

    fn insert(&mut self, item: T) {
        let level = level_of(item.priority());
        let key = item.key().to_owned();
        let slot = Slot {
            item,
            level,
            prev: self.levels[level].tail,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };

        match self.levels[level].tail {
            Some(tail) => {
                if let Some(t) = self.slots[tail].as_mut() {
                    t.next = Some(idx);
                }
            }
            None => self.levels[level].head = Some(idx),
        }
        self.levels[level].tail = Some(idx);
        self.levels[level].len += 1;
        self.mass += level + 1;
        self.index.insert(key, idx);
    }

    fn take_out_first(&mut self, level: usize) -> Option<T> {
        let idx = self.levels[level].head?;
        self.remove_at(idx)
    }

    /// Unlink slot `idx` from its level and the index.
    fn remove_at(&mut self, idx: usize) -> Option<T> {
        let slot = self.slots.get_mut(idx)?.take()?;
        match slot.prev {
            Some(prev) => {
                if let Some(p) = self.slots[prev].as_mut() {
                    p.next = slot.next;
                }
            }
            None => self.levels[slot.level].head = slot.next,
        }
        match slot.next {
            Some(next) => {
                if let Some(n) = self.slots[next].as_mut() {
                    n.prev = slot.prev;
                }
            }
            None => self.levels[slot.level].tail = slot.prev,
        }
        self.levels[slot.level].len -= 1;
        self.mass -= slot.level + 1;
        self.index.remove(slot.item.key());
        self.free.push(idx);
        Some(slot.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Entry {
        key: String,
        budget: Budget,
    }

    impl Entry {
        fn new(key: &str, priority: f32) -> Self {
            Self {
                key: key.to_owned(),
                budget: Budget::new(priority, 0.5, 0.5),
            }
        }
    }

    impl Item for Entry {
        fn key(&self) -> &str {
            &self.key
        }

        fn budget(&self) -> Budget {
            self.budget
        }

        fn set_budget(&mut self, budget: Budget) {
            self.budget = budget;
        }
    }

    #[test]
    fn test_level_formula() {
        assert_eq!(level_of(0.0), 0);
        assert_eq!(level_of(0.005), 0);
        assert_eq!(level_of(0.01), 0);
        assert_eq!(level_of(0.011), 1);
        assert_eq!(level_of(0.5), 49);
        assert_eq!(level_of(1.0), 99);
    }

    #[test]
    fn test_put_in_and_pick_out() {
        let mut bag = Bag::new(10, 10);
        assert!(bag.put_in(Entry::new("a", 0.4)).is_none());
        assert_eq!(bag.len(), 1);
        let a = bag.pick_out("a").unwrap();
        assert_eq!(a.key, "a");
        assert!(bag.get("a").is_none());
        assert!(bag.is_empty());
    }

    #[test]
    fn test_duplicate_key_merges() {
        let mut bag = Bag::new(10, 10);
        bag.put_in(Entry::new("a", 0.2));
        let mut stronger = Entry::new("a", 0.7);
        stronger.budget.set_quality(0.1);
        assert!(bag.put_in(stronger).is_none());
        assert_eq!(bag.len(), 1);
        let merged = bag.get("a").unwrap();
        assert_relative_eq!(merged.budget.priority(), 0.7);
        assert_relative_eq!(merged.budget.quality(), 0.5);
    }

    #[test]
    fn test_full_bag_evicts_lowest() {
        let mut bag = Bag::new(2, 10);
        bag.put_in(Entry::new("low", 0.1));
        bag.put_in(Entry::new("high", 0.9));
        let out = bag.put_in(Entry::new("mid", 0.5)).unwrap();
        assert_eq!(out.key, "low");
        assert!(bag.contains("mid"));
        assert!(bag.contains("high"));
    }

    #[test]
    fn test_full_bag_rejects_weaker_incoming() {
        let mut bag = Bag::new(2, 10);
        bag.put_in(Entry::new("a", 0.6));
        bag.put_in(Entry::new("b", 0.9));
        let out = bag.put_in(Entry::new("weak", 0.1)).unwrap();
        assert_eq!(out.key, "weak");
        assert_eq!(bag.len(), 2);
        assert!(!bag.contains("weak"));
    }

    #[test]
    fn test_equal_level_evicts_resident() {
        let mut bag = Bag::new(1, 10);
        bag.put_in(Entry::new("old", 0.5));
        let out = bag.put_in(Entry::new("new", 0.5)).unwrap();
        assert_eq!(out.key, "old");
    }

    #[test]
    fn test_take_out_empty() {
        let mut bag: Bag<Entry> = Bag::new(5, 10);
        assert!(bag.take_out().is_none());
    }

    #[test]
    fn test_take_out_prefers_high_levels() {
        let mut bag = Bag::new(100, 10);
        for i in 0..5 {
            bag.put_in(Entry::new(&format!("low{i}"), 0.05));
            bag.put_in(Entry::new(&format!("high{i}"), 0.95));
        }
        let mut high = 0;
        for _ in 0..200 {
            let item = bag.take_out().unwrap();
            if item.key.starts_with("high") {
                high += 1;
            }
            bag.put_in(item);
        }
        assert!(high > 150, "high-priority items taken {high} times out of 200");
    }

    #[test]
    fn test_active_level_drains_fifo() {
        let mut bag = Bag::new(10, 10);
        bag.put_in(Entry::new("first", 0.95));
        bag.put_in(Entry::new("second", 0.95));
        bag.put_in(Entry::new("third", 0.95));
        let order: Vec<String> = (0..3).map(|_| bag.take_out().unwrap().key).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_put_back_decays() {
        let mut bag = Bag::new(10, 10);
        bag.put_in(Entry::new("a", 0.9));
        let a = bag.take_out().unwrap();
        bag.put_back(a);
        assert!(bag.get("a").unwrap().budget.priority() < 0.9);
    }

    #[test]
    fn test_average_priority() {
        let mut bag: Bag<Entry> = Bag::new(10, 10);
        assert_relative_eq!(bag.average_priority(), 0.01);
        bag.put_in(Entry::new("a", 0.5));
        bag.put_in(Entry::new("b", 0.25));
        assert_relative_eq!(bag.average_priority(), (50.0 + 25.0) / 200.0, epsilon = 1e-6);
    }

    #[test]
    fn test_iter_orders_by_level() {
        let mut bag = Bag::new(10, 10);
        bag.put_in(Entry::new("low", 0.2));
        bag.put_in(Entry::new("high", 0.8));
        bag.put_in(Entry::new("high2", 0.8));
        let keys: Vec<&str> = bag.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["high", "high2", "low"]);
    }

    #[test]
    fn test_slots_reused_after_removal() {
        let mut bag = Bag::new(3, 10);
        for round in 0..20 {
            let key = format!("k{round}");
            bag.put_in(Entry::new(&key, 0.5));
            bag.pick_out(&key);
        }
        assert!(bag.slots.len() <= 1);
    }

    proptest! {
        #[test]
        fn prop_size_never_exceeds_capacity(
            capacity in 1usize..20,
            ops in prop::collection::vec((0u8..30, 0.0f32..=1.0, any::<bool>()), 0..200),
        ) {
            let mut bag = Bag::new(capacity, 10);
            for (k, p, take) in ops {
                if take {
                    if let Some(item) = bag.take_out() {
                        bag.put_back(item);
                    }
                } else {
                    bag.put_in(Entry::new(&format!("k{k}"), p));
                }
                prop_assert!(bag.len() <= capacity);
                prop_assert_eq!(bag.iter().count(), bag.len());
            }
        }

        #[test]
        fn prop_level_matches_formula(p in 0.0f32..=1.0) {
            let expected = ((p * 100.0).ceil() as i64 - 1).clamp(0, 99) as usize;
            prop_assert_eq!(level_of(p), expected);
        }

        #[test]
        fn prop_put_in_pick_out_round_trip(
            p in 0.0f32..=1.0,
            others in prop::collection::vec(0.0f32..=1.0, 0..10),
        ) {
            let mut bag = Bag::new(50, 10);
            for (i, q) in others.iter().enumerate() {
                bag.put_in(Entry::new(&format!("o{i}"), *q));
            }
            let x = Entry::new("x", p);
            bag.put_in(x.clone());
            let out = bag.pick_out("x");
            prop_assert_eq!(out, Some(x));
            prop_assert!(bag.get("x").is_none());
        }
    }
}
