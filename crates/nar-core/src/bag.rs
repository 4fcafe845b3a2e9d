//! Bounded, priority-stratified item store.
//!
//! Items are owned by a slab of slots. A key index and one FIFO queue of slot
//! numbers per priority level both point into the slab, and every mutation
//! goes through `insert_slot` / `remove_slot`, so the two views always cover
//! the same set of items.
//!
//! Selection walks a shared [`Distributor`]: higher levels come up more
//! often. A level under `threshold` hands out one item per selection; a level
//! at or above it is drained of everything it held when it was selected.
//!
//! At capacity the incoming item is compared against the lowest non-empty
//! level. Equal or lower means the incoming item is returned unstored;
//! higher means the oldest item of that lowest level is evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::budget;
use crate::constants::{BAG_LEVEL, BAG_THRESHOLD, EMPTY_BAG_PRIORITY, RELATIVE_THRESHOLD};
use crate::distributor::Distributor;
use crate::item::Item;

/// Level layout shared by every bag of one reasoner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BagParams {
    pub levels: usize,
    pub threshold: usize,
    pub relative_threshold: f32,
}

impl Default for BagParams {
    fn default() -> Self {
        Self {
            levels: BAG_LEVEL,
            threshold: BAG_THRESHOLD,
            relative_threshold: RELATIVE_THRESHOLD,
        }
    }
}

struct Slot<T> {
    item: T,
    level: usize,
}

pub struct Bag<T: Item> {
    slots: Vec<Option<Slot<T>>>,
    free: Vec<usize>,
    keys: HashMap<String, usize>,
    levels: Vec<VecDeque<usize>>,
    capacity: usize,
    forget_rate: f32,
    params: BagParams,
    mass: usize,
    distributor: Arc<Distributor>,
    cursor: usize,
    current_level: usize,
    current_counter: usize,
}

impl<T: Item> Bag<T> {
    /// `capacity >= 1` and `params.levels` must match the distributor; both
    /// are checked once by [`ReasonerConfig::validate`](crate::config::ReasonerConfig::validate).
    pub fn new(
        capacity: usize,
        forget_rate: f32,
        params: BagParams,
        distributor: Arc<Distributor>,
    ) -> Self {
        debug_assert!(capacity > 0, "bag capacity must be positive");
        debug_assert_eq!(distributor.level_count(), params.levels);
        let cursor = capacity % distributor.capacity();
        Self {
            slots: Vec::with_capacity(capacity.min(4096)),
            free: Vec::new(),
            keys: HashMap::new(),
            levels: (0..params.levels).map(|_| VecDeque::new()).collect(),
            capacity,
            forget_rate,
            params,
            mass: 0,
            distributor,
            cursor,
            current_level: params.levels - 1,
            current_counter: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sum of `level + 1` over resident items.
    pub fn mass(&self) -> usize {
        self.mass
    }

    pub fn forget_rate(&self) -> f32 {
        self.forget_rate
    }

    pub fn set_forget_rate(&mut self, rate: f32) {
        self.forget_rate = rate;
    }

    /// O(1) estimate of mean priority from `mass`.
    pub fn average_priority(&self) -> f32 {
        if self.is_empty() {
            return EMPTY_BAG_PRIORITY;
        }
        let f = self.mass as f32 / (self.size() * self.params.levels) as f32;
        f.min(1.0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn peek(&self, key: &str) -> Option<&T> {
        let slot = *self.keys.get(key)?;
        self.slots[slot].as_ref().map(|s| &s.item)
    }

    /// Mutable access to a resident item. The item keeps its level until it
    /// is next reinserted, and its key must not change.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let slot = *self.keys.get(key)?;
        self.slots[slot].as_mut().map(|s| &mut s.item)
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut T)) {
        for slot in self.slots.iter_mut().flatten() {
            f(&mut slot.item);
        }
    }

    pub fn level_of(&self, key: &str) -> Option<usize> {
        let slot = *self.keys.get(key)?;
        self.slots[slot].as_ref().map(|s| s.level)
    }

    /// Level a priority maps to: `ceil(p * L) - 1`, clamped into range.
    pub fn level_for(&self, priority: f32) -> usize {
        let fl = priority * self.params.levels as f32;
        let level = fl.ceil() as isize - 1;
        level.clamp(0, self.params.levels as isize - 1) as usize
    }

    /// Insert an item, merging with a resident item of the same key.
    ///
    /// Returns whatever did not make it into the bag: the evicted resident,
    /// or the incoming item itself when it loses against the lowest level.
    pub fn put_in(&mut self, mut item: T) -> Option<T> {
        if let Some(slot) = self.keys.get(item.key()).copied() {
            let old = self.remove_slot(slot);
            item.merge(old.budget());
        }

        let level = self.level_for(item.priority());

        if self.size() >= self.capacity {
            let Some(lowest) = self.lowest_nonempty_level() else {
                return Some(item);
            };
            if level <= lowest {
                tracing::debug!(key = item.key(), level, lowest, "bag full, incoming rejected");
                return Some(item);
            }
            let evicted = self.take_out_first(lowest);
            tracing::debug!(key = evicted.key(), level = lowest, "bag full, evicted");
            self.insert_slot(item, level);
            return Some(evicted);
        }

        self.insert_slot(item, level);
        None
    }

    /// Decay an item that was taken out and processed, then put it in again.
    pub fn put_back(&mut self, mut item: T) -> Option<T> {
        budget::forget(
            item.budget_mut(),
            self.forget_rate,
            self.params.relative_threshold,
        );
        self.put_in(item)
    }

    /// Draw the next item by distributor-weighted level selection.
    pub fn take_out(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        if self.levels[self.current_level].is_empty() || self.current_counter == 0 {
            loop {
                self.current_level = self.distributor.pick(self.cursor);
                self.cursor = self.distributor.next(self.cursor);
                if !self.levels[self.current_level].is_empty() {
                    break;
                }
            }
            self.current_counter = if self.current_level < self.params.threshold {
                1
            } else {
                self.levels[self.current_level].len()
            };
        }

        let item = self.take_out_first(self.current_level);
        self.current_counter = self.current_counter.saturating_sub(1);
        Some(item)
    }

    /// Draw items until `accept` approves one, putting rejected draws back.
    /// Gives up after `max_tries` draws.
    pub fn take_out_where(
        &mut self,
        max_tries: usize,
        mut accept: impl FnMut(&T) -> bool,
    ) -> Option<T> {
        for _ in 0..max_tries {
            let item = self.take_out()?;
            if accept(&item) {
                return Some(item);
            }
            self.put_back(item);
        }
        None
    }

    /// Remove a specific item by key, bypassing selection.
    pub fn pick_out(&mut self, key: &str) -> Option<T> {
        let slot = self.keys.get(key).copied()?;
        Some(self.remove_slot(slot))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.keys.clear();
        for level in &mut self.levels {
            level.clear();
        }
        self.mass = 0;
        self.cursor = self.capacity % self.distributor.capacity();
        self.current_level = self.params.levels - 1;
        self.current_counter = 0;
    }

    /// Resident items, highest level first, FIFO within a level.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.levels.iter().rev().flat_map(move |queue| {
            queue
                .iter()
                .filter_map(move |&slot| self.slots[slot].as_ref().map(|s| &s.item))
        })
    }

    /// Whether the key index, level queues and mass agree. Used by tests.
    pub fn check_invariants(&self) -> bool {
        if self.size() > self.capacity {
            return false;
        }
        let mut queued = 0usize;
        let mut mass = 0usize;
        for (level, queue) in self.levels.iter().enumerate() {
            for &slot in queue {
                let Some(s) = self.slots[slot].as_ref() else {
                    return false;
                };
                if s.level != level || self.keys.get(s.item.key()) != Some(&slot) {
                    return false;
                }
                queued += 1;
                mass += level + 1;
            }
        }
        queued == self.keys.len() && mass == self.mass
    }

    fn lowest_nonempty_level(&self) -> Option<usize> {
        self.levels.iter().position(|q| !q.is_empty())
    }

    fn insert_slot(&mut self, item: T, level: usize) {
        let key = item.key().to_string();
        let entry = Slot { item, level };
        let slot = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.levels[level].push_back(slot);
        self.keys.insert(key, slot);
        self.mass += level + 1;
    }

    fn remove_slot(&mut self, slot: usize) -> T {
        let entry = self.slots[slot]
            .take()
            .unwrap_or_else(|| unreachable!("key index points at an empty slot"));
        let queue = &mut self.levels[entry.level];
        if let Some(pos) = queue.iter().position(|&s| s == slot) {
            queue.remove(pos);
        }
        self.finish_removal(slot, entry)
    }

    fn take_out_first(&mut self, level: usize) -> T {
        let slot = self.levels[level]
            .pop_front()
            .unwrap_or_else(|| unreachable!("take_out_first on empty level {level}"));
        let entry = self.slots[slot]
            .take()
            .unwrap_or_else(|| unreachable!("level queue points at an empty slot"));
        self.finish_removal(slot, entry)
    }

    fn finish_removal(&mut self, slot: usize, entry: Slot<T>) -> T {
        self.keys.remove(entry.item.key());
        self.free.push(slot);
        self.mass -= entry.level + 1;
        entry.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::Budget;

    #[derive(Debug, Clone)]
    struct Probe {
        key: String,
        budget: Budget,
    }

    impl Item for Probe {
        fn key(&self) -> &str {
            &self.key
        }
        fn budget(&self) -> &Budget {
            &self.budget
        }
        fn budget_mut(&mut self) -> &mut Budget {
            &mut self.budget
        }
    }

    fn probe(key: &str, priority: f32) -> Probe {
        Probe {
            key: key.to_string(),
            budget: Budget::new(priority, 0.5, 0.5),
        }
    }

    fn bag(capacity: usize) -> Bag<Probe> {
        let params = BagParams::default();
        Bag::new(capacity, 10.0, params, Arc::new(Distributor::new(params.levels)))
    }

    #[test]
    fn test_put_in_and_lookup() {
        let mut b = bag(10);
        assert!(b.put_in(probe("a", 0.5)).is_none());
        assert!(b.contains("a"));
        assert_eq!(b.peek("a").map(|p| p.priority()), Some(0.5));
        assert_eq!(b.size(), 1);
        assert_eq!(b.level_of("a"), Some(49));
        assert_eq!(b.mass(), 50);
        assert!(b.check_invariants());
    }

    #[test]
    fn test_level_for() {
        let b = bag(1);
        assert_eq!(b.level_for(0.0), 0);
        assert_eq!(b.level_for(0.005), 0);
        assert_eq!(b.level_for(0.01), 0);
        assert_eq!(b.level_for(0.011), 1);
        assert_eq!(b.level_for(0.5), 49);
        assert_eq!(b.level_for(1.0), 99);
    }

    #[test]
    fn test_overflow_evicts_lowest_level() {
        let mut b = bag(2);
        assert!(b.put_in(probe("A", 0.9)).is_none());
        assert!(b.put_in(probe("B", 0.5)).is_none());
        let out = b.put_in(probe("C", 0.95));
        assert_eq!(out.map(|p| p.key), Some("B".to_string()));
        assert!(b.contains("A") && b.contains("C"));
        assert_eq!(b.size(), 2);
        assert!(b.check_invariants());
    }

    #[test]
    fn test_overflow_rejects_lower_incoming() {
        let mut b = bag(2);
        b.put_in(probe("A", 0.9));
        b.put_in(probe("B", 0.5));
        let out = b.put_in(probe("C", 0.2));
        assert_eq!(out.map(|p| p.key), Some("C".to_string()));
        assert!(b.contains("A") && b.contains("B"));
        assert!(!b.contains("C"));
    }

    #[test]
    fn test_overflow_rejects_on_tie() {
        let mut b = bag(1);
        b.put_in(probe("first", 0.305));
        let out = b.put_in(probe("second", 0.301));
        assert_eq!(out.map(|p| p.key), Some("second".to_string()));
        assert!(b.contains("first"));
    }

    #[test]
    fn test_eviction_is_fifo_within_level() {
        let mut b = bag(3);
        b.put_in(probe("x", 0.3));
        b.put_in(probe("y", 0.3));
        b.put_in(probe("top", 0.9));
        let out = b.put_in(probe("new", 0.8));
        assert_eq!(out.map(|p| p.key), Some("x".to_string()));
        assert!(b.contains("y"));
    }

    #[test]
    fn test_duplicate_merges() {
        let mut b = bag(2);
        b.put_in(probe("a", 0.3));
        b.put_in(probe("b", 0.4));
        // full, but a duplicate replaces its own entry
        assert!(b.put_in(probe("a", 0.7)).is_none());
        assert_eq!(b.size(), 2);
        assert_eq!(b.peek("a").map(|p| p.priority()), Some(0.7));
        assert!(b.put_in(probe("a", 0.1)).is_none());
        assert_eq!(b.peek("a").map(|p| p.priority()), Some(0.7));
        assert!(b.check_invariants());
    }

    #[test]
    fn test_take_out_empty() {
        let mut b = bag(4);
        assert!(b.take_out().is_none());
    }

    #[test]
    fn test_take_out_put_in_roundtrip() {
        let mut b = bag(8);
        for (i, p) in [0.1, 0.35, 0.6, 0.95].iter().enumerate() {
            b.put_in(probe(&format!("k{i}"), *p));
        }
        let (size, mass) = (b.size(), b.mass());
        let item = b.take_out().expect("non-empty bag");
        assert!(!b.contains(&item.key));
        assert!(b.put_in(item).is_none());
        assert_eq!(b.size(), size);
        assert_eq!(b.mass(), mass);
        assert!(b.check_invariants());
    }

    #[test]
    fn test_selection_frequency_follows_levels() {
        let mut b = bag(4);
        b.put_in(probe("hi", 1.0));
        b.put_in(probe("lo", 0.005));
        let mut hi = 0;
        let mut lo = 0;
        // one full distributor pass stops 100 times at level 99, once at 0
        for _ in 0..101 {
            let item = b.take_out().expect("non-empty bag");
            if item.key == "hi" {
                hi += 1;
            } else {
                lo += 1;
            }
            b.put_in(item);
        }
        assert_eq!((hi, lo), (100, 1));
    }

    #[test]
    fn test_active_level_drains_in_batch() {
        let mut b = bag(10);
        for k in ["a1", "a2", "a3"] {
            b.put_in(probe(k, 0.95));
        }
        for k in ["b1", "b2", "b3"] {
            b.put_in(probe(k, 0.55));
        }
        let first = b.take_out().expect("item");
        let level = b.level_for(first.priority());
        let second = b.take_out().expect("item");
        let third = b.take_out().expect("item");
        assert_eq!(b.level_for(second.priority()), level);
        assert_eq!(b.level_for(third.priority()), level);
    }

    #[test]
    fn test_take_out_where_skips_rejected() {
        let mut b = bag(10);
        b.put_in(probe("keep", 0.9));
        b.put_in(probe("skip", 0.9));
        let got = b.take_out_where(5, |p| p.key == "keep");
        assert_eq!(got.map(|p| p.key), Some("keep".to_string()));
        assert!(b.contains("skip"));
        assert!(b.take_out_where(3, |_| false).is_none());
        assert_eq!(b.size(), 1);
    }

    #[test]
    fn test_pick_out() {
        let mut b = bag(4);
        b.put_in(probe("a", 0.5));
        b.put_in(probe("b", 0.5));
        let a = b.pick_out("a").expect("resident");
        assert_eq!(a.key, "a");
        assert!(b.pick_out("a").is_none());
        assert_eq!(b.size(), 1);
        assert_eq!(b.mass(), 50);
        assert!(b.check_invariants());
    }

    #[test]
    fn test_put_back_decays() {
        let mut b = bag(4);
        b.put_in(probe("a", 0.9));
        let a = b.take_out().expect("item");
        b.put_back(a);
        let p = b.peek("a").map(|p| p.priority()).unwrap_or_default();
        assert!(p < 0.9 && p >= 0.1);
    }

    #[test]
    fn test_average_priority() {
        let mut b = bag(4);
        assert_eq!(b.average_priority(), EMPTY_BAG_PRIORITY);
        b.put_in(probe("a", 0.5));
        b.put_in(probe("b", 1.0));
        assert!((b.average_priority() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_iter_high_to_low() {
        let mut b = bag(4);
        b.put_in(probe("mid", 0.5));
        b.put_in(probe("top", 0.9));
        b.put_in(probe("low", 0.1));
        let keys: Vec<&str> = b.iter().map(|p| p.key()).collect();
        assert_eq!(keys, vec!["top", "mid", "low"]);
    }

    #[test]
    fn test_get_mut_keeps_level_until_reinsert() {
        let mut b = bag(4);
        b.put_in(probe("a", 0.5));
        if let Some(a) = b.get_mut("a") {
            a.budget_mut().set_priority(0.9);
        }
        assert_eq!(b.level_of("a"), Some(49));
        let a = b.pick_out("a").expect("resident");
        b.put_in(a);
        assert_eq!(b.level_of("a"), Some(89));
        assert!(b.check_invariants());
    }

    #[test]
    fn test_clear() {
        let mut b = bag(4);
        b.put_in(probe("a", 0.5));
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.mass(), 0);
        assert!(b.check_invariants());
        assert!(b.put_in(probe("a", 0.5)).is_none());
    }

    #[test]
    fn test_slot_reuse_keeps_invariants() {
        let mut b = bag(3);
        for round in 0..20 {
            b.put_in(probe(&format!("k{round}"), 0.1 + (round % 9) as f32 * 0.1));
            if round % 3 == 0 {
                b.take_out();
            }
            assert!(b.check_invariants(), "round {round}");
            assert!(b.size() <= 3);
        }
    }
}
