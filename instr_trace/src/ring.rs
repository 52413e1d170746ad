// Copyright 2024 The Chromium OS Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use trace_types::Entry;

/// A fixed-size circular store of owned `Entry` slots.
///
/// `head` names the slot currently being populated; `tail` names the oldest committed slot not
/// yet handed to the backend. In streaming mode the two are always equal: there's a single
/// working slot and `commit` drains it immediately. In buffered mode `commit` advances `head`
/// and only `flush` walks the ring from `tail` up to `head` through the backend, afterwards
/// setting `tail := head`.
///
/// Slots are allocated once and reused in place for the life of the ring; resizing reinitializes
/// every slot and resets both indices, since there's no way to preserve in-flight entries across
/// a capacity change without also preserving arbitrary old and new neighbors.
///
/// One extra slot is always allocated beyond the requested `size`: with only `size` slots, the
/// classic head==tail ambiguity between "empty" and "full" would cap usable capacity at
/// `size - 1`, which would make `size` a lie. The spare slot keeps `capacity()` equal to `size`.
pub struct RingBuffer {
    slots: Vec<Entry>,
    head: usize,
    tail: usize,
}

impl RingBuffer {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "ring buffer size must be non-zero");
        let mut slots = Vec::with_capacity(size + 1);
        slots.resize_with(size + 1, Entry::new);
        RingBuffer {
            slots,
            head: 0,
            tail: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Reinitializes every slot and resets `head`/`tail` to the start of a fresh ring of `size`.
    pub fn resize(&mut self, size: usize) {
        assert!(size > 0, "ring buffer size must be non-zero");
        self.slots.clear();
        self.slots.resize_with(size + 1, Entry::new);
        self.head = 0;
        self.tail = 0;
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    /// The slot currently being populated.
    pub fn current(&self) -> &Entry {
        &self.slots[self.head]
    }

    /// The slot currently being populated, mutably.
    pub fn current_mut(&mut self) -> &mut Entry {
        &mut self.slots[self.head]
    }

    /// Number of committed-but-undrained entries between `tail` and `head`.
    pub fn pending(&self) -> usize {
        let cap = self.slots.len();
        (self.head + cap - self.tail) % cap
    }

    pub fn is_streaming_invariant(&self) -> bool {
        self.head == self.tail
    }

    /// Advances `head` to the next slot, resetting it for reuse. If doing so would catch up to
    /// `tail`, the oldest entry is dropped by advancing `tail` past it too: overflow never
    /// blocks, it silently discards the oldest undrained entry.
    pub fn advance_head(&mut self) {
        let cap = self.slots.len();
        let next = (self.head + 1) % cap;
        if next == self.tail {
            self.tail = (self.tail + 1) % cap;
        }
        self.head = next;
        self.slots[self.head].reset();
    }

    /// Drains every slot from `tail` up to (but not including) `head` through `emit`, in ring
    /// traversal order, then sets `tail := head`.
    pub fn drain_to_head(&mut self, mut emit: impl FnMut(&Entry)) {
        let cap = self.slots.len();
        while self.tail != self.head {
            emit(&self.slots[self.tail]);
            self.tail = (self.tail + 1) % cap;
        }
    }

    /// Drains every already-committed slot from `tail` to `head`, then also emits the slot
    /// currently being populated (`head`) as the final entry and resets it in place.
    ///
    /// This is `flush`'s drain, not `drain_to_head`'s: an explicit flush means to empty the ring
    /// including whatever's mid-flight, not to compete with it for room the way an ordinary
    /// `advance_head` overflow would. Leaves the ring quiescent (`head == tail`).
    pub fn flush_all(&mut self, mut emit: impl FnMut(&Entry)) {
        self.drain_to_head(&mut emit);
        emit(&self.slots[self.head]);
        self.slots[self.head].reset();
        self.tail = self.head;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_mode_keeps_head_and_tail_equal() {
        let mut ring = RingBuffer::new(4);
        assert!(ring.is_streaming_invariant());
        ring.current_mut().pc = 1;
        // Streaming commit: reset in place, head/tail never move.
        ring.current_mut().reset();
        assert!(ring.is_streaming_invariant());
    }

    #[test]
    fn buffered_overflow_drops_oldest() {
        let mut ring = RingBuffer::new(4);
        assert_eq!(ring.capacity(), 4);
        for i in 0..6u64 {
            ring.current_mut().pc = i;
            ring.advance_head();
        }
        // Capacity is exactly `size`; 6 commits into a 4-slot ring drop the oldest 2.
        assert_eq!(ring.pending(), 4);
        let mut seen = Vec::new();
        ring.drain_to_head(|e| seen.push(e.pc));
        assert_eq!(seen, vec![2, 3, 4, 5]);
    }

    #[test]
    fn drain_visits_in_commit_order_then_equalizes_tail() {
        let mut ring = RingBuffer::new(4);
        for i in 0..3u64 {
            ring.current_mut().pc = i;
            ring.advance_head();
        }
        let mut seen = Vec::new();
        ring.drain_to_head(|e| seen.push(e.pc));
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(ring.tail(), ring.head());
    }

    #[test]
    fn flush_all_includes_the_in_flight_entry_without_dropping_anything() {
        let mut ring = RingBuffer::new(4);
        for i in 0..6u64 {
            ring.current_mut().pc = i;
            ring.advance_head();
        }
        ring.current_mut().pc = 99;
        let mut seen = Vec::new();
        ring.flush_all(|e| seen.push(e.pc));
        assert_eq!(seen, vec![2, 3, 4, 5, 99]);
        assert!(ring.is_streaming_invariant());
    }
}
