//! The context table: bounded per-`(source, destination)` reassembly
//! state with LRU reclamation.
//!
//! Implemented as a `Vec<Context>` bounded at `capacity`, linked into an
//! intrusive doubly-linked LRU order via `Option<usize>` `prev`/`next`
//! indices, with a `HashMap` for O(1) key lookup — an array-of-slots shape
//! that avoids a pointer-linked list's per-node allocations.

use std::collections::HashMap;

use dnp3_core::constants::MIN_BUFLEN;
use dnp3_core::{Error, Result, Segment};
use tracing::warn;

use crate::transport::TransportRecognizer;

/// Per-`(src, dst)` reassembly state.
#[derive(Debug, Clone)]
pub struct Context {
    pub src: u16,
    pub dst: u16,
    /// Deep copy of the last segment observed in this context, used to
    /// classify the next arriving segment's token.
    pub last_segment: Option<Segment>,
    /// In-progress transport-function recognizer state for this context.
    pub tfun: TransportRecognizer,
    /// Total count of tokens ever fed to `tfun` in this context's lifetime
    /// (reset when the context is reclaimed).
    pub tfun_pos: u64,
    buf: Vec<u8>,
    buflen: usize,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Context {
    fn new(src: u16, dst: u16, buflen: usize) -> Self {
        Self {
            src,
            dst,
            last_segment: None,
            tfun: TransportRecognizer::new(),
            tfun_pos: 0,
            buf: Vec::new(),
            buflen,
            prev: None,
            next: None,
        }
    }

    /// Reset to a fresh state for a different `(src, dst)` pair, discarding
    /// any in-progress reassembly. Used when an LRU slot is reclaimed.
    fn reclaim(&mut self, src: u16, dst: u16) {
        self.src = src;
        self.dst = dst;
        self.last_segment = None;
        self.tfun = TransportRecognizer::new();
        self.tfun_pos = 0;
        self.buf.clear();
    }

    /// Raw bytes accumulated since the last reassembly boundary.
    pub fn raw(&self) -> &[u8] {
        &self.buf
    }

    /// Append `bytes` to the raw-bytes buffer if capacity allows. Returns
    /// `false` (and leaves the buffer untouched) on overflow — the caller
    /// is expected to log and continue, dropping the incoming frame
    /// without destroying the context.
    pub fn push_raw(&mut self, bytes: &[u8]) -> bool {
        if self.buf.len() + bytes.len() > self.buflen {
            false
        } else {
            self.buf.extend_from_slice(bytes);
            true
        }
    }

    /// Clear the raw-bytes buffer, as happens after every transport-function
    /// series completion.
    pub fn clear_raw(&mut self) {
        self.buf.clear();
    }
}

/// Bounded table of [`Context`]s, keyed by `(src, dst)`, in most-recently-used
/// order.
#[derive(Debug)]
pub struct ContextTable {
    slots: Vec<Context>,
    index: HashMap<(u16, u16), usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
    buflen: usize,
}

impl ContextTable {
    pub fn new(capacity: usize, buflen: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity { requested: capacity });
        }
        if buflen < MIN_BUFLEN {
            return Err(Error::BufferTooSmall {
                requested: buflen,
                minimum: MIN_BUFLEN,
            });
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
            capacity,
            buflen,
        })
    }

    /// Number of contexts currently held (`<= capacity`).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(src, dst)` pairs currently held, most-recently-used first.
    pub fn keys_mru_order(&self) -> Vec<(u16, u16)> {
        let mut out = Vec::with_capacity(self.slots.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            out.push((self.slots[idx].src, self.slots[idx].dst));
            cursor = self.slots[idx].next;
        }
        out
    }

    /// Look up (or create, or reclaim) the context for `(src, dst)`, moving
    /// it to the front of the LRU order. Returns a slot index stable until
    /// the next call to `lookup` (reclamation may repurpose any slot).
    pub fn lookup(&mut self, src: u16, dst: u16) -> usize {
        if let Some(&idx) = self.index.get(&(src, dst)) {
            self.move_to_front(idx);
            return idx;
        }

        if self.slots.len() < self.capacity {
            let idx = self.slots.len();
            self.slots.push(Context::new(src, dst, self.buflen));
            self.index.insert((src, dst), idx);
            self.link_front(idx);
            return idx;
        }

        let idx = self.tail.expect("a full table always has a tail");
        let (old_src, old_dst, dropped) = {
            let ctx = &self.slots[idx];
            (ctx.src, ctx.dst, ctx.buf.len())
        };
        if dropped > 0 {
            warn!(
                src = old_src,
                dst = old_dst,
                dropped_bytes = dropped,
                "context table full: reclaiming least-recently-used context with unflushed bytes"
            );
        }
        self.index.remove(&(old_src, old_dst));
        self.unlink(idx);
        self.slots[idx].reclaim(src, dst);
        self.index.insert((src, dst), idx);
        self.link_front(idx);
        idx
    }

    pub fn get(&self, idx: usize) -> &Context {
        &self.slots[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut Context {
        &mut self.slots[idx]
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }

    fn link_front(&mut self, idx: usize) {
        self.slots[idx].prev = None;
        self.slots[idx].next = self.head;
        if let Some(h) = self.head {
            self.slots[h].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_fresh_contexts_until_full() {
        let mut table = ContextTable::new(2, MIN_BUFLEN).unwrap();
        let a = table.lookup(1, 2);
        let b = table.lookup(3, 4);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.keys_mru_order(), vec![(3, 4), (1, 2)]);
    }

    #[test]
    fn hit_moves_to_front() {
        let mut table = ContextTable::new(3, MIN_BUFLEN).unwrap();
        table.lookup(1, 1);
        table.lookup(2, 2);
        table.lookup(3, 3);
        table.lookup(1, 1);
        assert_eq!(table.keys_mru_order(), vec![(1, 1), (3, 3), (2, 2)]);
    }

    #[test]
    fn reclaims_lru_slot_when_full() {
        let mut table = ContextTable::new(2, MIN_BUFLEN).unwrap();
        table.lookup(1, 1);
        table.lookup(2, 2);
        table.lookup(3, 3); // evicts (1,1)
        assert_eq!(table.len(), 2);
        assert_eq!(table.keys_mru_order(), vec![(3, 3), (2, 2)]);

        // (1,1) is gone; looking it up again allocates fresh state.
        let idx = table.lookup(1, 1);
        assert!(table.get(idx).last_segment.is_none());
        assert_eq!(table.keys_mru_order(), vec![(1, 1), (3, 3)]);
    }

    #[test]
    fn six_distinct_pairs_over_capacity_four_keeps_most_recent_four() {
        let mut table = ContextTable::new(4, MIN_BUFLEN).unwrap();
        for pair in [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)] {
            table.lookup(pair.0, pair.1);
        }
        assert_eq!(table.len(), 4);
        assert_eq!(
            table.keys_mru_order(),
            vec![(5, 5), (4, 4), (3, 3), (2, 2)]
        );
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            ContextTable::new(0, MIN_BUFLEN),
            Err(Error::ZeroCapacity { requested: 0 })
        ));
    }

    #[test]
    fn tiny_buffer_is_rejected() {
        assert!(matches!(
            ContextTable::new(1, 1),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn push_raw_respects_buflen() {
        let mut table = ContextTable::new(1, MIN_BUFLEN).unwrap();
        let idx = table.lookup(1, 1);
        let ctx = table.get_mut(idx);
        assert!(ctx.push_raw(&vec![0u8; MIN_BUFLEN]));
        assert!(!ctx.push_raw(&[0u8]));
        assert_eq!(ctx.raw().len(), MIN_BUFLEN);
    }
}
