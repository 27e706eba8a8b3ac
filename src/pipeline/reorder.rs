use std::collections::BTreeMap;

/// A completed slot: a frame, or a skipped sequence number.
#[derive(Debug, PartialEq)]
pub enum Slot<T> {
    Frame(T),
    Skipped,
}

/// Re-sequences out-of-order completions into strictly increasing index order.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u64,
    pending: BTreeMap<u64, Slot<T>>,
}

impl<T> ReorderBuffer<T> {
    pub fn new(first: u64) -> Self {
        Self {
            next: first,
            pending: BTreeMap::new(),
        }
    }

    /// Index the buffer is waiting for.
    pub fn next_index(&self) -> u64 {
        self.next
    }

    /// Queue a completion. Returns `false` (and drops the slot) for stale or duplicate indices.
    pub fn insert(&mut self, idx: u64, slot: Slot<T>) -> bool {
        if idx < self.next || self.pending.contains_key(&idx) {
            return false;
        }
        self.pending.insert(idx, slot);
        true
    }

    /// Pop the next slot if it has arrived.
    pub fn pop_ready(&mut self) -> Option<(u64, Slot<T>)> {
        let slot = self.pending.remove(&self.next)?;
        let idx = self.next;
        self.next += 1;
        Some((idx, slot))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/reorder.rs"]
mod tests;
