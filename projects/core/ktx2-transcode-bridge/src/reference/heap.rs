//! Fixed-capacity first-fit heap standing in for an engine's linear memory.

use std::collections::BTreeMap;

/// Offsets below this are never handed out, so 0 stays the failure value.
const FIRST_OFFSET: usize = 8;

/// Allocations are aligned like the engine's `malloc`.
const ALIGNMENT: usize = 8;

pub(crate) struct SimulatedHeap {
    memory: Vec<u8>,
    /// Live allocations: offset -> length.
    allocations: BTreeMap<usize, usize>,
}

impl SimulatedHeap {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            memory: vec![0; capacity.max(FIRST_OFFSET)],
            allocations: BTreeMap::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.memory.len()
    }

    pub(crate) fn live_allocations(&self) -> usize {
        self.allocations.len()
    }

    /// Returns the offset of a new allocation, or `None` if nothing fits.
    pub(crate) fn allocate(&mut self, len: usize) -> Option<usize> {
        // Zero-sized requests still get a distinct address.
        let reserved = len.max(1);
        let mut candidate = FIRST_OFFSET;

        for (&offset, &size) in &self.allocations {
            if candidate.checked_add(reserved)? <= offset {
                break;
            }
            candidate = align_up(offset + size.max(1))?;
        }

        if candidate.checked_add(reserved)? > self.memory.len() {
            return None;
        }

        self.allocations.insert(candidate, len);
        Some(candidate)
    }

    /// Frees the allocation starting at `offset`. Returns false if there was none.
    pub(crate) fn free(&mut self, offset: usize) -> bool {
        self.allocations.remove(&offset).is_some()
    }

    /// The `len` bytes at `offset`, if that range lies inside the heap.
    pub(crate) fn bytes(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        self.memory.get(offset..end)
    }

    pub(crate) fn bytes_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        let end = offset.checked_add(len)?;
        self.memory.get_mut(offset..end)
    }

    /// Length of the live allocation starting exactly at `offset`.
    pub(crate) fn allocation_len(&self, offset: usize) -> Option<usize> {
        self.allocations.get(&offset).copied()
    }
}

fn align_up(value: usize) -> Option<usize> {
    Some(value.checked_add(ALIGNMENT - 1)? & !(ALIGNMENT - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fit_reuses_freed_gap() {
        let mut heap = SimulatedHeap::new(256);
        let a = heap.allocate(16).unwrap();
        let b = heap.allocate(16).unwrap();
        let c = heap.allocate(16).unwrap();
        assert!(a < b && b < c);
        assert_eq!(a, FIRST_OFFSET);

        assert!(heap.free(b));
        assert_eq!(heap.allocate(8), Some(b));
        assert_eq!(heap.live_allocations(), 3);
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut heap = SimulatedHeap::new(64);
        assert!(heap.allocate(56).is_some());
        assert!(heap.allocate(1).is_none());
        assert!(heap.allocate(usize::MAX).is_none());
    }

    #[test]
    fn double_free_is_reported() {
        let mut heap = SimulatedHeap::new(64);
        let a = heap.allocate(4).unwrap();
        assert!(heap.free(a));
        assert!(!heap.free(a));
    }

    #[test]
    fn zero_sized_allocations_are_distinct() {
        let mut heap = SimulatedHeap::new(64);
        let a = heap.allocate(0).unwrap();
        let b = heap.allocate(0).unwrap();
        assert_ne!(a, b);
    }
}
