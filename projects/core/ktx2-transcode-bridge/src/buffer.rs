//! Owned allocations in the engine's address space.

use crate::engine::TranscoderEngine;
use crate::error::{BridgeError, BridgeResult};
use tracing::{trace, warn};

/// A region of foreign memory allocated through [`Bridge::allocate`](crate::Bridge::allocate).
///
/// The buffer owns its allocation. It is freed exactly once: either by
/// [`ForeignBuffer::release`], which reports failures, or when dropped, which
/// logs them. Every access is checked against the allocated length, so a
/// buffer can never be used to touch engine memory it does not own.
///
/// The borrow of the engine ties the buffer's lifetime to the engine instance.
pub struct ForeignBuffer<'e> {
    engine: &'e dyn TranscoderEngine,
    address: u64,
    len: usize,
    released: bool,
}

impl<'e> ForeignBuffer<'e> {
    pub(crate) fn allocate(engine: &'e dyn TranscoderEngine, len: usize) -> BridgeResult<Self> {
        let address = engine.alloc(len as u64)?;
        if address == 0 {
            return Err(BridgeError::OutOfForeignMemory { requested: len });
        }

        trace!(backend = %engine.backend(), address, len, "allocated foreign buffer");
        Ok(Self {
            engine,
            address,
            len,
            released: false,
        })
    }

    /// Allocated length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true for zero length buffers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address handed to engine entry points.
    #[inline]
    pub(crate) fn address(&self) -> u64 {
        self.address
    }

    /// Copies `data` into the buffer at `offset`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::OutOfBounds`] if `offset + data.len()` exceeds [`ForeignBuffer::len`].
    pub fn write(&mut self, offset: usize, data: &[u8]) -> BridgeResult<()> {
        self.check_range(offset, data.len())?;
        // SAFETY: The range lies within this live allocation.
        unsafe { self.engine.write_memory(self.address + offset as u64, data) }
    }

    /// Copies `out.len()` bytes starting at `offset` into `out`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::OutOfBounds`] if the range exceeds [`ForeignBuffer::len`].
    pub fn read_into(&self, offset: usize, out: &mut [u8]) -> BridgeResult<()> {
        self.check_range(offset, out.len())?;
        // SAFETY: The range lies within this live allocation.
        unsafe { self.engine.read_memory(self.address + offset as u64, out) }
    }

    /// Reads `len` bytes starting at `offset`.
    pub fn read(&self, offset: usize, len: usize) -> BridgeResult<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.read_into(offset, &mut out)?;
        Ok(out)
    }

    /// Reads the entire buffer.
    pub fn to_vec(&self) -> BridgeResult<Vec<u8>> {
        self.read(0, self.len)
    }

    /// Frees the allocation, reporting any failure to do so.
    pub fn release(mut self) -> BridgeResult<()> {
        self.released = true;
        trace!(address = self.address, len = self.len, "releasing foreign buffer");
        self.engine.free(self.address)
    }

    fn check_range(&self, offset: usize, len: usize) -> BridgeResult<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(BridgeError::OutOfBounds {
                offset,
                len,
                capacity: self.len,
            }),
        }
    }
}

impl Drop for ForeignBuffer<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        if let Err(e) = self.engine.free(self.address) {
            warn!(address = self.address, error = %e, "failed to free foreign buffer");
        }
    }
}

impl core::fmt::Debug for ForeignBuffer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ForeignBuffer")
            .field("backend", &self.engine.backend())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    #[test]
    fn write_then_read_returns_same_bytes() {
        let bridge = Bridge::new(ReferenceEngine::new());
        let mut buffer = bridge.allocate(8).unwrap();
        buffer.write(2, &[1, 2, 3]).unwrap();
        assert_eq!(buffer.read(2, 3).unwrap(), [1, 2, 3]);
        assert_eq!(buffer.len(), 8);
    }

    #[rstest]
    #[case(0, 9)]
    #[case(8, 1)]
    #[case(usize::MAX, 2)]
    fn rejects_out_of_bounds_access(#[case] offset: usize, #[case] len: usize) {
        let bridge = Bridge::new(ReferenceEngine::new());
        let mut buffer = bridge.allocate(8).unwrap();

        let write = buffer.write(offset, &vec![0u8; len]);
        assert!(matches!(write, Err(BridgeError::OutOfBounds { .. })));

        let mut out = vec![0u8; len];
        let read = buffer.read_into(offset, &mut out);
        assert!(matches!(read, Err(BridgeError::OutOfBounds { capacity: 8, .. })));
    }

    #[test]
    fn release_and_drop_free_exactly_once() {
        let engine = ReferenceEngine::new();
        let bridge = Bridge::new(engine.clone());

        let first = bridge.allocate(16).unwrap();
        let second = bridge.allocate(16).unwrap();
        assert_eq!(engine.live_allocations(), 2);

        first.release().unwrap();
        assert_eq!(engine.live_allocations(), 1);

        drop(second);
        assert_eq!(engine.live_allocations(), 0);
        assert_eq!(engine.invalid_frees(), 0);
    }

    #[test]
    fn allocation_failure_is_out_of_foreign_memory() {
        let bridge = Bridge::new(ReferenceEngine::with_heap_capacity(64));
        let err = bridge.allocate(1024).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::OutOfForeignMemory { requested: 1024 }
        ));
    }
}
