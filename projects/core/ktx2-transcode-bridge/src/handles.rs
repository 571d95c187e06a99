//! Opaque engine handles.
//!
//! Neither type is `Clone`: the only way to release one is to give it back to
//! the [`Bridge`](crate::Bridge), after which it no longer exists.

use core::num::NonZeroU64;

/// An opened container inside the engine.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(NonZeroU64);

impl ContainerId {
    #[inline]
    pub(crate) fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    #[inline]
    pub(crate) fn raw(&self) -> u64 {
        self.0.get()
    }
}

/// Scratch decode state owned by one thread.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TranscodeStateId(NonZeroU64);

impl TranscodeStateId {
    #[inline]
    pub(crate) fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    #[inline]
    pub(crate) fn raw(&self) -> u64 {
        self.0.get()
    }
}
