//! Entry point owning the engine bridge.

use crate::container::ContainerHandle;
use crate::error::TranscodeResult;
use crate::options::TranscodeOptions;
use crate::state::TranscodeState;
use crate::transcode::TranscodedSlice;
use ktx2_transcode_bridge::{Bridge, EngineConfig};
use ktx2_transcode_common::SliceIndex;

/// Opens containers on one engine instance.
///
/// A transcoder wraps exactly one [`Bridge`]. Create as many as needed; they
/// share nothing. Handles and scratch states borrow the transcoder, so they
/// cannot outlive the engine they were created on.
#[derive(Debug)]
pub struct Transcoder {
    bridge: Bridge,
}

impl Transcoder {
    /// Wraps an already constructed bridge.
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Loads an engine as described by `config`.
    pub fn from_config(config: &EngineConfig) -> TranscodeResult<Self> {
        Ok(Self::new(Bridge::from_config(config)?))
    }

    /// The underlying bridge, for engine-level queries.
    #[inline]
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Copies `bytes` into the engine and opens them as a container.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::OpenFailed`](crate::TranscodeError::OpenFailed) if
    ///   the engine rejects the bytes.
    /// - [`TranscodeError::EmptyContainer`](crate::TranscodeError::EmptyContainer)
    ///   or [`TranscodeError::InvalidMetadata`](crate::TranscodeError::InvalidMetadata)
    ///   if the reported metadata is unusable.
    pub fn open(&self, bytes: &[u8]) -> TranscodeResult<ContainerHandle<'_>> {
        ContainerHandle::open(&self.bridge, bytes)
    }

    /// Creates scratch state for one thread.
    pub fn create_state(&self) -> TranscodeResult<TranscodeState<'_>> {
        TranscodeState::create(&self.bridge)
    }

    /// Opens `bytes`, resolves `family`, transcodes one slice and closes the container.
    pub fn transcode(
        &self,
        bytes: &[u8],
        family: &str,
        slice: SliceIndex,
        options: &TranscodeOptions,
    ) -> TranscodeResult<TranscodedSlice> {
        let mut handle = self.open(bytes)?;
        let target = handle.resolve(family)?;
        let result = handle.transcode_slice(target, slice, options, None)?;
        handle.close()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    #[test]
    fn one_shot_transcode_cleans_up() {
        let engine = ReferenceEngine::new();
        let transcoder = Transcoder::new(Bridge::new(engine.clone()));
        let container = ReferenceContainer::new(16, 16);

        let result = transcoder
            .transcode(
                &container.to_bytes(),
                "rgba32",
                SliceIndex::default(),
                &TranscodeOptions::new(),
            )
            .unwrap();
        assert_eq!(result.data.len(), 1024);
        assert_eq!(engine.open_containers(), 0);
        assert_eq!(engine.live_allocations(), 0);
    }

    #[test]
    fn one_shot_transcode_cleans_up_on_error() {
        let engine = ReferenceEngine::new();
        let transcoder = Transcoder::new(Bridge::new(engine.clone()));
        let container = ReferenceContainer::new(16, 16);

        let err = transcoder
            .transcode(
                &container.to_bytes(),
                "BC6H",
                SliceIndex::default(),
                &TranscodeOptions::new(),
            )
            .unwrap_err();
        assert!(matches!(err, TranscodeError::FormatMismatch { .. }));
        assert_eq!(engine.open_containers(), 0);
        assert_eq!(engine.live_allocations(), 0);
    }

    #[test]
    fn independent_transcoders_share_nothing() {
        let first = ReferenceEngine::new();
        let second = ReferenceEngine::new();
        let a = Transcoder::new(Bridge::new(first.clone()));
        let b = Transcoder::new(Bridge::new(second.clone()));

        let _handle = a
            .open(&ReferenceContainer::new(4, 4).to_bytes())
            .unwrap();
        assert_eq!(first.open_containers(), 1);
        assert_eq!(second.open_containers(), 0);
        drop(b);
    }
}
