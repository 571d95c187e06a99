//! Open containers and their lifecycle.

mod metadata;

pub use metadata::{ContainerMetadata, DfdInfo, SliceInfo};

use crate::error::{TranscodeError, TranscodeResult};
use core::sync::atomic::{AtomicBool, Ordering};
use ktx2_transcode_bridge::{Bridge, ContainerId, ForeignBuffer};
use ktx2_transcode_common::{SliceIndex, SliceIter};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Lifecycle position of a [`ContainerHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Opened, metadata available, not yet prepared for transcoding.
    Open,
    /// Prepared for transcoding. There is no way back to [`HandleState::Open`].
    TranscodingStarted,
    /// Closed. Every further operation fails with [`TranscodeError::UseAfterClose`].
    Closed,
}

/// A container opened inside the engine.
///
/// The handle owns both the engine's container and the foreign buffer holding
/// the container bytes, which the engine may read from until the container is
/// closed. [`ContainerHandle::close`] releases both and reports failures;
/// dropping an open handle does the same but only logs them.
///
/// Slice operations take `&self` and may be called from several threads.
/// Starting and transcoding without a [`TranscodeState`](crate::TranscodeState)
/// both use the engine's built-in state for this container, so those calls
/// run one at a time. Give each thread its own state to transcode in
/// parallel, as [`ContainerHandle::par_transcode_all`] does.
pub struct ContainerHandle<'t> {
    bridge: &'t Bridge,
    id: Option<ContainerId>,
    data: Option<ForeignBuffer<'t>>,
    metadata: ContainerMetadata,
    started: AtomicBool,
    /// Held across every engine call that uses the built-in decode state.
    shared_state: Mutex<()>,
}

impl<'t> ContainerHandle<'t> {
    /// Opens the container in `bytes`.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::OpenFailed`] if the engine rejects the bytes.
    /// - Any error of [`ContainerMetadata`] validation. The container is closed
    ///   again before the error is returned.
    /// - [`TranscodeError::Bridge`] if copying the bytes into the engine fails.
    pub(crate) fn open(bridge: &'t Bridge, bytes: &[u8]) -> TranscodeResult<Self> {
        let data = bridge.allocate_from(bytes)?;
        let Some(id) = bridge.open_container(&data)? else {
            return Err(TranscodeError::OpenFailed { len: bytes.len() });
        };

        let metadata = match ContainerMetadata::query(bridge, &id) {
            Ok(metadata) => metadata,
            Err(e) => {
                if let Err(close_error) = bridge.close_container(id) {
                    warn!(error = %close_error, "failed to close rejected container");
                }
                return Err(e);
            }
        };

        debug!(
            width = metadata.width,
            height = metadata.height,
            levels = metadata.levels,
            layers = metadata.layers,
            faces = metadata.faces,
            source = ?metadata.source_format,
            "opened container"
        );
        Ok(Self {
            bridge,
            id: Some(id),
            data: Some(data),
            metadata,
            started: AtomicBool::new(false),
            shared_state: Mutex::new(()),
        })
    }

    /// The bridge this container was opened with.
    #[inline]
    pub fn bridge(&self) -> &'t Bridge {
        self.bridge
    }

    /// The metadata snapshot taken at open time. Still readable after close.
    #[inline]
    pub fn metadata(&self) -> &ContainerMetadata {
        &self.metadata
    }

    /// Current lifecycle position.
    pub fn state(&self) -> HandleState {
        if self.id.is_none() {
            HandleState::Closed
        } else if self.started.load(Ordering::Acquire) {
            HandleState::TranscodingStarted
        } else {
            HandleState::Open
        }
    }

    /// Every slice of the container, levels outermost and faces innermost.
    #[inline]
    pub fn slices(&self) -> SliceIter {
        self.metadata.slices()
    }

    /// Queries the per-slice properties of `slice`.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::UseAfterClose`] if the handle was closed.
    /// - [`TranscodeError::SliceOutOfRange`] if the slice does not exist.
    pub fn slice_info(&self, slice: SliceIndex) -> TranscodeResult<SliceInfo> {
        let id = self.id()?;
        self.check_slice(slice)?;
        SliceInfo::query(self.bridge, id, slice)
    }

    /// Prepares the container for transcoding.
    ///
    /// Repeated calls are no-ops. Transcoding functions call this themselves.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::UseAfterClose`] if the handle was closed.
    /// - [`TranscodeError::StartTranscodingFailed`] if the engine refuses.
    pub fn start_transcoding(&self) -> TranscodeResult<()> {
        let id = self.id()?;
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }

        let _shared = self.lock_shared_state();
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }
        if !self.bridge.start_transcoding(id)? {
            return Err(TranscodeError::StartTranscodingFailed);
        }
        self.started.store(true, Ordering::Release);
        debug!("started transcoding");
        Ok(())
    }

    /// Closes the container and frees its bytes.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::UseAfterClose`] if the handle was already closed.
    /// - [`TranscodeError::Bridge`] if the engine failed to close the container
    ///   or free its bytes. The handle is closed regardless.
    pub fn close(&mut self) -> TranscodeResult<()> {
        let id = self.id.take().ok_or(TranscodeError::UseAfterClose)?;
        let closed = self.bridge.close_container(id);
        let released = self.data.take().map_or(Ok(()), ForeignBuffer::release);
        debug!("closed container");
        closed?;
        released?;
        Ok(())
    }

    pub(crate) fn id(&self) -> TranscodeResult<&ContainerId> {
        self.id.as_ref().ok_or(TranscodeError::UseAfterClose)
    }

    /// Exclusive use of the engine's built-in decode state for this container.
    pub(crate) fn lock_shared_state(&self) -> MutexGuard<'_, ()> {
        self.shared_state.lock()
    }

    pub(crate) fn check_slice(&self, slice: SliceIndex) -> TranscodeResult<()> {
        if self.metadata.contains(slice) {
            Ok(())
        } else {
            Err(self.metadata.out_of_range(slice))
        }
    }
}

impl Drop for ContainerHandle<'_> {
    fn drop(&mut self) {
        if self.id.is_none() {
            return;
        }

        warn!("container handle dropped without close");
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close container on drop");
        }
    }
}

impl core::fmt::Debug for ContainerHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("state", &self.state())
            .field("metadata", &self.metadata)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    #[test]
    fn lifecycle_moves_forward_only() {
        let engine = ReferenceEngine::new();
        let transcoder = Transcoder::new(Bridge::new(engine.clone()));
        let mut handle = transcoder
            .open(&ReferenceContainer::new(8, 8).to_bytes())
            .unwrap();

        assert_eq!(handle.state(), HandleState::Open);
        handle.start_transcoding().unwrap();
        handle.start_transcoding().unwrap();
        assert_eq!(handle.state(), HandleState::TranscodingStarted);

        handle.close().unwrap();
        assert_eq!(handle.state(), HandleState::Closed);
        assert_eq!(engine.open_containers(), 0);
        assert_eq!(engine.live_allocations(), 0);
    }

    #[test]
    fn operations_after_close_are_rejected() {
        let engine = ReferenceEngine::new();
        let transcoder = Transcoder::new(Bridge::new(engine.clone()));
        let mut handle = transcoder
            .open(&ReferenceContainer::new(8, 8).to_bytes())
            .unwrap();
        handle.close().unwrap();

        assert!(matches!(handle.close(), Err(TranscodeError::UseAfterClose)));
        assert!(matches!(
            handle.start_transcoding(),
            Err(TranscodeError::UseAfterClose)
        ));
        assert!(matches!(
            handle.slice_info(SliceIndex::default()),
            Err(TranscodeError::UseAfterClose)
        ));
        assert!(matches!(
            handle.resolve("RGBA32"),
            Err(TranscodeError::UseAfterClose)
        ));
        assert_eq!(engine.invalid_closes(), 0);
        assert_eq!(handle.metadata().width, 8);
    }

    #[test]
    fn drop_closes_open_handle() {
        let engine = ReferenceEngine::new();
        let transcoder = Transcoder::new(Bridge::new(engine.clone()));
        {
            let handle = transcoder
                .open(&ReferenceContainer::new(4, 4).to_bytes())
                .unwrap();
            handle.start_transcoding().unwrap();
            assert_eq!(engine.open_containers(), 1);
        }
        assert_eq!(engine.open_containers(), 0);
        assert_eq!(engine.live_allocations(), 0);
    }

    #[test]
    fn rejected_bytes_leave_nothing_allocated() {
        let engine = ReferenceEngine::new();
        let transcoder = Transcoder::new(Bridge::new(engine.clone()));
        let err = transcoder.open(b"definitely not a container").unwrap_err();

        assert!(matches!(err, TranscodeError::OpenFailed { len: 26 }));
        assert_eq!(engine.live_allocations(), 0);
    }

    #[test]
    fn metadata_reflects_container() {
        let engine = ReferenceEngine::new();
        let transcoder = Transcoder::new(Bridge::new(engine));
        let container = ReferenceContainer::new(32, 16)
            .with_levels(3)
            .with_layers(2)
            .with_faces(6)
            .with_alpha(true)
            .with_video(true)
            .with_nit_multiplier(100.0)
            .with_source_format(SourceBlockFormat::AstcLdr8x5);
        let handle = transcoder.open(&container.to_bytes()).unwrap();
        let metadata = handle.metadata();

        assert_eq!((metadata.width, metadata.height), (32, 16));
        assert_eq!((metadata.levels, metadata.layers, metadata.faces), (3, 2, 6));
        assert_eq!((metadata.block_width, metadata.block_height), (8, 5));
        assert!(metadata.is_ldr && !metadata.is_hdr);
        assert!(metadata.is_astc_ldr && !metadata.is_xuastc_ldr);
        assert!(metadata.has_alpha && metadata.is_video && metadata.is_srgb);
        assert_eq!(metadata.ldr_hdr_nit_multiplier, 100.0);
        assert_eq!(handle.slices().count(), 36);
    }

    #[rstest]
    #[case(SliceIndex::new(1, 0, 0), (8, 4), (8, 4), (2, 1))]
    #[case(SliceIndex::new(2, 1, 0), (4, 2), (4, 4), (1, 1))]
    fn slice_info_follows_level(
        #[case] slice: SliceIndex,
        #[case] orig: (u32, u32),
        #[case] actual: (u32, u32),
        #[case] blocks: (u32, u32),
    ) {
        let transcoder = Transcoder::new(Bridge::new(ReferenceEngine::new()));
        let container = ReferenceContainer::new(16, 8).with_levels(3).with_layers(2);
        let handle = transcoder.open(&container.to_bytes()).unwrap();
        let info = handle.slice_info(slice).unwrap();

        assert_eq!(info.slice, slice);
        assert_eq!((info.orig_width, info.orig_height), orig);
        assert_eq!((info.actual_width, info.actual_height), actual);
        assert_eq!((info.num_blocks_x, info.num_blocks_y), blocks);
        assert_eq!(info.total_blocks, blocks.0 * blocks.1);
        assert!(!info.has_alpha && !info.is_iframe);
    }

    #[test]
    fn slice_info_rejects_missing_slice() {
        let transcoder = Transcoder::new(Bridge::new(ReferenceEngine::new()));
        let handle = transcoder
            .open(&ReferenceContainer::new(4, 4).to_bytes())
            .unwrap();
        let err = handle.slice_info(SliceIndex::new(0, 1, 0)).unwrap_err();
        assert!(matches!(
            err,
            TranscodeError::SliceOutOfRange {
                levels: 1,
                layers: 0,
                faces: 1,
                ..
            }
        ));
    }
}
