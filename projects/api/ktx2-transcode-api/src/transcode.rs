//! Slice transcoding.

use crate::container::ContainerHandle;
use crate::error::{TranscodeError, TranscodeResult};
use crate::options::TranscodeOptions;
use crate::state::TranscodeState;
use ktx2_transcode_bridge::SliceQuery;
use ktx2_transcode_common::{SliceIndex, TargetFormat};
use tracing::{trace, warn};

/// The output of transcoding one slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodedSlice {
    pub slice: SliceIndex,
    pub target: TargetFormat,
    /// Original (unpadded) width of the slice.
    pub width: u32,
    /// Original (unpadded) height of the slice.
    pub height: u32,
    /// Block dimensions of `target`; `None` for uncompressed formats.
    pub block_dims: Option<(u32, u32)>,
    pub data: Vec<u8>,
}

impl TranscodedSlice {
    /// Block width, if the target is block compressed.
    #[inline]
    pub fn block_width(&self) -> Option<u32> {
        self.block_dims.map(|(width, _)| width)
    }

    /// Block height, if the target is block compressed.
    #[inline]
    pub fn block_height(&self) -> Option<u32> {
        self.block_dims.map(|(_, height)| height)
    }
}

impl ContainerHandle<'_> {
    /// Transcodes one slice to `target`.
    ///
    /// Starts transcoding first if that has not happened yet. The output
    /// buffer is allocated in the engine for the duration of the call and
    /// released on every path, including failures.
    ///
    /// `state` is optional scratch state; `None` lets the engine use its own,
    /// in which case calls on this handle are serialized.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::UseAfterClose`] if the handle was closed.
    /// - [`TranscodeError::SliceOutOfRange`] if the slice does not exist.
    /// - [`TranscodeError::UnsupportedFormat`] if the engine reports a zero
    ///   output size. Nothing is allocated in that case.
    /// - [`TranscodeError::TranscodeFailed`] if the engine reports failure.
    /// - [`TranscodeError::Bridge`] if an engine call fails.
    pub fn transcode_slice(
        &self,
        target: TargetFormat,
        slice: SliceIndex,
        options: &TranscodeOptions,
        state: Option<&TranscodeState<'_>>,
    ) -> TranscodeResult<TranscodedSlice> {
        let id = self.id()?;
        self.check_slice(slice)?;
        self.start_transcoding()?;

        let bridge = self.bridge();
        let width = bridge.slice_value(id, SliceQuery::OrigWidth, slice)?;
        let height = bridge.slice_value(id, SliceQuery::OrigHeight, slice)?;

        let size = bridge.transcoded_size(target, width, height)?;
        if size == 0 {
            return Err(TranscodeError::UnsupportedFormat {
                target,
                width,
                height,
            });
        }

        let mut output = bridge.allocate(size as usize)?;
        let request = options.request(slice, target);
        let ok = match state.and_then(TranscodeState::id) {
            Some(state_id) => {
                bridge.transcode_image_level(id, &request, &mut output, Some(state_id))?
            }
            None => {
                let _shared = self.lock_shared_state();
                bridge.transcode_image_level(id, &request, &mut output, None)?
            }
        };
        if !ok {
            if let Err(e) = output.release() {
                warn!(error = %e, "failed to release output after failed transcode");
            }
            return Err(TranscodeError::TranscodeFailed { slice, target });
        }

        let data = output.to_vec()?;
        output.release()?;
        trace!(%slice, %target, len = data.len(), "transcoded slice");

        Ok(TranscodedSlice {
            slice,
            target,
            width,
            height,
            block_dims: bridge.target_block_dims(target)?,
            data,
        })
    }

    /// Transcodes every slice, levels outermost and faces innermost.
    ///
    /// Stops at the first failure.
    pub fn transcode_all(
        &self,
        target: TargetFormat,
        options: &TranscodeOptions,
    ) -> TranscodeResult<Vec<TranscodedSlice>> {
        self.start_transcoding()?;
        self.slices()
            .map(|slice| self.transcode_slice(target, slice, options, None))
            .collect()
    }

    /// [`ContainerHandle::transcode_all`] on the rayon thread pool.
    ///
    /// Each worker creates its own [`TranscodeState`]. If the engine cannot
    /// create one, that worker runs without. Results are in slice order.
    #[cfg(feature = "multithreaded")]
    pub fn par_transcode_all(
        &self,
        target: TargetFormat,
        options: &TranscodeOptions,
    ) -> TranscodeResult<Vec<TranscodedSlice>> {
        use rayon::prelude::*;

        self.start_transcoding()?;
        let slices: Vec<SliceIndex> = self.slices().collect();
        slices
            .par_iter()
            .map_init(
                || match TranscodeState::create(self.bridge()) {
                    Ok(state) => Some(state),
                    Err(e) => {
                        warn!(error = %e, "transcoding without scratch state");
                        None
                    }
                },
                |state, &slice| self.transcode_slice(target, slice, options, state.as_ref()),
            )
            .collect()
    }
}
