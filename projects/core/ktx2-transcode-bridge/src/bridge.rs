//! Typed access to a loaded engine.

use crate::buffer::ForeignBuffer;
use crate::engine::{
    BackendKind, ContainerQuery, SliceQuery, SourceFormatQuery, TargetFormatQuery, TranscodeCall,
    TranscoderEngine,
};
use crate::error::{BridgeError, BridgeResult};
use crate::format_info::{SourceFormatInfo, TargetFormatInfo};
use crate::handles::{ContainerId, TranscodeStateId};
use ktx2_transcode_common::{DecodeFlags, SliceIndex, SourceBlockFormat, TargetFormat};
use tracing::{debug, trace};

/// Parameters of a single image-level transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLevelRequest {
    pub slice: SliceIndex,
    pub target: TargetFormat,
    pub decode_flags: DecodeFlags,
    /// `None` lets the engine pick the tightly packed pitch.
    pub row_pitch: Option<u32>,
    /// `None` lets the engine use the image height.
    pub rows_in_pixels: Option<u32>,
    /// `None` lets the engine pick its default source channel.
    pub channel0: Option<u8>,
    /// `None` lets the engine pick its default source channel.
    pub channel1: Option<u8>,
}

impl ImageLevelRequest {
    /// Request with every override left at the engine default.
    pub fn new(slice: SliceIndex, target: TargetFormat) -> Self {
        Self {
            slice,
            target,
            decode_flags: DecodeFlags::NONE,
            row_pitch: None,
            rows_in_pixels: None,
            channel0: None,
            channel1: None,
        }
    }
}

/// A loaded transcoder engine together with typed wrappers for its entry points.
///
/// The bridge is the engine instance: create one per engine and pass it (by
/// reference) to everything that needs it. Any number of bridges may coexist.
///
/// All methods are synchronous and run the engine call on the calling thread.
pub struct Bridge {
    engine: Box<dyn TranscoderEngine>,
}

impl Bridge {
    /// Wraps an already loaded engine.
    pub fn new<E: TranscoderEngine + 'static>(engine: E) -> Self {
        Self::from_boxed(Box::new(engine))
    }

    /// Wraps an already loaded, boxed engine.
    pub fn from_boxed(engine: Box<dyn TranscoderEngine>) -> Self {
        Self { engine }
    }

    /// The kind of backend in use.
    #[inline]
    pub fn backend(&self) -> BackendKind {
        self.engine.backend()
    }

    /// The raw engine, for callers that need an entry point not wrapped here.
    #[inline]
    pub fn engine(&self) -> &dyn TranscoderEngine {
        self.engine.as_ref()
    }

    /// Engine version number.
    pub fn version(&self) -> BridgeResult<u32> {
        self.engine.version()
    }

    /// Toggles the engine's own diagnostic printing.
    pub fn enable_debug_printf(&self, enabled: bool) -> BridgeResult<()> {
        self.engine.enable_debug_printf(enabled)
    }

    /// Allocates `len` bytes of foreign memory.
    ///
    /// # Errors
    ///
    /// [`BridgeError::OutOfForeignMemory`] when the engine's heap is exhausted.
    pub fn allocate(&self, len: usize) -> BridgeResult<ForeignBuffer<'_>> {
        ForeignBuffer::allocate(self.engine.as_ref(), len)
    }

    /// Allocates a buffer holding a copy of `data`.
    pub fn allocate_from(&self, data: &[u8]) -> BridgeResult<ForeignBuffer<'_>> {
        let mut buffer = self.allocate(data.len())?;
        buffer.write(0, data)?;
        Ok(buffer)
    }

    /// Queries every helper for a target format.
    pub fn target_format_info(&self, format: TargetFormat) -> BridgeResult<TargetFormatInfo> {
        let value = |query| self.engine.target_format_query(query, format.as_raw());
        Ok(TargetFormatInfo {
            format,
            bytes_per_block_or_pixel: value(TargetFormatQuery::BytesPerBlockOrPixel)?,
            has_alpha: value(TargetFormatQuery::HasAlpha)? != 0,
            is_hdr: value(TargetFormatQuery::IsHdr)? != 0,
            is_ldr: value(TargetFormatQuery::IsLdr)? != 0,
            is_astc: value(TargetFormatQuery::IsAstc)? != 0,
            is_uncompressed: value(TargetFormatQuery::IsUncompressed)? != 0,
            uncompressed_bytes_per_pixel: value(TargetFormatQuery::UncompressedBytesPerPixel)?,
            block_width: value(TargetFormatQuery::BlockWidth)?,
            block_height: value(TargetFormatQuery::BlockHeight)?,
        })
    }

    /// Asks the engine whether a target format is HDR.
    pub fn target_is_hdr(&self, format: TargetFormat) -> BridgeResult<bool> {
        Ok(self
            .engine
            .target_format_query(TargetFormatQuery::IsHdr, format.as_raw())?
            != 0)
    }

    /// Block dimensions of a target format, `None` for uncompressed formats.
    pub fn target_block_dims(&self, format: TargetFormat) -> BridgeResult<Option<(u32, u32)>> {
        let raw = format.as_raw();
        if self
            .engine
            .target_format_query(TargetFormatQuery::IsUncompressed, raw)?
            != 0
        {
            return Ok(None);
        }

        Ok(Some((
            self.engine
                .target_format_query(TargetFormatQuery::BlockWidth, raw)?,
            self.engine
                .target_format_query(TargetFormatQuery::BlockHeight, raw)?,
        )))
    }

    /// Queries every helper for a source block format.
    pub fn source_format_info(&self, format: SourceBlockFormat) -> BridgeResult<SourceFormatInfo> {
        let value = |query| self.engine.source_format_query(query, format.as_raw());
        Ok(SourceFormatInfo {
            format,
            is_xuastc_ldr: value(SourceFormatQuery::IsXuastcLdr)? != 0,
            is_astc_ldr: value(SourceFormatQuery::IsAstcLdr)? != 0,
            is_hdr: value(SourceFormatQuery::IsHdr)? != 0,
            is_ldr: value(SourceFormatQuery::IsLdr)? != 0,
            block_width: value(SourceFormatQuery::BlockWidth)?,
            block_height: value(SourceFormatQuery::BlockHeight)?,
        })
    }

    /// The target format exactly matching a source's block configuration.
    pub fn matching_target(&self, source: SourceBlockFormat) -> BridgeResult<TargetFormat> {
        let raw = self.engine.matching_target(source.as_raw())?;
        Ok(TargetFormat::try_from(raw)?)
    }

    /// Whether the engine was built with support for transcoding `source` to `target`.
    pub fn is_format_supported(
        &self,
        target: TargetFormat,
        source: SourceBlockFormat,
    ) -> BridgeResult<bool> {
        Ok(self
            .engine
            .is_format_supported(target.as_raw(), source.as_raw())?
            != 0)
    }

    /// Bytes needed for one transcoded image. 0 means the engine cannot produce it.
    pub fn transcoded_size(
        &self,
        target: TargetFormat,
        width: u32,
        height: u32,
    ) -> BridgeResult<u32> {
        self.engine.transcoded_size(target.as_raw(), width, height)
    }

    /// Opens the container held in `data`. `None` if the engine rejects the bytes.
    ///
    /// The engine may keep referring to `data` until the container is closed.
    pub fn open_container(&self, data: &ForeignBuffer<'_>) -> BridgeResult<Option<ContainerId>> {
        let len = u32::try_from(data.len()).map_err(|_| BridgeError::LengthOverflow(data.len()))?;
        let raw = self.engine.ktx2_open(data.address(), len)?;
        let id = ContainerId::from_raw(raw);
        debug!(len, opened = id.is_some(), "opened container");
        Ok(id)
    }

    /// Closes a container. The id is consumed, so it cannot be closed twice.
    pub fn close_container(&self, id: ContainerId) -> BridgeResult<()> {
        debug!(handle = id.raw(), "closing container");
        self.engine.ktx2_close(id.raw())
    }

    /// A numeric container property.
    pub fn container_value(&self, id: &ContainerId, query: ContainerQuery) -> BridgeResult<u32> {
        trace!(export = query.export_name(), "container query");
        self.engine.container_query(query, id.raw())
    }

    /// A boolean container property.
    pub fn container_flag(&self, id: &ContainerId, query: ContainerQuery) -> BridgeResult<bool> {
        Ok(self.container_value(id, query)? != 0)
    }

    /// The container's source block format.
    pub fn container_source_format(&self, id: &ContainerId) -> BridgeResult<SourceBlockFormat> {
        let raw = self.container_value(id, ContainerQuery::SourceFormat)?;
        Ok(SourceBlockFormat::try_from(raw)?)
    }

    /// The LDR to HDR up-conversion multiplier, in nits.
    pub fn nit_multiplier(&self, id: &ContainerId) -> BridgeResult<f32> {
        self.engine.nit_multiplier(id.raw())
    }

    /// A per-slice property.
    pub fn slice_value(
        &self,
        id: &ContainerId,
        query: SliceQuery,
        slice: SliceIndex,
    ) -> BridgeResult<u32> {
        trace!(export = query.export_name(), %slice, "slice query");
        self.engine
            .slice_query(query, id.raw(), slice.level, slice.layer, slice.face)
    }

    /// Prepares a container for transcoding. Safe to call more than once.
    pub fn start_transcoding(&self, id: &ContainerId) -> BridgeResult<bool> {
        Ok(self.engine.start_transcoding(id.raw())? != 0)
    }

    /// Creates scratch decode state. `None` if the engine could not create one.
    pub fn create_transcode_state(&self) -> BridgeResult<Option<TranscodeStateId>> {
        let raw = self.engine.create_transcode_state()?;
        Ok(TranscodeStateId::from_raw(raw))
    }

    /// Destroys scratch decode state.
    pub fn destroy_transcode_state(&self, state: TranscodeStateId) -> BridgeResult<()> {
        self.engine.destroy_transcode_state(state.raw())
    }

    /// Transcodes one slice into `output`. Returns the engine's success flag.
    ///
    /// The output capacity is passed to the engine in blocks (or pixels for
    /// uncompressed formats), derived from the buffer length.
    pub fn transcode_image_level(
        &self,
        id: &ContainerId,
        request: &ImageLevelRequest,
        output: &mut ForeignBuffer<'_>,
        state: Option<&TranscodeStateId>,
    ) -> BridgeResult<bool> {
        let unit = self
            .engine
            .target_format_query(
                TargetFormatQuery::BytesPerBlockOrPixel,
                request.target.as_raw(),
            )?
            .max(1) as usize;
        let capacity = output.len() / unit;

        let call = TranscodeCall {
            handle: id.raw(),
            level: request.slice.level,
            layer: request.slice.layer,
            face: request.slice.face,
            output: output.address(),
            output_blocks_or_pixels: u32::try_from(capacity)
                .map_err(|_| BridgeError::LengthOverflow(capacity))?,
            target_format: request.target.as_raw(),
            decode_flags: request.decode_flags.bits(),
            row_pitch: request.row_pitch.unwrap_or(0),
            rows_in_pixels: request.rows_in_pixels.unwrap_or(0),
            channel0: request.channel0.map_or(-1, i32::from),
            channel1: request.channel1.map_or(-1, i32::from),
            state: state.map_or(0, TranscodeStateId::raw),
        };

        trace!(?call, "transcode_image_level");
        Ok(self.engine.transcode_image_level(&call)? != 0)
    }
}

impl core::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bridge")
            .field("backend", &self.backend())
            .finish_non_exhaustive()
    }
}
