//! Snapshots of container and slice properties.

use crate::error::{TranscodeError, TranscodeResult};
use ktx2_transcode_bridge::{Bridge, ContainerId, ContainerQuery, SliceQuery};
use ktx2_transcode_common::{effective_layer_count, SliceIndex, SliceIter, SourceBlockFormat};

/// Data format descriptor fields reported by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DfdInfo {
    pub color_model: u32,
    pub color_primaries: u32,
    pub transfer_function: u32,
    pub flags: u32,
    pub total_samples: u32,
    pub channel_id0: u32,
    pub channel_id1: u32,
}

/// Container properties, queried once when the container is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerMetadata {
    pub width: u32,
    pub height: u32,
    pub levels: u32,
    /// 1 for 2D textures, 6 for cubemaps.
    pub faces: u32,
    /// Raw layer count; 0 means the container is not an array.
    pub layers: u32,
    pub source_format: SourceBlockFormat,
    pub block_width: u32,
    pub block_height: u32,
    pub is_hdr: bool,
    pub is_ldr: bool,
    pub is_srgb: bool,
    pub has_alpha: bool,
    pub is_video: bool,
    pub is_etc1s: bool,
    pub is_uastc_ldr_4x4: bool,
    pub is_hdr_4x4: bool,
    pub is_hdr_6x6: bool,
    pub is_astc_ldr: bool,
    pub is_xuastc_ldr: bool,
    pub dfd: DfdInfo,
    /// Multiplier applied when LDR content is up-converted to HDR, in nits.
    pub ldr_hdr_nit_multiplier: f32,
}

impl ContainerMetadata {
    /// Queries every property of an open container and checks its invariants.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::EmptyContainer`] for zero width, height or levels.
    /// - [`TranscodeError::InvalidMetadata`] if the HDR and LDR flags are both
    ///   set, the face count is neither 1 nor 6, or a block dimension is
    ///   outside `4..=12`.
    /// - [`TranscodeError::Bridge`] if a query fails.
    pub(crate) fn query(bridge: &Bridge, id: &ContainerId) -> TranscodeResult<Self> {
        let value = |query| bridge.container_value(id, query);
        let flag = |query| bridge.container_flag(id, query);

        let metadata = Self {
            width: value(ContainerQuery::Width)?,
            height: value(ContainerQuery::Height)?,
            levels: value(ContainerQuery::Levels)?,
            faces: value(ContainerQuery::Faces)?,
            layers: value(ContainerQuery::Layers)?,
            source_format: bridge.container_source_format(id)?,
            block_width: value(ContainerQuery::BlockWidth)?,
            block_height: value(ContainerQuery::BlockHeight)?,
            is_hdr: flag(ContainerQuery::IsHdr)?,
            is_ldr: flag(ContainerQuery::IsLdr)?,
            is_srgb: flag(ContainerQuery::IsSrgb)?,
            has_alpha: flag(ContainerQuery::HasAlpha)?,
            is_video: flag(ContainerQuery::IsVideo)?,
            is_etc1s: flag(ContainerQuery::IsEtc1s)?,
            is_uastc_ldr_4x4: flag(ContainerQuery::IsUastcLdr4x4)?,
            is_hdr_4x4: flag(ContainerQuery::IsHdr4x4)?,
            is_hdr_6x6: flag(ContainerQuery::IsHdr6x6)?,
            is_astc_ldr: flag(ContainerQuery::IsAstcLdr)?,
            is_xuastc_ldr: flag(ContainerQuery::IsXuastcLdr)?,
            dfd: DfdInfo {
                color_model: value(ContainerQuery::DfdColorModel)?,
                color_primaries: value(ContainerQuery::DfdColorPrimaries)?,
                transfer_function: value(ContainerQuery::DfdTransferFunction)?,
                flags: value(ContainerQuery::DfdFlags)?,
                total_samples: value(ContainerQuery::DfdTotalSamples)?,
                channel_id0: value(ContainerQuery::DfdChannelId0)?,
                channel_id1: value(ContainerQuery::DfdChannelId1)?,
            },
            ldr_hdr_nit_multiplier: bridge.nit_multiplier(id)?,
        };
        metadata.validate()?;
        Ok(metadata)
    }

    pub(crate) fn validate(&self) -> TranscodeResult<()> {
        if self.width == 0 || self.height == 0 || self.levels == 0 {
            return Err(TranscodeError::EmptyContainer);
        }
        if self.is_hdr && self.is_ldr {
            return Err(TranscodeError::InvalidMetadata("both HDR and LDR"));
        }
        if self.faces != 1 && self.faces != 6 {
            return Err(TranscodeError::InvalidMetadata("face count must be 1 or 6"));
        }
        let block_range = 4..=12;
        if !block_range.contains(&self.block_width) || !block_range.contains(&self.block_height) {
            return Err(TranscodeError::InvalidMetadata("block dimensions outside 4..=12"));
        }
        Ok(())
    }

    /// Layer count used for iteration: 1 when the container is not an array.
    #[inline]
    pub fn effective_layers(&self) -> u32 {
        effective_layer_count(self.layers)
    }

    /// Number of slices in the container.
    #[inline]
    pub fn slice_count(&self) -> usize {
        self.slices().total()
    }

    /// Every slice, levels outermost and faces innermost.
    #[inline]
    pub fn slices(&self) -> SliceIter {
        SliceIndex::iter_all(self.levels, self.layers, self.faces)
    }

    /// Whether `slice` exists in the container.
    #[inline]
    pub fn contains(&self, slice: SliceIndex) -> bool {
        slice.is_within(self.levels, self.layers, self.faces)
    }

    /// The error for a slice outside this container.
    pub(crate) fn out_of_range(&self, slice: SliceIndex) -> TranscodeError {
        TranscodeError::SliceOutOfRange {
            slice,
            levels: self.levels,
            layers: self.layers,
            faces: self.faces,
        }
    }
}

/// Properties of one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceInfo {
    pub slice: SliceIndex,
    pub orig_width: u32,
    pub orig_height: u32,
    /// Width padded to whole blocks.
    pub actual_width: u32,
    /// Height padded to whole blocks.
    pub actual_height: u32,
    pub num_blocks_x: u32,
    pub num_blocks_y: u32,
    pub total_blocks: u32,
    pub has_alpha: bool,
    /// Video key frame.
    pub is_iframe: bool,
}

impl SliceInfo {
    pub(crate) fn query(
        bridge: &Bridge,
        id: &ContainerId,
        slice: SliceIndex,
    ) -> TranscodeResult<Self> {
        let value = |query| bridge.slice_value(id, query, slice);
        Ok(Self {
            slice,
            orig_width: value(SliceQuery::OrigWidth)?,
            orig_height: value(SliceQuery::OrigHeight)?,
            actual_width: value(SliceQuery::ActualWidth)?,
            actual_height: value(SliceQuery::ActualHeight)?,
            num_blocks_x: value(SliceQuery::NumBlocksX)?,
            num_blocks_y: value(SliceQuery::NumBlocksY)?,
            total_blocks: value(SliceQuery::TotalBlocks)?,
            has_alpha: value(SliceQuery::AlphaFlag)? != 0,
            is_iframe: value(SliceQuery::IFrameFlag)? != 0,
        })
    }
}
