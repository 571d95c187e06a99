//! Format properties as reported by the engine.

use ktx2_transcode_common::{SourceBlockFormat, TargetFormat};

/// Properties of a target format, answered by the engine's helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFormatInfo {
    pub format: TargetFormat,
    pub bytes_per_block_or_pixel: u32,
    pub has_alpha: bool,
    pub is_hdr: bool,
    pub is_ldr: bool,
    pub is_astc: bool,
    pub is_uncompressed: bool,
    /// 0 for block formats.
    pub uncompressed_bytes_per_pixel: u32,
    pub block_width: u32,
    pub block_height: u32,
}

impl TargetFormatInfo {
    /// Block dimensions, or `None` for uncompressed formats.
    #[inline]
    pub fn block_dims(&self) -> Option<(u32, u32)> {
        (!self.is_uncompressed).then_some((self.block_width, self.block_height))
    }
}

/// Properties of a source block format, answered by the engine's helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFormatInfo {
    pub format: SourceBlockFormat,
    pub is_xuastc_ldr: bool,
    pub is_astc_ldr: bool,
    pub is_hdr: bool,
    pub is_ldr: bool,
    pub block_width: u32,
    pub block_height: u32,
}
