//! Concrete output formats understood by the transcoder.
//!
//! The discriminants are the values the foreign engine expects on the wire, so
//! they must never be renumbered.

use crate::error::{InvalidEnumValue, UnknownFormatKind};
use derive_enum_all_values::AllValues;

/// A resolved, engine-recognized output texture format.
///
/// Block-compressed formats store fixed size texel blocks; the uncompressed
/// formats ([`TargetFormat::Rgba32`], [`TargetFormat::RgbaHalf`], ...) store
/// one pixel per "block".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AllValues)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum TargetFormat {
    /// ETC1 RGB, 8 bytes per 4x4 block.
    Etc1Rgb = 0,
    /// ETC2 RGBA (EAC alpha), 16 bytes per 4x4 block.
    Etc2Rgba = 1,
    /// BC1 (DXT1) RGB, 8 bytes per 4x4 block.
    Bc1Rgb = 2,
    /// BC3 (DXT5) RGBA, 16 bytes per 4x4 block.
    Bc3Rgba = 3,
    /// BC4 single channel, 8 bytes per 4x4 block.
    Bc4R = 4,
    /// BC5 two channels, 16 bytes per 4x4 block.
    Bc5Rg = 5,
    /// BC7 RGBA, 16 bytes per 4x4 block.
    Bc7Rgba = 6,
    /// PVRTC1 4bpp RGB.
    Pvrtc1Rgb = 8,
    /// PVRTC1 4bpp RGBA.
    Pvrtc1Rgba = 9,
    /// ASTC LDR 4x4.
    AstcLdr4x4 = 10,
    /// ATC RGB.
    AtcRgb = 11,
    /// ATC RGBA (interpolated alpha).
    AtcRgba = 12,
    /// Uncompressed 32bpp RGBA.
    Rgba32 = 13,
    /// Uncompressed 16bpp RGB565.
    Rgb565 = 14,
    /// Uncompressed 16bpp BGR565.
    Bgr565 = 15,
    /// Uncompressed 16bpp RGBA4444.
    Rgba4444 = 16,
    /// FXT1 RGB, 16 bytes per 8x4 block.
    Fxt1Rgb = 17,
    /// PVRTC2 4bpp RGB.
    Pvrtc2Rgb = 18,
    /// PVRTC2 4bpp RGBA.
    Pvrtc2Rgba = 19,
    /// ETC2 EAC R11.
    Etc2EacR11 = 20,
    /// ETC2 EAC RG11.
    Etc2EacRg11 = 21,
    /// BC6H unsigned half float.
    Bc6h = 22,
    /// ASTC HDR 4x4.
    AstcHdr4x4 = 23,
    /// Uncompressed half float RGB, 6 bytes per pixel.
    RgbHalf = 24,
    /// Uncompressed half float RGBA, 8 bytes per pixel.
    RgbaHalf = 25,
    /// Uncompressed shared exponent RGB9E5, 4 bytes per pixel.
    Rgb9e5 = 26,
    /// ASTC HDR 6x6.
    AstcHdr6x6 = 27,
    /// ASTC LDR 5x4.
    AstcLdr5x4 = 28,
    /// ASTC LDR 5x5.
    AstcLdr5x5 = 29,
    /// ASTC LDR 6x5.
    AstcLdr6x5 = 30,
    /// ASTC LDR 6x6.
    AstcLdr6x6 = 31,
    /// ASTC LDR 8x5.
    AstcLdr8x5 = 32,
    /// ASTC LDR 8x6.
    AstcLdr8x6 = 33,
    /// ASTC LDR 10x5.
    AstcLdr10x5 = 34,
    /// ASTC LDR 10x6.
    AstcLdr10x6 = 35,
    /// ASTC LDR 8x8.
    AstcLdr8x8 = 36,
    /// ASTC LDR 10x8.
    AstcLdr10x8 = 37,
    /// ASTC LDR 10x10.
    AstcLdr10x10 = 38,
    /// ASTC LDR 12x10.
    AstcLdr12x10 = 39,
    /// ASTC LDR 12x12.
    AstcLdr12x12 = 40,
}

impl TargetFormat {
    /// Raw value passed across the engine boundary.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Human readable name, matching the engine's naming.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Etc1Rgb => "ETC1_RGB",
            Self::Etc2Rgba => "ETC2_RGBA",
            Self::Bc1Rgb => "BC1_RGB",
            Self::Bc3Rgba => "BC3_RGBA",
            Self::Bc4R => "BC4_R",
            Self::Bc5Rg => "BC5_RG",
            Self::Bc7Rgba => "BC7_RGBA",
            Self::Pvrtc1Rgb => "PVRTC1_4_RGB",
            Self::Pvrtc1Rgba => "PVRTC1_4_RGBA",
            Self::AstcLdr4x4 => "ASTC_LDR_4X4",
            Self::AtcRgb => "ATC_RGB",
            Self::AtcRgba => "ATC_RGBA",
            Self::Rgba32 => "RGBA32",
            Self::Rgb565 => "RGB565",
            Self::Bgr565 => "BGR565",
            Self::Rgba4444 => "RGBA4444",
            Self::Fxt1Rgb => "FXT1_RGB",
            Self::Pvrtc2Rgb => "PVRTC2_4_RGB",
            Self::Pvrtc2Rgba => "PVRTC2_4_RGBA",
            Self::Etc2EacR11 => "ETC2_EAC_R11",
            Self::Etc2EacRg11 => "ETC2_EAC_RG11",
            Self::Bc6h => "BC6H",
            Self::AstcHdr4x4 => "ASTC_HDR_4X4",
            Self::RgbHalf => "RGB_HALF",
            Self::RgbaHalf => "RGBA_HALF",
            Self::Rgb9e5 => "RGB_9E5",
            Self::AstcHdr6x6 => "ASTC_HDR_6X6",
            Self::AstcLdr5x4 => "ASTC_LDR_5X4",
            Self::AstcLdr5x5 => "ASTC_LDR_5X5",
            Self::AstcLdr6x5 => "ASTC_LDR_6X5",
            Self::AstcLdr6x6 => "ASTC_LDR_6X6",
            Self::AstcLdr8x5 => "ASTC_LDR_8X5",
            Self::AstcLdr8x6 => "ASTC_LDR_8X6",
            Self::AstcLdr10x5 => "ASTC_LDR_10X5",
            Self::AstcLdr10x6 => "ASTC_LDR_10X6",
            Self::AstcLdr8x8 => "ASTC_LDR_8X8",
            Self::AstcLdr10x8 => "ASTC_LDR_10X8",
            Self::AstcLdr10x10 => "ASTC_LDR_10X10",
            Self::AstcLdr12x10 => "ASTC_LDR_12X10",
            Self::AstcLdr12x12 => "ASTC_LDR_12X12",
        }
    }

    /// Returns true for raw pixel formats.
    pub const fn is_uncompressed(self) -> bool {
        matches!(
            self,
            Self::Rgba32
                | Self::Rgb565
                | Self::Bgr565
                | Self::Rgba4444
                | Self::RgbHalf
                | Self::RgbaHalf
                | Self::Rgb9e5
        )
    }

    /// Returns true for any ASTC block format (LDR or HDR).
    pub const fn is_astc(self) -> bool {
        matches!(self, Self::AstcHdr4x4 | Self::AstcHdr6x6) || self.astc_ldr_block_dims().is_some()
    }

    /// Returns true if the format stores high dynamic range data.
    pub const fn is_hdr(self) -> bool {
        matches!(
            self,
            Self::Bc6h
                | Self::AstcHdr4x4
                | Self::AstcHdr6x6
                | Self::RgbHalf
                | Self::RgbaHalf
                | Self::Rgb9e5
        )
    }

    /// Returns true if the format stores low dynamic range data.
    #[inline]
    pub const fn is_ldr(self) -> bool {
        !self.is_hdr()
    }

    /// Returns true if the format can carry an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Etc2Rgba
                | Self::Bc3Rgba
                | Self::Bc7Rgba
                | Self::Pvrtc1Rgba
                | Self::AtcRgba
                | Self::Rgba32
                | Self::Rgba4444
                | Self::Pvrtc2Rgba
                | Self::AstcHdr4x4
                | Self::RgbaHalf
                | Self::AstcHdr6x6
        ) || self.astc_ldr_block_dims().is_some()
    }

    /// Bytes per pixel for uncompressed formats, 0 for block formats.
    pub const fn uncompressed_bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba32 | Self::Rgb9e5 => 4,
            Self::Rgb565 | Self::Bgr565 | Self::Rgba4444 => 2,
            Self::RgbHalf => 6,
            Self::RgbaHalf => 8,
            _ => 0,
        }
    }

    /// Bytes per block for block formats, or bytes per pixel for uncompressed formats.
    pub const fn bytes_per_block_or_pixel(self) -> u32 {
        if self.is_uncompressed() {
            return self.uncompressed_bytes_per_pixel();
        }

        match self {
            Self::Etc1Rgb
            | Self::Bc1Rgb
            | Self::Bc4R
            | Self::Pvrtc1Rgb
            | Self::Pvrtc1Rgba
            | Self::AtcRgb
            | Self::Pvrtc2Rgb
            | Self::Pvrtc2Rgba
            | Self::Etc2EacR11 => 8,
            _ => 16,
        }
    }

    /// Block width in texels. Uncompressed formats report 1.
    pub const fn block_width(self) -> u32 {
        if self.is_uncompressed() {
            return 1;
        }
        match self {
            Self::Fxt1Rgb => 8,
            Self::AstcHdr6x6 => 6,
            _ => match self.astc_ldr_block_dims() {
                Some((width, _)) => width,
                None => 4,
            },
        }
    }

    /// Block height in texels. Uncompressed formats report 1.
    pub const fn block_height(self) -> u32 {
        if self.is_uncompressed() {
            return 1;
        }
        match self {
            Self::AstcHdr6x6 => 6,
            _ => match self.astc_ldr_block_dims() {
                Some((_, height)) => height,
                None => 4,
            },
        }
    }

    /// Block dimensions, or `None` for uncompressed formats.
    #[inline]
    pub const fn block_dims(self) -> Option<(u32, u32)> {
        if self.is_uncompressed() {
            None
        } else {
            Some((self.block_width(), self.block_height()))
        }
    }

    /// Bytes needed to hold one transcoded image of the given original size.
    ///
    /// Returns 0 if either dimension is 0. PVRTC1 images are padded to power
    /// of two block counts of at least 2 in each direction.
    pub const fn transcoded_size_in_bytes(self, width: u32, height: u32) -> u32 {
        if width == 0 || height == 0 {
            return 0;
        }

        if self.is_uncompressed() {
            return width * height * self.uncompressed_bytes_per_pixel();
        }

        let block_width = self.block_width();
        let block_height = self.block_height();
        let mut blocks_x = width.div_ceil(block_width);
        let mut blocks_y = height.div_ceil(block_height);

        if matches!(self, Self::Pvrtc1Rgb | Self::Pvrtc1Rgba) {
            blocks_x = max_u32(blocks_x.next_power_of_two(), 2);
            blocks_y = max_u32(blocks_y.next_power_of_two(), 2);
        }

        blocks_x * blocks_y * self.bytes_per_block_or_pixel()
    }

    /// Block dimensions of the LDR ASTC targets, `None` for everything else.
    pub const fn astc_ldr_block_dims(self) -> Option<(u32, u32)> {
        Some(match self {
            Self::AstcLdr4x4 => (4, 4),
            Self::AstcLdr5x4 => (5, 4),
            Self::AstcLdr5x5 => (5, 5),
            Self::AstcLdr6x5 => (6, 5),
            Self::AstcLdr6x6 => (6, 6),
            Self::AstcLdr8x5 => (8, 5),
            Self::AstcLdr8x6 => (8, 6),
            Self::AstcLdr10x5 => (10, 5),
            Self::AstcLdr10x6 => (10, 6),
            Self::AstcLdr8x8 => (8, 8),
            Self::AstcLdr10x8 => (10, 8),
            Self::AstcLdr10x10 => (10, 10),
            Self::AstcLdr12x10 => (12, 10),
            Self::AstcLdr12x12 => (12, 12),
            _ => return None,
        })
    }

    /// Finds the LDR ASTC target with the given block dimensions.
    pub fn astc_ldr_from_block_dims(block_width: u32, block_height: u32) -> Option<Self> {
        Self::all_values()
            .iter()
            .copied()
            .find(|format| format.astc_ldr_block_dims() == Some((block_width, block_height)))
    }
}

const fn max_u32(a: u32, b: u32) -> u32 {
    if a > b {
        a
    } else {
        b
    }
}

impl TryFrom<u32> for TargetFormat {
    type Error = InvalidEnumValue;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::all_values()
            .iter()
            .copied()
            .find(|format| format.as_raw() == value)
            .ok_or(InvalidEnumValue {
                kind: UnknownFormatKind::TargetFormat,
                value,
            })
    }
}

impl From<TargetFormat> for u32 {
    #[inline]
    fn from(format: TargetFormat) -> Self {
        format.as_raw()
    }
}

impl core::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
