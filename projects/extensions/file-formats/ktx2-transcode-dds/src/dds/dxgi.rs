use core::fmt;
use ktx2_transcode_common::TargetFormat;

/// A `DXGI_FORMAT` value as stored in the DX10 header.
///
/// Any `u32` is accepted; the associated constants name the ones this crate
/// maps transcode targets to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct DxgiFormat(pub u32);

impl DxgiFormat {
    pub const UNKNOWN: Self = Self(0);
    pub const R16G16B16A16_FLOAT: Self = Self(10);
    pub const R8G8B8A8_UNORM: Self = Self(28);
    pub const R8G8B8A8_UNORM_SRGB: Self = Self(29);
    pub const R9G9B9E5_SHAREDEXP: Self = Self(67);
    pub const BC1_UNORM: Self = Self(71);
    pub const BC1_UNORM_SRGB: Self = Self(72);
    pub const BC3_UNORM: Self = Self(77);
    pub const BC3_UNORM_SRGB: Self = Self(78);
    pub const BC4_UNORM: Self = Self(80);
    pub const BC5_UNORM: Self = Self(83);
    pub const B5G6R5_UNORM: Self = Self(85);
    pub const BC6H_UF16: Self = Self(95);
    pub const BC7_UNORM: Self = Self(98);
    pub const BC7_UNORM_SRGB: Self = Self(99);

    /// Raw value written to the file.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Formats that have a legacy FourCC and need no DX10 header.
    #[inline]
    pub const fn has_legacy_fourcc(self) -> bool {
        matches!(self.0, 71 | 77 | 80 | 83)
    }
}

impl From<u32> for DxgiFormat {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for DxgiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DXGI_FORMAT({})", self.0)
    }
}

/// The DXGI format a transcode `target` is stored as.
///
/// `srgb` selects the `_SRGB` variant where one exists. Returns `None` for
/// targets DDS has no matching format for (ETC, PVRTC, ASTC and friends).
pub const fn dxgi_format_for_target(target: TargetFormat, srgb: bool) -> Option<DxgiFormat> {
    Some(match (target, srgb) {
        (TargetFormat::Bc1Rgb, false) => DxgiFormat::BC1_UNORM,
        (TargetFormat::Bc1Rgb, true) => DxgiFormat::BC1_UNORM_SRGB,
        (TargetFormat::Bc3Rgba, false) => DxgiFormat::BC3_UNORM,
        (TargetFormat::Bc3Rgba, true) => DxgiFormat::BC3_UNORM_SRGB,
        (TargetFormat::Bc4R, _) => DxgiFormat::BC4_UNORM,
        (TargetFormat::Bc5Rg, _) => DxgiFormat::BC5_UNORM,
        (TargetFormat::Bc6h, _) => DxgiFormat::BC6H_UF16,
        (TargetFormat::Bc7Rgba, false) => DxgiFormat::BC7_UNORM,
        (TargetFormat::Bc7Rgba, true) => DxgiFormat::BC7_UNORM_SRGB,
        (TargetFormat::Rgba32, false) => DxgiFormat::R8G8B8A8_UNORM,
        (TargetFormat::Rgba32, true) => DxgiFormat::R8G8B8A8_UNORM_SRGB,
        (TargetFormat::RgbaHalf, _) => DxgiFormat::R16G16B16A16_FLOAT,
        (TargetFormat::Rgb9e5, _) => DxgiFormat::R9G9B9E5_SHAREDEXP,
        (TargetFormat::Rgb565, _) => DxgiFormat::B5G6R5_UNORM,
        _ => return None,
    })
}

/// Bits per pixel of `target` as used in the linear size computation.
///
/// `None` whenever [`dxgi_format_for_target`] is `None`.
pub const fn bits_per_pixel_for_target(target: TargetFormat) -> Option<u32> {
    Some(match target {
        TargetFormat::Bc1Rgb | TargetFormat::Bc4R => 4,
        TargetFormat::Bc3Rgba | TargetFormat::Bc5Rg | TargetFormat::Bc6h | TargetFormat::Bc7Rgba => 8,
        TargetFormat::Rgb565 => 16,
        TargetFormat::Rgba32 | TargetFormat::Rgb9e5 => 32,
        TargetFormat::RgbaHalf => 64,
        _ => return None,
    })
}
