//! Flags forwarded to the transcode primitive.

use core::ops::{BitOr, BitOrAssign};

/// Bit set of decode flags understood by the engine's transcode call.
///
/// ```
/// use ktx2_transcode_common::DecodeFlags;
///
/// let flags = DecodeFlags::HIGH_QUALITY | DecodeFlags::NO_DEBLOCK_FILTERING;
/// assert!(flags.contains(DecodeFlags::HIGH_QUALITY));
/// assert_eq!(flags.bits(), 32 | 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct DecodeFlags(u32);

impl DecodeFlags {
    /// No flags; the engine's defaults.
    pub const NONE: Self = Self(0);
    /// Pad PVRTC1 output to the next power of two.
    pub const PVRTC_DECODE_TO_NEXT_POW2: Self = Self(2);
    /// Force alpha to opaque when the target has alpha but the source does not.
    pub const TRANSCODE_ALPHA_TO_OPAQUE: Self = Self(4);
    /// Never emit BC1 three colour blocks.
    pub const BC1_FORBID_THREE_COLOR_BLOCKS: Self = Self(8);
    /// The output buffer has alpha indices (used with ETC2 EAC / BC4).
    pub const OUTPUT_HAS_ALPHA_INDICES: Self = Self(16);
    /// Slower, higher quality transcoding where supported.
    pub const HIGH_QUALITY: Self = Self(32);
    /// Disable ETC1S chroma filtering.
    pub const NO_ETC1S_CHROMA_FILTERING: Self = Self(64);
    /// Disable deblocking.
    pub const NO_DEBLOCK_FILTERING: Self = Self(128);
    /// Stronger deblocking.
    pub const STRONGER_DEBLOCK_FILTERING: Self = Self(256);
    /// Deblock even where the engine would skip it.
    pub const FORCE_DEBLOCK_FILTERING: Self = Self(512);
    /// Disable the fast XUASTC LDR to BC7 path.
    pub const XUASTC_LDR_DISABLE_FAST_BC7_TRANSCODING: Self = Self(1024);

    /// Wraps raw bits without validation; unknown bits are forwarded to the engine as-is.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits passed across the engine boundary.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every bit in `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if no bits are set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `self` with the bits of `other` set.
    #[inline]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for DecodeFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}

impl BitOrAssign for DecodeFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
