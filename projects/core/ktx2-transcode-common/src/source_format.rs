//! Codec families a container can be encoded with.

use crate::error::{InvalidEnumValue, UnknownFormatKind};
use crate::TargetFormat;
use derive_enum_all_values::AllValues;

/// The block format the container's payload was encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AllValues)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum SourceBlockFormat {
    /// ETC1S, supercompressed.
    Etc1s = 0,
    /// UASTC LDR 4x4.
    UastcLdr4x4 = 1,
    /// UASTC HDR 4x4.
    UastcHdr4x4 = 2,
    /// Plain ASTC HDR 6x6.
    AstcHdr6x6 = 3,
    /// UASTC HDR 6x6 (intermediate).
    UastcHdr6x6 = 4,
    XuastcLdr4x4 = 5,
    XuastcLdr5x4 = 6,
    XuastcLdr5x5 = 7,
    XuastcLdr6x5 = 8,
    XuastcLdr6x6 = 9,
    XuastcLdr8x5 = 10,
    XuastcLdr8x6 = 11,
    XuastcLdr10x5 = 12,
    XuastcLdr10x6 = 13,
    XuastcLdr8x8 = 14,
    XuastcLdr10x8 = 15,
    XuastcLdr10x10 = 16,
    XuastcLdr12x10 = 17,
    XuastcLdr12x12 = 18,
    AstcLdr4x4 = 19,
    AstcLdr5x4 = 20,
    AstcLdr5x5 = 21,
    AstcLdr6x5 = 22,
    AstcLdr6x6 = 23,
    AstcLdr8x5 = 24,
    AstcLdr8x6 = 25,
    AstcLdr10x5 = 26,
    AstcLdr10x6 = 27,
    AstcLdr8x8 = 28,
    AstcLdr10x8 = 29,
    AstcLdr10x10 = 30,
    AstcLdr12x10 = 31,
    AstcLdr12x12 = 32,
}

/// Block sizes shared by the XUASTC and ASTC LDR families, in discriminant order.
const LDR_BLOCK_SIZES: [(u32, u32); 14] = [
    (4, 4),
    (5, 4),
    (5, 5),
    (6, 5),
    (6, 6),
    (8, 5),
    (8, 6),
    (10, 5),
    (10, 6),
    (8, 8),
    (10, 8),
    (10, 10),
    (12, 10),
    (12, 12),
];

const FIRST_XUASTC: u32 = SourceBlockFormat::XuastcLdr4x4 as u32;
const FIRST_ASTC_LDR: u32 = SourceBlockFormat::AstcLdr4x4 as u32;

impl SourceBlockFormat {
    /// Raw value passed across the engine boundary.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Returns true for the XUASTC LDR family.
    #[inline]
    pub const fn is_xuastc_ldr(self) -> bool {
        let raw = self.as_raw();
        raw >= FIRST_XUASTC && raw < FIRST_ASTC_LDR
    }

    /// Returns true for the plain ASTC LDR family.
    #[inline]
    pub const fn is_astc_ldr(self) -> bool {
        self.as_raw() >= FIRST_ASTC_LDR
    }

    /// Returns true for HDR sources.
    pub const fn is_hdr(self) -> bool {
        matches!(
            self,
            Self::UastcHdr4x4 | Self::AstcHdr6x6 | Self::UastcHdr6x6
        )
    }

    /// Returns true for LDR sources.
    #[inline]
    pub const fn is_ldr(self) -> bool {
        !self.is_hdr()
    }

    /// Block dimensions of the source codec.
    pub const fn block_dims(self) -> (u32, u32) {
        let raw = self.as_raw();
        match self {
            Self::Etc1s | Self::UastcLdr4x4 | Self::UastcHdr4x4 => (4, 4),
            Self::AstcHdr6x6 | Self::UastcHdr6x6 => (6, 6),
            _ if self.is_xuastc_ldr() => LDR_BLOCK_SIZES[(raw - FIRST_XUASTC) as usize],
            _ => LDR_BLOCK_SIZES[(raw - FIRST_ASTC_LDR) as usize],
        }
    }

    /// Block width in texels.
    #[inline]
    pub const fn block_width(self) -> u32 {
        self.block_dims().0
    }

    /// Block height in texels.
    #[inline]
    pub const fn block_height(self) -> u32 {
        self.block_dims().1
    }

    /// The output format that exactly matches this source's block configuration.
    ///
    /// ASTC-family sources map to the ASTC target with the same block size. ETC1S
    /// maps to ETC1, which it is a subset of.
    pub fn matching_target(self) -> TargetFormat {
        match self {
            Self::Etc1s => TargetFormat::Etc1Rgb,
            Self::UastcHdr4x4 => TargetFormat::AstcHdr4x4,
            Self::AstcHdr6x6 | Self::UastcHdr6x6 => TargetFormat::AstcHdr6x6,
            _ => {
                let (width, height) = self.block_dims();
                TargetFormat::astc_ldr_from_block_dims(width, height)
                    .unwrap_or(TargetFormat::AstcLdr4x4)
            }
        }
    }
}

impl TryFrom<u32> for SourceBlockFormat {
    type Error = InvalidEnumValue;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::all_values()
            .iter()
            .copied()
            .find(|format| format.as_raw() == value)
            .ok_or(InvalidEnumValue {
                kind: UnknownFormatKind::SourceBlockFormat,
                value,
            })
    }
}

impl From<SourceBlockFormat> for u32 {
    #[inline]
    fn from(format: SourceBlockFormat) -> Self {
        format.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    #[rstest]
    #[case(SourceBlockFormat::AstcLdr6x6, TargetFormat::AstcLdr6x6)]
    #[case(SourceBlockFormat::XuastcLdr12x10, TargetFormat::AstcLdr12x10)]
    #[case(SourceBlockFormat::UastcLdr4x4, TargetFormat::AstcLdr4x4)]
    #[case(SourceBlockFormat::UastcHdr4x4, TargetFormat::AstcHdr4x4)]
    #[case(SourceBlockFormat::UastcHdr6x6, TargetFormat::AstcHdr6x6)]
    #[case(SourceBlockFormat::Etc1s, TargetFormat::Etc1Rgb)]
    fn matching_target_keeps_block_size(
        #[case] source: SourceBlockFormat,
        #[case] expected: TargetFormat,
    ) {
        assert_eq!(source.matching_target(), expected);
    }

    #[test]
    fn astc_sources_map_to_targets_of_equal_dims() {
        for source in SourceBlockFormat::all_values().iter().copied() {
            let target = source.matching_target();
            if target.is_astc() {
                assert_eq!(target.block_dims(), Some(source.block_dims()));
                assert_eq!(target.is_hdr(), source.is_hdr());
            }
        }
    }

    #[test]
    fn families_are_disjoint() {
        for source in SourceBlockFormat::all_values().iter().copied() {
            assert!(!(source.is_astc_ldr() && source.is_xuastc_ldr()));
            let (w, h) = source.block_dims();
            assert!((4..=12).contains(&w) && (4..=12).contains(&h));
        }
    }

    #[test]
    fn raw_values_round_trip() {
        for source in SourceBlockFormat::all_values().iter().copied() {
            assert_eq!(SourceBlockFormat::try_from(source.as_raw()), Ok(source));
        }
        assert!(SourceBlockFormat::try_from(33).is_err());
    }
}
