//! Mapping of human readable format families to concrete target formats.
//!
//! Resolution is a pure function of the family string and the container's
//! metadata. Unrecognized families are not an error: they fall back to an
//! uncompressed format (half float RGBA for HDR containers, RGBA32 otherwise).

use crate::container::ContainerHandle;
use crate::error::{TranscodeError, TranscodeResult};
use ktx2_transcode_common::TargetFormat;
use tracing::{debug, warn};

/// A parsed format family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Always resolves to this format.
    Fixed(TargetFormat),
    /// Resolves to `alpha` when the container has alpha, `opaque` otherwise.
    AlphaDependent {
        /// Format used for containers without alpha
        opaque: TargetFormat,
        /// Format used for containers with alpha
        alpha: TargetFormat,
    },
    /// The ASTC format matching the container's own block configuration.
    Astc,
    /// Not a known family; resolves to the uncompressed fallback.
    Unknown,
}

impl Family {
    /// Picks the target for a container with the given flags.
    ///
    /// Returns `None` for [`Family::Astc`], which needs the engine to pick the
    /// format matching the container's source.
    pub fn select(self, is_hdr: bool, has_alpha: bool) -> Option<TargetFormat> {
        match self {
            Family::Fixed(target) => Some(target),
            Family::AlphaDependent { opaque, alpha } => {
                Some(if has_alpha { alpha } else { opaque })
            }
            Family::Astc => None,
            Family::Unknown => Some(fallback_target(is_hdr)),
        }
    }
}

/// The uncompressed format used for unrecognized families.
#[inline]
pub const fn fallback_target(is_hdr: bool) -> TargetFormat {
    if is_hdr {
        TargetFormat::RgbaHalf
    } else {
        TargetFormat::Rgba32
    }
}

/// Trims, uppercases and removes spaces. Underscores are kept.
pub fn normalize_family(family: &str) -> String {
    family
        .trim()
        .chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Parses a family name, case and whitespace insensitively.
pub fn parse_family(family: &str) -> Family {
    use TargetFormat as T;

    let normalized = normalize_family(family);
    match normalized.as_str() {
        "RGBA32" | "RGBA8" | "UNCOMPRESSED" => Family::Fixed(T::Rgba32),
        "RGB_HALF" | "RGBHALF" | "RGB16F" | "RGB_FLOAT" | "RGBFLOAT" => Family::Fixed(T::RgbHalf),
        "RGBA_HALF" | "RGBAHALF" | "RGBA16F" | "RGBA_FLOAT" | "RGBAFLOAT" => {
            Family::Fixed(T::RgbaHalf)
        }
        "RGB9E5" | "RGB_9E5" => Family::Fixed(T::Rgb9e5),

        "BC1" => Family::Fixed(T::Bc1Rgb),
        "BC3" => Family::Fixed(T::Bc3Rgba),
        "BC4" => Family::Fixed(T::Bc4R),
        "BC5" => Family::Fixed(T::Bc5Rg),
        "BC6H" => Family::Fixed(T::Bc6h),
        "BC7" => Family::Fixed(T::Bc7Rgba),

        "ETC1" => Family::Fixed(T::Etc1Rgb),
        "ETC2" => Family::Fixed(T::Etc2Rgba),
        "ETC2_EAC_R11" | "EAC_R11" => Family::Fixed(T::Etc2EacR11),
        "ETC2_EAC_RG11" | "EAC_RG11" => Family::Fixed(T::Etc2EacRg11),

        "PVRTC1" => Family::AlphaDependent {
            opaque: T::Pvrtc1Rgb,
            alpha: T::Pvrtc1Rgba,
        },
        "PVRTC2" => Family::AlphaDependent {
            opaque: T::Pvrtc2Rgb,
            alpha: T::Pvrtc2Rgba,
        },
        "ATC" => Family::AlphaDependent {
            opaque: T::AtcRgb,
            alpha: T::AtcRgba,
        },
        "FXT1" => Family::Fixed(T::Fxt1Rgb),

        "ASTC" => Family::Astc,
        _ => Family::Unknown,
    }
}

impl ContainerHandle<'_> {
    /// Resolves `family` to a concrete target format for this container.
    ///
    /// The result is checked against the container: an HDR target for an LDR
    /// container (or the other way around) is rejected. The engine, not the
    /// built-in tables, decides whether the target is HDR.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::UseAfterClose`] if the handle was closed.
    /// - [`TranscodeError::FormatMismatch`] on an HDR/LDR mismatch.
    /// - [`TranscodeError::Bridge`] if an engine query fails.
    pub fn resolve(&self, family: &str) -> TranscodeResult<TargetFormat> {
        self.id()?;
        let metadata = self.metadata();
        let parsed = parse_family(family);

        let target = match parsed.select(metadata.is_hdr, metadata.has_alpha) {
            Some(target) => target,
            None => self.bridge().matching_target(metadata.source_format)?,
        };
        if parsed == Family::Unknown {
            warn!(family, %target, "unknown format family, using uncompressed fallback");
        }

        let target_is_hdr = self.bridge().target_is_hdr(target)?;
        if target_is_hdr != metadata.is_hdr {
            return Err(TranscodeError::FormatMismatch {
                target,
                container_is_hdr: metadata.is_hdr,
            });
        }

        debug!(family, %target, source = ?metadata.source_format, "resolved format family");
        Ok(target)
    }
}
