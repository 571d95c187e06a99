//! Decoding slices to plain pixel data.

use crate::container::ContainerHandle;
use crate::error::TranscodeResult;
use crate::options::TranscodeOptions;
use ktx2_transcode_common::{SliceIndex, TargetFormat};

/// Uncompressed pixels of one slice.
///
/// `data` holds `width * height` pixels in `format`: 4 bytes per pixel for
/// [`TargetFormat::Rgba32`], 8 (four IEEE half floats) for
/// [`TargetFormat::RgbaHalf`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: TargetFormat,
    pub data: Vec<u8>,
}

impl ContainerHandle<'_> {
    /// Decodes a slice of an LDR container to 8-bit RGBA.
    pub fn decode_rgba(&self, slice: SliceIndex) -> TranscodeResult<DecodedImage> {
        self.decode_as(TargetFormat::Rgba32, slice)
    }

    /// Decodes a slice of an HDR container to half float RGBA.
    pub fn decode_rgba_hdr(&self, slice: SliceIndex) -> TranscodeResult<DecodedImage> {
        self.decode_as(TargetFormat::RgbaHalf, slice)
    }

    fn decode_as(&self, format: TargetFormat, slice: SliceIndex) -> TranscodeResult<DecodedImage> {
        let result = self.transcode_slice(format, slice, &TranscodeOptions::new(), None)?;
        Ok(DecodedImage {
            width: result.width,
            height: result.height,
            format,
            data: result.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    #[test]
    fn ldr_decode_is_rgba8() {
        let transcoder = Transcoder::new(Bridge::new(ReferenceEngine::new()));
        let container = ReferenceContainer::new(10, 6).with_levels(2).with_alpha(true);
        let handle = transcoder.open(&container.to_bytes()).unwrap();

        let slice = SliceIndex::new(1, 0, 0);
        let image = handle.decode_rgba(slice).unwrap();
        assert_eq!((image.width, image.height), (5, 3));
        assert_eq!(image.format, TargetFormat::Rgba32);
        assert_eq!(image.data, container.slice_pixels(slice));
    }

    #[test]
    fn hdr_decode_is_half_float() {
        let transcoder = Transcoder::new(Bridge::new(ReferenceEngine::new()));
        let container =
            ReferenceContainer::new(8, 4).with_source_format(SourceBlockFormat::UastcHdr4x4);
        let handle = transcoder.open(&container.to_bytes()).unwrap();

        let image = handle.decode_rgba_hdr(SliceIndex::default()).unwrap();
        assert_eq!(image.format, TargetFormat::RgbaHalf);
        assert_eq!(image.data.len(), 8 * 4 * 8);
    }
}
