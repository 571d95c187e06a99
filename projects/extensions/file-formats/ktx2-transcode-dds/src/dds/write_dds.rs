use super::{constants::*, dxgi::*};
use alloc::vec::Vec;
use endian_writer::{EndianWriter, LittleEndianWriter};
use ktx2_transcode_common::TargetFormat;
use ktx2_transcode_file_formats_api::{TextureFileFormat, WriterError, WriterResult};

/// A single 2D surface, without mipmaps, ready to be written as a DDS file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsImage<'a> {
    blocks: &'a [u8],
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    dxgi_format: DxgiFormat,
    force_dx10_header: bool,
}

impl<'a> DdsImage<'a> {
    /// Creates an image from raw block data.
    ///
    /// Only the first [`linear_size`] bytes of `blocks` are written.
    pub fn new(
        blocks: &'a [u8],
        width: u32,
        height: u32,
        bits_per_pixel: u32,
        dxgi_format: DxgiFormat,
    ) -> Self {
        Self {
            blocks,
            width,
            height,
            bits_per_pixel,
            dxgi_format,
            force_dx10_header: false,
        }
    }

    /// Creates an image from data transcoded to `target`.
    ///
    /// # Errors
    ///
    /// [`WriterError::UnsupportedTarget`] if DDS has no format for `target`.
    pub fn for_target(
        blocks: &'a [u8],
        target: TargetFormat,
        width: u32,
        height: u32,
        srgb: bool,
    ) -> WriterResult<Self> {
        match (
            dxgi_format_for_target(target, srgb),
            bits_per_pixel_for_target(target),
        ) {
            (Some(format), Some(bpp)) => Ok(Self::new(blocks, width, height, bpp, format)),
            _ => Err(WriterError::UnsupportedTarget(target)),
        }
    }

    /// Always emit the DX10 extension, even for formats with a legacy FourCC.
    pub fn with_force_dx10_header(mut self, force_dx10_header: bool) -> Self {
        self.force_dx10_header = force_dx10_header;
        self
    }

    pub fn dxgi_format(&self) -> DxgiFormat {
        self.dxgi_format
    }

    /// Whether the DX10 extension header is written.
    pub fn uses_dx10_header(&self) -> bool {
        self.force_dx10_header || !self.dxgi_format.has_legacy_fourcc()
    }

    /// Size of everything before the payload.
    pub fn header_len(&self) -> usize {
        if self.uses_dx10_header() {
            DDS_HEADER_SIZE + DX10_HEADER_SIZE
        } else {
            DDS_HEADER_SIZE
        }
    }

    fn fourcc(&self) -> u32 {
        if self.uses_dx10_header() {
            return FOURCC_DX10;
        }
        match self.dxgi_format {
            DxgiFormat::BC1_UNORM => FOURCC_DXT1,
            DxgiFormat::BC3_UNORM => FOURCC_DXT5,
            DxgiFormat::BC4_UNORM => FOURCC_ATI1,
            _ => FOURCC_ATI2,
        }
    }

    fn checked_linear_size(&self) -> WriterResult<u32> {
        linear_size(self.width, self.height, self.bits_per_pixel).ok_or(
            WriterError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
                max: u32::MAX,
            },
        )
    }
}

/// Payload size of a surface: dimensions rounded up to whole 4x4 blocks.
///
/// `None` if the result does not fit the header's 32-bit field.
#[inline]
pub fn linear_size(width: u32, height: u32, bits_per_pixel: u32) -> Option<u32> {
    let round = |v: u32| (u64::from(v) + 3) & !3;
    let bits = round(width)
        .checked_mul(round(height))?
        .checked_mul(u64::from(bits_per_pixel))?;
    u32::try_from(bits >> 3).ok()
}

impl TextureFileFormat for DdsImage<'_> {
    const EXTENSION: &'static str = "dds";

    fn serialized_len(&self) -> WriterResult<usize> {
        let linear_size = self.checked_linear_size()? as usize;
        if self.blocks.len() < linear_size {
            return Err(WriterError::BufferTooSmall {
                required: linear_size,
                actual: self.blocks.len(),
            });
        }
        Ok(self.header_len() + linear_size)
    }

    fn serialize_into(&self, output: &mut [u8]) -> WriterResult<usize> {
        let len = self.checked_output_len(output)?;
        let header_len = self.header_len();
        let linear_size = len - header_len;

        // Reserved fields, color keys, bit masks and secondary caps stay zero.
        output[..header_len].fill(0);

        // SAFETY: checked_output_len guarantees output.len() >= header_len, and
        // every offset below lies inside the header being written.
        unsafe {
            let mut writer = LittleEndianWriter::new(output.as_mut_ptr());
            writer.write_u32_at(DDS_MAGIC, 0);
            writer.write_u32_at(DDS_DESCRIPTOR_SIZE, DDS_SIZE_OFFSET as isize);
            writer.write_u32_at(
                DDSD_WIDTH | DDSD_HEIGHT | DDSD_PIXELFORMAT | DDSD_CAPS | DDSD_LINEARSIZE,
                DDS_FLAGS_OFFSET as isize,
            );
            writer.write_u32_at(self.height, DDS_HEIGHT_OFFSET as isize);
            writer.write_u32_at(self.width, DDS_WIDTH_OFFSET as isize);
            writer.write_u32_at(linear_size as u32, DDS_LINEAR_SIZE_OFFSET as isize);

            writer.write_u32_at(DDS_PIXELFORMAT_SIZE, DDS_PIXELFORMAT_OFFSET as isize);
            writer.write_u32_at(DDPF_FOURCC, DDS_PIXELFORMAT_FLAGS_OFFSET as isize);
            writer.write_u32_at(self.fourcc(), FOURCC_OFFSET as isize);
            writer.write_u32_at(DDSCAPS_TEXTURE, DDS_CAPS_OFFSET as isize);

            if self.uses_dx10_header() {
                writer.write_u32_at(self.dxgi_format.as_raw(), DX10_FORMAT_OFFSET as isize);
                writer.write_u32_at(
                    D3D10_RESOURCE_DIMENSION_TEXTURE2D,
                    DX10_RESOURCE_DIMENSION_OFFSET as isize,
                );
                writer.write_u32_at(0, DX10_MISC_FLAG_OFFSET as isize);
                writer.write_u32_at(1, DX10_ARRAY_SIZE_OFFSET as isize);
                writer.write_u32_at(0, DX10_MISC_FLAGS2_OFFSET as isize);
            }
        }

        output[header_len..len].copy_from_slice(&self.blocks[..linear_size]);
        Ok(len)
    }
}

/// Serializes a surface into a new buffer.
///
/// # Errors
///
/// - [`WriterError::BufferTooSmall`] if `blocks` is shorter than [`linear_size`].
/// - [`WriterError::DimensionsTooLarge`] if [`linear_size`] overflows 32 bits.
pub fn write_dds_to_vec(
    blocks: &[u8],
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    dxgi_format: DxgiFormat,
    force_dx10_header: bool,
) -> WriterResult<Vec<u8>> {
    DdsImage::new(blocks, width, height, bits_per_pixel, dxgi_format)
        .with_force_dx10_header(force_dx10_header)
        .to_vec()
}

/// Writes a surface to a `.dds` file at `path`.
///
/// Fails with the errors of [`write_dds_to_vec`] before the file is created, so
/// a short block buffer never leaves a partial file behind.
#[cfg(feature = "file-io")]
pub fn write_dds(
    path: &std::path::Path,
    width: u32,
    height: u32,
    blocks: &[u8],
    bits_per_pixel: u32,
    dxgi_format: DxgiFormat,
    force_dx10_header: bool,
) -> WriterResult<()> {
    let image = DdsImage::new(blocks, width, height, bits_per_pixel, dxgi_format)
        .with_force_dx10_header(force_dx10_header);
    ktx2_transcode_file_formats_api::write_to_file(&image, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    fn read_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    }

    #[rstest]
    #[case(DxgiFormat::BC1_UNORM, 4, *b"DXT1")]
    #[case(DxgiFormat::BC3_UNORM, 8, *b"DXT5")]
    #[case(DxgiFormat::BC4_UNORM, 4, *b"ATI1")]
    #[case(DxgiFormat::BC5_UNORM, 8, *b"ATI2")]
    fn legacy_formats_use_fourcc(
        #[case] format: DxgiFormat,
        #[case] bpp: u32,
        #[case] fourcc: [u8; 4],
    ) {
        let blocks = vec![0x11u8; 256];
        let bytes = write_dds_to_vec(&blocks, 8, 8, bpp, format, false).unwrap();
        let linear = (8 * 8 * bpp / 8) as usize;

        assert_eq!(bytes.len(), DDS_HEADER_SIZE + linear);
        assert_eq!(&bytes[..4], b"DDS ");
        assert_eq!(&bytes[FOURCC_OFFSET..FOURCC_OFFSET + 4], fourcc);
        assert_eq!(read_u32(&bytes, DDS_LINEAR_SIZE_OFFSET) as usize, linear);
        assert!(bytes[DDS_HEADER_SIZE..].iter().all(|&b| b == 0x11));
    }

    #[rstest]
    #[case(DxgiFormat::BC1_UNORM, 4)]
    #[case(DxgiFormat::BC7_UNORM, 8)]
    #[case(DxgiFormat::BC6H_UF16, 8)]
    fn forced_dx10_header(#[case] format: DxgiFormat, #[case] bpp: u32) {
        let blocks = vec![0u8; 64];
        let bytes = write_dds_to_vec(&blocks, 4, 4, bpp, format, true).unwrap();

        assert_eq!(bytes.len(), DDS_HEADER_SIZE + DX10_HEADER_SIZE + (16 * bpp / 8) as usize);
        assert_eq!(&bytes[FOURCC_OFFSET..FOURCC_OFFSET + 4], b"DX10");
        assert_eq!(read_u32(&bytes, DX10_FORMAT_OFFSET), format.as_raw());
        assert_eq!(read_u32(&bytes, DX10_RESOURCE_DIMENSION_OFFSET), 3);
        assert_eq!(read_u32(&bytes, DX10_MISC_FLAG_OFFSET), 0);
        assert_eq!(read_u32(&bytes, DX10_ARRAY_SIZE_OFFSET), 1);
        assert_eq!(read_u32(&bytes, DX10_MISC_FLAGS2_OFFSET), 0);
    }

    #[test]
    fn non_legacy_format_gets_dx10_without_forcing() {
        let image = DdsImage::new(&[0u8; 16], 4, 4, 8, DxgiFormat::BC7_UNORM);
        assert!(image.uses_dx10_header());
        assert_eq!(image.header_len(), 148);
    }

    #[test]
    fn writes_exact_descriptor() {
        let bytes = write_dds_to_vec(&[0u8; 8], 3, 2, 4, DxgiFormat::BC1_UNORM, false).unwrap();

        let mut expected = [0u32; 32];
        expected[0] = u32::from_le_bytes(*b"DDS ");
        expected[1] = 124;
        expected[2] = 0x1 | 0x2 | 0x4 | 0x1000 | 0x80000;
        expected[3] = 2; // height
        expected[4] = 3; // width
        expected[5] = 8; // linear size
        expected[19] = 32;
        expected[20] = 4;
        expected[21] = u32::from_le_bytes(*b"DXT1");
        expected[27] = 0x1000;

        for (index, value) in expected.iter().enumerate() {
            assert_eq!(read_u32(&bytes, index * 4), *value, "field {index}");
        }
    }

    #[rstest]
    #[case(1, 1, 4, 8)]
    #[case(5, 5, 8, 64)]
    #[case(16, 16, 8, 256)]
    #[case(0, 16, 8, 0)]
    fn computes_linear_size(
        #[case] width: u32,
        #[case] height: u32,
        #[case] bpp: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(linear_size(width, height, bpp), Some(expected));
    }

    #[test]
    fn linear_size_overflow_is_reported() {
        assert_eq!(linear_size(u32::MAX, u32::MAX, 64), None);
        let result = write_dds_to_vec(&[], u32::MAX, u32::MAX, 64, DxgiFormat::BC7_UNORM, false);
        assert!(matches!(result, Err(WriterError::DimensionsTooLarge { .. })));
    }

    #[test]
    fn short_block_buffer_is_rejected() {
        let result = write_dds_to_vec(&[0u8; 15], 4, 4, 8, DxgiFormat::BC7_UNORM, false);
        assert!(matches!(
            result,
            Err(WriterError::BufferTooSmall {
                required: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn only_linear_size_bytes_are_written() {
        let blocks: Vec<u8> = (0..40).collect();
        let bytes = write_dds_to_vec(&blocks, 4, 4, 8, DxgiFormat::BC3_UNORM, false).unwrap();
        assert_eq!(&bytes[DDS_HEADER_SIZE..], &blocks[..16]);
    }

    #[rstest]
    #[case(TargetFormat::Etc1Rgb)]
    #[case(TargetFormat::AstcLdr4x4)]
    #[case(TargetFormat::Pvrtc1Rgba)]
    fn for_target_rejects_unmapped(#[case] target: TargetFormat) {
        assert!(matches!(
            DdsImage::for_target(&[], target, 4, 4, false),
            Err(WriterError::UnsupportedTarget(t)) if t == target
        ));
    }

    #[test]
    fn for_target_picks_format_and_bpp() {
        let image = DdsImage::for_target(&[0u8; 16], TargetFormat::Bc7Rgba, 4, 4, true).unwrap();
        assert_eq!(image.dxgi_format(), DxgiFormat::BC7_UNORM_SRGB);
        assert_eq!(image.serialized_len().unwrap(), 148 + 16);
    }
}
