use super::{constants::*, dxgi::DxgiFormat};
use endian_writer::{EndianReader, LittleEndianReader};
use ktx2_transcode_file_formats_api::{HeaderParseError, HeaderParseResult};

/// The information of the DDS file supplied to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsInfo {
    pub width: u32,
    pub height: u32,
    /// The raw FourCC code of the pixel format.
    pub fourcc: [u8; 4],
    /// Format from the DX10 header, or the one implied by a legacy FourCC.
    /// [`DxgiFormat::UNKNOWN`] for FourCC codes this crate does not write.
    pub format: DxgiFormat,
    pub has_dx10_header: bool,
    pub data_offset: usize,
    /// Value of the linear size field.
    pub data_length: usize,
}

impl DdsInfo {
    /// The payload of `data`, the buffer this info was parsed from.
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.data_offset..self.data_offset + self.data_length]
    }
}

/// Parses the header of a single-surface DDS file.
///
/// # Errors
///
/// - [`HeaderParseError::InputTooShort`] if the headers, or the payload the
///   linear size field announces, do not fit in `data`.
/// - [`HeaderParseError::InvalidMagic`] if the file does not start with `"DDS "`.
/// - [`HeaderParseError::InvalidField`] if the descriptor size is not 124, or no
///   linear size was recorded.
pub fn parse_dds(data: &[u8]) -> HeaderParseResult<DdsInfo> {
    if data.len() < DDS_HEADER_SIZE {
        return Err(HeaderParseError::InputTooShort {
            required: DDS_HEADER_SIZE,
            actual: data.len(),
        });
    }

    // SAFETY: data.len() >= DDS_HEADER_SIZE (128), every descriptor offset + 4 fits.
    let mut reader = unsafe { LittleEndianReader::new(data.as_ptr()) };
    if unsafe { reader.read_u32_at(0) } != DDS_MAGIC {
        return Err(HeaderParseError::InvalidMagic);
    }
    let (size, flags, height, width, linear_size, fourcc) = unsafe {
        (
            reader.read_u32_at(DDS_SIZE_OFFSET as isize),
            reader.read_u32_at(DDS_FLAGS_OFFSET as isize),
            reader.read_u32_at(DDS_HEIGHT_OFFSET as isize),
            reader.read_u32_at(DDS_WIDTH_OFFSET as isize),
            reader.read_u32_at(DDS_LINEAR_SIZE_OFFSET as isize),
            reader.read_u32_at(FOURCC_OFFSET as isize),
        )
    };

    if size != DDS_DESCRIPTOR_SIZE {
        return Err(HeaderParseError::InvalidField("descriptor size"));
    }
    if flags & DDSD_LINEARSIZE == 0 {
        return Err(HeaderParseError::InvalidField("linear size flag"));
    }

    let has_dx10_header = fourcc == FOURCC_DX10;
    let (format, data_offset) = if has_dx10_header {
        let required = DDS_HEADER_SIZE + DX10_HEADER_SIZE;
        if data.len() < required {
            return Err(HeaderParseError::InputTooShort {
                required,
                actual: data.len(),
            });
        }

        // SAFETY: data.len() >= 148, so DX10_FORMAT_OFFSET (0x80) + 4 is in bounds.
        let dxgi = unsafe { reader.read_u32_at(DX10_FORMAT_OFFSET as isize) };
        (DxgiFormat(dxgi), required)
    } else {
        let format = match fourcc {
            FOURCC_DXT1 => DxgiFormat::BC1_UNORM,
            FOURCC_DXT5 => DxgiFormat::BC3_UNORM,
            FOURCC_ATI1 => DxgiFormat::BC4_UNORM,
            FOURCC_ATI2 => DxgiFormat::BC5_UNORM,
            _ => DxgiFormat::UNKNOWN,
        };
        (format, DDS_HEADER_SIZE)
    };

    let data_length = linear_size as usize;
    let required = data_offset + data_length;
    if data.len() < required {
        return Err(HeaderParseError::InputTooShort {
            required,
            actual: data.len(),
        });
    }

    Ok(DdsInfo {
        width,
        height,
        fourcc: fourcc.to_le_bytes(),
        format,
        has_dx10_header,
        data_offset,
        data_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    #[rstest]
    #[case(DxgiFormat::BC1_UNORM, 4, false, *b"DXT1")]
    #[case(DxgiFormat::BC5_UNORM, 8, false, *b"ATI2")]
    #[case(DxgiFormat::BC7_UNORM, 8, false, *b"DX10")]
    #[case(DxgiFormat::BC4_UNORM, 4, true, *b"DX10")]
    fn parses_written_files(
        #[case] format: DxgiFormat,
        #[case] bpp: u32,
        #[case] force_dx10: bool,
        #[case] fourcc: [u8; 4],
    ) {
        let blocks: Vec<u8> = (0..=255).collect();
        let bytes = write_dds_to_vec(&blocks, 12, 8, bpp, format, force_dx10).unwrap();
        let info = parse_dds(&bytes).unwrap();

        assert_eq!((info.width, info.height), (12, 8));
        assert_eq!(info.fourcc, fourcc);
        assert_eq!(info.format, format);
        assert_eq!(info.has_dx10_header, fourcc == *b"DX10");
        assert_eq!(info.data_offset + info.data_length, bytes.len());
        assert_eq!(info.payload(&bytes), &blocks[..info.data_length]);
    }

    #[test]
    fn rejects_truncated_header() {
        let bytes = write_dds_to_vec(&[0u8; 16], 4, 4, 8, DxgiFormat::BC7_UNORM, false).unwrap();
        assert_eq!(
            parse_dds(&bytes[..140]),
            Err(HeaderParseError::InputTooShort {
                required: 148,
                actual: 140
            })
        );
        assert_eq!(
            parse_dds(&bytes[..100]),
            Err(HeaderParseError::InputTooShort {
                required: 128,
                actual: 100
            })
        );
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = write_dds_to_vec(&[0u8; 16], 4, 4, 8, DxgiFormat::BC3_UNORM, false).unwrap();
        assert_eq!(
            parse_dds(&bytes[..bytes.len() - 1]),
            Err(HeaderParseError::InputTooShort {
                required: 144,
                actual: 143
            })
        );
    }

    #[test]
    fn rejects_bad_magic_and_descriptor_size() {
        let mut bytes = write_dds_to_vec(&[0u8; 8], 4, 4, 4, DxgiFormat::BC1_UNORM, false).unwrap();
        bytes[DDS_SIZE_OFFSET] = 123;
        assert_eq!(
            parse_dds(&bytes),
            Err(HeaderParseError::InvalidField("descriptor size"))
        );

        bytes[0] = b'X';
        assert_eq!(parse_dds(&bytes), Err(HeaderParseError::InvalidMagic));
    }

    #[rstest]
    #[case::zeroed(vec![0; 148])]
    #[case::astc_file(astc_header_bytes())]
    fn rejects_non_dds_input(#[case] bytes: Vec<u8>) {
        assert_eq!(parse_dds(&bytes), Err(HeaderParseError::InvalidMagic));
    }

    /// ASTC magic followed by enough zeros to pass the length check.
    fn astc_header_bytes() -> Vec<u8> {
        let mut bytes = vec![0x13, 0xAB, 0xA1, 0x5C];
        bytes.resize(DDS_HEADER_SIZE, 0);
        bytes
    }
}
