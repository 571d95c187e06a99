use super::constants::*;
use endian_writer::{EndianReader, LittleEndianReader};
use ktx2_transcode_file_formats_api::{HeaderParseError, HeaderParseResult};

/// Fields of a 16 byte `.astc` file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstcHeader {
    pub block_width: u32,
    pub block_height: u32,
    pub block_depth: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl AstcHeader {
    /// Number of payload bytes described by this header.
    pub fn payload_len(&self) -> Option<usize> {
        let blocks_x = self.width.div_ceil(self.block_width) as usize;
        let blocks_y = self.height.div_ceil(self.block_height) as usize;
        let blocks_z = self.depth.div_ceil(self.block_depth) as usize;
        blocks_x
            .checked_mul(blocks_y)?
            .checked_mul(blocks_z)?
            .checked_mul(ASTC_BLOCK_SIZE)
    }
}

/// Checks the magic only.
#[inline]
pub fn likely_astc(data: &[u8]) -> bool {
    data.len() >= ASTC_HEADER_SIZE && data[..4] == ASTC_MAGIC.to_le_bytes()
}

/// Parses the header of an `.astc` file.
///
/// # Errors
///
/// - [`HeaderParseError::InputTooShort`] if fewer than 16 bytes are supplied.
/// - [`HeaderParseError::InvalidMagic`] if the magic is not `0x5CA1AB13`.
/// - [`HeaderParseError::InvalidField`] if a block dimension is zero.
pub fn parse_astc_header(data: &[u8]) -> HeaderParseResult<AstcHeader> {
    if data.len() < ASTC_HEADER_SIZE {
        return Err(HeaderParseError::InputTooShort {
            required: ASTC_HEADER_SIZE,
            actual: data.len(),
        });
    }

    // SAFETY: data.len() >= ASTC_HEADER_SIZE, the magic occupies bytes 0..4.
    let mut reader = unsafe { LittleEndianReader::new(data.as_ptr()) };
    let magic = unsafe { reader.read_u32_at(0) };
    if magic != ASTC_MAGIC {
        return Err(HeaderParseError::InvalidMagic);
    }

    let header = AstcHeader {
        block_width: data[BLOCK_WIDTH_OFFSET] as u32,
        block_height: data[BLOCK_HEIGHT_OFFSET] as u32,
        block_depth: data[BLOCK_DEPTH_OFFSET] as u32,
        width: read_u24(data, IMAGE_WIDTH_OFFSET),
        height: read_u24(data, IMAGE_HEIGHT_OFFSET),
        depth: read_u24(data, IMAGE_DEPTH_OFFSET),
    };

    if header.block_width == 0 || header.block_height == 0 || header.block_depth == 0 {
        return Err(HeaderParseError::InvalidField("block dimensions"));
    }
    Ok(header)
}

/// Parses an `.astc` file, returning its header and block payload.
///
/// Trailing bytes after the payload are ignored.
///
/// # Errors
///
/// As [`parse_astc_header`], plus [`HeaderParseError::InputTooShort`] when the
/// payload is shorter than the header describes.
pub fn parse_astc(data: &[u8]) -> HeaderParseResult<(AstcHeader, &[u8])> {
    let header = parse_astc_header(data)?;
    let payload_len = header
        .payload_len()
        .ok_or(HeaderParseError::InvalidField("image dimensions"))?;
    let required = ASTC_HEADER_SIZE + payload_len;
    if data.len() < required {
        return Err(HeaderParseError::InputTooShort {
            required,
            actual: data.len(),
        });
    }
    Ok((header, &data[ASTC_HEADER_SIZE..required]))
}

#[inline(always)]
fn read_u24(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], 0])
}
