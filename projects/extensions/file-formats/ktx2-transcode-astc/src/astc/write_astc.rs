use super::constants::*;
use alloc::vec::Vec;
use endian_writer::{EndianWriter, LittleEndianWriter};
use ktx2_transcode_common::TargetFormat;
use ktx2_transcode_file_formats_api::{TextureFileFormat, WriterError, WriterResult};

/// Block data of a single 2D ASTC image, ready to be serialized.
///
/// Nothing is validated on construction; [`TextureFileFormat::serialized_len`]
/// checks the block size, the image size and the payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstcImage<'a> {
    blocks: &'a [u8],
    block_width: u32,
    block_height: u32,
    width: u32,
    height: u32,
}

impl<'a> AstcImage<'a> {
    /// Creates an image from row-major block data.
    pub fn new(
        blocks: &'a [u8],
        block_width: u32,
        block_height: u32,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            blocks,
            block_width,
            block_height,
            width,
            height,
        }
    }

    /// Creates an image from data transcoded to an ASTC `target`.
    ///
    /// # Errors
    ///
    /// [`WriterError::UnsupportedTarget`] if `target` is not an ASTC format.
    pub fn for_target(
        blocks: &'a [u8],
        target: TargetFormat,
        width: u32,
        height: u32,
    ) -> WriterResult<Self> {
        match target.block_dims() {
            Some((block_width, block_height)) if target.is_astc() => Ok(Self::new(
                blocks,
                block_width,
                block_height,
                width,
                height,
            )),
            _ => Err(WriterError::UnsupportedTarget(target)),
        }
    }

    /// The block payload.
    pub fn blocks(&self) -> &'a [u8] {
        self.blocks
    }

    fn validate(&self) -> WriterResult<usize> {
        let block_range = MIN_BLOCK_DIM..=MAX_BLOCK_DIM;
        if !block_range.contains(&self.block_width) || !block_range.contains(&self.block_height) {
            return Err(WriterError::InvalidBlockSize {
                block_width: self.block_width,
                block_height: self.block_height,
            });
        }

        if self.width > MAX_IMAGE_DIM || self.height > MAX_IMAGE_DIM {
            return Err(WriterError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
                max: MAX_IMAGE_DIM,
            });
        }

        let expected = astc_payload_len(self.block_width, self.block_height, self.width, self.height);
        if self.blocks.len() != expected {
            return Err(WriterError::SizeMismatch {
                expected,
                actual: self.blocks.len(),
            });
        }

        Ok(expected)
    }
}

/// Payload size of an image in bytes: one 16 byte block per started block footprint.
///
/// `block_width` and `block_height` must be non-zero.
#[inline]
pub fn astc_payload_len(block_width: u32, block_height: u32, width: u32, height: u32) -> usize {
    let blocks_x = width.div_ceil(block_width) as usize;
    let blocks_y = height.div_ceil(block_height) as usize;
    blocks_x * blocks_y * ASTC_BLOCK_SIZE
}

impl TextureFileFormat for AstcImage<'_> {
    const EXTENSION: &'static str = "astc";

    fn serialized_len(&self) -> WriterResult<usize> {
        Ok(ASTC_HEADER_SIZE + self.validate()?)
    }

    fn serialize_into(&self, output: &mut [u8]) -> WriterResult<usize> {
        let len = self.checked_output_len(output)?;

        // SAFETY: checked_output_len guarantees output.len() >= ASTC_HEADER_SIZE.
        unsafe {
            let mut writer = LittleEndianWriter::new(output.as_mut_ptr());
            writer.write_u32_at(ASTC_MAGIC, 0);
        }
        output[BLOCK_WIDTH_OFFSET] = self.block_width as u8;
        output[BLOCK_HEIGHT_OFFSET] = self.block_height as u8;
        output[BLOCK_DEPTH_OFFSET] = 1;
        write_u24(output, IMAGE_WIDTH_OFFSET, self.width);
        write_u24(output, IMAGE_HEIGHT_OFFSET, self.height);
        write_u24(output, IMAGE_DEPTH_OFFSET, 1);

        output[ASTC_HEADER_SIZE..len].copy_from_slice(self.blocks);
        Ok(len)
    }
}

#[inline(always)]
fn write_u24(output: &mut [u8], offset: usize, value: u32) {
    output[offset..offset + 3].copy_from_slice(&value.to_le_bytes()[..3]);
}

/// Serializes ASTC block data into a new buffer.
///
/// # Errors
///
/// - [`WriterError::InvalidBlockSize`] if either block dimension is outside `4..=12`.
/// - [`WriterError::DimensionsTooLarge`] if a dimension does not fit in 24 bits.
/// - [`WriterError::SizeMismatch`] if `blocks` is not exactly
///   `ceil(width / block_width) * ceil(height / block_height) * 16` bytes long.
pub fn write_astc_to_vec(
    blocks: &[u8],
    block_width: u32,
    block_height: u32,
    width: u32,
    height: u32,
) -> WriterResult<Vec<u8>> {
    AstcImage::new(blocks, block_width, block_height, width, height).to_vec()
}

/// Writes ASTC block data to a `.astc` file at `path`.
///
/// Validation happens before the file is created: on any of the errors listed
/// for [`write_astc_to_vec`] the target path is left untouched.
#[cfg(feature = "file-io")]
pub fn write_astc(
    path: &std::path::Path,
    blocks: &[u8],
    block_width: u32,
    block_height: u32,
    width: u32,
    height: u32,
) -> WriterResult<()> {
    let image = AstcImage::new(blocks, block_width, block_height, width, height);
    ktx2_transcode_file_formats_api::write_to_file(&image, path)
}
