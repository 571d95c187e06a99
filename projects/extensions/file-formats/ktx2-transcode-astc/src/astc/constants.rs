//! ASTC file format constants

/// Magic header for ASTC files, `13 AB A1 5C` on disk.
pub const ASTC_MAGIC: u32 = 0x5CA1AB13;

/// Size of the ASTC file header.
pub const ASTC_HEADER_SIZE: usize = 16;

/// Every ASTC block is 128 bits, whatever its footprint.
pub const ASTC_BLOCK_SIZE: usize = 16;

/// Smallest block edge the writer accepts.
pub const MIN_BLOCK_DIM: u32 = 4;

/// Largest block edge the writer accepts.
pub const MAX_BLOCK_DIM: u32 = 12;

/// Largest value of a 24-bit dimension field.
pub const MAX_IMAGE_DIM: u32 = 0x00FF_FFFF;

// Header field offsets
pub(crate) const BLOCK_WIDTH_OFFSET: usize = 4;
pub(crate) const BLOCK_HEIGHT_OFFSET: usize = 5;
pub(crate) const BLOCK_DEPTH_OFFSET: usize = 6;
pub(crate) const IMAGE_WIDTH_OFFSET: usize = 7;
pub(crate) const IMAGE_HEIGHT_OFFSET: usize = 10;
pub(crate) const IMAGE_DEPTH_OFFSET: usize = 13;
