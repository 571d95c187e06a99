//! DDS format constants and definitions

/// Magic header for DDS files
pub const DDS_MAGIC: u32 = 0x44445320_u32.to_be();

/// Size of the magic plus the surface descriptor.
pub const DDS_HEADER_SIZE: usize = 0x80;

/// Size of the `DDS_HEADER_DXT10` extension.
pub const DX10_HEADER_SIZE: usize = 20;

/// Value of the descriptor's own size field.
pub(crate) const DDS_DESCRIPTOR_SIZE: u32 = 124;

/// Value of the pixel format's own size field.
pub(crate) const DDS_PIXELFORMAT_SIZE: u32 = 32;

pub(crate) const FOURCC_DXT1: u32 = 0x31545844_u32.to_le(); // 'DXT1'
pub(crate) const FOURCC_DXT5: u32 = 0x35545844_u32.to_le(); // 'DXT5'
pub(crate) const FOURCC_ATI1: u32 = 0x31495441_u32.to_le(); // 'ATI1'
pub(crate) const FOURCC_ATI2: u32 = 0x32495441_u32.to_le(); // 'ATI2'
pub(crate) const FOURCC_DX10: u32 = 0x30315844_u32.to_le(); // 'DX10'

// Surface descriptor field offsets, counted from the start of the file
pub(crate) const DDS_SIZE_OFFSET: usize = 0x04;
pub(crate) const DDS_FLAGS_OFFSET: usize = 0x08;
pub(crate) const DDS_HEIGHT_OFFSET: usize = 0x0C;
pub(crate) const DDS_WIDTH_OFFSET: usize = 0x10;
pub(crate) const DDS_LINEAR_SIZE_OFFSET: usize = 0x14;
pub(crate) const DDS_PIXELFORMAT_OFFSET: usize = 0x4C;
pub(crate) const DDS_PIXELFORMAT_FLAGS_OFFSET: usize = 0x50;
pub(crate) const FOURCC_OFFSET: usize = 0x54;
pub(crate) const DDS_CAPS_OFFSET: usize = 0x6C;

// DX10 extension field offsets
pub(crate) const DX10_FORMAT_OFFSET: usize = 0x80;
pub(crate) const DX10_RESOURCE_DIMENSION_OFFSET: usize = 0x84;
pub(crate) const DX10_MISC_FLAG_OFFSET: usize = 0x88;
pub(crate) const DX10_ARRAY_SIZE_OFFSET: usize = 0x8C;
pub(crate) const DX10_MISC_FLAGS2_OFFSET: usize = 0x90;

// DDS header flags
pub(crate) const DDSD_CAPS: u32 = 0x1;
pub(crate) const DDSD_HEIGHT: u32 = 0x2;
pub(crate) const DDSD_WIDTH: u32 = 0x4;
pub(crate) const DDSD_PIXELFORMAT: u32 = 0x1000;
pub(crate) const DDSD_LINEARSIZE: u32 = 0x80000;

// DDS pixel format flags
pub(crate) const DDPF_FOURCC: u32 = 0x4;

// DDS caps
pub(crate) const DDSCAPS_TEXTURE: u32 = 0x1000;

pub(crate) const D3D10_RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;
