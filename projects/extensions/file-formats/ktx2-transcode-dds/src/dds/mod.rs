/// Shared constants between modules.
pub mod constants;

/// DXGI format identifiers and the mapping from transcode targets.
pub mod dxgi;

/// Read back the header of a DDS file.
pub mod parse_dds;

/// Serialize block data into a DDS file.
pub mod write_dds;

pub use dxgi::*;
pub use parse_dds::*;
pub use write_dds::*;
