//! Error types for container writers and header parsers.

use ktx2_transcode_common::TargetFormat;
use thiserror::Error;

/// Result type for writer operations
pub type WriterResult<T> = Result<T, WriterError>;

/// Result type for header parsing
pub type HeaderParseResult<T> = Result<T, HeaderParseError>;

/// Errors raised while serializing a texture container.
///
/// Every variant except [`WriterError::Io`] is raised before any output is
/// produced.
#[derive(Debug, Error)]
pub enum WriterError {
    /// Block dimensions outside what the container format can describe.
    #[error("Invalid block size {block_width}x{block_height}")]
    InvalidBlockSize { block_width: u32, block_height: u32 },

    /// The block payload does not match the size implied by the image dimensions.
    #[error("Block data size mismatch: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch { expected: usize, actual: usize },

    /// The block payload is shorter than the data section being written.
    #[error("Block data too small: required {required} bytes, got {actual} bytes")]
    BufferTooSmall { required: usize, actual: usize },

    /// The caller's output buffer cannot hold the serialized container.
    #[error("Output buffer too small: required {required} bytes, got {actual} bytes")]
    OutputBufferTooSmall { required: usize, actual: usize },

    /// Image dimensions that do not fit in the container's header fields.
    #[error("Image dimensions {width}x{height} exceed the format limit of {max}")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },

    /// The container format has no representation for this target format.
    #[error("{0} cannot be stored in this container format")]
    UnsupportedTarget(TargetFormat),

    /// Creating or writing the output file failed.
    #[cfg(feature = "file-io")]
    #[error("I/O operation failed: {0}")]
    Io(#[from] crate::file_io::FileIoError),
}

/// Errors raised while reading back a container header.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeaderParseError {
    /// Input buffer is too short to hold the header
    #[error("Input buffer too short: required at least {required} bytes, got {actual} bytes")]
    InputTooShort { required: usize, actual: usize },

    /// The input does not start with the container's magic bytes.
    #[error("Invalid magic bytes")]
    InvalidMagic,

    /// A header field holds a value the format does not allow.
    #[error("Invalid header field: {0}")]
    InvalidField(&'static str),
}
