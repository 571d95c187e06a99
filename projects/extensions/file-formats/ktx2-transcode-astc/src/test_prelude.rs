//! Common test imports for the ASTC file format tests.

pub use rstest::rstest;

pub use crate::astc::*;
pub use ktx2_transcode_common::TargetFormat;
pub use ktx2_transcode_file_formats_api::{
    HeaderParseError, TextureFileFormat, WriterError, WriterResult,
};

pub use alloc::vec;
pub use alloc::vec::Vec;
