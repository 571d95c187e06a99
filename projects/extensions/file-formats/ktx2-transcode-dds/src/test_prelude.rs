//! Common test imports for DDS writer tests.
#![allow(unused_imports)]

pub use alloc::{vec, vec::Vec};

pub use rstest::rstest;

pub use crate::dds::*;
pub use ktx2_transcode_common::TargetFormat;
pub use ktx2_transcode_file_formats_api::{
    HeaderParseError, TextureFileFormat, WriterError, WriterResult,
};
