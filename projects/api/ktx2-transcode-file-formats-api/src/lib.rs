#![doc = include_str!("../README.MD")]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

#[cfg(test)]
pub mod test_prelude;

pub mod error;
pub mod traits;

#[cfg(feature = "file-io")]
pub mod file_io;

pub use error::{HeaderParseError, HeaderParseResult, WriterError, WriterResult};
pub use traits::TextureFileFormat;

#[cfg(feature = "file-io")]
pub use file_io::{write_to_file, FileIoError};
