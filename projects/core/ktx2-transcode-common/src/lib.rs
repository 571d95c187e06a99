#![doc = include_str!("../README.MD")]
#![no_std]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(test)]
pub mod test_prelude;

pub mod decode_flags;
pub mod error;
pub mod slice;
pub mod source_format;
pub mod target_format;

pub use decode_flags::DecodeFlags;
pub use error::{InvalidEnumValue, UnknownFormatKind};
pub use slice::{effective_layer_count, SliceIndex, SliceIter};
pub use source_format::SourceBlockFormat;
pub use target_format::TargetFormat;
