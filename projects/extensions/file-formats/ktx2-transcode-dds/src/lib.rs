#![doc = include_str!("../README.MD")]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

#[cfg(test)]
pub mod test_prelude;

pub mod dds;

pub use dds::*;
