//! Common test imports and utilities for the common crate tests
#![allow(unused_imports)]

// External crates commonly used in tests
pub use rstest::rstest;

pub use crate::{DecodeFlags, SliceIndex, SourceBlockFormat, TargetFormat};
