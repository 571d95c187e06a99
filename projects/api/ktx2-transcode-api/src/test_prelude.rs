//! Common test imports for the API tests.

// External crates commonly used in tests
pub use rstest::rstest;

// Engine used by every test
pub use ktx2_transcode_bridge::{Bridge, ReferenceContainer, ReferenceEngine};

// Core functionality from this crate
pub use crate::{
    ContainerHandle, ExportOptions, HandleState, TranscodeError, TranscodeOptions, Transcoder,
};

// Common types from ktx2_transcode_common
pub use ktx2_transcode_common::{SliceIndex, SourceBlockFormat, TargetFormat};
