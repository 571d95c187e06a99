//! Common test imports for the bridge tests.

// External crates commonly used in tests
pub use rstest::rstest;

// Core functionality from this crate
pub use crate::reference::{ReferenceContainer, ReferenceEngine};
pub use crate::{
    BackendKind, BackendPreference, Bridge, BridgeError, ContainerQuery, EngineConfig,
    ForeignBuffer, ImageLevelRequest, SliceQuery, TranscoderEngine,
};
#[cfg(feature = "wasm")]
pub use crate::WasmEngine;

// Common types from ktx2_transcode_common
pub use ktx2_transcode_common::{DecodeFlags, SliceIndex, SourceBlockFormat, TargetFormat};
