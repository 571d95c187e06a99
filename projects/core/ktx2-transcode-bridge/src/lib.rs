#![doc = include_str!("../README.MD")]

#[cfg(test)]
pub mod test_prelude;

pub mod bridge;
pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod format_info;
pub mod handles;
mod select;

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(any(test, feature = "reference-engine"))]
pub mod reference;

pub use bridge::{Bridge, ImageLevelRequest};
pub use buffer::ForeignBuffer;
pub use config::{BackendPreference, EngineConfig};
pub use engine::{
    BackendKind, ContainerQuery, SliceQuery, SourceFormatQuery, TargetFormatQuery, TranscodeCall,
    TranscoderEngine,
};
pub use error::{BridgeError, BridgeResult};
pub use format_info::{SourceFormatInfo, TargetFormatInfo};
pub use handles::{ContainerId, TranscodeStateId};

#[cfg(feature = "native")]
pub use native::NativeEngine;
#[cfg(any(test, feature = "reference-engine"))]
pub use reference::{ReferenceContainer, ReferenceEngine};
#[cfg(feature = "wasm")]
pub use wasm::WasmEngine;

// Format types used throughout the public API.
pub use ktx2_transcode_common::{
    DecodeFlags, SliceIndex, SliceIter, SourceBlockFormat, TargetFormat,
};
