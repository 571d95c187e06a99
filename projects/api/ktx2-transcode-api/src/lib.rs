#![doc = include_str!("../README.MD")]

//! # Example
//!
//! ```ignore
//! use ktx2_transcode_api::{EngineConfig, SliceIndex, TranscodeOptions, Transcoder};
//!
//! let transcoder = Transcoder::from_config(
//!     &EngineConfig::new().with_wasm_module("basisu_transcoder.wasm"),
//! )?;
//! let mut handle = transcoder.open(&std::fs::read("texture.ktx2")?)?;
//! let target = handle.resolve("BC7")?;
//! let slice = handle.transcode_slice(target, SliceIndex::default(), &TranscodeOptions::new(), None)?;
//! handle.close()?;
//! ```

#[cfg(test)]
pub mod test_prelude;

pub mod container;
pub mod decode;
pub mod error;
pub mod export;
pub mod options;
pub mod resolve;
pub mod state;
pub mod transcode;
pub mod transcoder;

pub use container::{ContainerHandle, ContainerMetadata, DfdInfo, HandleState, SliceInfo};
pub use decode::DecodedImage;
pub use error::{TranscodeError, TranscodeResult};
pub use export::{ExportOptions, ExportReport, ExportedFile};
pub use options::TranscodeOptions;
pub use resolve::{normalize_family, parse_family, Family};
pub use state::TranscodeState;
pub use transcode::TranscodedSlice;
pub use transcoder::Transcoder;

// Types callers need alongside the API.
pub use ktx2_transcode_bridge::{BackendKind, BackendPreference, Bridge, BridgeError, EngineConfig};
pub use ktx2_transcode_common::{DecodeFlags, SliceIndex, SourceBlockFormat, TargetFormat};
