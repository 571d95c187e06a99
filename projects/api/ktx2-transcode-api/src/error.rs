//! Error types for container transcoding.

use ktx2_transcode_bridge::BridgeError;
use ktx2_transcode_common::{SliceIndex, TargetFormat};
use ktx2_transcode_file_formats_api::WriterError;
use thiserror::Error;

/// Result type for transcoding operations
pub type TranscodeResult<T> = Result<T, TranscodeError>;

/// Errors that can occur while opening, resolving, transcoding or exporting a container.
///
/// Every variant is recoverable. A function returning one of these has already
/// released any foreign buffer it allocated.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The resolved target and the container disagree on HDR vs LDR.
    #[error("Target format {target} does not match the container's dynamic range (container is HDR: {container_is_hdr})")]
    FormatMismatch {
        /// The resolved target format
        target: TargetFormat,
        /// Whether the container holds HDR data
        container_is_hdr: bool,
    },

    /// The engine reports a zero output size for this target and image size.
    #[error("Engine cannot produce {target} output for a {width}x{height} image")]
    UnsupportedFormat {
        /// The requested target format
        target: TargetFormat,
        /// Original width of the slice
        width: u32,
        /// Original height of the slice
        height: u32,
    },

    /// The engine reported failure while transcoding a slice.
    #[error("Transcoding {slice} to {target} failed")]
    TranscodeFailed {
        /// The slice being transcoded
        slice: SliceIndex,
        /// The requested target format
        target: TargetFormat,
    },

    /// The engine refused to prepare the container for transcoding.
    #[error("Engine failed to start transcoding the container")]
    StartTranscodingFailed,

    /// The engine could not create scratch transcode state.
    #[error("Engine failed to create a transcode state")]
    StateCreationFailed,

    /// The engine rejected the container bytes.
    #[error("Engine rejected a {len} byte container")]
    OpenFailed {
        /// Length of the rejected input
        len: usize,
    },

    /// The handle was already closed.
    #[error("Container handle used after close")]
    UseAfterClose,

    /// The slice does not exist in this container.
    #[error("Slice ({slice}) is outside a container with {levels} levels, {layers} layers and {faces} faces")]
    SliceOutOfRange {
        /// The requested slice
        slice: SliceIndex,
        /// Level count of the container
        levels: u32,
        /// Raw layer count of the container (0 means not an array)
        layers: u32,
        /// Face count of the container
        faces: u32,
    },

    /// The engine reported metadata that breaks a container invariant.
    #[error("Container metadata is invalid: {0}")]
    InvalidMetadata(&'static str),

    /// The container has no image data.
    #[error("Container has zero width, height or levels")]
    EmptyContainer,

    /// An engine call failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// An output file could not be written.
    #[error(transparent)]
    Writer(#[from] WriterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_mismatch_names_both_sides() {
        let err = TranscodeError::FormatMismatch {
            target: TargetFormat::Bc7Rgba,
            container_is_hdr: true,
        };
        let message = err.to_string();
        assert!(message.contains("BC7_RGBA"));
        assert!(message.contains("container is HDR: true"));
    }

    #[test]
    fn bridge_errors_convert() {
        let err: TranscodeError = BridgeError::OutOfForeignMemory { requested: 64 }.into();
        assert!(matches!(
            err,
            TranscodeError::Bridge(BridgeError::OutOfForeignMemory { requested: 64 })
        ));
    }
}
