//! Error types for the foreign engine bridge.

use crate::engine::BackendKind;
use ktx2_transcode_common::InvalidEnumValue;
use thiserror::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while talking to a foreign engine.
///
/// All of these are recoverable by the caller; none of them leave foreign
/// memory allocated on the caller's behalf.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine could not satisfy an allocation request.
    #[error("Foreign engine could not allocate {requested} bytes")]
    OutOfForeignMemory { requested: usize },

    /// A read or write fell outside the buffer (or linear memory) it targeted.
    #[error("Access of {len} bytes at offset {offset} exceeds buffer of {capacity} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// The backend failed to load or initialise.
    #[error("{backend} engine unavailable: {reason}")]
    EngineUnavailable { backend: BackendKind, reason: String },

    /// The backend was requested but not compiled in.
    #[error("{0} backend support was not compiled in")]
    BackendDisabled(BackendKind),

    /// Automatic selection exhausted every candidate backend.
    #[error("No transcoder engine could be loaded: {0}")]
    NoBackendAvailable(String),

    /// The engine does not export an entry point (or exports it with another signature).
    #[error("Engine does not export '{name}': {reason}")]
    MissingExport { name: &'static str, reason: String },

    /// A call into the engine trapped or otherwise failed to complete.
    #[error("Call to '{export}' failed: {message}")]
    ForeignCall {
        export: &'static str,
        message: String,
    },

    /// The engine returned a value outside a known enumeration.
    #[error(transparent)]
    InvalidEnumValue(#[from] InvalidEnumValue),

    /// A length does not fit in the engine's 32-bit size parameters.
    #[error("Length {0} does not fit the engine's 32-bit size parameter")]
    LengthOverflow(usize),
}
