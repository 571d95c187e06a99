//! Errors produced when converting raw engine values into typed enums.

use thiserror::Error;

/// Which enumeration a raw value failed to convert into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFormatKind {
    /// [`TargetFormat`](crate::TargetFormat)
    TargetFormat,
    /// [`SourceBlockFormat`](crate::SourceBlockFormat)
    SourceBlockFormat,
}

/// A raw numeric value does not name any known variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown {kind:?} value: {value}")]
pub struct InvalidEnumValue {
    /// Target enumeration.
    pub kind: UnknownFormatKind,
    /// The raw value that was rejected.
    pub value: u32,
}
