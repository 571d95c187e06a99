//! Error types for file I/O operations.

use thiserror::Error;

/// Specific backend-related errors that can occur during file I/O operations.
#[derive(Debug, Error)]
pub enum LightweightMmapError {
    /// Error opening file handle
    #[error("Failed to open file handle: {0}")]
    FileHandle(#[from] lightweight_mmap::handles::HandleOpenError),

    /// Error creating memory mapping
    #[error("Failed to create memory mapping: {0}")]
    MemoryMapping(#[from] lightweight_mmap::mmap::MmapError),
}

/// File I/O errors that can occur with different backends
#[derive(Debug, Error)]
pub enum FileIoError {
    /// Error from lightweight-mmap backend
    #[error("lightweight-mmap error: {0}")]
    LightweightMmap(#[from] LightweightMmapError),

    /// Error from std I/O operations
    #[error("I/O error: {0}")]
    Std(#[from] std::io::Error),
}

// Direct From implementations so `?` works on lightweight-mmap calls in writer code.
impl From<lightweight_mmap::handles::HandleOpenError> for crate::WriterError {
    fn from(e: lightweight_mmap::handles::HandleOpenError) -> Self {
        Self::Io(FileIoError::LightweightMmap(
            LightweightMmapError::FileHandle(e),
        ))
    }
}

impl From<lightweight_mmap::mmap::MmapError> for crate::WriterError {
    fn from(e: lightweight_mmap::mmap::MmapError) -> Self {
        Self::Io(FileIoError::LightweightMmap(
            LightweightMmapError::MemoryMapping(e),
        ))
    }
}

impl From<std::io::Error> for crate::WriterError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(FileIoError::Std(e))
    }
}
