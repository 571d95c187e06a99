//! Common test imports for the file format API tests.

// External crates commonly used in tests
pub use rstest::rstest;

// Core functionality from this crate
pub use crate::{TextureFileFormat, WriterError, WriterResult};

pub use alloc::vec;
pub use alloc::vec::Vec;

/// Minimal container used to exercise the trait's provided methods and file output.
///
/// Serializes as `b"TEST"`, one length byte, then the payload. Fails validation
/// for payloads longer than 255 bytes.
pub(crate) struct TestContainer<'a> {
    pub payload: &'a [u8],
}

impl TextureFileFormat for TestContainer<'_> {
    const EXTENSION: &'static str = "test";

    fn serialized_len(&self) -> WriterResult<usize> {
        if self.payload.len() > u8::MAX as usize {
            return Err(WriterError::SizeMismatch {
                expected: u8::MAX as usize,
                actual: self.payload.len(),
            });
        }
        Ok(5 + self.payload.len())
    }

    fn serialize_into(&self, output: &mut [u8]) -> WriterResult<usize> {
        let len = self.checked_output_len(output)?;
        output[..4].copy_from_slice(b"TEST");
        output[4] = self.payload.len() as u8;
        output[5..len].copy_from_slice(self.payload);
        Ok(len)
    }
}
