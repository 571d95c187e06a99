//! The interface shared by all container writers.

use crate::error::{WriterError, WriterResult};
use alloc::vec;
use alloc::vec::Vec;

/// A texture container ready to be serialized.
///
/// Implementations validate their inputs in [`TextureFileFormat::serialized_len`],
/// so a caller can reject bad data before creating any output. This is what
/// lets [`write_to_file`](crate::write_to_file) guarantee that invalid input
/// never leaves a file behind.
pub trait TextureFileFormat {
    /// File extension, without the leading dot.
    const EXTENSION: &'static str;

    /// Validates the container and returns its exact serialized size in bytes.
    fn serialized_len(&self) -> WriterResult<usize>;

    /// Writes the container into the start of `output`.
    ///
    /// # Returns
    ///
    /// The number of bytes written, equal to [`TextureFileFormat::serialized_len`].
    ///
    /// # Errors
    ///
    /// Any validation error of [`TextureFileFormat::serialized_len`], or
    /// [`WriterError::OutputBufferTooSmall`] if `output` is too short. Nothing is
    /// written when an error is returned.
    fn serialize_into(&self, output: &mut [u8]) -> WriterResult<usize>;

    /// Serializes the container into a new buffer.
    fn to_vec(&self) -> WriterResult<Vec<u8>> {
        let mut output = vec![0u8; self.serialized_len()?];
        let written = self.serialize_into(&mut output)?;
        output.truncate(written);
        Ok(output)
    }

    /// Validates the container and checks that `output` can hold it.
    ///
    /// Helper for implementations of [`TextureFileFormat::serialize_into`].
    fn checked_output_len(&self, output: &[u8]) -> WriterResult<usize> {
        let required = self.serialized_len()?;
        if output.len() < required {
            return Err(WriterError::OutputBufferTooSmall {
                required,
                actual: output.len(),
            });
        }
        Ok(required)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    #[test]
    fn to_vec_matches_serialized_len() {
        let container = TestContainer {
            payload: &[1, 2, 3],
        };
        let bytes = container.to_vec().unwrap();
        assert_eq!(bytes.len(), container.serialized_len().unwrap());
        assert_eq!(bytes, [b'T', b'E', b'S', b'T', 3, 1, 2, 3]);
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    fn serialize_into_rejects_short_output(#[case] len: usize) {
        let container = TestContainer {
            payload: &[1, 2, 3],
        };
        let mut output = vec![0xAAu8; len];
        let err = container.serialize_into(&mut output).unwrap_err();
        assert!(matches!(
            err,
            WriterError::OutputBufferTooSmall { required: 8, actual } if actual == len
        ));
        assert!(output.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn serialize_into_leaves_trailing_bytes_untouched() {
        let container = TestContainer { payload: &[9] };
        let mut output = vec![0xAAu8; 8];
        assert_eq!(container.serialize_into(&mut output).unwrap(), 6);
        assert_eq!(&output[6..], [0xAA, 0xAA]);
    }
}
