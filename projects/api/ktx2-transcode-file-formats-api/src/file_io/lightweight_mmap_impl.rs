//! File output implementation using lightweight-mmap.

use crate::{TextureFileFormat, WriterResult};
use lightweight_mmap::handles::*;
use lightweight_mmap::mmap::*;
use std::path::Path;

/// Serializes `container` into a new file at `output_path`.
///
/// The container is validated before the file is created, so invalid input
/// never touches the file system. If writing fails after the file was created,
/// the partial file is removed (best effort).
///
/// # Arguments
///
/// * `container` - The container to write
/// * `output_path` - Path to the output file (will be created). The output directory must exist.
pub fn write_to_file<F: TextureFileFormat>(container: &F, output_path: &Path) -> WriterResult<()> {
    let len = container.serialized_len()?;
    let output_handle = ReadWriteFileHandle::create_preallocated(output_path, len as i64)?;

    let result = write_mapped(container, &output_handle, len);
    drop(output_handle);
    if result.is_err() {
        let _ = std::fs::remove_file(output_path);
    }
    result
}

fn write_mapped<F: TextureFileFormat>(
    container: &F,
    output_handle: &ReadWriteFileHandle,
    len: usize,
) -> WriterResult<()> {
    let mut output_mapping = ReadWriteMmap::new(output_handle, 0, len)?;
    container.serialize_into(output_mapping.as_mut_slice())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;
    use crate::FileIoError;

    #[test]
    fn writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.test");
        let container = TestContainer {
            payload: &[5, 6, 7, 8],
        };

        write_to_file(&container, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), container.to_vec().unwrap());
    }

    #[test]
    fn invalid_container_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.test");
        let payload = [0u8; 300];

        let err = write_to_file(&TestContainer { payload: &payload }, &path).unwrap_err();
        assert!(matches!(err, WriterError::SizeMismatch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.test");

        let err = write_to_file(&TestContainer { payload: &[1] }, &path).unwrap_err();
        assert!(matches!(err, WriterError::Io(FileIoError::LightweightMmap(_))));
        assert!(!path.exists());
    }
}
