//! Engine loaded as a native shared library.
//!
//! The library exposes the same `bt_*` C ABI as the WASM build. Addresses it
//! returns are host pointers, so memory is copied directly.

use crate::engine::{
    exports, BackendKind, ContainerQuery, SliceQuery, SourceFormatQuery, TargetFormatQuery,
    TranscodeCall, TranscoderEngine,
};
use crate::error::{BridgeError, BridgeResult};
use libloading::Library;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

type AllocFn = unsafe extern "C" fn(u64) -> u64;
type FreeFn = unsafe extern "C" fn(u64);
type HandleFn = unsafe extern "C" fn(u64) -> u32;
type FormatFn = unsafe extern "C" fn(u32) -> u32;
type SliceFn = unsafe extern "C" fn(u64, u32, u32, u32) -> u32;
type TranscodeFn = unsafe extern "C" fn(
    u64,
    u32,
    u32,
    u32,
    u64,
    u32,
    u32,
    u32,
    u32,
    u32,
    i32,
    i32,
    u64,
) -> u32;

/// Platform file name of the engine library (`libbasisu_transcoder.so`, `basisu_transcoder.dll`, ...).
pub fn default_library_name() -> OsString {
    libloading::library_filename("basisu_transcoder")
}

/// Engine backed by a native shared library.
pub struct NativeEngine {
    // Function pointers below are only valid while the library stays loaded.
    library: Library,
    alloc: AllocFn,
    free: FreeFn,
    transcode: TranscodeFn,
}

impl NativeEngine {
    /// Loads the library at `path` and runs `bt_init`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::EngineUnavailable`] if the library cannot be loaded or
    /// lacks the memory or transcode entry points.
    pub fn load(path: &Path) -> BridgeResult<Self> {
        // SAFETY: Loading runs the library's initialisers; the engine library has none with preconditions.
        let library = unsafe { Library::new(path) }.map_err(|e| BridgeError::EngineUnavailable {
            backend: BackendKind::Native,
            reason: format!("{}: {e}", path.display()),
        })?;

        let alloc = required_symbol::<AllocFn>(&library, exports::ALLOC)?;
        let free = required_symbol::<FreeFn>(&library, exports::FREE)?;
        let transcode = required_symbol::<TranscodeFn>(&library, exports::TRANSCODE_IMAGE_LEVEL)?;

        let engine = Self {
            library,
            alloc,
            free,
            transcode,
        };

        if let Ok(init) = engine.symbol::<unsafe extern "C" fn()>(exports::INIT) {
            // SAFETY: Signature matches the engine ABI.
            unsafe { init() };
        }

        debug!(path = %path.display(), "loaded native transcoder library");
        Ok(engine)
    }

    fn symbol<T: Copy>(&self, name: &'static str) -> BridgeResult<T> {
        // SAFETY: `T` is one of the function pointer types above, matching the engine ABI for `name`.
        unsafe { self.library.get::<T>(name.as_bytes()) }
            .map(|symbol| *symbol)
            .map_err(|e| BridgeError::MissingExport {
                name,
                reason: e.to_string(),
            })
    }
}

fn required_symbol<T: Copy>(library: &Library, name: &'static str) -> BridgeResult<T> {
    // SAFETY: `T` matches the engine ABI for `name`.
    unsafe { library.get::<T>(name.as_bytes()) }
        .map(|symbol| *symbol)
        .map_err(|e| BridgeError::EngineUnavailable {
            backend: BackendKind::Native,
            reason: format!("missing export '{name}': {e}"),
        })
}

impl TranscoderEngine for NativeEngine {
    fn backend(&self) -> BackendKind {
        BackendKind::Native
    }

    fn alloc(&self, size: u64) -> BridgeResult<u64> {
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { (self.alloc)(size) })
    }

    fn free(&self, address: u64) -> BridgeResult<()> {
        // SAFETY: Signature matches the engine ABI.
        unsafe { (self.free)(address) };
        Ok(())
    }

    unsafe fn write_memory(&self, address: u64, data: &[u8]) -> BridgeResult<()> {
        // SAFETY: The caller guarantees `address` is a live allocation of at least `data.len()` bytes.
        core::ptr::copy_nonoverlapping(data.as_ptr(), address as usize as *mut u8, data.len());
        Ok(())
    }

    unsafe fn read_memory(&self, address: u64, out: &mut [u8]) -> BridgeResult<()> {
        // SAFETY: The caller guarantees `address` is a live allocation of at least `out.len()` bytes.
        core::ptr::copy_nonoverlapping(address as usize as *const u8, out.as_mut_ptr(), out.len());
        Ok(())
    }

    fn version(&self) -> BridgeResult<u32> {
        let f = self.symbol::<unsafe extern "C" fn() -> u32>(exports::GET_VERSION)?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f() })
    }

    fn enable_debug_printf(&self, enabled: bool) -> BridgeResult<()> {
        let f = self.symbol::<unsafe extern "C" fn(u32)>(exports::ENABLE_DEBUG_PRINTF)?;
        // SAFETY: Signature matches the engine ABI.
        unsafe { f(u32::from(enabled)) };
        Ok(())
    }

    fn source_format_query(&self, query: SourceFormatQuery, format: u32) -> BridgeResult<u32> {
        let f = self.symbol::<FormatFn>(query.export_name())?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f(format) })
    }

    fn target_format_query(&self, query: TargetFormatQuery, format: u32) -> BridgeResult<u32> {
        let f = self.symbol::<FormatFn>(query.export_name())?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f(format) })
    }

    fn matching_target(&self, source_format: u32) -> BridgeResult<u32> {
        let f = self.symbol::<FormatFn>(exports::MATCHING_TARGET)?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f(source_format) })
    }

    fn is_format_supported(&self, target_format: u32, source_format: u32) -> BridgeResult<u32> {
        let f = self.symbol::<unsafe extern "C" fn(u32, u32) -> u32>(exports::IS_FORMAT_SUPPORTED)?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f(target_format, source_format) })
    }

    fn transcoded_size(&self, target_format: u32, width: u32, height: u32) -> BridgeResult<u32> {
        let f = self.symbol::<unsafe extern "C" fn(u32, u32, u32) -> u32>(exports::TRANSCODED_SIZE)?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f(target_format, width, height) })
    }

    fn ktx2_open(&self, address: u64, len: u32) -> BridgeResult<u64> {
        let f = self.symbol::<unsafe extern "C" fn(u64, u32) -> u64>(exports::KTX2_OPEN)?;
        // SAFETY: Signature matches the engine ABI; `address` is a live allocation of `len` bytes.
        Ok(unsafe { f(address, len) })
    }

    fn ktx2_close(&self, handle: u64) -> BridgeResult<()> {
        let f = self.symbol::<unsafe extern "C" fn(u64)>(exports::KTX2_CLOSE)?;
        // SAFETY: Signature matches the engine ABI.
        unsafe { f(handle) };
        Ok(())
    }

    fn container_query(&self, query: ContainerQuery, handle: u64) -> BridgeResult<u32> {
        let f = self.symbol::<HandleFn>(query.export_name())?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f(handle) })
    }

    fn nit_multiplier(&self, handle: u64) -> BridgeResult<f32> {
        let f = self.symbol::<unsafe extern "C" fn(u64) -> f32>(exports::NIT_MULTIPLIER)?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f(handle) })
    }

    fn slice_query(
        &self,
        query: SliceQuery,
        handle: u64,
        level: u32,
        layer: u32,
        face: u32,
    ) -> BridgeResult<u32> {
        let f = self.symbol::<SliceFn>(query.export_name())?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f(handle, level, layer, face) })
    }

    fn start_transcoding(&self, handle: u64) -> BridgeResult<u32> {
        let f = self.symbol::<HandleFn>(exports::START_TRANSCODING)?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f(handle) })
    }

    fn create_transcode_state(&self) -> BridgeResult<u64> {
        let f = self.symbol::<unsafe extern "C" fn() -> u64>(exports::CREATE_TRANSCODE_STATE)?;
        // SAFETY: Signature matches the engine ABI.
        Ok(unsafe { f() })
    }

    fn destroy_transcode_state(&self, state: u64) -> BridgeResult<()> {
        let f = self.symbol::<FreeFn>(exports::DESTROY_TRANSCODE_STATE)?;
        // SAFETY: Signature matches the engine ABI.
        unsafe { f(state) };
        Ok(())
    }

    fn transcode_image_level(&self, call: &TranscodeCall) -> BridgeResult<u32> {
        // SAFETY: Signature matches the engine ABI; the output address is a live allocation
        // large enough for `output_blocks_or_pixels` units of the target format.
        Ok(unsafe {
            (self.transcode)(
                call.handle,
                call.level,
                call.layer,
                call.face,
                call.output,
                call.output_blocks_or_pixels,
                call.target_format,
                call.decode_flags,
                call.row_pitch,
                call.rows_in_pixels,
                call.channel0,
                call.channel1,
                call.state,
            )
        })
    }
}
