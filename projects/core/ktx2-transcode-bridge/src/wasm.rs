//! Engine running as a WebAssembly module inside wasmtime.
//!
//! Addresses are offsets into the module's exported `memory`; all copies go
//! through wasmtime's bounds-checked accessors. The store is not reentrant, so
//! every call takes the instance lock for its duration.
//!
//! WASI preview 1 is linked with the host's stdout and stderr, so the engine's
//! debug output and abort messages reach the terminal.

use crate::engine::{
    exports, BackendKind, ContainerQuery, SliceQuery, SourceFormatQuery, TargetFormatQuery,
    TranscodeCall, TranscoderEngine,
};
use crate::error::{BridgeError, BridgeResult};
use parking_lot::Mutex;
use std::path::Path;
use tracing::debug;
use wasmtime::{Engine, Instance, Linker, Memory, Module, Store, TypedFunc, WasmParams, WasmResults};
use wasmtime_wasi::p1::{self, WasiP1Ctx};
use wasmtime_wasi::WasiCtxBuilder;

type TranscodeParams = (
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
);

struct WasmInstance {
    store: Store<WasiP1Ctx>,
    instance: Instance,
    memory: Memory,
    alloc: TypedFunc<u64, u64>,
    free: TypedFunc<u64, ()>,
    transcode: TypedFunc<TranscodeParams, u32>,
}

/// Engine backed by the WASM build of the transcoder.
///
/// WASI imports are provided by `wasmtime-wasi`; any other import the module
/// declares is linked as a trap.
pub struct WasmEngine {
    inner: Mutex<WasmInstance>,
}

fn unavailable(reason: impl core::fmt::Display) -> BridgeError {
    BridgeError::EngineUnavailable {
        backend: BackendKind::Wasm,
        reason: reason.to_string(),
    }
}

impl WasmEngine {
    /// Compiles and instantiates the module at `path`.
    pub fn from_file(path: &Path) -> BridgeResult<Self> {
        let engine = Engine::default();
        let module = Module::from_file(&engine, path)
            .map_err(|e| unavailable(format_args!("{}: {e:#}", path.display())))?;
        debug!(path = %path.display(), "compiled transcoder module");
        Self::instantiate(&engine, &module)
    }

    /// Compiles and instantiates a module from its binary (or text) form.
    pub fn from_bytes(bytes: &[u8]) -> BridgeResult<Self> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes).map_err(|e| unavailable(format_args!("{e:#}")))?;
        Self::instantiate(&engine, &module)
    }

    fn instantiate(engine: &Engine, module: &Module) -> BridgeResult<Self> {
        let mut linker: Linker<WasiP1Ctx> = Linker::new(engine);
        p1::add_to_linker_sync(&mut linker, |wasi| wasi)
            .map_err(|e| unavailable(format_args!("linking WASI failed: {e:#}")))?;
        linker
            .define_unknown_imports_as_traps(module)
            .map_err(|e| unavailable(format_args!("{e:#}")))?;

        let wasi = WasiCtxBuilder::new()
            .inherit_stdout()
            .inherit_stderr()
            .build_p1();
        let mut store = Store::new(engine, wasi);
        let instance = linker
            .instantiate(&mut store, module)
            .map_err(|e| unavailable(format_args!("instantiation failed: {e:#}")))?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| unavailable("module does not export 'memory'"))?;
        let alloc = instance
            .get_typed_func::<u64, u64>(&mut store, exports::ALLOC)
            .map_err(|e| unavailable(format_args!("'{}': {e:#}", exports::ALLOC)))?;
        let free = instance
            .get_typed_func::<u64, ()>(&mut store, exports::FREE)
            .map_err(|e| unavailable(format_args!("'{}': {e:#}", exports::FREE)))?;
        let transcode = instance
            .get_typed_func::<TranscodeParams, u32>(&mut store, exports::TRANSCODE_IMAGE_LEVEL)
            .map_err(|e| unavailable(format_args!("'{}': {e:#}", exports::TRANSCODE_IMAGE_LEVEL)))?;

        // WASI reactors must run their constructors before any other export.
        for name in ["_initialize", exports::INIT] {
            if let Ok(init) = instance.get_typed_func::<(), ()>(&mut store, name) {
                init.call(&mut store, ())
                    .map_err(|e| unavailable(format_args!("'{name}' failed: {e:#}")))?;
            }
        }

        Ok(Self {
            inner: Mutex::new(WasmInstance {
                store,
                instance,
                memory,
                alloc,
                free,
                transcode,
            }),
        })
    }

    /// Size of the module's linear memory in bytes.
    pub fn memory_size(&self) -> usize {
        let guard = self.inner.lock();
        guard.memory.data_size(&guard.store)
    }

    fn call<P: WasmParams, R: WasmResults>(&self, name: &'static str, params: P) -> BridgeResult<R> {
        let mut guard = self.inner.lock();
        let WasmInstance {
            store, instance, ..
        } = &mut *guard;

        let func = instance
            .get_typed_func::<P, R>(&mut *store, name)
            .map_err(|e| BridgeError::MissingExport {
                name,
                reason: format!("{e:#}"),
            })?;
        func.call(&mut *store, params)
            .map_err(|e| BridgeError::ForeignCall {
                export: name,
                message: format!("{e:#}"),
            })
    }
}

fn to_offset(address: u64, len: usize, capacity: usize) -> BridgeResult<usize> {
    usize::try_from(address).map_err(|_| BridgeError::OutOfBounds {
        offset: usize::MAX,
        len,
        capacity,
    })
}

impl TranscoderEngine for WasmEngine {
    fn backend(&self) -> BackendKind {
        BackendKind::Wasm
    }

    fn alloc(&self, size: u64) -> BridgeResult<u64> {
        let mut guard = self.inner.lock();
        let WasmInstance { store, alloc, .. } = &mut *guard;
        alloc
            .call(&mut *store, size)
            .map_err(|e| BridgeError::ForeignCall {
                export: exports::ALLOC,
                message: format!("{e:#}"),
            })
    }

    fn free(&self, address: u64) -> BridgeResult<()> {
        let mut guard = self.inner.lock();
        let WasmInstance { store, free, .. } = &mut *guard;
        free.call(&mut *store, address)
            .map_err(|e| BridgeError::ForeignCall {
                export: exports::FREE,
                message: format!("{e:#}"),
            })
    }

    unsafe fn write_memory(&self, address: u64, data: &[u8]) -> BridgeResult<()> {
        let mut guard = self.inner.lock();
        let WasmInstance { store, memory, .. } = &mut *guard;
        let capacity = memory.data_size(&*store);
        let offset = to_offset(address, data.len(), capacity)?;

        memory
            .write(&mut *store, offset, data)
            .map_err(|_| BridgeError::OutOfBounds {
                offset,
                len: data.len(),
                capacity,
            })
    }

    unsafe fn read_memory(&self, address: u64, out: &mut [u8]) -> BridgeResult<()> {
        let guard = self.inner.lock();
        let capacity = guard.memory.data_size(&guard.store);
        let offset = to_offset(address, out.len(), capacity)?;
        let len = out.len();

        guard
            .memory
            .read(&guard.store, offset, out)
            .map_err(|_| BridgeError::OutOfBounds {
                offset,
                len,
                capacity,
            })
    }

    fn version(&self) -> BridgeResult<u32> {
        self.call::<(), u32>(exports::GET_VERSION, ())
    }

    fn enable_debug_printf(&self, enabled: bool) -> BridgeResult<()> {
        self.call::<u32, ()>(exports::ENABLE_DEBUG_PRINTF, u32::from(enabled))
    }

    fn source_format_query(&self, query: SourceFormatQuery, format: u32) -> BridgeResult<u32> {
        self.call::<u32, u32>(query.export_name(), format)
    }

    fn target_format_query(&self, query: TargetFormatQuery, format: u32) -> BridgeResult<u32> {
        self.call::<u32, u32>(query.export_name(), format)
    }

    fn matching_target(&self, source_format: u32) -> BridgeResult<u32> {
        self.call::<u32, u32>(exports::MATCHING_TARGET, source_format)
    }

    fn is_format_supported(&self, target_format: u32, source_format: u32) -> BridgeResult<u32> {
        self.call::<(u32, u32), u32>(exports::IS_FORMAT_SUPPORTED, (target_format, source_format))
    }

    fn transcoded_size(&self, target_format: u32, width: u32, height: u32) -> BridgeResult<u32> {
        self.call::<(u32, u32, u32), u32>(exports::TRANSCODED_SIZE, (target_format, width, height))
    }

    fn ktx2_open(&self, address: u64, len: u32) -> BridgeResult<u64> {
        self.call::<(u64, u32), u64>(exports::KTX2_OPEN, (address, len))
    }

    fn ktx2_close(&self, handle: u64) -> BridgeResult<()> {
        self.call::<u64, ()>(exports::KTX2_CLOSE, handle)
    }

    fn container_query(&self, query: ContainerQuery, handle: u64) -> BridgeResult<u32> {
        self.call::<u64, u32>(query.export_name(), handle)
    }

    fn nit_multiplier(&self, handle: u64) -> BridgeResult<f32> {
        self.call::<u64, f32>(exports::NIT_MULTIPLIER, handle)
    }

    fn slice_query(
        &self,
        query: SliceQuery,
        handle: u64,
        level: u32,
        layer: u32,
        face: u32,
    ) -> BridgeResult<u32> {
        self.call::<(u64, u32, u32, u32), u32>(query.export_name(), (handle, level, layer, face))
    }

    fn start_transcoding(&self, handle: u64) -> BridgeResult<u32> {
        self.call::<u64, u32>(exports::START_TRANSCODING, handle)
    }

    fn create_transcode_state(&self) -> BridgeResult<u64> {
        self.call::<(), u64>(exports::CREATE_TRANSCODE_STATE, ())
    }

    fn destroy_transcode_state(&self, state: u64) -> BridgeResult<()> {
        self.call::<u64, ()>(exports::DESTROY_TRANSCODE_STATE, state)
    }

    fn transcode_image_level(&self, call: &TranscodeCall) -> BridgeResult<u32> {
        let mut guard = self.inner.lock();
        let WasmInstance {
            store, transcode, ..
        } = &mut *guard;

        transcode
            .call(
                &mut *store,
                (
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
                ),
            )
            .map_err(|e| BridgeError::ForeignCall {
                export: exports::TRANSCODE_IMAGE_LEVEL,
                message: format!("{e:#}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    /// Implements the memory half of the engine ABI with a bump allocator.
    const BUMP_ALLOCATOR_MODULE: &str = r#"
        (module
          (import "wasi_snapshot_preview1" "fd_write" (func $fd_write (param i32 i32 i32 i32) (result i32)))
          (import "wasi_snapshot_preview1" "proc_exit" (func $proc_exit (param i32)))
          (memory (export "memory") 1)
          (data (i32.const 8) "bt: hello\n")
          (global $next (mut i64) (i64.const 1024))
          (global $live (mut i32) (i32.const 0))
          (global $debug (mut i32) (i32.const 0))
          (func (export "bt_enable_debug_printf") (param i32) (global.set $debug (local.get 0)))
          (func (export "debug_printf_enabled") (result i32) (global.get $debug))
          (func (export "print_line") (result i32)
            (i32.store (i32.const 0) (i32.const 8))
            (i32.store (i32.const 4) (i32.const 10))
            (call $fd_write (i32.const 1) (i32.const 0) (i32.const 1) (i32.const 32)))
          (func (export "bt_alloc") (param $size i64) (result i64)
            (local $ptr i64)
            (if (i64.gt_u (i64.add (global.get $next) (local.get $size)) (i64.const 65536))
              (then (return (i64.const 0))))
            (local.set $ptr (global.get $next))
            (global.set $next (i64.add (global.get $next) (local.get $size)))
            (global.set $live (i32.add (global.get $live) (i32.const 1)))
            (local.get $ptr))
          (func (export "bt_free") (param i64)
            (global.set $live (i32.sub (global.get $live) (i32.const 1))))
          (func (export "live_allocations") (result i32) (global.get $live))
          (func (export "bt_get_version") (result i32) (i32.const 200))
          (func (export "bt_ktx2_close") (param i64) (unreachable))
          (func (export "bt_ktx2_transcode_image_level")
            (param i64 i32 i32 i32 i64 i32 i32 i32 i32 i32 i32 i32 i64) (result i32)
            (i32.const 0))
        )
    "#;

    fn bump_engine() -> WasmEngine {
        let wasm = wat::parse_str(BUMP_ALLOCATOR_MODULE).unwrap();
        WasmEngine::from_bytes(&wasm).unwrap()
    }

    #[test]
    fn copies_bytes_through_linear_memory() {
        let bridge = Bridge::new(bump_engine());
        assert_eq!(bridge.backend(), BackendKind::Wasm);
        assert_eq!(bridge.version().unwrap(), 200);

        let buffer = bridge.allocate_from(b"KTX2 bytes").unwrap();
        assert_eq!(buffer.to_vec().unwrap(), b"KTX2 bytes");
        buffer.release().unwrap();
    }

    #[test]
    fn drop_frees_through_the_module() {
        let engine = bump_engine();
        let live = |engine: &WasmEngine| engine.call::<(), u32>("live_allocations", ()).unwrap();
        {
            let _a = ForeignBuffer::allocate(&engine, 32).unwrap();
            let b = ForeignBuffer::allocate(&engine, 32).unwrap();
            assert_eq!(live(&engine), 2);
            b.release().unwrap();
            assert_eq!(live(&engine), 1);
        }
        assert_eq!(live(&engine), 0);
    }

    #[test]
    fn wasi_imports_are_linked_to_host_stdio() {
        let engine = bump_engine();
        let errno = engine.call::<(), u32>("print_line", ()).unwrap();
        assert_eq!(errno, 0);

        let mut written = [0u8; 4];
        unsafe { engine.read_memory(32, &mut written) }.unwrap();
        assert_eq!(u32::from_le_bytes(written), 10);
    }

    #[test]
    fn debug_printf_is_forwarded_to_the_module() {
        let engine = bump_engine();
        let enabled = |engine: &WasmEngine| {
            engine
                .call::<(), u32>("debug_printf_enabled", ())
                .unwrap()
        };
        assert_eq!(enabled(&engine), 0);

        engine.enable_debug_printf(true).unwrap();
        assert_eq!(enabled(&engine), 1);
        engine.enable_debug_printf(false).unwrap();
        assert_eq!(enabled(&engine), 0);
    }

    #[test]
    fn exhausted_module_heap_is_out_of_foreign_memory() {
        let bridge = Bridge::new(bump_engine());
        let err = bridge.allocate(128 * 1024).unwrap_err();
        assert!(matches!(err, BridgeError::OutOfForeignMemory { .. }));
    }

    #[test]
    fn raw_access_outside_linear_memory_is_out_of_bounds() {
        let engine = bump_engine();
        let mut out = [0u8; 16];
        let err = unsafe { engine.read_memory(65536 - 8, &mut out) }.unwrap_err();
        assert!(matches!(err, BridgeError::OutOfBounds { capacity: 65536, .. }));
    }

    #[test]
    fn missing_export_is_reported_by_name() {
        let engine = bump_engine();
        let err = engine.ktx2_open(1024, 16).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::MissingExport {
                name: "bt_ktx2_open",
                ..
            }
        ));
    }

    #[test]
    fn trap_is_a_foreign_call_error() {
        let engine = bump_engine();
        let err = engine.ktx2_close(1).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::ForeignCall {
                export: "bt_ktx2_close",
                ..
            }
        ));
    }

    #[test]
    fn module_without_allocator_is_unavailable() {
        let wasm = wat::parse_str(r#"(module (memory (export "memory") 1))"#).unwrap();
        let err = WasmEngine::from_bytes(&wasm).err().unwrap();
        assert!(matches!(
            err,
            BridgeError::EngineUnavailable {
                backend: BackendKind::Wasm,
                ..
            }
        ));
    }
}
