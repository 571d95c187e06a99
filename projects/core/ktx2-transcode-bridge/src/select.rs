//! Picks and loads a backend from an [`EngineConfig`].

use crate::bridge::Bridge;
use crate::config::EngineConfig;
use crate::engine::{BackendKind, TranscoderEngine};
use crate::error::{BridgeError, BridgeResult};
use tracing::{info, warn};

impl Bridge {
    /// Loads an engine according to `config`.
    ///
    /// Candidates are tried in the order given by the configured
    /// [`BackendPreference`](crate::BackendPreference). A backend counts as
    /// loaded once it answers the version query and, if configured, accepts
    /// the debug printf toggle. With `Auto`, a native failure at any of those
    /// steps is logged and the WASM module is tried next; an explicit
    /// preference never falls back.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::NoBackendAvailable`] if `Auto` exhausted every backend.
    /// - Otherwise the error of the single backend that was tried.
    pub fn from_config(config: &EngineConfig) -> BridgeResult<Self> {
        select_backend(config, load)
    }
}

fn select_backend<L>(config: &EngineConfig, load: L) -> BridgeResult<Bridge>
where
    L: Fn(BackendKind, &EngineConfig) -> BridgeResult<Box<dyn TranscoderEngine>>,
{
    let candidates = config.preference().candidates();
    let mut failures = Vec::with_capacity(candidates.len());

    for &backend in candidates {
        match load(backend, config).and_then(|engine| initialize(backend, engine, config)) {
            Ok(bridge) => return Ok(bridge),
            Err(e) if candidates.len() == 1 => return Err(e),
            Err(e) => {
                warn!(%backend, error = %e, "transcoder backend failed to load");
                failures.push(format!("{backend}: {e}"));
            }
        }
    }

    Err(BridgeError::NoBackendAvailable(failures.join("; ")))
}

fn initialize(
    backend: BackendKind,
    engine: Box<dyn TranscoderEngine>,
    config: &EngineConfig,
) -> BridgeResult<Bridge> {
    let bridge = Bridge::from_boxed(engine);
    let version = bridge.version()?;
    if config.debug_printf() {
        bridge.enable_debug_printf(true)?;
    }
    info!(%backend, version, "transcoder engine ready");
    Ok(bridge)
}

fn load(backend: BackendKind, config: &EngineConfig) -> BridgeResult<Box<dyn TranscoderEngine>> {
    match backend {
        BackendKind::Native => load_native(config),
        BackendKind::Wasm => load_wasm(config),
        BackendKind::Reference => Err(BridgeError::BackendDisabled(BackendKind::Reference)),
    }
}

#[cfg(feature = "native")]
fn load_native(config: &EngineConfig) -> BridgeResult<Box<dyn TranscoderEngine>> {
    let engine = match config.native_library() {
        Some(path) => crate::native::NativeEngine::load(path)?,
        None => {
            let name = crate::native::default_library_name();
            crate::native::NativeEngine::load(std::path::Path::new(&name))?
        }
    };
    Ok(Box::new(engine))
}

#[cfg(not(feature = "native"))]
fn load_native(_config: &EngineConfig) -> BridgeResult<Box<dyn TranscoderEngine>> {
    Err(BridgeError::BackendDisabled(BackendKind::Native))
}

#[cfg(feature = "wasm")]
fn load_wasm(config: &EngineConfig) -> BridgeResult<Box<dyn TranscoderEngine>> {
    let path = config
        .wasm_module()
        .ok_or_else(|| BridgeError::EngineUnavailable {
            backend: BackendKind::Wasm,
            reason: "no module path configured".into(),
        })?;
    Ok(Box::new(crate::wasm::WasmEngine::from_file(path)?))
}

#[cfg(not(feature = "wasm"))]
fn load_wasm(_config: &EngineConfig) -> BridgeResult<Box<dyn TranscoderEngine>> {
    Err(BridgeError::BackendDisabled(BackendKind::Wasm))
}

#[cfg(test)]
mod tests {
    use super::select_backend;
    use crate::test_prelude::*;

    #[test]
    fn auto_reports_every_failure() {
        let config = EngineConfig::new()
            .with_native_library("/nonexistent/libbasisu_transcoder.so")
            .with_wasm_module("/nonexistent/basisu_transcoder.wasm");
        let err = Bridge::from_config(&config).unwrap_err();
        let BridgeError::NoBackendAvailable(reasons) = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(reasons.contains("native"));
        assert!(reasons.contains("wasm"));
    }

    #[test]
    fn explicit_preference_does_not_fall_back() {
        let config = EngineConfig::new().with_preference(BackendPreference::Wasm);
        let err = Bridge::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::EngineUnavailable {
                backend: BackendKind::Wasm,
                ..
            } | BridgeError::BackendDisabled(BackendKind::Wasm)
        ));
    }

    #[cfg(feature = "wasm")]
    #[test]
    fn loads_wasm_module_from_disk() {
        let module = wat::parse_str(
            r#"(module
                 (memory (export "memory") 1)
                 (func (export "bt_alloc") (param i64) (result i64) (i64.const 16))
                 (func (export "bt_free") (param i64))
                 (func (export "bt_get_version") (result i32) (i32.const 7))
                 (func (export "bt_ktx2_transcode_image_level")
                   (param i64 i32 i32 i32 i64 i32 i32 i32 i32 i32 i32 i32 i64) (result i32)
                   (i32.const 0)))"#,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.wasm");
        std::fs::write(&path, module).unwrap();

        let config = EngineConfig::new()
            .with_preference(BackendPreference::Auto)
            .with_native_library("/nonexistent/libbasisu_transcoder.so")
            .with_wasm_module(&path);
        let bridge = Bridge::from_config(&config).unwrap();
        assert_eq!(bridge.backend(), BackendKind::Wasm);
        assert_eq!(bridge.version().unwrap(), 7);
    }

    #[cfg(feature = "wasm")]
    fn wasm_engine(version_export: &str) -> Box<dyn TranscoderEngine> {
        let module = wat::parse_str(format!(
            r#"(module
                 (memory (export "memory") 1)
                 (func (export "bt_alloc") (param i64) (result i64) (i64.const 16))
                 (func (export "bt_free") (param i64))
                 {version_export}
                 (func (export "bt_ktx2_transcode_image_level")
                   (param i64 i32 i32 i32 i64 i32 i32 i32 i32 i32 i32 i32 i64) (result i32)
                   (i32.const 0)))"#
        ))
        .unwrap();
        Box::new(WasmEngine::from_bytes(&module).unwrap())
    }

    #[cfg(feature = "wasm")]
    #[test]
    fn auto_falls_back_when_first_backend_fails_to_initialize() {
        let load = |backend: BackendKind, _: &EngineConfig| {
            Ok(match backend {
                // Loads, but has no version export.
                BackendKind::Native => wasm_engine(""),
                _ => wasm_engine(
                    r#"(func (export "bt_get_version") (result i32) (i32.const 9))"#,
                ),
            })
        };

        let bridge = select_backend(&EngineConfig::new(), load).unwrap();
        assert_eq!(bridge.version().unwrap(), 9);
    }

    #[cfg(feature = "wasm")]
    #[test]
    fn auto_falls_back_when_debug_printf_is_missing() {
        let load = |backend: BackendKind, _: &EngineConfig| {
            Ok(match backend {
                BackendKind::Native => wasm_engine(
                    r#"(func (export "bt_get_version") (result i32) (i32.const 1))"#,
                ),
                _ => wasm_engine(
                    r#"(func (export "bt_get_version") (result i32) (i32.const 2))
                       (func (export "bt_enable_debug_printf") (param i32))"#,
                ),
            })
        };

        let config = EngineConfig::new().with_debug_printf(true);
        let bridge = select_backend(&config, load).unwrap();
        assert_eq!(bridge.version().unwrap(), 2);
    }

    #[cfg(feature = "wasm")]
    #[test]
    fn explicit_preference_reports_initialization_error() {
        let load = |_: BackendKind, _: &EngineConfig| Ok(wasm_engine(""));
        let config = EngineConfig::new().with_preference(BackendPreference::Native);
        let err = select_backend(&config, load).err().unwrap();
        assert!(matches!(
            err,
            BridgeError::MissingExport {
                name: "bt_get_version",
                ..
            }
        ));
    }
}
