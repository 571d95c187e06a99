//! Engine selection settings.

use crate::engine::BackendKind;
use std::path::{Path, PathBuf};

/// Which backend [`Bridge::from_config`](crate::Bridge::from_config) should load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BackendPreference {
    /// Try the native library, fall back to the WASM module if it fails to load.
    #[default]
    Auto,
    /// Native library only.
    Native,
    /// WASM module only.
    Wasm,
}

impl BackendPreference {
    /// Backends to attempt, in order.
    pub fn candidates(self) -> &'static [BackendKind] {
        match self {
            Self::Auto => &[BackendKind::Native, BackendKind::Wasm],
            Self::Native => &[BackendKind::Native],
            Self::Wasm => &[BackendKind::Wasm],
        }
    }
}

/// Settings used to construct a [`Bridge`](crate::Bridge).
///
/// ```
/// use ktx2_transcode_bridge::{BackendPreference, EngineConfig};
///
/// let config = EngineConfig::new()
///     .with_preference(BackendPreference::Wasm)
///     .with_wasm_module("basisu_transcoder.wasm")
///     .with_debug_printf(false);
/// assert_eq!(config.preference(), BackendPreference::Wasm);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    preference: BackendPreference,
    native_library: Option<PathBuf>,
    wasm_module: Option<PathBuf>,
    debug_printf: bool,
}

impl EngineConfig {
    /// Automatic selection, default library name, no WASM module, no debug output.
    pub fn new() -> Self {
        Self {
            preference: BackendPreference::Auto,
            native_library: None,
            wasm_module: None,
            debug_printf: false,
        }
    }

    /// Sets the backend preference.
    pub fn with_preference(mut self, preference: BackendPreference) -> Self {
        self.preference = preference;
        self
    }

    /// Path of the native shared library.
    ///
    /// When unset the platform's name for `basisu_transcoder` is looked up on
    /// the library search path.
    pub fn with_native_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.native_library = Some(path.into());
        self
    }

    /// Path of the engine's `.wasm` build. Required for the WASM backend.
    pub fn with_wasm_module(mut self, path: impl Into<PathBuf>) -> Self {
        self.wasm_module = Some(path.into());
        self
    }

    /// Asks the engine to print its own diagnostics.
    pub fn with_debug_printf(mut self, enabled: bool) -> Self {
        self.debug_printf = enabled;
        self
    }

    pub fn preference(&self) -> BackendPreference {
        self.preference
    }

    pub fn native_library(&self) -> Option<&Path> {
        self.native_library.as_deref()
    }

    pub fn wasm_module(&self) -> Option<&Path> {
        self.wasm_module.as_deref()
    }

    pub fn debug_printf(&self) -> bool {
        self.debug_printf
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_prefers_native_then_wasm() {
        assert_eq!(
            BackendPreference::Auto.candidates(),
            [BackendKind::Native, BackendKind::Wasm]
        );
        assert_eq!(BackendPreference::Wasm.candidates(), [BackendKind::Wasm]);
    }

    #[test]
    fn builder_sets_paths() {
        let config = EngineConfig::default()
            .with_native_library("/opt/lib/libbasisu_transcoder.so")
            .with_wasm_module("transcoder.wasm");
        assert_eq!(
            config.native_library(),
            Some(Path::new("/opt/lib/libbasisu_transcoder.so"))
        );
        assert_eq!(config.wasm_module(), Some(Path::new("transcoder.wasm")));
        assert_eq!(config.preference(), BackendPreference::Auto);
        assert!(!config.debug_printf());
    }
}
