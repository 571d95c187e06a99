//! The raw entry points every backend exposes.
//!
//! This is the lowest layer: addresses and handles are plain integers here.
//! Code outside this crate should go through [`Bridge`](crate::Bridge), which
//! wraps them in owning types.

use crate::error::BridgeResult;
use core::fmt;

/// Which kind of backend is driving the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackendKind {
    /// Shared library called through the C ABI; addresses are host pointers.
    Native,
    /// WebAssembly module; addresses are offsets into its linear memory.
    Wasm,
    /// The in-process reference engine.
    Reference,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Native => "native",
            Self::Wasm => "wasm",
            Self::Reference => "reference",
        })
    }
}

/// Declares a query enum whose variants map one-to-one onto engine exports.
macro_rules! export_queries {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $export:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Name of the engine export answering this query.
            pub const fn export_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $export,)+
                }
            }
        }
    };
}

export_queries! {
    /// Per-container queries of shape `(handle: u64) -> u32`.
    ///
    /// Flag queries return the engine's boolean encoding (0 or 1).
    ContainerQuery {
        Width => "bt_ktx2_get_width",
        Height => "bt_ktx2_get_height",
        Levels => "bt_ktx2_get_levels",
        Faces => "bt_ktx2_get_faces",
        Layers => "bt_ktx2_get_layers",
        SourceFormat => "bt_ktx2_get_basis_tex_format",
        BlockWidth => "bt_ktx2_get_block_width",
        BlockHeight => "bt_ktx2_get_block_height",
        IsEtc1s => "bt_ktx2_is_etc1s",
        IsUastcLdr4x4 => "bt_ktx2_is_uastc_ldr_4x4",
        IsHdr => "bt_ktx2_is_hdr",
        IsHdr4x4 => "bt_ktx2_is_hdr_4x4",
        IsHdr6x6 => "bt_ktx2_is_hdr_6x6",
        IsLdr => "bt_ktx2_is_ldr",
        IsAstcLdr => "bt_ktx2_is_astc_ldr",
        IsXuastcLdr => "bt_ktx2_is_xuastc_ldr",
        HasAlpha => "bt_ktx2_has_alpha",
        IsSrgb => "bt_ktx2_is_srgb",
        IsVideo => "bt_ktx2_is_video",
        DfdColorModel => "bt_ktx2_get_dfd_color_model",
        DfdColorPrimaries => "bt_ktx2_get_dfd_color_primaries",
        DfdTransferFunction => "bt_ktx2_get_dfd_transfer_func",
        DfdFlags => "bt_ktx2_get_dfd_flags",
        DfdTotalSamples => "bt_ktx2_get_dfd_total_samples",
        DfdChannelId0 => "bt_ktx2_get_dfd_channel_id0",
        DfdChannelId1 => "bt_ktx2_get_dfd_channel_id1",
    }
}

export_queries! {
    /// Per-slice queries of shape `(handle: u64, level: u32, layer: u32, face: u32) -> u32`.
    SliceQuery {
        OrigWidth => "bt_ktx2_get_level_orig_width",
        OrigHeight => "bt_ktx2_get_level_orig_height",
        ActualWidth => "bt_ktx2_get_level_actual_width",
        ActualHeight => "bt_ktx2_get_level_actual_height",
        NumBlocksX => "bt_ktx2_get_level_num_blocks_x",
        NumBlocksY => "bt_ktx2_get_level_num_blocks_y",
        TotalBlocks => "bt_ktx2_get_level_total_blocks",
        AlphaFlag => "bt_ktx2_get_level_alpha_flag",
        IFrameFlag => "bt_ktx2_get_level_iframe_flag",
    }
}

export_queries! {
    /// Queries about a target (output) format, of shape `(format: u32) -> u32`.
    TargetFormatQuery {
        BytesPerBlockOrPixel => "bt_basis_get_bytes_per_block_or_pixel",
        HasAlpha => "bt_basis_transcoder_format_has_alpha",
        IsHdr => "bt_basis_transcoder_format_is_hdr",
        IsLdr => "bt_basis_transcoder_format_is_ldr",
        IsAstc => "bt_basis_transcoder_texture_format_is_astc",
        IsUncompressed => "bt_basis_transcoder_format_is_uncompressed",
        UncompressedBytesPerPixel => "bt_basis_get_uncompressed_bytes_per_pixel",
        BlockWidth => "bt_basis_get_block_width",
        BlockHeight => "bt_basis_get_block_height",
    }
}

export_queries! {
    /// Queries about a source (container) block format, of shape `(format: u32) -> u32`.
    SourceFormatQuery {
        IsXuastcLdr => "bt_basis_tex_format_is_xuastc_ldr",
        IsAstcLdr => "bt_basis_tex_format_is_astc_ldr",
        BlockWidth => "bt_basis_tex_format_get_block_width",
        BlockHeight => "bt_basis_tex_format_get_block_height",
        IsHdr => "bt_basis_tex_format_is_hdr",
        IsLdr => "bt_basis_tex_format_is_ldr",
    }
}

/// Export names of the entry points that do not fit one of the query shapes.
pub mod exports {
    pub const INIT: &str = "bt_init";
    pub const GET_VERSION: &str = "bt_get_version";
    pub const ENABLE_DEBUG_PRINTF: &str = "bt_enable_debug_printf";
    pub const ALLOC: &str = "bt_alloc";
    pub const FREE: &str = "bt_free";
    pub const MATCHING_TARGET: &str = "bt_basis_get_transcoder_texture_format_from_basis_tex_format";
    pub const IS_FORMAT_SUPPORTED: &str = "bt_basis_is_format_supported";
    pub const TRANSCODED_SIZE: &str = "bt_basis_compute_transcoded_image_size_in_bytes";
    pub const KTX2_OPEN: &str = "bt_ktx2_open";
    pub const KTX2_CLOSE: &str = "bt_ktx2_close";
    pub const NIT_MULTIPLIER: &str = "bt_ktx2_get_ldr_hdr_upconversion_nit_multiplier";
    pub const START_TRANSCODING: &str = "bt_ktx2_start_transcoding";
    pub const CREATE_TRANSCODE_STATE: &str = "bt_ktx2_create_transcode_state";
    pub const DESTROY_TRANSCODE_STATE: &str = "bt_ktx2_destroy_transcode_state";
    pub const TRANSCODE_IMAGE_LEVEL: &str = "bt_ktx2_transcode_image_level";
}

/// Arguments of the engine's transcode primitive, in ABI order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeCall {
    pub handle: u64,
    pub level: u32,
    pub layer: u32,
    pub face: u32,
    /// Address of the output buffer.
    pub output: u64,
    /// Output capacity, in blocks for block formats or pixels for uncompressed ones.
    pub output_blocks_or_pixels: u32,
    pub target_format: u32,
    pub decode_flags: u32,
    /// 0 selects the engine default.
    pub row_pitch: u32,
    /// 0 selects the engine default.
    pub rows_in_pixels: u32,
    /// -1 selects the engine default.
    pub channel0: i32,
    /// -1 selects the engine default.
    pub channel1: i32,
    /// 0 means "no dedicated scratch state".
    pub state: u64,
}

/// A loaded foreign transcoder engine.
///
/// Implementations translate each method into exactly one call of the matching
/// engine export. Boolean results use the engine's encoding (non-zero is true);
/// an allocation or open that fails returns address/handle 0.
///
/// Every method can fail with a [`BridgeError`](crate::BridgeError) because the
/// call itself may trap (WASM) or the export may be missing.
pub trait TranscoderEngine: Send + Sync {
    /// The kind of backend.
    fn backend(&self) -> BackendKind;

    /// `bt_alloc`: returns 0 when the engine is out of memory.
    fn alloc(&self, size: u64) -> BridgeResult<u64>;

    /// `bt_free`
    fn free(&self, address: u64) -> BridgeResult<()>;

    /// Copies `data` into engine memory at `address`.
    ///
    /// # Safety
    ///
    /// `address` must point to a live allocation made by [`TranscoderEngine::alloc`]
    /// on this engine, with at least `data.len()` bytes remaining.
    unsafe fn write_memory(&self, address: u64, data: &[u8]) -> BridgeResult<()>;

    /// Copies `out.len()` bytes of engine memory at `address` into `out`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`TranscoderEngine::write_memory`].
    unsafe fn read_memory(&self, address: u64, out: &mut [u8]) -> BridgeResult<()>;

    /// `bt_get_version`
    fn version(&self) -> BridgeResult<u32>;

    /// `bt_enable_debug_printf`
    fn enable_debug_printf(&self, enabled: bool) -> BridgeResult<()>;

    /// One of the `bt_basis_tex_format_*` helpers.
    fn source_format_query(&self, query: SourceFormatQuery, format: u32) -> BridgeResult<u32>;

    /// One of the target format helpers.
    fn target_format_query(&self, query: TargetFormatQuery, format: u32) -> BridgeResult<u32>;

    /// `bt_basis_get_transcoder_texture_format_from_basis_tex_format`
    fn matching_target(&self, source_format: u32) -> BridgeResult<u32>;

    /// `bt_basis_is_format_supported`
    fn is_format_supported(&self, target_format: u32, source_format: u32) -> BridgeResult<u32>;

    /// `bt_basis_compute_transcoded_image_size_in_bytes`
    fn transcoded_size(&self, target_format: u32, width: u32, height: u32) -> BridgeResult<u32>;

    /// `bt_ktx2_open`: returns 0 if the bytes are not a valid container.
    fn ktx2_open(&self, address: u64, len: u32) -> BridgeResult<u64>;

    /// `bt_ktx2_close`
    fn ktx2_close(&self, handle: u64) -> BridgeResult<()>;

    /// One of the `bt_ktx2_get_*` / `bt_ktx2_is_*` container getters.
    fn container_query(&self, query: ContainerQuery, handle: u64) -> BridgeResult<u32>;

    /// `bt_ktx2_get_ldr_hdr_upconversion_nit_multiplier`
    fn nit_multiplier(&self, handle: u64) -> BridgeResult<f32>;

    /// One of the `bt_ktx2_get_level_*` getters.
    fn slice_query(
        &self,
        query: SliceQuery,
        handle: u64,
        level: u32,
        layer: u32,
        face: u32,
    ) -> BridgeResult<u32>;

    /// `bt_ktx2_start_transcoding`
    fn start_transcoding(&self, handle: u64) -> BridgeResult<u32>;

    /// `bt_ktx2_create_transcode_state`: returns 0 on failure.
    fn create_transcode_state(&self) -> BridgeResult<u64>;

    /// `bt_ktx2_destroy_transcode_state`
    fn destroy_transcode_state(&self, state: u64) -> BridgeResult<()>;

    /// `bt_ktx2_transcode_image_level`
    fn transcode_image_level(&self, call: &TranscodeCall) -> BridgeResult<u32>;
}
