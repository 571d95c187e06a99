//! Writing every slice of a container out as standalone texture files.

use crate::container::ContainerHandle;
use crate::error::TranscodeResult;
use crate::options::TranscodeOptions;
use ktx2_transcode_astc::write_astc;
use ktx2_transcode_common::{DecodeFlags, SliceIndex, TargetFormat};
use ktx2_transcode_dds::{write_dds, DxgiFormat};
use ktx2_transcode_file_formats_api::WriterError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// BC6H and BC7 both store 16 bytes per 4x4 block.
const BC_BITS_PER_PIXEL: u32 = 8;

/// Builder for [`ContainerHandle::export`].
///
/// By default both ASTC and DDS files are written to the current directory.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    astc: bool,
    dds: bool,
    decode_flags: DecodeFlags,
    output_dir: PathBuf,
}

impl ExportOptions {
    /// Create new export options with both outputs enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `astc_L{level}_Y{layer}_F{face}.astc` for every slice.
    pub fn astc(mut self, enabled: bool) -> Self {
        self.astc = enabled;
        self
    }

    /// Write `bc7_*.dds` (LDR) or `bc6h_*.dds` (HDR) for every slice.
    pub fn dds(mut self, enabled: bool) -> Self {
        self.dds = enabled;
        self
    }

    /// Decode flags used for every transcode.
    pub fn decode_flags(mut self, flags: DecodeFlags) -> Self {
        self.decode_flags = flags;
        self
    }

    /// Directory the files are written to. Created if missing.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            astc: true,
            dds: true,
            decode_flags: DecodeFlags::NONE,
            output_dir: PathBuf::from("."),
        }
    }
}

/// One file written by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub slice: SliceIndex,
    pub target: TargetFormat,
}

/// Outcome of [`ContainerHandle::export`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Files written, in slice order with the ASTC file of a slice first.
    pub files: Vec<ExportedFile>,
    /// Set when ASTC output was requested but the container's source has no
    /// matching ASTC format (ETC1S).
    pub astc_skipped: bool,
}

struct BcOutput {
    target: TargetFormat,
    dxgi_format: DxgiFormat,
    prefix: &'static str,
}

fn bc_output(is_hdr: bool) -> BcOutput {
    if is_hdr {
        BcOutput {
            target: TargetFormat::Bc6h,
            dxgi_format: DxgiFormat::BC6H_UF16,
            prefix: "bc6h",
        }
    } else {
        BcOutput {
            target: TargetFormat::Bc7Rgba,
            dxgi_format: DxgiFormat::BC7_UNORM,
            prefix: "bc7",
        }
    }
}

/// `{prefix}_L{level}_Y{layer}_F{face}.{extension}`
pub fn export_file_name(prefix: &str, slice: SliceIndex, extension: &str) -> String {
    format!(
        "{prefix}_L{}_Y{}_F{}.{extension}",
        slice.level, slice.layer, slice.face
    )
}

impl ContainerHandle<'_> {
    /// Transcodes every slice and writes it out as ASTC and/or DDS files.
    ///
    /// ASTC files use the ASTC format matching the container's own block
    /// configuration. DDS files hold BC7 for LDR containers and BC6H for HDR
    /// ones, always with a DX10 header.
    ///
    /// Stops at the first failure; files written before it are kept.
    pub fn export(&self, options: &ExportOptions) -> TranscodeResult<ExportReport> {
        let metadata = *self.metadata();
        self.start_transcoding()?;
        std::fs::create_dir_all(&options.output_dir).map_err(WriterError::from)?;

        let mut report = ExportReport::default();
        let astc_target = if options.astc {
            let target = self.bridge().matching_target(metadata.source_format)?;
            if target.is_astc() {
                Some(target)
            } else {
                warn!(source = ?metadata.source_format, %target, "source has no ASTC equivalent, skipping ASTC output");
                report.astc_skipped = true;
                None
            }
        } else {
            None
        };
        let bc = options.dds.then(|| bc_output(metadata.is_hdr));

        let transcode_options = TranscodeOptions::new().decode_flags(options.decode_flags);
        for slice in self.slices() {
            if let Some(target) = astc_target {
                let path = self.export_astc(slice, target, &transcode_options, &options.output_dir)?;
                report.files.push(ExportedFile { path, slice, target });
            }
            if let Some(bc) = &bc {
                let path = self.export_dds(slice, bc, &transcode_options, &options.output_dir)?;
                report.files.push(ExportedFile {
                    path,
                    slice,
                    target: bc.target,
                });
            }
        }

        info!(
            files = report.files.len(),
            dir = %options.output_dir.display(),
            "exported container"
        );
        Ok(report)
    }

    fn export_astc(
        &self,
        slice: SliceIndex,
        target: TargetFormat,
        options: &TranscodeOptions,
        dir: &Path,
    ) -> TranscodeResult<PathBuf> {
        let result = self.transcode_slice(target, slice, options, None)?;
        let (block_width, block_height) = result
            .block_dims
            .ok_or(WriterError::UnsupportedTarget(target))?;

        let path = dir.join(export_file_name("astc", slice, "astc"));
        write_astc(
            &path,
            &result.data,
            block_width,
            block_height,
            result.width,
            result.height,
        )?;
        debug!(path = %path.display(), "wrote ASTC file");
        Ok(path)
    }

    fn export_dds(
        &self,
        slice: SliceIndex,
        bc: &BcOutput,
        options: &TranscodeOptions,
        dir: &Path,
    ) -> TranscodeResult<PathBuf> {
        let result = self.transcode_slice(bc.target, slice, options, None)?;

        let path = dir.join(export_file_name(bc.prefix, slice, "dds"));
        write_dds(
            &path,
            result.width,
            result.height,
            &result.data,
            BC_BITS_PER_PIXEL,
            bc.dxgi_format,
            true,
        )?;
        debug!(path = %path.display(), "wrote DDS file");
        Ok(path)
    }
}
