//! Builder for per-slice transcode options.

use ktx2_transcode_bridge::ImageLevelRequest;
use ktx2_transcode_common::{DecodeFlags, SliceIndex, TargetFormat};

/// Overrides passed to the engine with every slice transcode.
///
/// Everything defaults to "let the engine decide": no decode flags, tightly
/// packed rows, the image height and the engine's default source channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeOptions {
    decode_flags: DecodeFlags,
    channel0: Option<u8>,
    channel1: Option<u8>,
    row_pitch: Option<u32>,
    rows_in_pixels: Option<u32>,
}

impl TranscodeOptions {
    /// Options with every override left at the engine default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the decode flags.
    pub fn decode_flags(mut self, flags: DecodeFlags) -> Self {
        self.decode_flags = flags;
        self
    }

    /// Selects the source channels used by single and dual channel targets
    /// (BC4, BC5, EAC R11/RG11). `None` keeps the engine default.
    pub fn channels(mut self, channel0: Option<u8>, channel1: Option<u8>) -> Self {
        self.channel0 = channel0;
        self.channel1 = channel1;
        self
    }

    /// Output row pitch in blocks or pixels. `None` means tightly packed.
    pub fn row_pitch(mut self, row_pitch: Option<u32>) -> Self {
        self.row_pitch = row_pitch;
        self
    }

    /// Number of output rows for uncompressed targets. `None` means the image height.
    pub fn rows_in_pixels(mut self, rows_in_pixels: Option<u32>) -> Self {
        self.rows_in_pixels = rows_in_pixels;
        self
    }

    /// The configured decode flags.
    pub fn flags(&self) -> DecodeFlags {
        self.decode_flags
    }

    /// Builds the engine request for one slice.
    pub fn request(&self, slice: SliceIndex, target: TargetFormat) -> ImageLevelRequest {
        let mut request = ImageLevelRequest::new(slice, target);
        request.decode_flags = self.decode_flags;
        request.channel0 = self.channel0;
        request.channel1 = self.channel1;
        request.row_pitch = self.row_pitch;
        request.rows_in_pixels = self.rows_in_pixels;
        request
    }
}
