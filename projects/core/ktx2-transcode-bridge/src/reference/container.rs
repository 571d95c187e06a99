//! The container format understood by the reference engine.
//!
//! Layout, all fields little-endian `u32`:
//!
//! ```text
//! "RKTX" width height levels layers faces source_format flags nit_multiplier(f32 bits)
//!        dfd_color_model dfd_color_primaries dfd_transfer_function dfd_flags
//!        dfd_total_samples dfd_channel_id0 dfd_channel_id1
//! RGBA8 pixels of every slice, levels outermost and faces innermost
//! ```

use ktx2_transcode_common::{effective_layer_count, SliceIndex, SourceBlockFormat};

pub(crate) const MAGIC: [u8; 4] = *b"RKTX";
const FIELD_COUNT: usize = 15;
pub(crate) const HEADER_LEN: usize = MAGIC.len() + FIELD_COUNT * 4;

const FLAG_SRGB: u32 = 1;
const FLAG_ALPHA: u32 = 2;
const FLAG_VIDEO: u32 = 4;

// Khronos data format descriptor values.
const KHR_DF_MODEL_ETC1S: u32 = 163;
const KHR_DF_MODEL_UASTC: u32 = 166;
const KHR_DF_MODEL_ASTC: u32 = 162;
const KHR_DF_PRIMARIES_BT709: u32 = 1;
const KHR_DF_TRANSFER_LINEAR: u32 = 1;
const KHR_DF_TRANSFER_SRGB: u32 = 2;

/// Dimensions of a mip level.
#[inline]
pub(crate) fn level_dims(width: u32, height: u32, level: u32) -> (u32, u32) {
    let shrink = |v: u32| v.checked_shr(level).unwrap_or(0).max(1);
    (shrink(width), shrink(height))
}

/// Builds containers for the reference engine.
///
/// Pixel contents are a deterministic function of the seed and slice index, so
/// tests can compute the expected output of an RGBA32 transcode with
/// [`ReferenceContainer::slice_pixels`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceContainer {
    width: u32,
    height: u32,
    levels: u32,
    layers: u32,
    faces: u32,
    source_format: SourceBlockFormat,
    srgb: bool,
    alpha: bool,
    video: bool,
    nit_multiplier: f32,
    seed: u8,
}

impl ReferenceContainer {
    /// A single-level, non-array 2D container holding UASTC LDR 4x4 data.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            levels: 1,
            layers: 0,
            faces: 1,
            source_format: SourceBlockFormat::UastcLdr4x4,
            srgb: true,
            alpha: false,
            video: false,
            nit_multiplier: 1.0,
            seed: 0,
        }
    }

    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    /// Raw layer count; 0 means "not an array".
    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_faces(mut self, faces: u32) -> Self {
        self.faces = faces;
        self
    }

    pub fn with_source_format(mut self, source_format: SourceBlockFormat) -> Self {
        self.source_format = source_format;
        self
    }

    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.srgb = srgb;
        self
    }

    pub fn with_alpha(mut self, alpha: bool) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_video(mut self, video: bool) -> Self {
        self.video = video;
        self
    }

    pub fn with_nit_multiplier(mut self, nit_multiplier: f32) -> Self {
        self.nit_multiplier = nit_multiplier;
        self
    }

    /// Varies the pixel contents between otherwise identical containers.
    pub fn with_seed(mut self, seed: u8) -> Self {
        self.seed = seed;
        self
    }

    /// The RGBA8 pixels stored for `slice`.
    pub fn slice_pixels(&self, slice: SliceIndex) -> Vec<u8> {
        let (width, height) = level_dims(self.width, self.height, slice.level);
        let tag = (slice.level * 16 + slice.layer * 4 + slice.face) as u8;
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);

        for y in 0..height {
            for x in 0..width {
                pixels.push((x as u8).wrapping_add(self.seed));
                pixels.push((y as u8).wrapping_mul(3).wrapping_add(self.seed));
                pixels.push(tag);
                pixels.push(if self.alpha { (x ^ y) as u8 } else { u8::MAX });
            }
        }
        pixels
    }

    /// Serializes the container.
    pub fn to_bytes(&self) -> Vec<u8> {
        let flags = u32::from(self.srgb) * FLAG_SRGB
            | u32::from(self.alpha) * FLAG_ALPHA
            | u32::from(self.video) * FLAG_VIDEO;
        let color_model = match self.source_format {
            SourceBlockFormat::Etc1s => KHR_DF_MODEL_ETC1S,
            f if f.is_astc_ldr() || f.is_xuastc_ldr() || f == SourceBlockFormat::AstcHdr6x6 => {
                KHR_DF_MODEL_ASTC
            }
            _ => KHR_DF_MODEL_UASTC,
        };
        let transfer = if self.srgb {
            KHR_DF_TRANSFER_SRGB
        } else {
            KHR_DF_TRANSFER_LINEAR
        };

        let fields: [u32; FIELD_COUNT] = [
            self.width,
            self.height,
            self.levels,
            self.layers,
            self.faces,
            self.source_format.as_raw(),
            flags,
            self.nit_multiplier.to_bits(),
            color_model,
            KHR_DF_PRIMARIES_BT709,
            transfer,
            0,
            if self.alpha { 2 } else { 1 },
            0,
            if self.alpha { 15 } else { 0 },
        ];

        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(&MAGIC);
        for field in fields {
            bytes.extend_from_slice(&field.to_le_bytes());
        }
        for slice in SliceIndex::iter_all(self.levels, self.layers, self.faces) {
            bytes.extend_from_slice(&self.slice_pixels(slice));
        }
        bytes
    }
}

/// A container opened by the reference engine.
#[derive(Debug, Clone)]
pub(crate) struct ParsedContainer {
    pub width: u32,
    pub height: u32,
    pub levels: u32,
    pub layers: u32,
    pub faces: u32,
    pub source_format: SourceBlockFormat,
    pub srgb: bool,
    pub alpha: bool,
    pub video: bool,
    pub nit_multiplier: f32,
    pub dfd: [u32; 7],
    pixels: Vec<u8>,
}

impl ParsedContainer {
    /// Parses `bytes`, returning `None` for anything malformed.
    pub(crate) fn parse(bytes: &[u8]) -> Option<Self> {
        let (magic, rest) = bytes.split_first_chunk::<4>()?;
        if *magic != MAGIC {
            return None;
        }

        let mut fields = [0u32; FIELD_COUNT];
        let mut rest = rest;
        for field in &mut fields {
            let (value, tail) = rest.split_first_chunk::<4>()?;
            *field = u32::from_le_bytes(*value);
            rest = tail;
        }

        let [width, height, levels, layers, faces, source_format, flags, nit_bits, dfd @ ..] =
            fields;
        let source_format = SourceBlockFormat::try_from(source_format).ok()?;
        if width == 0 || height == 0 || !(faces == 1 || faces == 6) {
            return None;
        }
        let max_levels = 32 - width.max(height).leading_zeros();
        if levels == 0 || levels > max_levels {
            return None;
        }

        let mut expected = 0usize;
        for slice in SliceIndex::iter_all(levels, layers, faces) {
            let (w, h) = level_dims(width, height, slice.level);
            let slice_len = (w as usize).checked_mul(h as usize)?.checked_mul(4)?;
            expected = expected.checked_add(slice_len)?;
        }
        if rest.len() != expected {
            return None;
        }

        Some(Self {
            width,
            height,
            levels,
            layers,
            faces,
            source_format,
            srgb: flags & FLAG_SRGB != 0,
            alpha: flags & FLAG_ALPHA != 0,
            video: flags & FLAG_VIDEO != 0,
            nit_multiplier: f32::from_bits(nit_bits),
            dfd,
            pixels: rest.to_vec(),
        })
    }

    pub(crate) fn contains(&self, slice: SliceIndex) -> bool {
        slice.is_within(self.levels, self.layers, self.faces)
    }

    pub(crate) fn level_dims(&self, level: u32) -> (u32, u32) {
        level_dims(self.width, self.height, level)
    }

    /// RGBA8 pixels of a slice inside the container.
    pub(crate) fn slice_pixels(&self, slice: SliceIndex) -> Option<&[u8]> {
        if !self.contains(slice) {
            return None;
        }

        let layers = effective_layer_count(self.layers);
        let mut offset = 0usize;
        for level in 0..slice.level {
            let (w, h) = self.level_dims(level);
            offset += w as usize * h as usize * 4 * (layers * self.faces) as usize;
        }

        let (w, h) = self.level_dims(slice.level);
        let slice_len = w as usize * h as usize * 4;
        offset += slice_len * (slice.layer * self.faces + slice.face) as usize;
        self.pixels.get(offset..offset + slice_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builder_output_parses_back() {
        let container = ReferenceContainer::new(16, 8)
            .with_levels(3)
            .with_layers(2)
            .with_faces(6)
            .with_alpha(true)
            .with_source_format(SourceBlockFormat::AstcLdr6x6);
        let parsed = ParsedContainer::parse(&container.to_bytes()).unwrap();

        assert_eq!((parsed.width, parsed.height), (16, 8));
        assert_eq!((parsed.levels, parsed.layers, parsed.faces), (3, 2, 6));
        assert_eq!(parsed.source_format, SourceBlockFormat::AstcLdr6x6);
        assert!(parsed.alpha && parsed.srgb && !parsed.video);
        assert_eq!(parsed.dfd[0], KHR_DF_MODEL_ASTC);
    }

    #[rstest]
    #[case(SliceIndex::new(0, 0, 0))]
    #[case(SliceIndex::new(1, 1, 3))]
    #[case(SliceIndex::new(2, 1, 5))]
    fn slice_pixels_are_located_correctly(#[case] slice: SliceIndex) {
        let container = ReferenceContainer::new(8, 8)
            .with_levels(3)
            .with_layers(2)
            .with_faces(6);
        let parsed = ParsedContainer::parse(&container.to_bytes()).unwrap();
        assert_eq!(
            parsed.slice_pixels(slice).unwrap(),
            container.slice_pixels(slice).as_slice()
        );
    }

    #[rstest]
    #[case(b"".to_vec())]
    #[case(b"KTX2 but not really".to_vec())]
    #[case(ReferenceContainer::new(4, 4).with_faces(2).to_bytes())]
    #[case(ReferenceContainer::new(4, 4).with_levels(4).to_bytes())]
    #[case(ReferenceContainer::new(0, 4).to_bytes())]
    fn rejects_malformed_input(#[case] bytes: Vec<u8>) {
        assert!(ParsedContainer::parse(&bytes).is_none());
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut bytes = ReferenceContainer::new(4, 4).to_bytes();
        bytes.pop();
        assert!(ParsedContainer::parse(&bytes).is_none());
    }

    #[test]
    fn level_dims_never_reach_zero() {
        assert_eq!(level_dims(16, 4, 3), (2, 1));
        assert_eq!(level_dims(16, 4, 40), (1, 1));
    }
}
