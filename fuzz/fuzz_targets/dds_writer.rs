#![no_main]

// Written DDS files must parse back with the requested format, the header length
// the FourCC selection implies, and exactly `linear_size` payload bytes.

use ktx2_transcode_dds::{linear_size, parse_dds, write_dds_to_vec, DxgiFormat};
use ktx2_transcode_file_formats_api::WriterError;
use libfuzzer_sys::{arbitrary, fuzz_target};

const FORMATS: [DxgiFormat; 8] = [
    DxgiFormat::BC1_UNORM,
    DxgiFormat::BC3_UNORM,
    DxgiFormat::BC4_UNORM,
    DxgiFormat::BC5_UNORM,
    DxgiFormat::BC6H_UF16,
    DxgiFormat::BC7_UNORM,
    DxgiFormat::R8G8B8A8_UNORM,
    DxgiFormat::R16G16B16A16_FLOAT,
];

const BITS_PER_PIXEL: [u32; 8] = [4, 8, 4, 8, 8, 8, 32, 64];

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct DdsInput {
    pub width: u16,
    pub height: u16,
    pub format: u8,
    pub force_dx10_header: bool,
    pub shortfall: u8,
}

fuzz_target!(|input: DdsInput| {
    let width = u32::from(input.width % 1024);
    let height = u32::from(input.height % 1024);
    let index = usize::from(input.format) % FORMATS.len();
    let (format, bits_per_pixel) = (FORMATS[index], BITS_PER_PIXEL[index]);

    let required = linear_size(width, height, bits_per_pixel).expect("fits in u32") as usize;
    let len = required.saturating_sub(usize::from(input.shortfall % 3));
    let blocks: Vec<u8> = (0..len).map(|i| i as u8).collect();

    match write_dds_to_vec(&blocks, width, height, bits_per_pixel, format, input.force_dx10_header) {
        Ok(file) => {
            let info = parse_dds(&file).expect("written file must parse");
            let dx10 = input.force_dx10_header || !format.has_legacy_fourcc();
            assert_eq!(info.has_dx10_header, dx10);
            assert_eq!(info.data_offset, if dx10 { 148 } else { 128 });
            assert_eq!(info.format, format);
            assert_eq!((info.width, info.height), (width, height));
            assert_eq!(info.data_length, required);
            assert_eq!(file.len(), info.data_offset + required);
            assert_eq!(info.payload(&file), &blocks[..required]);
        }
        Err(WriterError::BufferTooSmall { .. }) => assert!(len < required),
        Err(e) => panic!("unexpected error: {e}"),
    }
});
