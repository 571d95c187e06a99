#![no_main]

// Everything the ASTC writer accepts must parse back to the same header and payload,
// and everything it rejects must break one of its documented preconditions.

use ktx2_transcode_astc::{astc_payload_len, parse_astc, write_astc_to_vec};
use ktx2_transcode_file_formats_api::WriterError;
use libfuzzer_sys::{arbitrary, fuzz_target};

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct AstcInput {
    pub block_width: u8,
    pub block_height: u8,
    pub width: u16,
    pub height: u16,
    pub payload_tweak: i8,
    pub seed: u8,
}

fuzz_target!(|input: AstcInput| {
    let block_width = u32::from(input.block_width % 16);
    let block_height = u32::from(input.block_height % 16);
    let width = u32::from(input.width % 512);
    let height = u32::from(input.height % 512);
    let block_range = 4..=12;

    // Aim near the correct size so both the accepting and rejecting paths get exercised.
    let expected = if block_range.contains(&block_width) && block_range.contains(&block_height) {
        astc_payload_len(block_width, block_height, width, height)
    } else {
        64
    };
    let len = expected.saturating_add_signed(isize::from(input.payload_tweak % 4) * 16);
    let blocks: Vec<u8> = (0..len).map(|i| (i as u8) ^ input.seed).collect();

    match write_astc_to_vec(&blocks, block_width, block_height, width, height) {
        Ok(file) => {
            let (header, payload) = parse_astc(&file).expect("written file must parse");
            assert_eq!((header.block_width, header.block_height), (block_width, block_height));
            assert_eq!((header.width, header.height), (width, height));
            assert_eq!((header.block_depth, header.depth), (1, 1));
            assert_eq!(payload, blocks.as_slice());
        }
        Err(WriterError::InvalidBlockSize { .. }) => {
            assert!(!block_range.contains(&block_width) || !block_range.contains(&block_height));
        }
        Err(WriterError::SizeMismatch { .. }) => assert_ne!(blocks.len(), expected),
        Err(e) => panic!("unexpected error: {e}"),
    }
});
