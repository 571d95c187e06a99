//! Bulk export of every slice to ASTC and DDS files.

use ktx2_transcode_api::{
    Bridge, ExportOptions, SliceIndex, SourceBlockFormat, TargetFormat, Transcoder,
};
use ktx2_transcode_astc::parse_astc;
use ktx2_transcode_bridge::{ReferenceContainer, ReferenceEngine};
use ktx2_transcode_dds::{parse_dds, DxgiFormat};
use rstest::rstest;
use std::fs;

#[test]
fn ldr_container_exports_astc_and_bc7() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ReferenceEngine::new();
    let transcoder = Transcoder::new(Bridge::new(engine.clone()));
    let container = ReferenceContainer::new(20, 12)
        .with_levels(2)
        .with_layers(2)
        .with_source_format(SourceBlockFormat::AstcLdr6x6);
    let handle = transcoder.open(&container.to_bytes()).unwrap();

    let report = handle
        .export(&ExportOptions::new().output_dir(dir.path()))
        .unwrap();
    assert!(!report.astc_skipped);
    assert_eq!(report.files.len(), 2 * 2 * 2);

    let astc = fs::read(dir.path().join("astc_L1_Y1_F0.astc")).unwrap();
    let (header, payload) = parse_astc(&astc).unwrap();
    assert_eq!((header.block_width, header.block_height), (6, 6));
    assert_eq!((header.width, header.height), (10, 6));
    assert_eq!(payload.len(), 2 * 16);

    let dds = fs::read(dir.path().join("bc7_L0_Y1_F0.dds")).unwrap();
    let info = parse_dds(&dds).unwrap();
    assert!(info.has_dx10_header);
    assert_eq!(info.format, DxgiFormat::BC7_UNORM);
    assert_eq!((info.width, info.height), (20, 12));
    assert_eq!(info.data_length, 5 * 3 * 16);
    assert_eq!(dds.len(), 148 + info.data_length);

    assert_eq!(engine.live_allocations(), 1);
}

#[test]
fn hdr_container_exports_bc6h() {
    let dir = tempfile::tempdir().unwrap();
    let transcoder = Transcoder::new(Bridge::new(ReferenceEngine::new()));
    let container =
        ReferenceContainer::new(8, 8).with_source_format(SourceBlockFormat::UastcHdr4x4);
    let handle = transcoder.open(&container.to_bytes()).unwrap();

    let report = handle
        .export(&ExportOptions::new().astc(false).output_dir(dir.path()))
        .unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].target, TargetFormat::Bc6h);
    assert_eq!(report.files[0].slice, SliceIndex::default());

    let dds = fs::read(dir.path().join("bc6h_L0_Y0_F0.dds")).unwrap();
    assert_eq!(parse_dds(&dds).unwrap().format, DxgiFormat::BC6H_UF16);
}

#[rstest]
#[case(true, false, "astc")]
#[case(false, true, "dds")]
fn only_requested_outputs_are_written(
    #[case] astc: bool,
    #[case] dds: bool,
    #[case] extension: &str,
) {
    let dir = tempfile::tempdir().unwrap();
    let transcoder = Transcoder::new(Bridge::new(ReferenceEngine::new()));
    let container = ReferenceContainer::new(8, 8).with_faces(6);
    let handle = transcoder.open(&container.to_bytes()).unwrap();

    let report = handle
        .export(
            &ExportOptions::new()
                .astc(astc)
                .dds(dds)
                .output_dir(dir.path().join("nested")),
        )
        .unwrap();
    assert_eq!(report.files.len(), 6);
    for file in &report.files {
        assert_eq!(file.path.extension().unwrap(), extension);
        assert!(file.path.exists());
    }
}

#[test]
fn export_after_close_fails() {
    let dir = tempfile::tempdir().unwrap();
    let transcoder = Transcoder::new(Bridge::new(ReferenceEngine::new()));
    let mut handle = transcoder
        .open(&ReferenceContainer::new(4, 4).to_bytes())
        .unwrap();
    handle.close().unwrap();

    assert!(handle
        .export(&ExportOptions::new().output_dir(dir.path()))
        .is_err());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
