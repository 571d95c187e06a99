//! Drives a full slice transcode through the public bridge API.

use ktx2_transcode_bridge::{
    Bridge, BridgeError, ContainerQuery, ImageLevelRequest, ReferenceContainer, ReferenceEngine,
    SliceIndex, SliceQuery, SourceBlockFormat, TargetFormat,
};
use rstest::rstest;

#[test]
fn transcodes_slice_with_scratch_state() {
    let engine = ReferenceEngine::new();
    let bridge = Bridge::new(engine.clone());
    let container = ReferenceContainer::new(16, 16).with_levels(2).with_seed(3);

    let data = bridge.allocate_from(&container.to_bytes()).unwrap();
    let id = bridge.open_container(&data).unwrap().unwrap();
    assert!(bridge.start_transcoding(&id).unwrap());
    assert!(bridge.start_transcoding(&id).unwrap());

    let slice = SliceIndex::new(1, 0, 0);
    let width = bridge.slice_value(&id, SliceQuery::OrigWidth, slice).unwrap();
    let height = bridge.slice_value(&id, SliceQuery::OrigHeight, slice).unwrap();
    assert_eq!((width, height), (8, 8));

    let size = bridge
        .transcoded_size(TargetFormat::Rgba32, width, height)
        .unwrap();
    let mut output = bridge.allocate(size as usize).unwrap();
    let state = bridge.create_transcode_state().unwrap().unwrap();

    let request = ImageLevelRequest::new(slice, TargetFormat::Rgba32);
    assert!(bridge
        .transcode_image_level(&id, &request, &mut output, Some(&state))
        .unwrap());
    assert_eq!(output.to_vec().unwrap(), container.slice_pixels(slice));

    output.release().unwrap();
    bridge.destroy_transcode_state(state).unwrap();
    bridge.close_container(id).unwrap();
    data.release().unwrap();

    assert_eq!(engine.live_allocations(), 0);
    assert_eq!(engine.live_states(), 0);
    assert_eq!(engine.open_containers(), 0);
    assert_eq!(engine.invalid_frees(), 0);
}

#[rstest]
#[case(SourceBlockFormat::Etc1s, 163)]
#[case(SourceBlockFormat::UastcHdr4x4, 166)]
#[case(SourceBlockFormat::XuastcLdr8x5, 162)]
fn reports_container_metadata(#[case] source: SourceBlockFormat, #[case] color_model: u32) {
    let bridge = Bridge::new(ReferenceEngine::new());
    let container = ReferenceContainer::new(32, 16)
        .with_source_format(source)
        .with_alpha(true)
        .with_srgb(false)
        .with_nit_multiplier(100.0);

    let data = bridge.allocate_from(&container.to_bytes()).unwrap();
    let id = bridge.open_container(&data).unwrap().unwrap();

    assert_eq!(bridge.container_source_format(&id).unwrap(), source);
    assert_eq!(
        bridge.container_flag(&id, ContainerQuery::IsHdr).unwrap(),
        source.is_hdr()
    );
    assert!(bridge.container_flag(&id, ContainerQuery::HasAlpha).unwrap());
    assert!(!bridge.container_flag(&id, ContainerQuery::IsSrgb).unwrap());
    assert_eq!(
        bridge.container_value(&id, ContainerQuery::DfdColorModel).unwrap(),
        color_model
    );
    assert_eq!(
        bridge.container_value(&id, ContainerQuery::BlockWidth).unwrap(),
        source.block_width()
    );
    assert_eq!(bridge.nit_multiplier(&id).unwrap(), 100.0);

    bridge.close_container(id).unwrap();
}

#[test]
fn output_capacity_is_passed_in_blocks() {
    let bridge = Bridge::new(ReferenceEngine::new());
    let data = bridge
        .allocate_from(&ReferenceContainer::new(8, 8).to_bytes())
        .unwrap();
    let id = bridge.open_container(&data).unwrap().unwrap();
    bridge.start_transcoding(&id).unwrap();

    let request = ImageLevelRequest::new(SliceIndex::default(), TargetFormat::Bc7Rgba);

    // 4 blocks of 16 bytes are needed; one byte short leaves room for 3.
    let mut short = bridge.allocate(63).unwrap();
    assert!(!bridge
        .transcode_image_level(&id, &request, &mut short, None)
        .unwrap());

    let mut exact = bridge.allocate(64).unwrap();
    assert!(bridge
        .transcode_image_level(&id, &request, &mut exact, None)
        .unwrap());
}

#[test]
fn engines_do_not_share_state() {
    let first = ReferenceEngine::with_heap_capacity(128);
    let second = ReferenceEngine::with_heap_capacity(128);
    let a = Bridge::new(first.clone());
    let b = Bridge::new(second.clone());

    let _held = a.allocate(100).unwrap();
    assert!(matches!(
        a.allocate(100),
        Err(BridgeError::OutOfForeignMemory { requested: 100 })
    ));
    let _other = b.allocate(100).unwrap();

    assert_eq!(first.live_allocations(), 1);
    assert_eq!(second.live_allocations(), 1);
}
