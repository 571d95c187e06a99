#![no_main]

// Family resolution is a pure function of the normalized name: normalizing twice changes
// nothing, and every family resolves to something for every container kind except ASTC,
// which is deferred to the engine.

use ktx2_transcode_api::{normalize_family, parse_family, Family, TargetFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, bool, bool)| {
    let (family, is_hdr, has_alpha) = input;

    let normalized = normalize_family(&family);
    assert_eq!(normalize_family(&normalized), normalized);
    assert!(!normalized.contains(' '));

    let parsed = parse_family(&family);
    assert_eq!(parse_family(&normalized), parsed);

    match (parsed, parsed.select(is_hdr, has_alpha)) {
        (Family::Astc, None) => {}
        (Family::Unknown, Some(target)) => {
            let fallback = if is_hdr {
                TargetFormat::RgbaHalf
            } else {
                TargetFormat::Rgba32
            };
            assert_eq!(target, fallback);
        }
        (Family::Fixed(expected), Some(target)) => assert_eq!(target, expected),
        (Family::AlphaDependent { opaque, alpha }, Some(target)) => {
            assert_eq!(target, if has_alpha { alpha } else { opaque });
        }
        (family, target) => panic!("{family:?} resolved to {target:?}"),
    }
});
