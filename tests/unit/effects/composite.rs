use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    assert_eq!(over(dst, [200, 200, 200, 200], 0.0), dst);
}

#[test]
fn over_transparent_src_is_noop() {
    let dst = [10, 20, 30, 40];
    assert_eq!(over(dst, [0, 0, 0, 0], 1.0), dst);
}

#[test]
fn over_opaque_src_replaces_dst() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255], 1.0), [255, 0, 0, 255]);
}

#[test]
fn over_with_fifth_weight_on_black() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255], 0.2), [51, 0, 0, 255]);
}

#[test]
fn add_saturates_and_keeps_premul_valid() {
    let out = add([200, 10, 10, 200], [200, 200, 0, 255], 1.0);
    assert_eq!(out, [255, 210, 10, 255]);
    let dim = add([0, 0, 0, 100], [255, 255, 255, 0], 1.0);
    assert_eq!(dim, [100, 100, 100, 100]);
}

#[test]
fn in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
    assert!(add_in_place(&mut dst, &[0u8; 12], 1.0).is_err());
}

#[test]
fn unpremultiply_round_trips_opaque_and_clears_transparent() {
    assert_eq!(unpremultiply([10, 20, 30, 255]), [10, 20, 30, 255]);
    assert_eq!(unpremultiply([0, 0, 0, 0]), [0, 0, 0, 0]);
    assert_eq!(unpremultiply([64, 0, 0, 128]), [128, 0, 0, 128]);
}
