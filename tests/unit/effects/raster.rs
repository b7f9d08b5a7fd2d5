use super::*;

fn blank(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::try_new(width, height).unwrap()
}

fn opaque(width: u32, height: u32, px: [u8; 4]) -> PixelBuffer {
    let mut buf = blank(width, height);
    buf.fill(px);
    buf
}

#[test]
fn fill_rect_clips_and_skips_transparent() {
    let mut buf = blank(4, 4);
    fill_rect(&mut buf, Rect::new(2, 2, 10, 10), Color::rgb(0, 255, 0));
    assert_eq!(buf.pixel(3, 3), Some([0, 255, 0, 255]));
    assert_eq!(buf.pixel(1, 1), Some([0, 0, 0, 0]));

    let before = buf.clone();
    fill_rect(&mut buf, Rect::new(0, 0, 4, 4), Color::rgba(255, 0, 0, 0));
    assert_eq!(buf, before);
}

#[test]
fn inverted_rect_is_a_noop() {
    let mut buf = opaque(4, 4, [1, 2, 3, 255]);
    let before = buf.clone();
    fill_rect(&mut buf, Rect::new(3, 3, 1, 1), Color::WHITE);
    fill_linear_gradient(
        &mut buf,
        Rect::new(3, 0, 0, 4),
        Color::WHITE,
        Color::BLACK,
        GradientDirection::Horizontal,
    );
    assert_eq!(buf, before);
}

#[test]
fn horizontal_gradient_hits_both_stops() {
    let mut buf = blank(5, 1);
    fill_linear_gradient(
        &mut buf,
        Rect::new(0, 0, 5, 1),
        Color::rgb(0, 0, 0),
        Color::rgb(200, 100, 0),
        GradientDirection::Horizontal,
    );
    assert_eq!(buf.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(buf.pixel(4, 0), Some([200, 100, 0, 255]));
    assert_eq!(buf.pixel(2, 0), Some([100, 50, 0, 255]));
}

#[test]
fn vertical_gradient_is_constant_along_rows() {
    let mut buf = blank(3, 3);
    fill_linear_gradient(
        &mut buf,
        Rect::new(0, 0, 3, 3),
        Color::rgb(0, 0, 0),
        Color::rgb(0, 0, 255),
        GradientDirection::Vertical,
    );
    assert_eq!(buf.pixel(0, 1), buf.pixel(2, 1));
    assert_eq!(buf.pixel(1, 2), Some([0, 0, 255, 255]));
}

#[test]
fn radial_gradient_center_and_corner() {
    let mut buf = blank(9, 9);
    let rect = Rect::new(0, 0, 9, 9);
    fill_radial_gradient(&mut buf, rect, rect.center(), Color::WHITE, Color::BLACK);
    assert_eq!(buf.pixel(4, 4), Some([255, 255, 255, 255]));
    assert_eq!(buf.pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn shadow_lands_at_offset_and_softens_edges() {
    let mut buf = blank(40, 40);
    drop_shadow(&mut buf, Rect::new(5, 5, 15, 15), 10, 10, 3, Color::BLACK).unwrap();
    let center = buf.pixel(20, 20).unwrap();
    assert!(center[3] > 200);
    assert_eq!(buf.pixel(5, 5), Some([0, 0, 0, 0]));
    let edge = buf.pixel(14, 20).unwrap();
    assert!(edge[3] > 0 && edge[3] < center[3]);
}

#[test]
fn shadow_without_blur_is_a_hard_fill() {
    let mut buf = blank(10, 10);
    drop_shadow(&mut buf, Rect::new(0, 0, 2, 2), 3, 3, 0, Color::rgb(9, 9, 9)).unwrap();
    assert_eq!(buf.pixel(3, 3), Some([9, 9, 9, 255]));
    assert_eq!(buf.pixel(2, 2), Some([0, 0, 0, 0]));
}

#[test]
fn blur_region_leaves_outside_untouched() {
    let mut buf = opaque(8, 8, [0, 0, 0, 255]);
    fill_rect(&mut buf, Rect::new(2, 0, 3, 8), Color::WHITE);
    blur_region(&mut buf, Rect::new(0, 0, 4, 8), 2.0).unwrap();
    assert_eq!(buf.pixel(6, 3), Some([0, 0, 0, 255]));
    let spread = buf.pixel(1, 3).unwrap();
    assert!(spread[0] > 0);
}

#[test]
fn bloom_brightens_around_highlights_only_above_threshold() {
    let mut buf = opaque(20, 20, [20, 20, 20, 255]);
    fill_rect(&mut buf, Rect::new(9, 9, 11, 11), Color::WHITE);
    let before = buf.clone();
    bloom(&mut buf, Rect::new(0, 0, 20, 20), 0.8, 1.0).unwrap();
    assert!(buf.pixel(8, 10).unwrap()[0] > before.pixel(8, 10).unwrap()[0]);
    assert_eq!(buf.pixel(0, 0), before.pixel(0, 0));
}

#[test]
fn depth_of_field_keeps_focal_row_sharp() {
    let mut buf = blank(10, 10);
    for x in (0..10).step_by(2) {
        fill_rect(&mut buf, Rect::new(x, 0, x + 1, 10), Color::WHITE);
    }
    let before = buf.clone();
    depth_of_field(&mut buf, Rect::new(0, 0, 10, 10), 0.5, 4.0).unwrap();
    // Rows 4 and 5 straddle the focal line at y = 5.
    for x in 0..10 {
        assert_eq!(buf.pixel(x, 4), before.pixel(x, 4));
    }
    assert_ne!(buf.pixel(0, 0), before.pixel(0, 0));
}

#[test]
fn motion_blur_composites_fifth_weight_copies() {
    let mut buf = opaque(12, 1, [0, 0, 0, 255]);
    fill_rect(&mut buf, Rect::new(0, 0, 1, 1), Color::rgb(255, 0, 0));
    motion_blur(&mut buf, Rect::new(0, 0, 6, 1), 5.0, 0.0, 1.0);
    assert_eq!(buf.pixel(5, 0), Some([51, 0, 0, 255]));
    assert_eq!(buf.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(buf.pixel(11, 0), Some([0, 0, 0, 255]));
}

#[test]
fn motion_blur_zero_intensity_is_noop() {
    let mut buf = opaque(4, 4, [10, 20, 30, 255]);
    let before = buf.clone();
    motion_blur(&mut buf, Rect::new(0, 0, 4, 4), 3.0, 3.0, 0.0);
    assert_eq!(buf, before);
}

#[test]
fn chromatic_aberration_shifts_red_and_blue_opposite_ways() {
    let mut buf = blank(5, 1);
    let px = |i: u8| [10 * i, 100 + i, 200 + i, 255];
    for x in 0..5u8 {
        let i = usize::from(x) * 4;
        buf.data_mut()[i..i + 4].copy_from_slice(&px(x));
    }
    chromatic_aberration(&mut buf, Rect::new(0, 0, 5, 1), 2.0, 0.5);

    // shift = 1: red from x+1, blue from x-1, green untouched.
    assert_eq!(buf.pixel(2, 0), Some([30, 102, 201, 255]));
    // Left edge: blue source out of range keeps its own blue.
    assert_eq!(buf.pixel(0, 0), Some([10, 100, 200, 255]));
    // Right edge: red source out of range keeps its own red.
    assert_eq!(buf.pixel(4, 0), Some([40, 104, 203, 255]));
}

#[test]
fn chromatic_aberration_on_single_pixel_changes_nothing() {
    let mut buf = opaque(3, 3, [1, 2, 3, 255]);
    let before = buf.clone();
    chromatic_aberration(&mut buf, Rect::new(1, 1, 2, 2), 4.0, 1.0);
    assert_eq!(buf, before);
}

#[test]
fn chromatic_aberration_with_huge_offset_leaves_channels_alone() {
    let mut buf = opaque(16, 8, [40, 80, 120, 255]);
    fill_rect(&mut buf, Rect::new(4, 0, 8, 8), Color::rgb(200, 10, 30));
    let before = buf.clone();
    for offset in [1e10, -1e10, f32::MAX, f32::MIN] {
        chromatic_aberration(&mut buf, Rect::new(0, 0, 16, 8), offset, 1.0);
        assert_eq!(buf, before);
    }
}

#[test]
fn chromatic_aberration_keeps_channels_within_alpha() {
    let mut buf = blank(3, 1);
    fill_rect(&mut buf, Rect::new(0, 0, 1, 1), Color::rgb(255, 0, 0));
    fill_rect(&mut buf, Rect::new(1, 0, 2, 1), Color::rgba(0, 0, 0, 64));
    fill_rect(&mut buf, Rect::new(2, 0, 3, 1), Color::rgb(0, 0, 255));
    chromatic_aberration(&mut buf, Rect::new(0, 0, 3, 1), 1.0, 1.0);

    // Middle pixel takes red from the right and blue from the left, both zero.
    assert_eq!(buf.pixel(1, 0), Some([0, 0, 0, 64]));
    // The transparent neighbour cannot carry color into an opaque pixel's alpha.
    for x in 0..3 {
        let [r, g, b, a] = buf.pixel(x, 0).unwrap();
        assert!(r <= a && g <= a && b <= a, "pixel {x} is not premultiplied");
    }

    let mut clear = blank(3, 1);
    fill_rect(&mut clear, Rect::new(2, 0, 3, 1), Color::rgb(255, 0, 0));
    chromatic_aberration(&mut clear, Rect::new(0, 0, 3, 1), 1.0, 1.0);
    assert_eq!(clear.pixel(1, 0), Some([0, 0, 0, 0]));
}

#[test]
fn motion_blur_past_the_buffer_is_clipped() {
    let mut buf = opaque(12, 8, [10, 20, 30, 255]);
    fill_rect(&mut buf, Rect::new(2, 2, 10, 6), Color::WHITE);
    let before = buf.clone();
    for (vx, vy) in [(1e10, 0.0), (-1e10, 0.0), (0.0, 1e10), (f32::MAX, f32::MIN)] {
        motion_blur(&mut buf, Rect::new(2, 2, 10, 6), vx, vy, 0.5);
        assert_eq!(buf, before);
    }
}

#[test]
fn shadow_blur_radius_is_capped() {
    let mut buf = blank(16, 8);
    drop_shadow(&mut buf, Rect::new(2, 2, 10, 6), 0, 0, 1 << 30, Color::BLACK).unwrap();
    drop_shadow(&mut buf, Rect::new(2, 2, 10, 6), i32::MAX, i32::MIN, i32::MAX, Color::BLACK)
        .unwrap();
    // Clamped to MAX_BLUR_RADIUS: a small shadow spread that far is faint.
    assert!(buf.data().chunks_exact(4).all(|px| px[3] < 16));
}

#[test]
fn oversized_buffers_are_rejected() {
    assert!(PixelBuffer::try_new(u32::MAX, u32::MAX).is_err());
    assert_eq!(blank(0, 5).data().len(), 0);
}
