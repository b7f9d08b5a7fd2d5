use super::*;
use crate::render::surface::MemorySurface;

fn ready(width: u32, height: u32) -> (SoftwareRenderBackend, std::sync::Arc<MemorySurface>) {
    let surface = MemorySurface::new(width, height);
    let mut backend = SoftwareRenderBackend::new();
    assert!(backend.initialize(SurfaceHandle::new(surface.clone())));
    (backend, surface)
}

#[test]
fn corner_radius_is_clamped_to_half_the_short_side() {
    let rect = Rect::new(0, 0, 40, 10);
    assert_eq!(clamp_corner_radius(rect, 3.0), 3.0);
    assert_eq!(clamp_corner_radius(rect, 50.0), 5.0);
    assert_eq!(clamp_corner_radius(rect, -1.0), 0.0);
    assert_eq!(clamp_corner_radius(rect, f32::NAN), 0.0);
}

#[test]
fn stroke_needs_width_and_alpha() {
    assert!(stroke_visible(Color::BLACK, 1.0));
    assert!(!stroke_visible(Color::BLACK, 0.0));
    assert!(!stroke_visible(Color::TRANSPARENT, 2.0));
}

#[test]
fn empty_surface_fails_to_initialize() {
    let surface = MemorySurface::new(0, 20);
    let mut backend = SoftwareRenderBackend::new();
    assert!(!backend.initialize(SurfaceHandle::new(surface)));
    assert!(!backend.is_initialized());
    assert!(!backend.begin_draw());
}

#[test]
fn queued_shapes_are_flushed_before_pixel_ops() {
    let (mut backend, _surface) = ready(32, 32);
    assert!(backend.begin_draw());
    backend.clear(Color::BLACK);
    backend.draw_ellipse(
        Point::new(8.0, 8.0),
        6.0,
        6.0,
        Color::rgb(255, 0, 0),
        Color::TRANSPARENT,
        0.0,
    );
    backend.fill_rect(Rect::new(20, 20, 24, 24), Color::WHITE);

    let buf = backend.back_buffer().unwrap();
    assert_eq!(buf.pixel(8, 8), Some([255, 0, 0, 255]));
    assert_eq!(buf.pixel(21, 21), Some([255, 255, 255, 255]));
    assert_eq!(buf.pixel(30, 2), Some([0, 0, 0, 255]));
    backend.end_draw();
}

#[test]
fn clear_discards_queued_shapes() {
    let (mut backend, surface) = ready(16, 16);
    assert!(backend.begin_draw());
    backend.draw_ellipse(
        Point::new(8.0, 8.0),
        6.0,
        6.0,
        Color::WHITE,
        Color::TRANSPARENT,
        0.0,
    );
    backend.clear(Color::BLACK);
    backend.end_draw();

    let frame = surface.last_frame().unwrap();
    assert_eq!(frame.pixel(8, 8), Some([0, 0, 0, 255]));
}

#[test]
fn capabilities_describe_a_cpu_renderer() {
    let caps = SoftwareRenderBackend::new().capabilities();
    assert!(!caps.gpu_accelerated);
    assert!(caps.advanced_effects);
    assert!(caps.antialiasing);
    assert!(caps.transparency);
    assert_eq!(caps.max_texture_size, 65535);
}
