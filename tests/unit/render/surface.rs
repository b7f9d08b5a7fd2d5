use super::*;

fn frame(w: u32, h: u32) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: vec![0; (w * h * 4) as usize],
        premultiplied: true,
    }
}

#[test]
fn memory_surface_records_presents() {
    let surface = MemorySurface::new(4, 3);
    let handle = SurfaceHandle::new(surface.clone());
    assert_eq!(handle.client_size(), Some((4, 3)));

    handle.present(&frame(4, 3)).unwrap();
    handle.present(&frame(4, 3)).unwrap();
    assert_eq!(surface.present_count(), 2);
    assert_eq!(surface.last_frame().map(|f| f.width), Some(4));
}

#[test]
fn invalidated_surface_rejects_presents() {
    let surface = MemorySurface::new(2, 2);
    let handle = SurfaceHandle::new(surface.clone());
    surface.invalidate();
    assert_eq!(handle.client_size(), None);
    assert!(handle.present(&frame(2, 2)).is_err());
}

#[test]
fn handles_compare_by_identity() {
    let a = MemorySurface::new(1, 1);
    let b = MemorySurface::new(1, 1);
    let ha = SurfaceHandle::new(a.clone());
    assert!(ha.same_surface(&SurfaceHandle::new(a)));
    assert!(!ha.same_surface(&SurfaceHandle::new(b)));
}

#[test]
fn straight_conversion_unpremultiplies() {
    let f = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![64, 0, 0, 128],
        premultiplied: true,
    };
    assert_eq!(f.to_straight_rgba(), vec![128, 0, 0, 128]);
    assert_eq!(f.pixel(0, 0), Some([64, 0, 0, 128]));
    assert_eq!(f.pixel(1, 0), None);
}
