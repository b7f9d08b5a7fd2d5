use super::*;

#[test]
fn non_positive_radius_has_no_layers() {
    let r = Rect::new(0, 0, 10, 10);
    assert_eq!(glow_layers(r, 0, Color::WHITE).count(), 0);
    assert_eq!(glow_layers(r, -4, Color::WHITE).count(), 0);
}

#[test]
fn radius_n_yields_n_layers_outermost_first() {
    let r = Rect::new(10, 10, 20, 20);
    let layers: Vec<_> = glow_layers(r, 5, Color::rgba(0, 200, 255, 255)).collect();
    assert_eq!(layers.len(), 5);
    assert_eq!(layers[0].inflate, 5);
    assert_eq!(layers[0].rect, Rect::new(5, 5, 25, 25));
    assert_eq!(layers[4].inflate, 1);
    assert_eq!(layers[0].color.a, 0);
}

#[test]
fn alpha_strictly_decreases_as_layers_grow() {
    let r = Rect::new(0, 0, 4, 4);
    let mut layers: Vec<_> = glow_layers(r, 8, Color::rgba(255, 0, 0, 240)).collect();
    layers.sort_by_key(|l| l.inflate);
    for pair in layers.windows(2) {
        assert!(pair[0].color.a > pair[1].color.a);
        assert_eq!(pair[0].color.with_alpha(0), pair[1].color.with_alpha(0));
    }
}
