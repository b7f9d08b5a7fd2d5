use super::*;

#[test]
fn same_color_hits_the_cache() {
    let cache = BrushCache::<u32>::new();
    let mut created = 0;
    for _ in 0..3 {
        let b = cache.get_or_create(Color::rgb(1, 2, 3), |_| {
            created += 1;
            7
        });
        assert_eq!(b, 7);
    }
    assert_eq!(created, 1);
    assert_eq!(cache.hits(), 2);
    assert_eq!(cache.misses(), 1);
}

#[test]
fn alternating_colors_thrash() {
    let cache = BrushCache::<Color>::new();
    let a = Color::rgb(255, 0, 0);
    let b = Color::rgb(0, 0, 255);
    for _ in 0..4 {
        cache.get_or_create(a, |c| c);
        cache.get_or_create(b, |c| c);
    }
    assert_eq!(cache.hits(), 0);
    assert_eq!(cache.misses(), 8);
    assert_eq!(cache.cached_color(), Some(b));
}

#[test]
fn alpha_difference_is_a_miss() {
    let cache = BrushCache::<u8>::new();
    cache.get_or_create(Color::rgba(9, 9, 9, 255), |c| c.a);
    let b = cache.get_or_create(Color::rgba(9, 9, 9, 128), |c| c.a);
    assert_eq!(b, 128);
    assert_eq!(cache.misses(), 2);
    cache.clear();
    assert_eq!(cache.cached_color(), None);
}
