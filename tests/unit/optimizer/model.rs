use super::*;
use crate::foundation::core::Rect;

fn fresh() -> ElementMetrics {
    ElementMetrics::new(Rect::new(0, 0, 100, 100))
}

#[test]
fn features_of_a_fresh_element() {
    let f = OptimizationModel::features(&fresh());
    assert_eq!(f[0], 0.0);
    assert_eq!(f[1], 0.5);
    assert!((f[2] - 10_000.0 / 2_073_600.0).abs() < 1e-12);
    assert_eq!(f[3], 0.0);
    assert_eq!(f[4], 0.0);
    assert_eq!(f[5], 0.5);
}

#[test]
fn features_are_clamped() {
    let mut m = ElementMetrics::new(Rect::new(0, 0, 4000, 4000));
    m.avg_render_time = 40.0;
    let f = OptimizationModel::features(&m);
    assert_eq!(f[0], 1.0);
    assert_eq!(f[2], 1.0);
}

#[test]
fn fresh_element_prediction_is_fixed() {
    // z = 0.4 * 0.5 + 0.15 * area - 0.2 * 0.5 ~= 0.1007, sigmoid ~= 0.525.
    let model = OptimizationModel::default();
    let score = model.score(&fresh());
    assert!((score - 0.52516).abs() < 1e-4, "score {score}");
    assert_eq!(model.predict(&fresh()), RenderStrategy::FullRender);

    // An empty element lands in the same band.
    let empty = ElementMetrics::new(Rect::default());
    assert_eq!(model.predict(&empty), RenderStrategy::FullRender);
}

#[test]
fn animation_and_high_change_frequency_force_full_render() {
    let model = OptimizationModel::default();
    let mut m = fresh();
    m.change_frequency = 0.0;
    m.cache_hits = 100;
    m.is_animated = true;
    assert_eq!(model.predict(&m), RenderStrategy::FullRender);

    let mut m = fresh();
    m.change_frequency = 0.81;
    assert_eq!(model.predict(&m), RenderStrategy::FullRender);
}

#[test]
fn middle_band_depends_on_coverage() {
    let model = OptimizationModel::default();
    let mut m = ElementMetrics::new(Rect::default());
    m.change_frequency = 0.1;
    m.cache_hits = 10;
    // z = 0.04 - 0.2 = -0.16, sigmoid ~= 0.46
    assert_eq!(model.predict(&m), RenderStrategy::LodMedium);
    m.screen_coverage = 0.5;
    assert_eq!(model.predict(&m), RenderStrategy::CachedRender);
}

#[test]
fn high_band_with_large_coverage_is_full_render() {
    let model = OptimizationModel::default();
    let mut m = ElementMetrics::new(Rect::new(0, 0, 1920, 1080));
    m.avg_render_time = 16.0;
    m.change_frequency = 0.79;
    m.screen_coverage = 1.0;
    m.cache_misses = 1;
    assert!(model.score(&m) >= 0.7);
    assert_eq!(model.predict(&m), RenderStrategy::FullRender);
}

#[test]
fn fast_renders_raise_the_score() {
    let mut model = OptimizationModel::default();
    let m = fresh();
    let before = model.score(&m);
    model.learn(&m, RenderStrategy::FullRender, 2.0);
    assert!(model.bias() > 0.0);
    assert!(model.score(&m) > before);
    assert_eq!(model.training_samples(), 1);
    assert!((model.confidence() - before).abs() < 1e-12);
}

#[test]
fn slow_renders_push_toward_low_detail() {
    let mut model = OptimizationModel::default();
    let mut m = ElementMetrics::new(Rect::default());
    m.change_frequency = 0.1;
    m.cache_hits = 10;
    for _ in 0..500 {
        model.learn(&m, RenderStrategy::LodMedium, 30.0);
    }
    assert!(model.score(&m) < 0.3);
    assert_eq!(model.predict(&m), RenderStrategy::LodLow);
    m.screen_coverage = 0.15;
    assert_eq!(model.predict(&m), RenderStrategy::CachedRender);
}

#[test]
fn confidence_is_capped() {
    let mut model = OptimizationModel::default();
    let mut m = fresh();
    m.change_frequency = 0.0;
    for _ in 0..5000 {
        model.learn(&m, RenderStrategy::FullRender, 1.0);
    }
    assert!(model.confidence() <= 0.95);
    assert!(model.confidence() > 0.5);
}
