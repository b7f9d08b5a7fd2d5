use std::time::Instant;

use crate::foundation::core::Rect;

/// How an element should be drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    FullRender,
    CachedRender,
    SkipRender,
    LodHigh,
    LodMedium,
    LodLow,
}

impl RenderStrategy {
    /// Detail level for strategies that draw: 0 is full detail, 2 the coarsest.
    /// `None` for strategies that do not draw fresh content.
    pub fn lod_level(self) -> Option<u8> {
        match self {
            RenderStrategy::FullRender | RenderStrategy::LodHigh => Some(0),
            RenderStrategy::LodMedium => Some(1),
            RenderStrategy::LodLow => Some(2),
            RenderStrategy::CachedRender | RenderStrategy::SkipRender => None,
        }
    }
}

/// Per-element observations the model learns from.
#[derive(Clone, Debug)]
pub struct ElementMetrics {
    pub render_count: u64,
    /// Milliseconds, EMA with weight 0.9 on the old value.
    pub avg_render_time: f64,
    pub last_render_time: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub is_animated: bool,
    /// 0..1; 0.5 until the element reports changes.
    pub change_frequency: f64,
    pub pixel_area: u64,
    /// Fraction of the window covered, 0..1.
    pub screen_coverage: f64,
    pub last_update: Instant,
}

impl ElementMetrics {
    pub const INITIAL_CHANGE_FREQUENCY: f64 = 0.5;

    pub fn new(bounds: Rect) -> Self {
        Self {
            render_count: 0,
            avg_render_time: 0.0,
            last_render_time: 0.0,
            cache_hits: 0,
            cache_misses: 0,
            is_animated: false,
            change_frequency: Self::INITIAL_CHANGE_FREQUENCY,
            pixel_area: bounds.area(),
            screen_coverage: 0.0,
            last_update: Instant::now(),
        }
    }

    /// `hits / (hits + misses)`, or 0.5 before the first access.
    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.5
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
