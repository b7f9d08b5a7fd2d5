use std::{collections::HashMap, time::Instant};

use tracing::debug;

use crate::{
    foundation::core::Rect,
    optimizer::{
        metrics::{ElementMetrics, RenderStrategy},
        model::{GOOD_RENDER_MS, OptimizationModel},
    },
};

const CHANGE_EMA_KEEP: f64 = 0.95;
const RENDER_TIME_EMA_KEEP: f64 = 0.9;

/// Aggregate counters reported by [`RendererOptimizer::get_stats`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct OptimizerStats {
    pub total_elements: usize,
    /// Sum of every element's render count, whatever strategy was chosen.
    pub full_renders: u64,
    pub cached_renders: u64,
    /// Milliseconds per recorded render.
    pub avg_render_time: f64,
    pub cache_hit_rate: f64,
    pub ml_accuracy: f64,
}

/// Per-element strategy selection backed by an online model.
///
/// Unknown ids never fail: they get `FullRender` and LOD 0.
#[derive(Debug)]
pub struct RendererOptimizer {
    elements: HashMap<String, ElementMetrics>,
    model: OptimizationModel,
    enabled: bool,
    total_decisions: u64,
    correct_decisions: u64,
    total_render_time: f64,
}

impl Default for RendererOptimizer {
    fn default() -> Self {
        Self::new(OptimizationModel::default())
    }
}

impl RendererOptimizer {
    pub fn new(model: OptimizationModel) -> Self {
        Self {
            elements: HashMap::new(),
            model,
            enabled: true,
            total_decisions: 0,
            correct_decisions: 0,
            total_render_time: 0.0,
        }
    }

    /// No-op for an id that is already registered.
    pub fn register_element(&mut self, id: &str, bounds: Rect) {
        if self.elements.contains_key(id) {
            return;
        }
        debug!(id, ?bounds, "element registered");
        self.elements
            .insert(id.to_string(), ElementMetrics::new(bounds));
    }

    pub fn get_optimal_strategy(&mut self, id: &str) -> RenderStrategy {
        if !self.enabled {
            return RenderStrategy::FullRender;
        }
        let Some(metrics) = self.elements.get(id) else {
            return RenderStrategy::FullRender;
        };
        self.total_decisions += 1;
        self.model.predict(metrics)
    }

    pub fn record_render_metrics(&mut self, id: &str, render_time_ms: f64, was_visible: bool) {
        let Some(metrics) = self.elements.get_mut(id) else {
            return;
        };
        metrics.render_count += 1;
        metrics.avg_render_time = if metrics.render_count == 1 {
            render_time_ms
        } else {
            metrics.avg_render_time * RENDER_TIME_EMA_KEEP
                + render_time_ms * (1.0 - RENDER_TIME_EMA_KEEP)
        };
        metrics.last_render_time = render_time_ms;
        metrics.last_update = Instant::now();
        self.total_render_time += render_time_ms;

        if self.enabled && was_visible {
            let strategy = self.model.predict(metrics);
            self.model.learn(metrics, strategy, render_time_ms);
            if render_time_ms < GOOD_RENDER_MS {
                self.correct_decisions += 1;
            }
        }
    }

    /// Positive change sample: `cf = cf * 0.95 + 0.05`.
    pub fn mark_element_changed(&mut self, id: &str) {
        if let Some(metrics) = self.elements.get_mut(id) {
            metrics.change_frequency =
                metrics.change_frequency * CHANGE_EMA_KEEP + (1.0 - CHANGE_EMA_KEEP);
            metrics.last_update = Instant::now();
        }
    }

    /// Multiply every element's change frequency by `factor` (clamped to 0..=1).
    ///
    /// Not tied to a clock; callers decide when unchanged frames count.
    pub fn decay_metrics(&mut self, factor: f64) {
        let factor = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            1.0
        };
        for metrics in self.elements.values_mut() {
            metrics.change_frequency *= factor;
        }
    }

    /// Stores `screen_coverage` and returns 0 (high), 1 (medium) or 2 (low).
    pub fn calculate_lod(&mut self, id: &str, screen_coverage: f64) -> u8 {
        let Some(metrics) = self.elements.get_mut(id) else {
            return 0;
        };
        metrics.screen_coverage = screen_coverage;
        if metrics.is_animated || screen_coverage > 0.3 {
            0
        } else if screen_coverage > 0.1 {
            1
        } else {
            2
        }
    }

    pub fn update_screen_coverage(&mut self, id: &str, screen_coverage: f64) {
        if let Some(metrics) = self.elements.get_mut(id) {
            metrics.screen_coverage = screen_coverage;
        }
    }

    pub fn set_animated(&mut self, id: &str, animated: bool) {
        if let Some(metrics) = self.elements.get_mut(id) {
            metrics.is_animated = animated;
        }
    }

    pub fn record_cache_hit(&mut self, id: &str) {
        if let Some(metrics) = self.elements.get_mut(id) {
            metrics.cache_hits += 1;
        }
    }

    pub fn record_cache_miss(&mut self, id: &str) {
        if let Some(metrics) = self.elements.get_mut(id) {
            metrics.cache_misses += 1;
        }
    }

    pub fn get_stats(&self) -> OptimizerStats {
        let mut renders = 0u64;
        let mut hits = 0u64;
        let mut accesses = 0u64;
        for metrics in self.elements.values() {
            renders += metrics.render_count;
            hits += metrics.cache_hits;
            accesses += metrics.cache_hits + metrics.cache_misses;
        }

        OptimizerStats {
            total_elements: self.elements.len(),
            full_renders: renders,
            cached_renders: hits,
            avg_render_time: ratio(self.total_render_time, renders as f64),
            cache_hit_rate: ratio(hits as f64, accesses as f64),
            // Visible renders can outnumber decisions when callers skip the query.
            ml_accuracy: ratio(self.correct_decisions as f64, self.total_decisions as f64).min(1.0),
        }
    }

    /// Zero the counters; change frequencies, average times and the model survive.
    pub fn reset_stats(&mut self) {
        self.total_decisions = 0;
        self.correct_decisions = 0;
        self.total_render_time = 0.0;
        for metrics in self.elements.values_mut() {
            metrics.render_count = 0;
            metrics.cache_hits = 0;
            metrics.cache_misses = 0;
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn model(&self) -> &OptimizationModel {
        &self.model
    }

    pub fn metrics(&self, id: &str) -> Option<&ElementMetrics> {
        self.elements.get(id)
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/optimizer/renderer.rs"]
mod tests;
