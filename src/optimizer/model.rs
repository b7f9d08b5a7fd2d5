use tracing::trace;

use crate::optimizer::metrics::{ElementMetrics, RenderStrategy};

pub const FEATURE_COUNT: usize = 6;

/// Prior weights for render time, change frequency, pixel area, screen
/// coverage, animation and cache-hit ratio.
pub const PRIOR_WEIGHTS: [f64; FEATURE_COUNT] = [0.3, 0.4, 0.15, 0.1, 0.25, -0.2];
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Renders faster than this count as a good outcome.
pub const GOOD_RENDER_MS: f64 = 8.0;
const FRAME_BUDGET_MS: f64 = 16.0;
const FULL_HD_PIXELS: f64 = 1920.0 * 1080.0;
const MAX_CONFIDENCE: f64 = 0.95;

/// Online logistic regression over six element features.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct OptimizationModel {
    weights: [f64; FEATURE_COUNT],
    bias: f64,
    learning_rate: f64,
    confidence: f64,
    training_samples: u64,
}

impl Default for OptimizationModel {
    fn default() -> Self {
        Self::with_learning_rate(DEFAULT_LEARNING_RATE)
    }
}

impl OptimizationModel {
    pub fn with_learning_rate(learning_rate: f64) -> Self {
        Self {
            weights: PRIOR_WEIGHTS,
            bias: 0.0,
            learning_rate,
            confidence: 0.0,
            training_samples: 0,
        }
    }

    pub fn weights(&self) -> &[f64; FEATURE_COUNT] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Running average of `1 - |error|` over every training step, capped at 0.95.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn training_samples(&self) -> u64 {
        self.training_samples
    }

    /// Normalized inputs, each in 0..=1.
    pub fn features(metrics: &ElementMetrics) -> [f64; FEATURE_COUNT] {
        [
            (metrics.avg_render_time / FRAME_BUDGET_MS).min(1.0),
            metrics.change_frequency,
            (metrics.pixel_area as f64 / FULL_HD_PIXELS).min(1.0),
            metrics.screen_coverage,
            if metrics.is_animated { 1.0 } else { 0.0 },
            metrics.cache_hit_ratio(),
        ]
    }

    /// `sigmoid(bias + w·x)`.
    pub fn score(&self, metrics: &ElementMetrics) -> f64 {
        let features = Self::features(metrics);
        let z = self.bias
            + self
                .weights
                .iter()
                .zip(features.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        sigmoid(z)
    }

    pub fn predict(&self, metrics: &ElementMetrics) -> RenderStrategy {
        if metrics.is_animated || metrics.change_frequency > 0.8 {
            return RenderStrategy::FullRender;
        }

        let score = self.score(metrics);
        let coverage = metrics.screen_coverage;
        if score < 0.3 {
            if coverage < 0.1 {
                RenderStrategy::LodLow
            } else {
                RenderStrategy::CachedRender
            }
        } else if score < 0.5 {
            if coverage < 0.2 {
                RenderStrategy::LodMedium
            } else {
                RenderStrategy::CachedRender
            }
        } else if score < 0.7 {
            if metrics.change_frequency < 0.2 {
                RenderStrategy::CachedRender
            } else {
                RenderStrategy::FullRender
            }
        } else if coverage > 0.5 {
            RenderStrategy::FullRender
        } else {
            RenderStrategy::LodHigh
        }
    }

    /// One gradient step toward "fast" (`1.0`) or "slow" (`0.0`).
    pub fn learn(&mut self, metrics: &ElementMetrics, strategy: RenderStrategy, render_time_ms: f64) {
        let features = Self::features(metrics);
        let predicted = self.score(metrics);
        let target = if render_time_ms < GOOD_RENDER_MS { 1.0 } else { 0.0 };
        let error = target - predicted;

        for (w, x) in self.weights.iter_mut().zip(features.iter()) {
            *w += self.learning_rate * error * x;
        }
        self.bias += self.learning_rate * error;

        self.training_samples += 1;
        let n = self.training_samples as f64;
        let accuracy = 1.0 - error.abs();
        self.confidence = ((self.confidence * (n - 1.0) + accuracy) / n).min(MAX_CONFIDENCE);

        trace!(
            ?strategy,
            render_time_ms,
            predicted,
            error,
            confidence = self.confidence,
            "optimizer learned"
        );
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
#[path = "../../tests/unit/optimizer/model.rs"]
mod tests;
