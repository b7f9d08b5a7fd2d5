use crate::foundation::core::{Color, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlowLayer {
    pub inflate: i32,
    pub rect: Rect,
    pub color: Color,
}

/// Layers of a rectangular glow, outermost first.
///
/// Layer `i` (from `radius` down to 1) is `rect` inflated by `i` with alpha
/// `base_alpha * (1 - i / radius)`. Alpha is truncated like an integer cast.
/// A non-positive radius yields no layers.
pub fn glow_layers(rect: Rect, radius: i32, color: Color) -> impl Iterator<Item = GlowLayer> {
    (1..=radius.max(0)).rev().map(move |i| {
        let falloff = 1.0 - f64::from(i) / f64::from(radius);
        let alpha = (f64::from(color.a) * falloff).clamp(0.0, 255.0) as u8;
        GlowLayer {
            inflate: i,
            rect: rect.inflate(i),
            color: color.with_alpha(alpha),
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/effects/glow.rs"]
mod tests;
