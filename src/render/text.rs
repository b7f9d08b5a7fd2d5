use std::borrow::Cow;

use crate::foundation::core::Color;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// CSS-style family list, e.g. `"Segoe UI, sans-serif"`.
    pub family: String,
    pub size: f32,
    /// 100..=900, 400 is regular.
    pub weight: u16,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 14.0,
            weight: 400,
        }
    }
}

/// Word-wrapping text layout shared by both backends.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Color>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape `text` and break it into lines no wider than `max_width`.
    /// Returns `None` when there is nothing to draw.
    pub fn layout(
        &mut self,
        text: &str,
        style: &TextStyle,
        color: Color,
        max_width: Option<f32>,
    ) -> Option<parley::Layout<Color>> {
        if text.is_empty() || !style.size.is_finite() || style.size <= 0.0 {
            return None;
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(style.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(style.weight.clamp(1, 1000))),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(color));

        let mut layout: parley::Layout<Color> = builder.build(text);
        layout.break_all_lines(max_width);
        if let Some(w) = max_width {
            layout.align(
                Some(w),
                parley::Alignment::Start,
                parley::AlignmentOptions::default(),
            );
        }
        Some(layout)
    }
}
