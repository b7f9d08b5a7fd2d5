//! Window-side collaborators: the `Window` boundary, renderable elements and
//! the per-frame pass that routes them through the optimizer.

use std::time::Instant;

use tracing::trace;

use crate::{
    effects::settings::EffectPreset,
    foundation::core::{Color, Point, Rect},
    optimizer::{metrics::RenderStrategy, renderer::RendererOptimizer},
    render::{backend::RenderBackend, text::TextStyle},
};

/// Opaque native window id, as handed to window-created callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct WindowHandle(pub u64);

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: Color,
    pub surface: Color,
    pub border: Color,
    pub accent: Color,
    pub text: Color,
    pub shadow: Color,
    pub font: TextStyle,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::rgb(18, 20, 28),
            surface: Color::rgb(36, 40, 56),
            border: Color::rgb(72, 80, 110),
            accent: Color::rgb(94, 160, 255),
            text: Color::rgb(232, 236, 245),
            shadow: Color::rgba(0, 0, 0, 140),
            font: TextStyle::default(),
        }
    }
}

pub trait Window {
    fn handle(&self) -> WindowHandle;
    /// Stacking depth; larger is further back.
    fn depth(&self) -> f32;
    fn scale(&self) -> f32;
    fn alpha(&self) -> f32;
    fn offset(&self) -> Point;
    fn theme(&self) -> &Theme;
    /// Draw one frame. Returns `false` if the backend could not start a frame.
    fn render(&mut self, backend: &mut dyn RenderBackend, optimizer: &mut RendererOptimizer) -> bool;
}

/// Whether a strategy was served from an element's cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOutcome {
    NotApplicable,
    Hit,
    Miss,
}

pub trait RenderElement {
    /// Stable id used as the optimizer key.
    fn id(&self) -> &str;
    fn bounds(&self) -> Rect;
    fn is_visible(&self) -> bool;
    fn is_animated(&self) -> bool {
        false
    }
    fn render(&mut self, backend: &mut dyn RenderBackend, strategy: RenderStrategy) -> CacheOutcome;
}

impl<T: RenderElement + ?Sized> RenderElement for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn bounds(&self) -> Rect {
        (**self).bounds()
    }

    fn is_visible(&self) -> bool {
        (**self).is_visible()
    }

    fn is_animated(&self) -> bool {
        (**self).is_animated()
    }

    fn render(&mut self, backend: &mut dyn RenderBackend, strategy: RenderStrategy) -> CacheOutcome {
        (**self).render(backend, strategy)
    }
}

/// Draw `elements` inside an already open frame.
///
/// Each element is registered on first sight, asked for a strategy, drawn
/// (unless hidden or skipped) and timed. Every element is recorded, drawn or not.
pub fn draw_elements<E: RenderElement>(
    backend: &mut dyn RenderBackend,
    optimizer: &mut RendererOptimizer,
    elements: &mut [E],
) {
    for element in elements.iter_mut() {
        let id = element.id().to_string();
        optimizer.register_element(&id, element.bounds());
        optimizer.set_animated(&id, element.is_animated());

        let visible = element.is_visible();
        let strategy = optimizer.get_optimal_strategy(&id);
        let started = Instant::now();
        if visible && strategy != RenderStrategy::SkipRender {
            match element.render(backend, strategy) {
                CacheOutcome::Hit => optimizer.record_cache_hit(&id),
                CacheOutcome::Miss => optimizer.record_cache_miss(&id),
                CacheOutcome::NotApplicable => {}
            }
        }
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        trace!(id = %id, ?strategy, visible, elapsed_ms, "element rendered");
        optimizer.record_render_metrics(&id, elapsed_ms, visible);
    }
}

/// One full frame: `begin_draw`, [`draw_elements`], `end_draw`.
pub fn render_elements<E: RenderElement>(
    backend: &mut dyn RenderBackend,
    optimizer: &mut RendererOptimizer,
    elements: &mut [E],
) -> bool {
    if !backend.begin_draw() {
        return false;
    }
    draw_elements(backend, optimizer, elements);
    backend.end_draw();
    true
}

/// Rounded card with a title. Detail drops with the strategy's LOD level;
/// `CachedRender` reuses the last full render while the panel is clean.
#[derive(Clone, Debug)]
pub struct Panel {
    pub id: String,
    pub bounds: Rect,
    pub title: String,
    pub fill: Color,
    pub border: Color,
    pub text: Color,
    pub corner_radius: f32,
    pub visible: bool,
    pub animated: bool,
    dirty: bool,
}

impl Panel {
    pub fn new(id: impl Into<String>, bounds: Rect, title: impl Into<String>, theme: &Theme) -> Self {
        Self {
            id: id.into(),
            bounds,
            title: title.into(),
            fill: theme.surface,
            border: theme.border,
            text: theme.text,
            corner_radius: 8.0,
            visible: true,
            animated: false,
            dirty: true,
        }
    }

    /// Force the next cached render to redraw in full.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn draw(&self, backend: &mut dyn RenderBackend, lod: u8) {
        match lod {
            0 => {
                backend.draw_shadow(self.bounds, 0, 4, 8, Color::rgba(0, 0, 0, 110));
                backend.draw_rounded_rectangle(
                    self.bounds,
                    self.corner_radius,
                    self.fill,
                    self.border,
                    1.0,
                );
                self.draw_title(backend);
            }
            1 => {
                backend.draw_rounded_rectangle(
                    self.bounds,
                    self.corner_radius,
                    self.fill,
                    Color::TRANSPARENT,
                    0.0,
                );
                self.draw_title(backend);
            }
            _ => backend.fill_rect(self.bounds, self.fill),
        }
    }

    fn draw_title(&self, backend: &mut dyn RenderBackend) {
        let text_rect = Rect::new(
            self.bounds.left + 12,
            self.bounds.top + 10,
            self.bounds.right - 12,
            self.bounds.bottom - 10,
        );
        backend.draw_text(&self.title, text_rect, self.text, &TextStyle::default());
    }
}

impl RenderElement for Panel {
    fn id(&self) -> &str {
        &self.id
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn is_animated(&self) -> bool {
        self.animated
    }

    fn render(&mut self, backend: &mut dyn RenderBackend, strategy: RenderStrategy) -> CacheOutcome {
        // Backends present whole frames and `PanelWindow` clears each one, so no
        // pixels survive to be reused: a hit still redraws at full detail and
        // the outcome only feeds the optimizer's cache statistics.
        if strategy == RenderStrategy::CachedRender {
            let outcome = if self.dirty {
                CacheOutcome::Miss
            } else {
                CacheOutcome::Hit
            };
            self.draw(backend, 0);
            self.dirty = false;
            return outcome;
        }
        self.draw(backend, strategy.lod_level().unwrap_or(0));
        self.dirty = false;
        CacheOutcome::NotApplicable
    }
}

/// A window made of panels over a themed background, with an optional
/// post-processing preset over the whole client area.
#[derive(Debug)]
pub struct PanelWindow {
    handle: WindowHandle,
    size: (u32, u32),
    theme: Theme,
    depth: f32,
    scale: f32,
    alpha: f32,
    offset: Point,
    pub panels: Vec<Panel>,
    pub preset: EffectPreset,
}

impl PanelWindow {
    pub fn new(handle: WindowHandle, width: u32, height: u32, theme: Theme) -> Self {
        Self {
            handle,
            size: (width, height),
            theme,
            depth: 0.0,
            scale: 1.0,
            alpha: 1.0,
            offset: Point::default(),
            panels: Vec::new(),
            preset: EffectPreset::None,
        }
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn client_rect(&self) -> Rect {
        Rect::from_size(0, 0, self.size.0, self.size.1)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn add_panel(&mut self, id: &str, bounds: Rect, title: &str) -> &mut Panel {
        let panel = Panel::new(id, bounds, title, &self.theme);
        self.panels.push(panel);
        let last = self.panels.len() - 1;
        &mut self.panels[last]
    }

    fn update_coverage(&self, optimizer: &mut RendererOptimizer) {
        let window_area = self.client_rect().area();
        if window_area == 0 {
            return;
        }
        for panel in &self.panels {
            let visible_area = panel
                .bounds
                .intersect(self.client_rect())
                .map_or(0, Rect::area);
            optimizer.update_screen_coverage(&panel.id, visible_area as f64 / window_area as f64);
        }
    }
}

impl Window for PanelWindow {
    fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn depth(&self) -> f32 {
        self.depth
    }

    fn scale(&self) -> f32 {
        self.scale
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn offset(&self) -> Point {
        self.offset
    }

    fn theme(&self) -> &Theme {
        &self.theme
    }

    fn render(&mut self, backend: &mut dyn RenderBackend, optimizer: &mut RendererOptimizer) -> bool {
        if !backend.begin_draw() {
            return false;
        }
        backend.clear(self.theme.background);
        for panel in &self.panels {
            optimizer.register_element(&panel.id, panel.bounds);
        }
        self.update_coverage(optimizer);
        draw_elements(backend, optimizer, &mut self.panels);
        if self.preset != EffectPreset::None {
            backend.apply_effect_preset(self.preset, self.client_rect());
        }
        backend.end_draw();
        true
    }
}

#[cfg(test)]
#[path = "../tests/unit/window.rs"]
mod tests;
