use std::collections::HashMap;

use tracing::{debug, warn};
use vello_cpu::kurbo::{self, Shape as _};

use crate::{
    effects::{
        composite,
        raster::{self, GradientDirection, PixelBuffer},
    },
    foundation::{
        core::{Color, Point, Rect},
        error::{FivedError, FivedResult},
    },
    render::{
        backend::{BackendKind, Capabilities, RenderBackend},
        surface::{FrameRGBA, SurfaceHandle},
        text::{TextEngine, TextStyle},
    },
};

const PATH_TOLERANCE: f64 = 0.1;

/// Double-buffered CPU renderer.
///
/// Owns a premultiplied back buffer sized to the surface's client area at
/// initialization; a resize needs another `initialize`. Rect fills, gradients
/// and effects write the buffer directly. Anti-aliased shapes and text are
/// queued in a `vello_cpu` context and composited over the buffer before the
/// next pixel operation, which keeps painter's order. `end_draw` presents the
/// whole buffer in one call.
pub struct SoftwareRenderBackend {
    surface: Option<SurfaceHandle>,
    back_buffer: Option<PixelBuffer>,
    pending: Option<vello_cpu::RenderContext>,
    text: TextEngine,
    fonts: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
    drawing: bool,
}

impl Default for SoftwareRenderBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareRenderBackend {
    pub fn new() -> Self {
        Self {
            surface: None,
            back_buffer: None,
            pending: None,
            text: TextEngine::new(),
            fonts: HashMap::new(),
            drawing: false,
        }
    }

    /// Back buffer as of the last flush. Queued vector work is not included
    /// until the next pixel operation or `end_draw`.
    pub fn back_buffer(&self) -> Option<&PixelBuffer> {
        self.back_buffer.as_ref()
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.back_buffer.as_ref().map(|b| (b.width(), b.height()))
    }

    fn try_initialize(&mut self, surface: SurfaceHandle) -> FivedResult<()> {
        let (width, height) = surface
            .client_size()
            .ok_or_else(|| FivedError::surface("surface handle is no longer valid"))?;
        if width == 0 || height == 0 {
            return Err(FivedError::surface(format!(
                "surface client area is empty ({width}x{height})"
            )));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(FivedError::surface(format!(
                "surface {width}x{height} exceeds the software raster limit"
            )));
        }
        self.back_buffer = Some(PixelBuffer::try_new(width, height)?);
        self.surface = Some(surface);
        Ok(())
    }

    /// Back buffer for a pixel operation, with queued vector work flushed first.
    fn canvas(&mut self) -> Option<&mut PixelBuffer> {
        if !self.drawing {
            return None;
        }
        self.flush_pending();
        self.back_buffer.as_mut()
    }

    fn flush_pending(&mut self) {
        let Some(mut ctx) = self.pending.take() else {
            return;
        };
        let Some(buf) = self.back_buffer.as_mut() else {
            return;
        };
        ctx.flush();
        let mut scratch = vello_cpu::Pixmap::new(buf.width() as u16, buf.height() as u16);
        ctx.render_to_pixmap(&mut scratch);
        if let Err(err) = composite::over_in_place(buf.data_mut(), scratch.data_as_u8_slice(), 1.0) {
            warn!(%err, "dropping vector layer that does not match the back buffer");
        }
    }

    /// Queue a filled and/or stroked shape.
    fn queue_shape(&mut self, path: kurbo::BezPath, fill: Color, border: Color, border_width: f32) {
        let do_fill = !fill.is_transparent();
        let do_stroke = stroke_visible(border, border_width);
        if !(do_fill || do_stroke) || !self.drawing {
            return;
        }
        let Some(ctx) = pending_context(&mut self.pending, self.back_buffer.as_ref()) else {
            return;
        };
        if do_fill {
            ctx.set_paint(to_cpu_color(fill));
            ctx.fill_path(&path);
        }
        if do_stroke {
            ctx.set_stroke(kurbo::Stroke::new(f64::from(border_width)));
            ctx.set_paint(to_cpu_color(border));
            ctx.stroke_path(&path);
        }
    }

    fn report(result: FivedResult<()>, effect: &'static str) {
        if let Err(err) = result {
            warn!(%err, effect, "software effect failed");
        }
    }
}

impl RenderBackend for SoftwareRenderBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }

    fn initialize(&mut self, surface: SurfaceHandle) -> bool {
        if self.is_initialized() {
            self.shutdown();
        }
        match self.try_initialize(surface) {
            Ok(()) => {
                debug!(size = ?self.size(), "software backend initialized");
                true
            }
            Err(err) => {
                warn!(%err, "software backend initialization failed");
                self.shutdown();
                false
            }
        }
    }

    fn shutdown(&mut self) {
        self.drawing = false;
        self.pending = None;
        self.back_buffer = None;
        self.surface = None;
        self.fonts.clear();
    }

    fn is_initialized(&self) -> bool {
        self.surface.is_some() && self.back_buffer.is_some()
    }

    fn begin_draw(&mut self) -> bool {
        let valid = self
            .surface
            .as_ref()
            .is_some_and(|s| s.client_size().is_some());
        if !valid || self.back_buffer.is_none() {
            return false;
        }
        if self.drawing {
            warn!("begin_draw while a frame is already open; continuing the open frame");
        }
        self.drawing = true;
        true
    }

    fn end_draw(&mut self) {
        if !self.drawing {
            return;
        }
        self.flush_pending();
        self.drawing = false;

        let (Some(surface), Some(buf)) = (self.surface.as_ref(), self.back_buffer.as_ref()) else {
            return;
        };
        let frame = FrameRGBA {
            width: buf.width(),
            height: buf.height(),
            data: buf.data().to_vec(),
            premultiplied: true,
        };
        if let Err(err) = surface.present(&frame) {
            warn!(%err, "software present failed");
        }
    }

    fn clear(&mut self, color: Color) {
        if !self.drawing {
            return;
        }
        // Everything queued so far is about to be overwritten.
        self.pending = None;
        if let Some(buf) = self.back_buffer.as_mut() {
            buf.fill(color.to_premul());
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if color.is_transparent() || rect.is_empty() {
            return;
        }
        if let Some(buf) = self.canvas() {
            raster::fill_rect(buf, rect, color);
        }
    }

    fn draw_rectangle(&mut self, rect: Rect, fill: Color, border: Color, border_width: f32) {
        if rect.is_empty() {
            return;
        }
        self.fill_rect(rect, fill);
        if stroke_visible(border, border_width) {
            self.queue_shape(to_cpu_rect(rect).to_path(PATH_TOLERANCE), Color::TRANSPARENT, border, border_width);
        }
    }

    fn draw_rounded_rectangle(
        &mut self,
        rect: Rect,
        radius: f32,
        fill: Color,
        border: Color,
        border_width: f32,
    ) {
        if rect.is_empty() {
            return;
        }
        let radius = clamp_corner_radius(rect, radius);
        let shape = kurbo::RoundedRect::from_rect(to_cpu_rect(rect), radius);
        self.queue_shape(shape.to_path(PATH_TOLERANCE), fill, border, border_width);
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        if !stroke_visible(color, width) {
            return;
        }
        let line = kurbo::Line::new(to_cpu_point(from), to_cpu_point(to));
        self.queue_shape(line.to_path(PATH_TOLERANCE), Color::TRANSPARENT, color, width);
    }

    fn draw_ellipse(
        &mut self,
        center: Point,
        radius_x: f32,
        radius_y: f32,
        fill: Color,
        border: Color,
        border_width: f32,
    ) {
        if !(radius_x > 0.0 && radius_y > 0.0) {
            return;
        }
        let ellipse = kurbo::Ellipse::new(
            to_cpu_point(center),
            (f64::from(radius_x), f64::from(radius_y)),
            0.0,
        );
        self.queue_shape(ellipse.to_path(PATH_TOLERANCE), fill, border, border_width);
    }

    fn draw_text(&mut self, text: &str, rect: Rect, color: Color, style: &TextStyle) {
        if !self.drawing || color.is_transparent() || rect.is_empty() {
            return;
        }
        let Some(layout) = self
            .text
            .layout(text, style, color, Some(rect.width() as f32))
        else {
            return;
        };
        let Some(ctx) = pending_context(&mut self.pending, self.back_buffer.as_ref()) else {
            return;
        };

        ctx.set_transform(kurbo::Affine::IDENTITY);
        ctx.push_clip_layer(&to_cpu_rect(rect).to_path(PATH_TOLERANCE));
        ctx.set_transform(kurbo::Affine::translate((
            f64::from(rect.left),
            f64::from(rect.top),
        )));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let font_ref = run.run().font();
                let font = self
                    .fonts
                    .entry((font_ref.data.id(), font_ref.index))
                    .or_insert_with(|| {
                        vello_cpu::peniko::FontData::new(
                            vello_cpu::peniko::Blob::from(font_ref.data.data().to_vec()),
                            font_ref.index,
                        )
                    })
                    .clone();
                ctx.set_paint(to_cpu_color(run.style().brush));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(kurbo::Affine::IDENTITY);
        ctx.pop_layer();
    }

    fn draw_linear_gradient(
        &mut self,
        rect: Rect,
        start: Color,
        end: Color,
        direction: GradientDirection,
    ) {
        if let Some(buf) = self.canvas() {
            raster::fill_linear_gradient(buf, rect, start, end, direction);
        }
    }

    fn draw_radial_gradient(
        &mut self,
        rect: Rect,
        center: Point,
        center_color: Color,
        edge_color: Color,
    ) {
        if let Some(buf) = self.canvas() {
            raster::fill_radial_gradient(buf, rect, center, center_color, edge_color);
        }
    }

    fn draw_shadow(&mut self, rect: Rect, offset_x: i32, offset_y: i32, blur_radius: i32, color: Color) {
        if color.is_transparent() {
            return;
        }
        if let Some(buf) = self.canvas() {
            let result = raster::drop_shadow(buf, rect, offset_x, offset_y, blur_radius, color);
            Self::report(result, "shadow");
        }
    }

    fn draw_blur(&mut self, rect: Rect, radius: f32) {
        if let Some(buf) = self.canvas() {
            Self::report(raster::blur_region(buf, rect, radius), "blur");
        }
    }

    fn draw_bloom(&mut self, rect: Rect, threshold: f32, intensity: f32) {
        if let Some(buf) = self.canvas() {
            Self::report(raster::bloom(buf, rect, threshold, intensity), "bloom");
        }
    }

    fn draw_depth_of_field(&mut self, rect: Rect, focal_distance: f32, blur_amount: f32) {
        if let Some(buf) = self.canvas() {
            let result = raster::depth_of_field(buf, rect, focal_distance, blur_amount);
            Self::report(result, "depth_of_field");
        }
    }

    fn draw_motion_blur(&mut self, rect: Rect, velocity_x: f32, velocity_y: f32, intensity: f32) {
        if let Some(buf) = self.canvas() {
            raster::motion_blur(buf, rect, velocity_x, velocity_y, intensity);
        }
    }

    fn draw_chromatic_aberration(&mut self, rect: Rect, offset: f32, strength: f32) {
        if let Some(buf) = self.canvas() {
            raster::chromatic_aberration(buf, rect, offset, strength);
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            gpu_accelerated: false,
            advanced_effects: true,
            antialiasing: true,
            transparency: true,
            max_texture_size: u32::from(u16::MAX),
        }
    }
}

fn pending_context<'a>(
    pending: &'a mut Option<vello_cpu::RenderContext>,
    buffer: Option<&PixelBuffer>,
) -> Option<&'a mut vello_cpu::RenderContext> {
    let buf = buffer?;
    let (w, h) = (buf.width() as u16, buf.height() as u16);
    Some(pending.get_or_insert_with(|| vello_cpu::RenderContext::new(w, h)))
}

pub(crate) fn stroke_visible(color: Color, width: f32) -> bool {
    width > 0.0 && !color.is_transparent()
}

pub(crate) fn clamp_corner_radius(rect: Rect, radius: f32) -> f64 {
    let max = f64::from(rect.width().min(rect.height())) * 0.5;
    if radius.is_finite() {
        f64::from(radius).clamp(0.0, max)
    } else {
        0.0
    }
}

fn to_cpu_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn to_cpu_point(p: Point) -> kurbo::Point {
    kurbo::Point::new(f64::from(p.x), f64::from(p.y))
}

fn to_cpu_rect(r: Rect) -> kurbo::Rect {
    kurbo::Rect::new(
        f64::from(r.left),
        f64::from(r.top),
        f64::from(r.right),
        f64::from(r.bottom),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/software.rs"]
mod tests;
