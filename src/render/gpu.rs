use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, trace, warn};
use kurbo::Affine;
use vello::peniko::{self, Fill};

use crate::{
    effects::raster::{self, GradientDirection, PixelBuffer},
    foundation::{
        core::{Color, Point, Rect},
        error::{FivedError, FivedResult},
    },
    render::{
        backend::{BackendKind, Capabilities, RenderBackend},
        brush::BrushCache,
        software::{clamp_corner_radius, stroke_visible},
        surface::{FrameRGBA, SurfaceHandle},
        text::{TextEngine, TextStyle},
    },
};

/// Device-side state. Dropped and rebuilt as a unit when the device is lost.
struct GpuDevice {
    device: vello::wgpu::Device,
    queue: vello::wgpu::Queue,
    renderer: vello::Renderer,
    texture: vello::wgpu::Texture,
    view: vello::wgpu::TextureView,
    readback: vello::wgpu::Buffer,
    /// Mid-frame readback target for the raster effects.
    snapshot: Option<vello::wgpu::Buffer>,
    bytes_per_row: u32,
    width: u32,
    height: u32,
    max_texture_size: u32,
    lost: Arc<AtomicBool>,
}

impl GpuDevice {
    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    fn effects_ready(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Raise the flag the device-lost callback sets.
    #[cfg(test)]
    fn mark_lost(&self) {
        self.lost.store(true, Ordering::Release);
    }
}

#[derive(Clone, Copy)]
enum Readback {
    Present,
    Snapshot,
}

enum PresentError {
    /// The device went away; every device resource must be rebuilt.
    RecreateTarget,
    Failed(FivedError),
}

impl From<FivedError> for PresentError {
    fn from(err: FivedError) -> Self {
        PresentError::Failed(err)
    }
}

/// Hardware renderer on `vello` + `wgpu`.
///
/// Draw calls are recorded into a `vello::Scene`; `end_draw` renders the scene
/// into an offscreen texture, reads it back and presents it. Solid-color
/// brushes go through a single-entry cache. Raster effects snapshot the frame
/// so far, process it on the CPU and draw it back as the new base layer.
pub struct GpuRenderBackend {
    surface: Option<SurfaceHandle>,
    gpu: Option<GpuDevice>,
    scene: vello::Scene,
    base_color: Color,
    brushes: BrushCache<peniko::Brush>,
    text: TextEngine,
    fonts: HashMap<(u64, u32), peniko::FontData>,
    drawing: bool,
}

impl Default for GpuRenderBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuRenderBackend {
    pub fn new() -> Self {
        Self {
            surface: None,
            gpu: None,
            scene: vello::Scene::new(),
            base_color: Color::TRANSPARENT,
            brushes: BrushCache::new(),
            text: TextEngine::new(),
            fonts: HashMap::new(),
            drawing: false,
        }
    }

    /// `true` if a hardware adapter can be found. No device is created.
    pub fn probe() -> bool {
        let instance = vello::wgpu::Instance::new(&vello::wgpu::InstanceDescriptor::default());
        let found = pollster::block_on(instance.request_adapter(&adapter_options())).is_ok();
        debug!(found, "gpu adapter probe");
        found
    }

    pub fn brush_cache(&self) -> &BrushCache<peniko::Brush> {
        &self.brushes
    }

    fn create_device(width: u32, height: u32) -> FivedResult<GpuDevice> {
        let instance = vello::wgpu::Instance::new(&vello::wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&adapter_options())).map_err(
            |e| match e {
                vello::wgpu::RequestAdapterError::NotFound { .. } => {
                    FivedError::backend("no gpu adapter available")
                }
                other => FivedError::backend(format!("wgpu request_adapter failed: {other:?}")),
            },
        )?;

        let max_texture_size = adapter.limits().max_texture_dimension_2d;
        if width > max_texture_size || height > max_texture_size {
            return Err(FivedError::backend(format!(
                "surface {width}x{height} exceeds max texture size {max_texture_size}"
            )));
        }

        let (device, queue) =
            pollster::block_on(adapter.request_device(&vello::wgpu::DeviceDescriptor {
                label: Some("fived_device"),
                required_features: vello::wgpu::Features::empty(),
                required_limits: vello::wgpu::Limits::default(),
                experimental_features: vello::wgpu::ExperimentalFeatures::default(),
                memory_hints: vello::wgpu::MemoryHints::Performance,
                trace: vello::wgpu::Trace::Off,
            }))
            .map_err(|e| FivedError::backend(format!("wgpu request_device failed: {e:?}")))?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            warn!(?reason, %message, "gpu device lost");
            flag.store(true, Ordering::Release);
        });

        let renderer = vello::Renderer::new(&device, vello::RendererOptions::default())
            .map_err(|e| FivedError::backend(format!("vello renderer init failed: {e:?}")))?;

        let texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("fived_target"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::TEXTURE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        let bytes_per_row = align_to(
            width
                .checked_mul(4)
                .ok_or_else(|| FivedError::backend("render target width overflow"))?,
            vello::wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
        );
        let buffer_size = u64::from(bytes_per_row)
            .checked_mul(u64::from(height))
            .ok_or_else(|| FivedError::backend("readback buffer size overflow"))?;

        let readback_desc = vello::wgpu::BufferDescriptor {
            label: Some("fived_readback"),
            size: buffer_size,
            usage: vello::wgpu::BufferUsages::MAP_READ | vello::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        };
        let readback = device.create_buffer(&readback_desc);

        // Effects need a second readback target; without it they are skipped.
        device.push_error_scope(vello::wgpu::ErrorFilter::OutOfMemory);
        let snapshot = device.create_buffer(&vello::wgpu::BufferDescriptor {
            label: Some("fived_snapshot"),
            ..readback_desc
        });
        let snapshot = match pollster::block_on(device.pop_error_scope()) {
            None => Some(snapshot),
            Some(err) => {
                warn!(%err, "frame snapshots unavailable; effects disabled");
                None
            }
        };

        Ok(GpuDevice {
            device,
            queue,
            renderer,
            texture,
            view,
            readback,
            snapshot,
            bytes_per_row,
            width,
            height,
            max_texture_size,
            lost,
        })
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
        self.gpu = Some(Self::create_device(width, height)?);
        self.surface = Some(surface);
        Ok(())
    }

    /// Drop every device-dependent resource. The surface binding is kept.
    fn discard_device_resources(&mut self) {
        self.brushes.clear();
        self.fonts.clear();
        self.scene.reset();
        self.gpu = None;
    }

    /// Render the recorded scene into the target texture and read it back.
    fn render_and_read(&mut self, target: Readback) -> Result<Vec<u8>, PresentError> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(FivedError::backend("gpu backend not initialized").into());
        };
        if gpu.is_lost() {
            return Err(PresentError::RecreateTarget);
        }
        let buffer = match target {
            Readback::Present => &gpu.readback,
            Readback::Snapshot => gpu
                .snapshot
                .as_ref()
                .ok_or_else(|| FivedError::backend("frame snapshots unavailable"))?,
        };

        gpu.renderer
            .render_to_texture(
                &gpu.device,
                &gpu.queue,
                &self.scene,
                &gpu.view,
                &vello::RenderParams {
                    base_color: to_peniko_color(self.base_color),
                    width: gpu.width,
                    height: gpu.height,
                    antialiasing_method: vello::AaConfig::Area,
                },
            )
            .map_err(|e| FivedError::render(format!("vello render failed: {e:?}")))?;

        let mut encoder = gpu
            .device
            .create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                label: Some("fived_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            vello::wgpu::TexelCopyTextureInfo {
                texture: &gpu.texture,
                mip_level: 0,
                origin: vello::wgpu::Origin3d::ZERO,
                aspect: vello::wgpu::TextureAspect::All,
            },
            vello::wgpu::TexelCopyBufferInfo {
                buffer,
                layout: vello::wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(gpu.bytes_per_row),
                    rows_per_image: Some(gpu.height),
                },
            },
            vello::wgpu::Extent3d {
                width: gpu.width,
                height: gpu.height,
                depth_or_array_layers: 1,
            },
        );
        gpu.queue.submit(Some(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(vello::wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        if let Err(e) = gpu.device.poll(vello::wgpu::PollType::wait_indefinitely()) {
            if gpu.is_lost() {
                return Err(PresentError::RecreateTarget);
            }
            return Err(FivedError::render(format!("wgpu poll failed: {e:?}")).into());
        }
        let mapped = rx
            .recv()
            .map_err(|_| FivedError::render("readback channel closed"))?;
        if let Err(e) = mapped {
            if gpu.is_lost() {
                return Err(PresentError::RecreateTarget);
            }
            return Err(FivedError::render(format!("readback map failed: {e:?}")).into());
        }

        let view = slice.get_mapped_range();
        let row_bytes = gpu.width as usize * 4;
        let padded = gpu.bytes_per_row as usize;
        let mut out = Vec::with_capacity(row_bytes * gpu.height as usize);
        for row in 0..gpu.height as usize {
            let start = row * padded;
            out.extend_from_slice(&view[start..start + row_bytes]);
        }
        drop(view);
        buffer.unmap();
        Ok(out)
    }

    fn present_frame(&mut self) -> Result<(), PresentError> {
        let data = self.render_and_read(Readback::Present)?;
        let (Some(surface), Some(gpu)) = (self.surface.as_ref(), self.gpu.as_ref()) else {
            return Err(FivedError::backend("gpu backend not initialized").into());
        };
        let frame = FrameRGBA {
            width: gpu.width,
            height: gpu.height,
            data,
            premultiplied: true,
        };
        surface.present(&frame)?;
        Ok(())
    }

    /// Flatten the frame so far, run `effect` over it on the CPU and make the
    /// result the new base layer.
    fn apply_snapshot_effect(
        &mut self,
        name: &'static str,
        effect: impl FnOnce(&mut PixelBuffer) -> FivedResult<()>,
    ) {
        if !self.drawing {
            return;
        }
        if !self.gpu.as_ref().is_some_and(GpuDevice::effects_ready) {
            trace!(effect = name, "effect skipped; snapshots unavailable");
            return;
        }
        match self.snapshot_effect(effect) {
            Ok(()) => {}
            Err(PresentError::RecreateTarget) => {
                warn!(effect = name, "device lost during effect; frame will be recreated");
            }
            Err(PresentError::Failed(err)) => {
                warn!(%err, effect = name, "gpu effect failed");
            }
        }
    }

    fn snapshot_effect(
        &mut self,
        effect: impl FnOnce(&mut PixelBuffer) -> FivedResult<()>,
    ) -> Result<(), PresentError> {
        let data = self.render_and_read(Readback::Snapshot)?;
        let Some(gpu) = self.gpu.as_ref() else {
            return Err(FivedError::backend("gpu backend not initialized").into());
        };
        let mut frame = PixelBuffer::from_premul(gpu.width, gpu.height, data)?;
        effect(&mut frame)?;

        let image = peniko::ImageData {
            data: peniko::Blob::from(frame.into_data()),
            format: peniko::ImageFormat::Rgba8,
            alpha_type: peniko::ImageAlphaType::AlphaPremultiplied,
            width: gpu.width,
            height: gpu.height,
        };
        self.scene.reset();
        self.base_color = Color::TRANSPARENT;
        self.scene.draw_image(&image, Affine::IDENTITY);
        Ok(())
    }

    fn solid(&self, color: Color) -> peniko::Brush {
        self.brushes
            .get_or_create(color, |c| peniko::Brush::Solid(to_peniko_color(c)))
    }

    fn record_shape(&mut self, shape: &impl kurbo::Shape, fill: Color, border: Color, border_width: f32) {
        if !self.drawing {
            return;
        }
        if !fill.is_transparent() {
            let brush = self.solid(fill);
            self.scene
                .fill(Fill::NonZero, Affine::IDENTITY, &brush, None, shape);
        }
        if stroke_visible(border, border_width) {
            let brush = self.solid(border);
            self.scene.stroke(
                &kurbo::Stroke::new(f64::from(border_width)),
                Affine::IDENTITY,
                &brush,
                None,
                shape,
            );
        }
    }
}

impl RenderBackend for GpuRenderBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gpu
    }

    fn initialize(&mut self, surface: SurfaceHandle) -> bool {
        if self.is_initialized() {
            self.shutdown();
        }
        match self.try_initialize(surface) {
            Ok(()) => {
                debug!(
                    size = ?self.gpu.as_ref().map(|g| (g.width, g.height)),
                    "gpu backend initialized"
                );
                true
            }
            Err(err) => {
                warn!(%err, "gpu backend initialization failed");
                self.shutdown();
                false
            }
        }
    }

    fn shutdown(&mut self) {
        self.drawing = false;
        self.discard_device_resources();
        self.surface = None;
    }

    fn is_initialized(&self) -> bool {
        self.surface.is_some() && self.gpu.is_some()
    }

    fn begin_draw(&mut self) -> bool {
        let valid = self
            .surface
            .as_ref()
            .is_some_and(|s| s.client_size().is_some());
        if !valid || self.gpu.is_none() {
            return false;
        }
        if self.drawing {
            warn!("begin_draw while a frame is already open; continuing the open frame");
            return true;
        }
        self.scene.reset();
        self.base_color = Color::TRANSPARENT;
        self.drawing = true;
        true
    }

    fn end_draw(&mut self) {
        if !self.drawing {
            return;
        }
        self.drawing = false;
        match self.present_frame() {
            Ok(()) => {}
            Err(PresentError::Failed(err)) => warn!(%err, "gpu present failed"),
            Err(PresentError::RecreateTarget) => {
                warn!("gpu target lost; recreating device resources");
                let surface = self.surface.clone();
                self.discard_device_resources();
                let recreated = surface.is_some_and(|s| self.initialize(s));
                if !recreated {
                    warn!("gpu target could not be recreated; backend is now uninitialized");
                }
            }
        }
    }

    fn clear(&mut self, color: Color) {
        if !self.drawing {
            return;
        }
        self.scene.reset();
        self.base_color = color;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if rect.is_empty() {
            return;
        }
        self.record_shape(&rect.to_kurbo(), color, Color::TRANSPARENT, 0.0);
    }

    fn draw_rectangle(&mut self, rect: Rect, fill: Color, border: Color, border_width: f32) {
        if rect.is_empty() {
            return;
        }
        self.record_shape(&rect.to_kurbo(), fill, border, border_width);
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
        let shape = kurbo::RoundedRect::from_rect(rect.to_kurbo(), clamp_corner_radius(rect, radius));
        self.record_shape(&shape, fill, border, border_width);
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let line = kurbo::Line::new(from.to_kurbo(), to.to_kurbo());
        self.record_shape(&line, Color::TRANSPARENT, color, width);
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
            center.to_kurbo(),
            (f64::from(radius_x), f64::from(radius_y)),
            0.0,
        );
        self.record_shape(&ellipse, fill, border, border_width);
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
        let transform = Affine::translate((f64::from(rect.left), f64::from(rect.top)));
        self.scene.push_layer(
            Fill::NonZero,
            peniko::BlendMode::default(),
            1.0,
            Affine::IDENTITY,
            &rect.to_kurbo(),
        );
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
                        peniko::FontData::new(
                            peniko::Blob::from(font_ref.data.data().to_vec()),
                            font_ref.index,
                        )
                    })
                    .clone();
                let brush = self.solid(run.style().brush);
                self.scene
                    .draw_glyphs(&font)
                    .transform(transform)
                    .font_size(run.run().font_size())
                    .brush(&brush)
                    .draw(
                        Fill::NonZero,
                        run.positioned_glyphs().map(|g| vello::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        }),
                    );
            }
        }
        self.scene.pop_layer();
    }

    fn draw_linear_gradient(
        &mut self,
        rect: Rect,
        start: Color,
        end: Color,
        direction: GradientDirection,
    ) {
        if !self.drawing || rect.is_empty() || (start.is_transparent() && end.is_transparent()) {
            return;
        }
        let r = rect.to_kurbo();
        let to = match direction {
            GradientDirection::Horizontal => (r.x1, r.y0),
            GradientDirection::Vertical => (r.x0, r.y1),
        };
        let gradient = peniko::Gradient::new_linear((r.x0, r.y0), to)
            .with_stops([to_peniko_color(start), to_peniko_color(end)].as_slice());
        self.scene
            .fill(Fill::NonZero, Affine::IDENTITY, &gradient, None, &r);
    }

    fn draw_radial_gradient(
        &mut self,
        rect: Rect,
        center: Point,
        center_color: Color,
        edge_color: Color,
    ) {
        if !self.drawing
            || rect.is_empty()
            || (center_color.is_transparent() && edge_color.is_transparent())
        {
            return;
        }
        let rx = (f64::from(rect.width()) * 0.5).max(0.5);
        let ry = (f64::from(rect.height()) * 0.5).max(0.5);
        // Unit circle stretched onto the inscribed ellipse; pad extend keeps the
        // edge color outside it.
        let gradient = peniko::Gradient::new_radial((0.0, 0.0), 1.0)
            .with_stops([to_peniko_color(center_color), to_peniko_color(edge_color)].as_slice());
        let brush_transform =
            Affine::translate(center.to_kurbo().to_vec2()) * Affine::scale_non_uniform(rx, ry);
        self.scene.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            &gradient,
            Some(brush_transform),
            &rect.to_kurbo(),
        );
    }

    fn draw_shadow(&mut self, rect: Rect, offset_x: i32, offset_y: i32, blur_radius: i32, color: Color) {
        if !self.drawing || rect.is_empty() || color.is_transparent() {
            return;
        }
        let shadow = rect.offset(offset_x, offset_y).to_kurbo();
        let radius = blur_radius.clamp(0, raster::MAX_BLUR_RADIUS as i32);
        if radius == 0 {
            let brush = self.solid(color);
            self.scene
                .fill(Fill::NonZero, Affine::IDENTITY, &brush, None, &shadow);
            return;
        }
        // Matches the software path, which blurs with sigma = radius / 2.
        let std_dev = raster_sigma(radius);
        self.scene.draw_blurred_rounded_rect(
            Affine::IDENTITY,
            shadow,
            to_peniko_color(color),
            0.0,
            std_dev,
        );
    }

    fn draw_blur(&mut self, rect: Rect, radius: f32) {
        self.apply_snapshot_effect("blur", |buf| raster::blur_region(buf, rect, radius));
    }

    fn draw_bloom(&mut self, rect: Rect, threshold: f32, intensity: f32) {
        self.apply_snapshot_effect("bloom", |buf| raster::bloom(buf, rect, threshold, intensity));
    }

    fn draw_depth_of_field(&mut self, rect: Rect, focal_distance: f32, blur_amount: f32) {
        self.apply_snapshot_effect("depth_of_field", |buf| {
            raster::depth_of_field(buf, rect, focal_distance, blur_amount)
        });
    }

    fn draw_motion_blur(&mut self, rect: Rect, velocity_x: f32, velocity_y: f32, intensity: f32) {
        self.apply_snapshot_effect("motion_blur", |buf| {
            raster::motion_blur(buf, rect, velocity_x, velocity_y, intensity);
            Ok(())
        });
    }

    fn draw_chromatic_aberration(&mut self, rect: Rect, offset: f32, strength: f32) {
        self.apply_snapshot_effect("chromatic_aberration", |buf| {
            raster::chromatic_aberration(buf, rect, offset, strength);
            Ok(())
        });
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            gpu_accelerated: self.gpu.is_some(),
            advanced_effects: self.gpu.as_ref().is_some_and(GpuDevice::effects_ready),
            antialiasing: true,
            transparency: true,
            max_texture_size: self.gpu.as_ref().map_or(0, |g| g.max_texture_size),
        }
    }
}

fn adapter_options() -> vello::wgpu::RequestAdapterOptions<'static, 'static> {
    vello::wgpu::RequestAdapterOptions {
        power_preference: vello::wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

fn raster_sigma(radius: i32) -> f64 {
    f64::from(crate::effects::blur::sigma_for_radius(radius.unsigned_abs()))
}

fn to_peniko_color(c: Color) -> peniko::Color {
    peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

#[cfg(test)]
#[path = "../../tests/unit/render/gpu.rs"]
mod tests;
