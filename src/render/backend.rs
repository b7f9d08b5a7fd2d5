use std::str::FromStr;

use crate::{
    effects::{
        glow::glow_layers,
        raster::GradientDirection,
        settings::{EffectPreset, EffectSettings},
    },
    foundation::{
        core::{Color, Point, Rect},
        error::{FivedError, FivedResult},
    },
    render::{software::SoftwareRenderBackend, surface::SurfaceHandle, text::TextStyle},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hardware if the probe succeeds, otherwise software.
    #[default]
    Auto,
    Software,
    Gpu,
}

impl FromStr for BackendKind {
    type Err = FivedError;

    fn from_str(s: &str) -> FivedResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "software" | "cpu" | "gdi" => Ok(BackendKind::Software),
            "gpu" | "hardware" | "d2d" => Ok(BackendKind::Gpu),
            other => Err(FivedError::config(format!("unknown backend '{other}'"))),
        }
    }
}

/// Snapshot of what a backend can do right now. Built on every call from live state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Capabilities {
    pub gpu_accelerated: bool,
    pub advanced_effects: bool,
    pub antialiasing: bool,
    pub transparency: bool,
    pub max_texture_size: u32,
}

/// Polymorphic drawing contract over the software and GPU renderers.
///
/// A backend starts uninitialized. [`initialize`](Self::initialize) binds it to a
/// surface and may be called again (after a resize, say) to rebind. Every drawing
/// call outside a `begin_draw`/`end_draw` session, including before initialization
/// and after shutdown, is a silent no-op.
///
/// Fills are skipped for fully transparent colors. Strokes are skipped when the
/// border width is not positive or the border color is transparent.
pub trait RenderBackend {
    fn kind(&self) -> BackendKind;

    /// Bind to `surface`. Returns `false` and stays uninitialized on failure.
    fn initialize(&mut self, surface: SurfaceHandle) -> bool;

    fn shutdown(&mut self);

    fn is_initialized(&self) -> bool;

    /// Start a frame. Returns `false` if there is no valid surface.
    fn begin_draw(&mut self) -> bool;

    /// Flush everything drawn since `begin_draw` and present it as one frame.
    fn end_draw(&mut self);

    fn clear(&mut self, color: Color);

    /// Plain fill with no stroke; the primitive glow and other layered fills build on.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn draw_rectangle(&mut self, rect: Rect, fill: Color, border: Color, border_width: f32);

    /// `radius` is clamped to half of the shorter side.
    fn draw_rounded_rectangle(
        &mut self,
        rect: Rect,
        radius: f32,
        fill: Color,
        border: Color,
        border_width: f32,
    );

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32);

    fn draw_ellipse(
        &mut self,
        center: Point,
        radius_x: f32,
        radius_y: f32,
        fill: Color,
        border: Color,
        border_width: f32,
    );

    /// Word-wrapped inside `rect`.
    fn draw_text(&mut self, text: &str, rect: Rect, color: Color, style: &TextStyle);

    fn draw_linear_gradient(
        &mut self,
        rect: Rect,
        start: Color,
        end: Color,
        direction: GradientDirection,
    );

    fn draw_radial_gradient(
        &mut self,
        rect: Rect,
        center: Point,
        center_color: Color,
        edge_color: Color,
    );

    fn draw_shadow(&mut self, rect: Rect, offset_x: i32, offset_y: i32, blur_radius: i32, color: Color);

    /// Concentric fills from `radius` down to 1 with linearly decaying alpha.
    fn draw_glow(&mut self, rect: Rect, radius: i32, color: Color) {
        for layer in glow_layers(rect, radius, color) {
            self.fill_rect(layer.rect, layer.color);
        }
    }

    fn draw_blur(&mut self, rect: Rect, radius: f32);

    fn draw_bloom(&mut self, rect: Rect, threshold: f32, intensity: f32);

    fn draw_depth_of_field(&mut self, rect: Rect, focal_distance: f32, blur_amount: f32);

    fn draw_motion_blur(&mut self, rect: Rect, velocity_x: f32, velocity_y: f32, intensity: f32);

    fn draw_chromatic_aberration(&mut self, rect: Rect, offset: f32, strength: f32);

    fn capabilities(&self) -> Capabilities;

    fn supports_gpu_effects(&self) -> bool {
        let caps = self.capabilities();
        caps.gpu_accelerated && caps.advanced_effects
    }

    /// Run each enabled effect in a fixed order: blur, bloom, depth of field,
    /// motion blur, chromatic aberration.
    fn apply_custom_effects(&mut self, settings: &EffectSettings, rect: Rect) {
        if settings.enable_blur {
            self.draw_blur(rect, settings.blur_radius);
        }
        if settings.enable_bloom {
            self.draw_bloom(rect, settings.bloom_threshold, settings.bloom_intensity);
        }
        if settings.enable_depth_of_field {
            self.draw_depth_of_field(rect, settings.focal_distance, settings.dof_blur_amount);
        }
        if settings.enable_motion_blur {
            self.draw_motion_blur(
                rect,
                settings.motion_velocity_x,
                settings.motion_velocity_y,
                settings.motion_intensity,
            );
        }
        if settings.enable_chromatic_aberration {
            self.draw_chromatic_aberration(
                rect,
                settings.aberration_offset,
                settings.aberration_strength,
            );
        }
    }

    fn apply_effect_preset(&mut self, preset: EffectPreset, rect: Rect) {
        self.apply_custom_effects(&preset.settings(), rect);
    }
}

/// Cheap check for a usable hardware adapter. Does not create a device.
pub fn gpu_available() -> bool {
    #[cfg(feature = "gpu")]
    {
        crate::render::gpu::GpuRenderBackend::probe()
    }
    #[cfg(not(feature = "gpu"))]
    {
        false
    }
}

/// Create an uninitialized backend of the requested kind.
///
/// `Auto` never fails: it falls back to software when no adapter is found. An
/// explicit `Gpu` request is returned as-is; if its `initialize` later fails,
/// falling back is the caller's job.
pub fn create_backend(kind: BackendKind) -> FivedResult<Box<dyn RenderBackend>> {
    create_backend_with_probe(kind, gpu_available)
}

/// [`create_backend`] with an injectable hardware probe.
pub fn create_backend_with_probe(
    kind: BackendKind,
    probe: impl FnOnce() -> bool,
) -> FivedResult<Box<dyn RenderBackend>> {
    match kind {
        BackendKind::Software => Ok(Box::new(SoftwareRenderBackend::new())),
        BackendKind::Gpu => create_gpu_backend(),
        BackendKind::Auto => {
            if probe() {
                match create_gpu_backend() {
                    Ok(backend) => return Ok(backend),
                    Err(err) => {
                        tracing::debug!(%err, "hardware probe passed but gpu backend is unavailable");
                    }
                }
            }
            tracing::debug!("auto backend selection fell back to software");
            Ok(Box::new(SoftwareRenderBackend::new()))
        }
    }
}

fn create_gpu_backend() -> FivedResult<Box<dyn RenderBackend>> {
    #[cfg(feature = "gpu")]
    {
        Ok(Box::new(crate::render::gpu::GpuRenderBackend::new()))
    }
    #[cfg(not(feature = "gpu"))]
    {
        Err(FivedError::backend(
            "gpu backend requested but the crate was built without the `gpu` feature",
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
