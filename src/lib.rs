//! Rendering core for layered "5D" desktop UIs.
//!
//! Two pieces:
//!
//! - a [`RenderBackend`] trait with a software implementation (always
//!   available) and a `vello`/`wgpu` implementation behind the `gpu` feature,
//!   sharing one drawing vocabulary of shapes, text, gradients and effects;
//! - a [`RendererOptimizer`] that picks a per-element render strategy with an
//!   online logistic model and learns from measured render times.
//!
//! [`AppContext`] ties them together with [`Config`] and owns the backend
//! fallback policy.
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod effects;
pub mod foundation;
pub mod optimizer;
pub mod render;
pub mod window;

pub use config::{Config, OptimizerConfig};
pub use context::AppContext;
pub use effects::settings::{EffectPreset, EffectSettings};
pub use foundation::core::{Color, Point, Rect};
pub use foundation::error::{FivedError, FivedResult};
pub use optimizer::{
    metrics::{ElementMetrics, RenderStrategy},
    model::OptimizationModel,
    renderer::{OptimizerStats, RendererOptimizer},
};
pub use render::{
    backend::{BackendKind, Capabilities, RenderBackend, create_backend, gpu_available},
    software::SoftwareRenderBackend,
    surface::{FrameRGBA, MemorySurface, Surface, SurfaceHandle},
    text::TextStyle,
};
pub use window::{
    CacheOutcome, Panel, PanelWindow, RenderElement, Theme, Window, WindowHandle, draw_elements,
    render_elements,
};

#[cfg(feature = "gpu")]
pub use render::gpu::GpuRenderBackend;
