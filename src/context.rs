use tracing::{debug, warn};

use crate::{
    config::Config,
    optimizer::{model::OptimizationModel, renderer::RendererOptimizer},
    render::{
        backend::{BackendKind, RenderBackend, create_backend},
        software::SoftwareRenderBackend,
        surface::SurfaceHandle,
    },
    window::WindowHandle,
};

type WindowCreatedCallback = Box<dyn FnMut(WindowHandle)>;

/// Application-wide state, constructed once and passed to whoever needs it.
///
/// Owns the optimizer shared by all windows and the window-created
/// notification list.
pub struct AppContext {
    config: Config,
    optimizer: RendererOptimizer,
    window_created: Vec<WindowCreatedCallback>,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let mut optimizer =
            RendererOptimizer::new(OptimizationModel::with_learning_rate(config.optimizer.learning_rate));
        optimizer.set_enabled(config.optimizer.enabled);
        Self {
            config,
            optimizer,
            window_created: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn optimizer(&self) -> &RendererOptimizer {
        &self.optimizer
    }

    pub fn optimizer_mut(&mut self) -> &mut RendererOptimizer {
        &mut self.optimizer
    }

    /// Backend of the configured kind bound to `surface`.
    ///
    /// Falls back to software when the requested backend cannot be created or
    /// initialized. If software cannot initialize either, the returned backend
    /// is uninitialized and every draw call on it is a no-op.
    pub fn create_window_backend(&self, surface: SurfaceHandle) -> Box<dyn RenderBackend> {
        self.create_window_backend_with(surface, create_backend)
    }

    /// [`Self::create_window_backend`] with an injectable factory.
    pub fn create_window_backend_with(
        &self,
        surface: SurfaceHandle,
        factory: impl FnOnce(BackendKind) -> crate::FivedResult<Box<dyn RenderBackend>>,
    ) -> Box<dyn RenderBackend> {
        let requested = self.config.backend;
        match factory(requested) {
            Ok(mut backend) => {
                if backend.initialize(surface.clone()) {
                    debug!(kind = ?backend.kind(), "window backend ready");
                    return backend;
                }
                if backend.kind() == BackendKind::Software {
                    warn!("software backend failed to initialize");
                    return backend;
                }
                warn!(kind = ?backend.kind(), "backend failed to initialize; falling back to software");
            }
            Err(err) => {
                warn!(%err, ?requested, "backend unavailable; falling back to software");
            }
        }

        let mut software = SoftwareRenderBackend::new();
        if !software.initialize(surface) {
            warn!("software fallback failed to initialize");
        }
        Box::new(software)
    }

    pub fn register_window_created(&mut self, callback: impl FnMut(WindowHandle) + 'static) {
        self.window_created.push(Box::new(callback));
    }

    /// Deliver `handle` to every registered callback, in registration order.
    pub fn notify_window_created(&mut self, handle: WindowHandle) {
        debug!(?handle, callbacks = self.window_created.len(), "window created");
        for callback in &mut self.window_created {
            callback(handle);
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
#[path = "../tests/unit/context.rs"]
mod tests;
