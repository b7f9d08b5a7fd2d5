use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::{
    foundation::error::FivedError,
    render::surface::MemorySurface,
};

#[test]
fn config_reaches_the_optimizer() {
    let mut config = Config::default();
    config.optimizer.enabled = false;
    config.optimizer.learning_rate = 0.1;
    let ctx = AppContext::new(config);
    assert!(!ctx.optimizer().is_enabled());
    assert_eq!(ctx.optimizer().model().learning_rate(), 0.1);
}

#[test]
fn factory_error_falls_back_to_software() {
    let ctx = AppContext::new(Config {
        backend: BackendKind::Gpu,
        ..Config::default()
    });
    let surface = SurfaceHandle::new(MemorySurface::new(8, 8));
    let backend =
        ctx.create_window_backend_with(surface, |_| Err(FivedError::backend("no adapter")));
    assert_eq!(backend.kind(), BackendKind::Software);
    assert!(backend.is_initialized());
}

#[test]
fn invalid_surface_yields_uninitialized_software() {
    let ctx = AppContext::default();
    let memory = MemorySurface::new(8, 8);
    memory.invalidate();
    let mut backend = ctx.create_window_backend(SurfaceHandle::new(memory));
    assert_eq!(backend.kind(), BackendKind::Software);
    assert!(!backend.is_initialized());
    assert!(!backend.begin_draw());
}

#[test]
fn window_created_callbacks_run_in_order() {
    let mut ctx = AppContext::default();
    let seen = Rc::new(RefCell::new(Vec::new()));
    for tag in ["first", "second"] {
        let seen = seen.clone();
        ctx.register_window_created(move |handle| seen.borrow_mut().push((tag, handle)));
    }
    ctx.notify_window_created(WindowHandle(3));
    assert_eq!(
        *seen.borrow(),
        [("first", WindowHandle(3)), ("second", WindowHandle(3))]
    );
}
