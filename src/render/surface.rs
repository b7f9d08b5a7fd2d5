use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::error::{FivedError, FivedResult};

/// A finished frame handed to a [`Surface`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha copy of the pixel data, suitable for image encoders.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        self.data
            .chunks_exact(4)
            .flat_map(|px| crate::effects::composite::unpremultiply([px[0], px[1], px[2], px[3]]))
            .collect()
    }
}

/// Native drawing surface a backend binds to. The backend never owns the window
/// behind it; it only asks for the client size and presents whole frames.
pub trait Surface: Send + Sync {
    /// Current client-area size, or `None` once the handle is no longer valid.
    fn client_size(&self) -> Option<(u32, u32)>;

    fn present(&self, frame: &FrameRGBA) -> FivedResult<()>;
}

/// Opaque, cloneable handle to a [`Surface`].
#[derive(Clone)]
pub struct SurfaceHandle(Arc<dyn Surface>);

impl SurfaceHandle {
    pub fn new<S: Surface + 'static>(surface: Arc<S>) -> Self {
        Self(surface)
    }

    pub fn client_size(&self) -> Option<(u32, u32)> {
        self.0.client_size()
    }

    pub fn present(&self, frame: &FrameRGBA) -> FivedResult<()> {
        self.0.present(frame)
    }

    pub fn same_surface(&self, other: &SurfaceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("ptr", &Arc::as_ptr(&self.0).cast::<()>())
            .field("client_size", &self.client_size())
            .finish()
    }
}

#[derive(Debug)]
struct MemoryState {
    size: (u32, u32),
    valid: bool,
    last_frame: Option<FrameRGBA>,
    presents: u64,
}

/// In-process surface that keeps the last presented frame.
///
/// Used for headless rendering and tests. Resizing does not touch bound
/// backends; like a real window, the owner has to re-initialize them.
#[derive(Debug)]
pub struct MemorySurface {
    state: Mutex<MemoryState>,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MemoryState {
                size: (width, height),
                valid: true,
                last_frame: None,
                presents: 0,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.state().size = (width, height);
    }

    /// Simulate the window being destroyed.
    pub fn invalidate(&self) {
        self.state().valid = false;
    }

    pub fn last_frame(&self) -> Option<FrameRGBA> {
        self.state().last_frame.clone()
    }

    pub fn present_count(&self) -> u64 {
        self.state().presents
    }
}

impl Surface for MemorySurface {
    fn client_size(&self) -> Option<(u32, u32)> {
        let state = self.state();
        state.valid.then_some(state.size)
    }

    fn present(&self, frame: &FrameRGBA) -> FivedResult<()> {
        let mut state = self.state();
        if !state.valid {
            return Err(FivedError::surface("present on an invalidated surface"));
        }
        state.last_frame = Some(frame.clone());
        state.presents += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
