use std::cell::{Cell, RefCell};

use crate::foundation::core::Color;

/// Single-entry brush cache keyed by exact color equality.
///
/// Lookups take `&self`: the cache is logically part of an immutable query but
/// physically replaces its entry on a miss. Alternating colors thrash it.
#[derive(Debug)]
pub struct BrushCache<B> {
    entry: RefCell<Option<(Color, B)>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<B> Default for BrushCache<B> {
    fn default() -> Self {
        Self {
            entry: RefCell::new(None),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }
}

impl<B: Clone> BrushCache<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, color: Color, create: impl FnOnce(Color) -> B) -> B {
        let mut entry = self.entry.borrow_mut();
        if let Some((cached, brush)) = entry.as_ref()
            && *cached == color
        {
            self.hits.set(self.hits.get() + 1);
            return brush.clone();
        }
        self.misses.set(self.misses.get() + 1);
        // The previous brush is dropped here before the replacement is stored.
        *entry = None;
        let brush = create(color);
        *entry = Some((color, brush.clone()));
        brush
    }

    pub fn cached_color(&self) -> Option<Color> {
        self.entry.borrow().as_ref().map(|(c, _)| *c)
    }

    /// Release the cached brush, e.g. when the owning device goes away.
    pub fn clear(&self) {
        self.entry.borrow_mut().take();
    }

    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn misses(&self) -> u64 {
        self.misses.get()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/brush.rs"]
mod tests;
