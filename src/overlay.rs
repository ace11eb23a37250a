//! Overlay renderer abstraction
//!
//! The overlay sits on top of the video viewport. The pacer tells it about
//! source dimension changes; processors clear it and draw their results.
//! Drawing primitives belong to the host, so the trait only carries data.

use crate::annotations::Annotations;
use crate::frame::FrameDimensions;
use std::sync::{Arc, Mutex};

/// Trait for overlay renderers
///
/// Implementations are shared between the pacer (owning task) and processors
/// (worker threads), hence `&self` methods and `Send + Sync`.
pub trait OverlayRenderer: Send + Sync {
    /// Source image geometry changed; called only when it actually changes
    fn set_source_dimensions(&self, width: u32, height: u32, mirrored: bool);

    /// Remove everything drawn so far
    fn clear(&self);

    /// Draw one frame's annotations
    fn draw(&self, annotations: &Annotations);
}

/// Snapshot of what a [`SharedOverlay`] currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlaySnapshot {
    pub source: Option<FrameDimensions>,
    pub mirrored: bool,
    pub annotations: Option<Annotations>,
    /// Number of `set_source_dimensions` calls received
    pub dimension_updates: usize,
    /// Number of `draw` calls received
    pub draws: usize,
}

/// Headless overlay that keeps the latest geometry and annotations
///
/// Hosts read [`SharedOverlay::snapshot`] from their render loop.
#[derive(Debug, Clone, Default)]
pub struct SharedOverlay {
    inner: Arc<Mutex<OverlaySnapshot>>,
}

impl SharedOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current overlay state
    #[must_use]
    pub fn snapshot(&self) -> OverlaySnapshot {
        self.inner
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

impl OverlayRenderer for SharedOverlay {
    fn set_source_dimensions(&self, width: u32, height: u32, mirrored: bool) {
        if let Ok(mut state) = self.inner.lock() {
            state.source = Some(FrameDimensions::new(width, height));
            state.mirrored = mirrored;
            state.dimension_updates += 1;
        }
    }

    fn clear(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.annotations = None;
        }
    }

    fn draw(&self, annotations: &Annotations) {
        if let Ok(mut state) = self.inner.lock() {
            state.annotations = Some(annotations.clone());
            state.draws += 1;
        }
    }
}
