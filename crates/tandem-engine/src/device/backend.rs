use std::sync::Arc;

use anyhow::Result;

use crate::input::InputBackend;
use crate::runtime::UiCtx;

use super::{RenderMode, RenderingContext, SurfaceConfig, SurfaceInfo};

/// One live GL surface as seen by the widget rendering library.
///
/// Implementations are driven from the UI thread only; their own render
/// thread reads the [`RenderMode`] they were created with.
pub trait SurfaceBackend {
    /// Stops the render loop at a frame boundary.
    fn pause(&mut self);

    /// Restarts the render loop after [`pause`](Self::pause).
    fn resume(&mut self);

    /// Pauses the platform view hosting the surface.
    fn pause_view(&mut self) {}

    /// Resumes the platform view hosting the surface.
    fn resume_view(&mut self) {}

    /// Drops cached GPU resources (textures, buffers, shaders).
    fn clear_managed_caches(&mut self) {}

    /// Tears the surface down. Not reversible.
    fn destroy(&mut self);

    /// Texture the surface renders into, when it renders off-screen.
    fn texture_id(&self) -> Option<u32> {
        None
    }
}

/// The windowing system that owns the view hierarchy.
///
/// Every method takes a [`UiCtx`]: surfaces are created, attached and
/// destroyed on the UI thread only.
pub trait WindowSystem {
    /// Creates a widget surface sharing `shared` with the host.
    fn create_surface(
        &mut self,
        ui: &UiCtx<'_>,
        info: &SurfaceInfo,
        config: &SurfaceConfig,
        shared: RenderingContext,
        mode: Arc<RenderMode>,
    ) -> Result<Box<dyn SurfaceBackend>>;

    /// Adds a created surface to the layout at its configured size.
    fn attach_to_layout(&mut self, ui: &UiCtx<'_>, info: &SurfaceInfo) -> Result<()>;

    /// Removes a surface from the layout and releases its platform view.
    fn destroy_surface(&mut self, ui: &UiCtx<'_>, info: &SurfaceInfo);

    /// Creates the platform input backend bound to `info`.
    fn create_input(&mut self, ui: &UiCtx<'_>, info: &SurfaceInfo) -> Box<dyn InputBackend>;
}

/// Audio device of the widget runtime.
///
/// Called from the UI thread and from lifecycle listeners, hence `Send + Sync`.
pub trait AudioBackend: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn dispose(&self);
}
