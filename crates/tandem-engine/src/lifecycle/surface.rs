use std::sync::Arc;

use crate::device::{RenderMode, SurfaceBackend, SurfaceInfo};
use crate::runtime::UiCtx;

use super::LifecycleError;

/// Lifecycle state of one surface. `Destroyed` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LifecycleState {
    Created,
    Resumed,
    Paused,
    Destroyed,
}

impl LifecycleState {
    #[inline]
    pub fn is_destroyed(self) -> bool {
        self == LifecycleState::Destroyed
    }
}

/// A surface backend together with its lifecycle state.
///
/// State changes only through the `pub(crate)` transitions driven by the
/// [`LifecycleCoordinator`](super::LifecycleCoordinator).
pub struct ManagedSurface {
    info: SurfaceInfo,
    state: LifecycleState,
    mode: Arc<RenderMode>,
    backend: Box<dyn SurfaceBackend>,
}

impl ManagedSurface {
    pub fn new(info: SurfaceInfo, mode: Arc<RenderMode>, backend: Box<dyn SurfaceBackend>) -> Self {
        Self {
            info,
            state: LifecycleState::Created,
            mode,
            backend,
        }
    }

    #[inline]
    pub fn info(&self) -> &SurfaceInfo {
        &self.info
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    pub fn render_mode(&self) -> &Arc<RenderMode> {
        &self.mode
    }

    pub fn texture_id(&self) -> Option<u32> {
        self.backend.texture_id()
    }

    /// Starts the platform view of a freshly attached surface.
    pub(crate) fn start_rendering(&mut self, _ui: &UiCtx<'_>) {
        if self.state == LifecycleState::Created {
            self.backend.resume_view();
        }
    }

    /// Pauses the surface, or destroys it when `finishing`.
    ///
    /// Continuous rendering is forced while the render loop is stopped so a
    /// render thread parked on a frame request cannot stall the pause; the
    /// previous mode is restored afterwards. Returns whether anything changed.
    pub(crate) fn pause(&mut self, _ui: &UiCtx<'_>, finishing: bool) -> Result<bool, LifecycleError> {
        match self.state {
            LifecycleState::Destroyed => return Err(self.illegal("pause")),
            LifecycleState::Paused if !finishing => return Ok(false),
            _ => {}
        }

        {
            let _continuous = self.mode.force_continuous();
            self.backend.pause();
            if finishing {
                self.backend.clear_managed_caches();
                self.backend.destroy();
                self.state = LifecycleState::Destroyed;
            } else {
                self.state = LifecycleState::Paused;
            }
        }

        if !finishing {
            self.backend.pause_view();
        }
        log::debug!(
            "{:?} surface {} -> {:?}",
            self.info.role,
            self.info.id.get(),
            self.state
        );
        Ok(true)
    }

    /// Resumes a paused surface. Returns `Ok(false)` when it was not paused.
    pub(crate) fn resume(&mut self, _ui: &UiCtx<'_>) -> Result<bool, LifecycleError> {
        match self.state {
            LifecycleState::Destroyed => Err(self.illegal("resume")),
            LifecycleState::Created | LifecycleState::Resumed => Ok(false),
            LifecycleState::Paused => {
                self.backend.resume_view();
                self.backend.resume();
                self.state = LifecycleState::Resumed;
                log::debug!(
                    "{:?} surface {} -> Resumed",
                    self.info.role,
                    self.info.id.get()
                );
                Ok(true)
            }
        }
    }

    /// Destroys the surface without the pause protocol.
    pub(crate) fn destroy(&mut self, _ui: &UiCtx<'_>) {
        if self.state.is_destroyed() {
            return;
        }
        self.backend.clear_managed_caches();
        self.backend.destroy();
        self.state = LifecycleState::Destroyed;
    }

    fn illegal(&self, op: &'static str) -> LifecycleError {
        LifecycleError::IllegalTransition {
            role: self.info.role,
            from: self.state,
            op,
        }
    }
}

impl std::fmt::Debug for ManagedSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedSurface")
            .field("info", &self.info)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
