use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::coords::Viewport;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a rendering surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Allocate a new, globally unique `SurfaceId`.
    pub fn next() -> Self {
        SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Which side of the bridge a surface belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SurfaceRole {
    /// The primary VR rendering surface.
    Host,
    /// The embedded widget surface sharing the host context.
    Widget,
}

/// Immutable identity and size of one live surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SurfaceInfo {
    pub id: SurfaceId,
    pub role: SurfaceRole,
    pub width: u32,
    pub height: u32,
}

impl SurfaceInfo {
    pub fn new(role: SurfaceRole, width: u32, height: u32) -> Self {
        Self {
            id: SurfaceId::next(),
            role,
            width,
            height,
        }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport::from_pixels(self.width, self.height)
    }
}

/// Configuration handed to [`WindowSystem::create_surface`](super::WindowSystem::create_surface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub continuous_rendering: bool,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    pub depth: u8,
    pub stencil: u8,
    /// MSAA sample count; `0` disables multisampling.
    pub samples: u8,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            continuous_rendering: true,
            r: 8,
            g: 8,
            b: 8,
            a: 8,
            depth: 16,
            stencil: 0,
            samples: 0,
        }
    }
}

/// Render-loop scheduling flags shared between the UI thread and a surface's
/// render thread.
///
/// While continuous rendering is enforced, requests to leave continuous mode
/// are ignored. Pausing relies on this so a render thread that is mid-frame
/// cannot switch the loop to on-demand rendering and stall the pause.
#[derive(Debug)]
pub struct RenderMode {
    continuous: AtomicBool,
    enforced: AtomicBool,
    render_requested: AtomicBool,
}

impl RenderMode {
    pub fn new(continuous: bool) -> Self {
        Self {
            continuous: AtomicBool::new(continuous),
            enforced: AtomicBool::new(false),
            render_requested: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_continuous(&self) -> bool {
        self.continuous.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_enforced(&self) -> bool {
        self.enforced.load(Ordering::Acquire)
    }

    /// Switches between continuous and on-demand rendering.
    ///
    /// Returns `false` when the request was ignored because continuous
    /// rendering is currently enforced.
    pub fn set_continuous(&self, continuous: bool) -> bool {
        if !continuous && self.is_enforced() {
            log::trace!("non-continuous rendering request ignored while enforced");
            return false;
        }
        self.continuous.store(continuous, Ordering::Release);
        true
    }

    /// Forces continuous rendering until the returned guard drops, then
    /// restores both the previous mode and the previous enforcement flag.
    pub fn force_continuous(&self) -> ContinuousGuard<'_> {
        let prev_enforced = self.enforced.swap(true, Ordering::AcqRel);
        let prev_continuous = self.continuous.swap(true, Ordering::AcqRel);
        ContinuousGuard {
            mode: self,
            prev_continuous,
            prev_enforced,
        }
    }

    /// Asks an on-demand render loop to draw one more frame.
    #[inline]
    pub fn request_rendering(&self) {
        self.render_requested.store(true, Ordering::Release);
    }

    /// Returns whether a frame was requested since the last call.
    #[inline]
    pub fn take_render_request(&self) -> bool {
        self.render_requested.swap(false, Ordering::AcqRel)
    }
}

impl Default for RenderMode {
    fn default() -> Self {
        Self::new(true)
    }
}

/// RAII scope of [`RenderMode::force_continuous`].
#[must_use = "continuous rendering is only forced while the guard is alive"]
#[derive(Debug)]
pub struct ContinuousGuard<'a> {
    mode: &'a RenderMode,
    prev_continuous: bool,
    prev_enforced: bool,
}

impl Drop for ContinuousGuard<'_> {
    fn drop(&mut self) {
        self.mode.enforced.store(self.prev_enforced, Ordering::Release);
        self.mode
            .continuous
            .store(self.prev_continuous, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_ids_are_unique() {
        let a = SurfaceInfo::new(SurfaceRole::Host, 1, 1);
        let b = SurfaceInfo::new(SurfaceRole::Host, 1, 1);
        assert_ne!(a.id, b.id);
    }

    // ── RenderMode ────────────────────────────────────────────────────────

    #[test]
    fn forced_mode_ignores_non_continuous_requests() {
        let mode = RenderMode::new(false);
        {
            let _guard = mode.force_continuous();
            assert!(mode.is_continuous());
            assert!(mode.is_enforced());
            assert!(!mode.set_continuous(false));
            assert!(mode.is_continuous());
        }
        assert!(!mode.is_continuous());
        assert!(!mode.is_enforced());
        assert!(mode.set_continuous(false));
    }

    #[test]
    fn nested_force_restores_outer_enforcement() {
        let mode = RenderMode::new(false);
        let outer = mode.force_continuous();
        {
            let _inner = mode.force_continuous();
        }
        assert!(mode.is_enforced());
        assert!(mode.is_continuous());
        drop(outer);
        assert!(!mode.is_enforced());
        assert!(!mode.is_continuous());
    }

    #[test]
    fn render_request_is_consumed_once() {
        let mode = RenderMode::default();
        assert!(!mode.take_render_request());
        mode.request_rendering();
        assert!(mode.take_render_request());
        assert!(!mode.take_render_request());
    }
}
