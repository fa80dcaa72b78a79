use std::sync::{Arc, Weak};

use crate::coords::Vec2;
use crate::device::{SurfaceId, SurfaceInfo};
use crate::runtime::UiCtx;

use super::types::PointerEvent;

/// A scene entity that can be picked by the host and receive widget input.
pub trait SceneEntity: Send + Sync {
    /// Stable identifier, used for logging.
    fn entity_id(&self) -> u64;

    /// Where the pick ray hit the entity's widget texture, in normalized
    /// texture coordinates. `None` or non-finite when the hit is unknown;
    /// events are then scaled from the view they arrived on.
    fn hit_uv(&self) -> Option<Vec2> {
        None
    }
}

/// Platform input backend bound to one surface.
pub trait InputBackend {
    fn on_touch(&mut self, event: &PointerEvent);
    fn on_pause(&mut self);
    fn on_resume(&mut self);
    fn set_keyboard_available(&mut self, available: bool) {
        let _ = available;
    }
}

/// Why an event was not forwarded. None of these are errors.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DropReason {
    /// No entity is picked.
    NoPickTarget,
    /// The picked entity was dropped by its owner.
    TargetReleased,
    /// Input is suspended while the host is paused.
    Suspended,
    /// No input backend is bound yet.
    NoInputBackend,
    /// The event targeted a surface other than the bound one.
    SurfaceMismatch,
    /// No widget surface exists.
    NoWidgetSurface,
}

/// Result of [`InputDispatcher::dispatch`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Forwarded; carries the event as delivered in target-surface space.
    Forwarded(PointerEvent),
    Dropped(DropReason),
}

impl DispatchOutcome {
    #[inline]
    pub fn is_forwarded(&self) -> bool {
        matches!(self, DispatchOutcome::Forwarded(_))
    }
}

/// Routes pointer events to the picked entity's widget surface.
///
/// UI-thread confined: every mutating call takes a [`UiCtx`]. The pick target
/// is held weakly; the dispatcher never extends the entity's lifetime.
#[derive(Default)]
pub struct InputDispatcher {
    pick: Option<Weak<dyn SceneEntity>>,
    backend: Option<(SurfaceId, Box<dyn InputBackend>)>,
    suspended: bool,
    keyboard_available: bool,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears the picked entity.
    pub fn set_pick_target(&mut self, _ui: &UiCtx<'_>, target: Option<&Arc<dyn SceneEntity>>) {
        self.pick = target.map(Arc::downgrade);
    }

    /// Returns the picked entity if it is still alive.
    pub fn pick_target(&self) -> Option<Arc<dyn SceneEntity>> {
        self.pick.as_ref().and_then(Weak::upgrade)
    }

    /// Binds the input backend of `surface`, replacing any previous one.
    pub fn bind(&mut self, _ui: &UiCtx<'_>, surface: SurfaceId, mut backend: Box<dyn InputBackend>) {
        backend.set_keyboard_available(self.keyboard_available);
        if self.suspended {
            backend.on_pause();
        }
        self.backend = Some((surface, backend));
    }

    /// Drops the bound backend. Returns the surface it was bound to.
    pub fn unbind(&mut self, _ui: &UiCtx<'_>) -> Option<SurfaceId> {
        self.backend.take().map(|(id, _)| id)
    }

    pub fn bound_surface(&self) -> Option<SurfaceId> {
        self.backend.as_ref().map(|(id, _)| *id)
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub(crate) fn suspend(&mut self, _ui: &UiCtx<'_>) {
        self.suspended = true;
        if let Some((_, backend)) = self.backend.as_mut() {
            backend.on_pause();
        }
    }

    pub(crate) fn resume(&mut self, _ui: &UiCtx<'_>) {
        self.suspended = false;
        if let Some((_, backend)) = self.backend.as_mut() {
            backend.on_resume();
        }
    }

    pub fn set_keyboard_available(&mut self, _ui: &UiCtx<'_>, available: bool) {
        self.keyboard_available = available;
        if let Some((_, backend)) = self.backend.as_mut() {
            backend.set_keyboard_available(available);
        }
    }

    /// Forwards `event` to the input backend of `target` if an entity is
    /// picked, remapping its position into target-surface space.
    ///
    /// Dropped events are normal; the outcome says why.
    pub fn dispatch(
        &mut self,
        _ui: &UiCtx<'_>,
        event: &PointerEvent,
        target: &SurfaceInfo,
    ) -> DispatchOutcome {
        let entity = match self.pick.as_ref().map(Weak::upgrade) {
            None => return dropped(event, DropReason::NoPickTarget),
            Some(None) => {
                self.pick = None;
                return dropped(event, DropReason::TargetReleased);
            }
            Some(Some(entity)) => entity,
        };

        if self.suspended {
            return dropped(event, DropReason::Suspended);
        }

        let Some((bound, backend)) = self.backend.as_mut() else {
            return dropped(event, DropReason::NoInputBackend);
        };
        if *bound != target.id {
            return dropped(event, DropReason::SurfaceMismatch);
        }

        let space = target.viewport();
        let position = match entity.hit_uv() {
            Some(uv) if uv.is_finite() => space.denormalize(uv),
            _ => event.source.map_to(event.position, space).unwrap_or(event.position),
        };
        let routed = event.remapped(position, space);

        log::trace!(
            "{:?} #{} -> entity {} at ({:.1}, {:.1}) on surface {}",
            routed.action,
            routed.pointer_id,
            entity.entity_id(),
            routed.position.x,
            routed.position.y,
            target.id.get()
        );
        backend.on_touch(&routed);
        DispatchOutcome::Forwarded(routed)
    }
}

fn dropped(event: &PointerEvent, reason: DropReason) -> DispatchOutcome {
    log::trace!("{:?} #{} dropped: {reason:?}", event.action, event.pointer_id);
    DispatchOutcome::Dropped(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::device::SurfaceRole;
    use crate::input::PointerAction;
    use crate::runtime::UiLoop;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorded {
        touches: Vec<PointerEvent>,
        pauses: u32,
        resumes: u32,
        keyboard: Option<bool>,
    }

    struct RecordingInput(Arc<Mutex<Recorded>>);

    impl InputBackend for RecordingInput {
        fn on_touch(&mut self, event: &PointerEvent) {
            self.0.lock().touches.push(*event);
        }
        fn on_pause(&mut self) {
            self.0.lock().pauses += 1;
        }
        fn on_resume(&mut self) {
            self.0.lock().resumes += 1;
        }
        fn set_keyboard_available(&mut self, available: bool) {
            self.0.lock().keyboard = Some(available);
        }
    }

    struct Entity {
        id: u64,
        uv: Option<Vec2>,
    }

    impl SceneEntity for Entity {
        fn entity_id(&self) -> u64 {
            self.id
        }
        fn hit_uv(&self) -> Option<Vec2> {
            self.uv
        }
    }

    fn entity(uv: Option<Vec2>) -> Arc<dyn SceneEntity> {
        Arc::new(Entity { id: 42, uv })
    }

    fn touch(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(PointerAction::Down, 0, Vec2::new(x, y), Viewport::new(100.0, 100.0))
    }

    fn setup() -> (UiLoop<InputDispatcher>, SurfaceInfo, Arc<Mutex<Recorded>>) {
        let mut ui = UiLoop::new(InputDispatcher::new());
        let surface = SurfaceInfo::new(SurfaceRole::Widget, 400, 200);
        let rec = Arc::new(Mutex::new(Recorded::default()));
        let backend = RecordingInput(Arc::clone(&rec));
        ui.dispatch(|d, ctx| d.bind(ctx, surface.id, Box::new(backend)));
        (ui, surface, rec)
    }

    // ── dropping ──────────────────────────────────────────────────────────

    #[test]
    fn no_pick_target_drops_silently() {
        let (mut ui, surface, rec) = setup();
        let out = ui.dispatch(|d, ctx| d.dispatch(ctx, &touch(1.0, 1.0), &surface));
        assert_eq!(out, DispatchOutcome::Dropped(DropReason::NoPickTarget));
        assert!(rec.lock().touches.is_empty());
    }

    #[test]
    fn released_entity_is_forgotten() {
        let (mut ui, surface, rec) = setup();
        let target = entity(None);
        ui.dispatch(|d, ctx| d.set_pick_target(ctx, Some(&target)));
        drop(target);

        let out = ui.dispatch(|d, ctx| d.dispatch(ctx, &touch(1.0, 1.0), &surface));
        assert_eq!(out, DispatchOutcome::Dropped(DropReason::TargetReleased));
        assert!(ui.state().pick_target().is_none());
        assert!(rec.lock().touches.is_empty());
    }

    #[test]
    fn suspended_dispatcher_drops() {
        let (mut ui, surface, rec) = setup();
        let target = entity(None);
        ui.dispatch(|d, ctx| {
            d.set_pick_target(ctx, Some(&target));
            d.suspend(ctx);
        });
        let out = ui.dispatch(|d, ctx| d.dispatch(ctx, &touch(1.0, 1.0), &surface));
        assert_eq!(out, DispatchOutcome::Dropped(DropReason::Suspended));
        assert_eq!(rec.lock().pauses, 1);

        ui.dispatch(|d, ctx| d.resume(ctx));
        assert!(ui.dispatch(|d, ctx| d.dispatch(ctx, &touch(1.0, 1.0), &surface)).is_forwarded());
        assert_eq!(rec.lock().resumes, 1);
    }

    #[test]
    fn other_surface_is_not_routed() {
        let (mut ui, _surface, rec) = setup();
        let target = entity(None);
        let other = SurfaceInfo::new(SurfaceRole::Widget, 10, 10);
        ui.dispatch(|d, ctx| d.set_pick_target(ctx, Some(&target)));
        let out = ui.dispatch(|d, ctx| d.dispatch(ctx, &touch(1.0, 1.0), &other));
        assert_eq!(out, DispatchOutcome::Dropped(DropReason::SurfaceMismatch));
        assert!(rec.lock().touches.is_empty());
    }

    // ── remapping ─────────────────────────────────────────────────────────

    #[test]
    fn hit_uv_maps_into_surface_pixels() {
        let (mut ui, surface, rec) = setup();
        let target = entity(Some(Vec2::new(0.25, 0.5)));
        ui.dispatch(|d, ctx| d.set_pick_target(ctx, Some(&target)));

        let out = ui.dispatch(|d, ctx| d.dispatch(ctx, &touch(99.0, 99.0), &surface));
        let DispatchOutcome::Forwarded(ev) = out else {
            panic!("expected forward, got {out:?}");
        };
        assert_eq!(ev.position, Vec2::new(100.0, 100.0));
        assert_eq!(ev.source, Viewport::new(400.0, 200.0));
        assert_eq!(rec.lock().touches, vec![ev]);
    }

    #[test]
    fn missing_hit_scales_from_source_view() {
        let (mut ui, surface, rec) = setup();
        let target = entity(None);
        ui.dispatch(|d, ctx| d.set_pick_target(ctx, Some(&target)));

        ui.dispatch(|d, ctx| d.dispatch(ctx, &touch(50.0, 25.0), &surface));
        assert_eq!(rec.lock().touches[0].position, Vec2::new(200.0, 50.0));
    }

    #[test]
    fn keyboard_availability_reaches_late_backend() {
        let mut ui = UiLoop::new(InputDispatcher::new());
        let surface = SurfaceInfo::new(SurfaceRole::Widget, 1, 1);
        let rec = Arc::new(Mutex::new(Recorded::default()));
        let backend = RecordingInput(Arc::clone(&rec));
        ui.dispatch(|d, ctx| {
            d.set_keyboard_available(ctx, true);
            d.bind(ctx, surface.id, Box::new(backend));
        });
        assert_eq!(rec.lock().keyboard, Some(true));
        assert_eq!(ui.state().bound_surface(), Some(surface.id));
    }
}
