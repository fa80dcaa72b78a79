use crate::coords::{Vec2, Viewport};

/// Phase of a pointer or touch contact.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PointerAction {
    Down,
    Move,
    Up,
    /// The platform took the contact away (focus loss, gesture capture).
    Cancel,
}

/// Platform-agnostic pointer/touch event.
///
/// `position` is in logical pixels of the view that received the event;
/// `source` is that view's size, used when remapping into a target surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    /// Stable per-contact identifier (touch id, or [`PointerEvent::MOUSE_ID`]).
    pub pointer_id: u64,
    pub position: Vec2,
    pub source: Viewport,
}

impl PointerEvent {
    /// Pointer id used for mouse-emulated touches.
    pub const MOUSE_ID: u64 = u64::MAX;

    pub fn new(action: PointerAction, pointer_id: u64, position: Vec2, source: Viewport) -> Self {
        Self {
            action,
            pointer_id,
            position,
            source,
        }
    }

    /// Same event moved to another coordinate space.
    #[inline]
    pub fn remapped(self, position: Vec2, space: Viewport) -> Self {
        Self {
            position,
            source: space,
            ..self
        }
    }
}
