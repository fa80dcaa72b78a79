use ::winit::dpi::PhysicalPosition;
use ::winit::event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent};

use crate::coords::{Vec2, Viewport};
use crate::input::{PointerAction, PointerEvent};

/// Translates winit window events into [`PointerEvent`]s.
///
/// Touches map one-to-one. The left mouse button emulates a single touch
/// contact with id [`PointerEvent::MOUSE_ID`]; hover movement is not routed.
/// Positions are converted to logical pixels with the tracked scale factor.
#[derive(Debug, Clone)]
pub struct PointerTranslator {
    scale_factor: f64,
    view: Viewport,
    cursor: Option<Vec2>,
    pressed: bool,
}

impl PointerTranslator {
    /// `view` is the logical size of the window receiving events.
    pub fn new(scale_factor: f64, view: Viewport) -> Self {
        Self {
            scale_factor,
            view,
            cursor: None,
            pressed: false,
        }
    }

    #[inline]
    pub fn view(&self) -> Viewport {
        self.view
    }

    /// Returns `None` for events with no pointer meaning.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<PointerEvent> {
        match event {
            WindowEvent::Touch(Touch {
                phase,
                location,
                id,
                ..
            }) => {
                let action = match phase {
                    TouchPhase::Started => PointerAction::Down,
                    TouchPhase::Moved => PointerAction::Move,
                    TouchPhase::Ended => PointerAction::Up,
                    TouchPhase::Cancelled => PointerAction::Cancel,
                };
                Some(self.event(action, *id, self.to_logical(*location)))
            }

            WindowEvent::CursorMoved { position, .. } => {
                let pos = self.to_logical(*position);
                self.cursor = Some(pos);
                self.pressed
                    .then(|| self.event(PointerAction::Move, PointerEvent::MOUSE_ID, pos))
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let pos = self.cursor?;
                let action = match state {
                    ElementState::Pressed if !self.pressed => PointerAction::Down,
                    ElementState::Released if self.pressed => PointerAction::Up,
                    _ => return None,
                };
                self.pressed = action == PointerAction::Down;
                Some(self.event(action, PointerEvent::MOUSE_ID, pos))
            }

            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.cancel_mouse()
            }

            WindowEvent::Focused(false) => self.cancel_mouse(),

            WindowEvent::Resized(size) => {
                let logical = size.to_logical::<f64>(self.scale_factor);
                self.view = Viewport::new(logical.width as f32, logical.height as f32);
                None
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = *scale_factor;
                None
            }

            _ => None,
        }
    }

    fn cancel_mouse(&mut self) -> Option<PointerEvent> {
        if !self.pressed {
            return None;
        }
        self.pressed = false;
        let pos = self.cursor.unwrap_or_default();
        Some(self.event(PointerAction::Cancel, PointerEvent::MOUSE_ID, pos))
    }

    fn event(&self, action: PointerAction, id: u64, pos: Vec2) -> PointerEvent {
        PointerEvent::new(action, id, pos, self.view)
    }

    fn to_logical(&self, pos: PhysicalPosition<f64>) -> Vec2 {
        let logical = pos.to_logical::<f64>(self.scale_factor);
        Vec2::new(logical.x as f32, logical.y as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::winit::event::DeviceId;

    fn device() -> DeviceId {
        // SAFETY: only used as an opaque value in synthetic events.
        unsafe { DeviceId::dummy() }
    }

    fn translator() -> PointerTranslator {
        PointerTranslator::new(2.0, Viewport::new(400.0, 300.0))
    }

    fn cursor(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(x, y),
        }
    }

    fn left(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput {
            device_id: device(),
            state,
            button: MouseButton::Left,
        }
    }

    #[test]
    fn touch_phases_map_to_actions() {
        let mut t = translator();
        let ev = t
            .translate(&WindowEvent::Touch(Touch {
                device_id: device(),
                phase: TouchPhase::Started,
                location: PhysicalPosition::new(100.0, 50.0),
                force: None,
                id: 3,
            }))
            .unwrap();
        assert_eq!(ev.action, PointerAction::Down);
        assert_eq!(ev.pointer_id, 3);
        assert_eq!(ev.position, Vec2::new(50.0, 25.0));
        assert_eq!(ev.source, Viewport::new(400.0, 300.0));
    }

    #[test]
    fn hover_is_not_routed_but_drag_is() {
        let mut t = translator();
        assert!(t.translate(&cursor(20.0, 20.0)).is_none());

        let down = t.translate(&left(ElementState::Pressed)).unwrap();
        assert_eq!(down.action, PointerAction::Down);
        assert_eq!(down.pointer_id, PointerEvent::MOUSE_ID);
        assert_eq!(down.position, Vec2::new(10.0, 10.0));

        let drag = t.translate(&cursor(40.0, 20.0)).unwrap();
        assert_eq!(drag.action, PointerAction::Move);
        assert_eq!(drag.position, Vec2::new(20.0, 10.0));

        let up = t.translate(&left(ElementState::Released)).unwrap();
        assert_eq!(up.action, PointerAction::Up);
        assert!(t.translate(&left(ElementState::Released)).is_none());
    }

    #[test]
    fn press_without_known_cursor_is_ignored() {
        let mut t = translator();
        assert!(t.translate(&left(ElementState::Pressed)).is_none());
    }

    #[test]
    fn focus_loss_cancels_active_press() {
        let mut t = translator();
        t.translate(&cursor(2.0, 2.0));
        t.translate(&left(ElementState::Pressed));

        let cancel = t.translate(&WindowEvent::Focused(false)).unwrap();
        assert_eq!(cancel.action, PointerAction::Cancel);
        assert!(t.translate(&WindowEvent::Focused(false)).is_none());
    }

    #[test]
    fn resize_updates_source_view() {
        let mut t = translator();
        assert!(t
            .translate(&WindowEvent::Resized(::winit::dpi::PhysicalSize::new(1600, 1200)))
            .is_none());
        assert_eq!(t.view(), Viewport::new(800.0, 600.0));
    }
}
