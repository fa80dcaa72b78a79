//! Input subsystem.
//!
//! Pointer and touch events arrive on the host view and are routed to the
//! widget surface through the [`InputDispatcher`], but only while a scene
//! entity is picked. Public API is platform-agnostic; [`platform`] holds the
//! translation from windowing-system events.

mod dispatcher;
pub mod platform;
mod types;

pub use dispatcher::{DispatchOutcome, DropReason, InputBackend, InputDispatcher, SceneEntity};
pub use types::{PointerAction, PointerEvent};
