//! Tandem engine crate.
//!
//! Coordinates an embedded widget surface with a host VR render loop: the
//! widget is created only after the host context exists, surface work runs on
//! one UI thread, and pause/resume/focus and input are shared between both.

pub mod coords;
pub mod device;
pub mod host;
pub mod input;
pub mod lifecycle;
pub mod runtime;
pub mod sync;
pub mod widget;

pub mod logging;

pub use host::{HostConfig, WidgetHost};
