//! Entry points for the hosting runtime.
//!
//! [`WidgetHost`] is the state of the UI loop. Platform callbacks reach it
//! through [`UiLoop::dispatch`](crate::runtime::UiLoop::dispatch); the host
//! render thread publishes its context through [`WidgetHost::context_slot`].

mod widget_host;

pub use widget_host::{HostConfig, WidgetHost};
