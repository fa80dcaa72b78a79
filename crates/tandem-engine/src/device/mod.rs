//! Rendering context and surface plumbing.
//!
//! This module is responsible for:
//! - the publish-once [`RenderingContext`] handed from the host render loop
//! - surface identity, sizing and render-mode flags
//! - the collaborator traits implemented by the windowing system, the widget
//!   rendering library and the audio backend

mod backend;
mod context;
mod surface;

pub use backend::{AudioBackend, SurfaceBackend, WindowSystem};
pub use context::{ContextError, ContextSlot, RenderingContext};
pub use surface::{ContinuousGuard, RenderMode, SurfaceConfig, SurfaceId, SurfaceInfo, SurfaceRole};
