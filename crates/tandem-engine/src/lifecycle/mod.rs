//! Pause/resume/destroy sequencing across the host and widget surfaces.
//!
//! Surfaces change [`LifecycleState`] only through the
//! [`LifecycleCoordinator`]; everything here runs on the UI thread.

mod coordinator;
mod error;
mod focus;
mod listeners;
mod surface;

pub use coordinator::LifecycleCoordinator;
pub use error::LifecycleError;
pub use focus::FocusState;
pub use listeners::{LifecycleListener, ListenerSet};
pub use surface::{LifecycleState, ManagedSurface};
