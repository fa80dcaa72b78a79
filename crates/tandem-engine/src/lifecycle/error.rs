use crate::device::SurfaceRole;

use super::LifecycleState;

/// Lifecycle requests the coordinator refuses.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {op} the {role:?} surface while {from:?}")]
    IllegalTransition {
        role: SurfaceRole,
        from: LifecycleState,
        op: &'static str,
    },
    #[error("a widget surface is already attached")]
    WidgetAlreadyAttached,
}
