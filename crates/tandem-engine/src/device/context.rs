use std::num::NonZeroU64;
use std::sync::OnceLock;
use std::time::Duration;

use crate::sync::{Interrupt, SharedMonitor, WaitError};

/// Opaque handle to the host's GPU context.
///
/// Owned by the host render loop; a widget surface only shares it. Compared by
/// identity. A null native handle cannot be represented.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RenderingContext(NonZeroU64);

impl RenderingContext {
    /// Wraps a native context handle. Returns `None` for a null handle.
    #[inline]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ContextError {
    #[error("rendering context already published as {existing:?}; rejected {rejected:?}")]
    AlreadyPublished {
        existing: RenderingContext,
        rejected: RenderingContext,
    },
}

/// Publish-once slot for the host [`RenderingContext`].
///
/// The host writes the context exactly once, then signals the monitor; any
/// thread that observes readiness also observes the context.
#[derive(Debug, Default)]
pub struct ContextSlot {
    context: OnceLock<RenderingContext>,
    monitor: SharedMonitor,
}

impl ContextSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the host context and wakes every thread waiting for it.
    ///
    /// Publishing the same context again is accepted and re-signals.
    pub fn on_context_ready(&self, context: RenderingContext) -> Result<(), ContextError> {
        let existing = *self.context.get_or_init(|| context);
        if existing != context {
            log::warn!("ignoring second rendering context {context:?}; keeping {existing:?}");
            return Err(ContextError::AlreadyPublished {
                existing,
                rejected: context,
            });
        }

        log::debug!("rendering context {:#x} ready", context.raw());
        self.monitor.signal_ready();
        Ok(())
    }

    #[inline]
    pub fn get(&self) -> Option<RenderingContext> {
        self.context.get().copied()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.monitor.is_ready()
    }

    /// Blocks until a context has been published, the interrupt fires, or the
    /// optional timeout elapses.
    pub fn wait(
        &self,
        interrupt: &Interrupt,
        timeout: Option<Duration>,
    ) -> Result<RenderingContext, WaitError> {
        self.monitor.wait_until_ready(interrupt, timeout)?;
        // The monitor is only signalled after the slot is filled.
        self.get().ok_or(WaitError::Interrupted)
    }

    /// Wakes a thread parked in [`wait`](Self::wait) with `interrupt`.
    pub fn interrupt(&self, interrupt: &Interrupt) {
        self.monitor.interrupt(interrupt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn ctx(raw: u64) -> RenderingContext {
        RenderingContext::from_raw(raw).unwrap()
    }

    #[test]
    fn null_handle_is_not_a_context() {
        assert!(RenderingContext::from_raw(0).is_none());
        assert_eq!(ctx(7).raw(), 7);
    }

    #[test]
    fn publish_is_once() {
        let slot = ContextSlot::new();
        assert!(!slot.is_ready());

        slot.on_context_ready(ctx(1)).unwrap();
        slot.on_context_ready(ctx(1)).unwrap();
        assert_eq!(
            slot.on_context_ready(ctx(2)),
            Err(ContextError::AlreadyPublished {
                existing: ctx(1),
                rejected: ctx(2),
            })
        );
        assert_eq!(slot.get(), Some(ctx(1)));
    }

    #[test]
    fn waiter_sees_published_context() {
        let slot = Arc::new(ContextSlot::new());
        let waiter = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.wait(&Interrupt::new(), Some(Duration::from_secs(5))))
        };

        slot.on_context_ready(ctx(0xbeef)).unwrap();
        assert_eq!(waiter.join().unwrap(), Ok(ctx(0xbeef)));
    }

    #[test]
    fn interrupted_wait_reports_no_context() {
        let slot = Arc::new(ContextSlot::new());
        let interrupt = Interrupt::new();
        let waiter = {
            let slot = Arc::clone(&slot);
            let interrupt = interrupt.clone();
            thread::spawn(move || slot.wait(&interrupt, None))
        };

        slot.interrupt(&interrupt);
        assert_eq!(waiter.join().unwrap(), Err(WaitError::Interrupted));
        assert!(slot.get().is_none());
    }
}
