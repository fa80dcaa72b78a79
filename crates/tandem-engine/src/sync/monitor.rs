use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Reason a wait on [`SharedMonitor`] returned without the monitor being ready.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum WaitError {
    /// The waiting thread's [`Interrupt`] was triggered.
    #[error("wait for context readiness was interrupted")]
    Interrupted,
    /// The optional deadline passed before the monitor was signalled.
    #[error("context was not ready after {0:?}")]
    TimedOut(Duration),
}

/// Cancellation flag for one waiting thread.
///
/// Cloning shares the flag. Triggering goes through
/// [`SharedMonitor::interrupt`] so the flag flip and the wake-up happen under
/// the monitor lock.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    ready: bool,
    signals: u64,
}

/// Wait/notify latch signalling that the host rendering context exists.
///
/// Readiness is sticky: once [`signal_ready`](Self::signal_ready) has run,
/// every current and future wait returns immediately.
#[derive(Debug, Default)]
pub struct SharedMonitor {
    state: Mutex<MonitorState>,
    cond: Condvar,
}

impl SharedMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the monitor ready and wakes every waiter. Idempotent.
    pub fn signal_ready(&self) {
        let mut state = self.state.lock();
        state.ready = true;
        state.signals = state.signals.saturating_add(1);
        drop(state);
        self.cond.notify_all();
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Number of `signal_ready` calls observed so far.
    pub fn signal_count(&self) -> u64 {
        self.state.lock().signals
    }

    /// Triggers `interrupt` and wakes waiters so the owner of that flag can
    /// observe it.
    pub fn interrupt(&self, interrupt: &Interrupt) {
        let _state = self.state.lock();
        interrupt.flag.store(true, Ordering::Release);
        self.cond.notify_all();
    }

    /// Blocks until the monitor is ready.
    ///
    /// The predicate is checked before parking, so an already-ready monitor
    /// returns at once. Spurious wake-ups re-check readiness, then the
    /// interrupt, then the deadline. Readiness wins over an interrupt raised
    /// at the same time.
    pub fn wait_until_ready(
        &self,
        interrupt: &Interrupt,
        timeout: Option<Duration>,
    ) -> Result<(), WaitError> {
        // A timeout past the end of `Instant` is as good as none.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t).map(|at| (t, at)));
        let mut state = self.state.lock();

        loop {
            if state.ready {
                return Ok(());
            }
            if interrupt.is_triggered() {
                return Err(WaitError::Interrupted);
            }

            match deadline {
                None => self.cond.wait(&mut state),
                Some((timeout, at)) => {
                    if self.cond.wait_until(&mut state, at).timed_out() && !state.ready {
                        return Err(WaitError::TimedOut(timeout));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    fn spawn_waiter(
        monitor: &Arc<SharedMonitor>,
        interrupt: &Interrupt,
        timeout: Option<Duration>,
    ) -> mpsc::Receiver<Result<(), WaitError>> {
        let (tx, rx) = mpsc::channel();
        let monitor = Arc::clone(monitor);
        let interrupt = interrupt.clone();
        thread::spawn(move || {
            let _ = tx.send(monitor.wait_until_ready(&interrupt, timeout));
        });
        rx
    }

    // ── readiness ─────────────────────────────────────────────────────────

    #[test]
    fn already_ready_returns_immediately() {
        let monitor = SharedMonitor::new();
        monitor.signal_ready();
        assert_eq!(monitor.wait_until_ready(&Interrupt::new(), None), Ok(()));
    }

    #[test]
    fn repeated_signals_are_idempotent() {
        let monitor = SharedMonitor::new();
        for _ in 0..5 {
            monitor.signal_ready();
        }
        assert!(monitor.is_ready());
        assert_eq!(monitor.signal_count(), 5);
        assert_eq!(monitor.wait_until_ready(&Interrupt::new(), None), Ok(()));
    }

    #[test]
    fn waiter_parks_until_signalled() {
        let monitor = Arc::new(SharedMonitor::new());
        let rx = spawn_waiter(&monitor, &Interrupt::new(), None);

        // No signal yet: the waiter must still be parked.
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        monitor.signal_ready();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(()));
    }

    #[test]
    fn signal_wakes_every_waiter() {
        let monitor = Arc::new(SharedMonitor::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| spawn_waiter(&monitor, &Interrupt::new(), None))
            .collect();

        monitor.signal_ready();
        for rx in waiters {
            assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(()));
        }
    }

    // ── never ready ───────────────────────────────────────────────────────

    #[test]
    fn unsignalled_wait_times_out() {
        let monitor = SharedMonitor::new();
        let res = monitor.wait_until_ready(&Interrupt::new(), Some(Duration::from_millis(20)));
        assert_eq!(res, Err(WaitError::TimedOut(Duration::from_millis(20))));
    }

    #[test]
    fn unrepresentable_timeout_waits_without_deadline() {
        let monitor = Arc::new(SharedMonitor::new());
        let rx = spawn_waiter(&monitor, &Interrupt::new(), Some(Duration::MAX));

        assert!(rx.recv_timeout(Duration::from_millis(30)).is_err());
        monitor.signal_ready();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(()));
    }

    #[test]
    fn interrupt_releases_parked_waiter() {
        let monitor = Arc::new(SharedMonitor::new());
        let interrupt = Interrupt::new();
        let rx = spawn_waiter(&monitor, &interrupt, None);

        assert!(rx.recv_timeout(Duration::from_millis(30)).is_err());
        monitor.interrupt(&interrupt);

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Err(WaitError::Interrupted)
        );
        assert!(!monitor.is_ready());
    }

    #[test]
    fn interrupt_only_affects_its_own_waiter() {
        let monitor = Arc::new(SharedMonitor::new());
        let cancelled = Interrupt::new();
        let kept = Interrupt::new();
        let rx_cancelled = spawn_waiter(&monitor, &cancelled, None);
        let rx_kept = spawn_waiter(&monitor, &kept, None);

        monitor.interrupt(&cancelled);
        assert_eq!(
            rx_cancelled.recv_timeout(Duration::from_secs(5)).unwrap(),
            Err(WaitError::Interrupted)
        );
        assert!(rx_kept.recv_timeout(Duration::from_millis(30)).is_err());

        monitor.signal_ready();
        assert_eq!(rx_kept.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(()));
    }

    #[test]
    fn readiness_beats_a_pending_interrupt() {
        let monitor = SharedMonitor::new();
        let interrupt = Interrupt::new();
        monitor.signal_ready();
        monitor.interrupt(&interrupt);
        assert_eq!(monitor.wait_until_ready(&interrupt, None), Ok(()));
    }
}
