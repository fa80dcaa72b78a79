use std::sync::Arc;

use parking_lot::Mutex;

/// Observer of host lifecycle transitions. All methods default to no-ops.
pub trait LifecycleListener: Send + Sync {
    fn pause(&self) {}
    fn resume(&self) {}
    /// Final notification after a finishing pause.
    fn dispose(&self) {}
}

/// Listener collection guarded by one lock.
///
/// Iteration works on a copy-on-write snapshot taken under the lock and
/// released before any callback runs, so callbacks may add or remove
/// listeners (including themselves) without deadlocking.
pub struct ListenerSet<L: ?Sized> {
    entries: Mutex<Arc<Vec<Arc<L>>>>,
}

impl<L: ?Sized> ListenerSet<L> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Arc::new(Vec::new())),
        }
    }

    pub fn add(&self, listener: Arc<L>) {
        Arc::make_mut(&mut *self.entries.lock()).push(listener);
    }

    /// Removes `listener` by identity. Returns whether it was present.
    pub fn remove(&self, listener: &Arc<L>) -> bool {
        let mut entries = self.entries.lock();
        let Some(index) = entries.iter().position(|l| Arc::ptr_eq(l, listener)) else {
            return false;
        };
        Arc::make_mut(&mut *entries).remove(index);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Current listeners in registration order.
    pub fn snapshot(&self) -> Arc<Vec<Arc<L>>> {
        Arc::clone(&self.entries.lock())
    }

    /// Calls `f` on each listener of the current snapshot.
    pub fn for_each(&self, mut f: impl FnMut(&L)) {
        let snapshot = self.snapshot();
        for listener in snapshot.iter() {
            f(listener);
        }
    }
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counter {
        pauses: AtomicU32,
    }

    impl LifecycleListener for Counter {
        fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn add_notify_remove() {
        let set: ListenerSet<dyn LifecycleListener> = ListenerSet::new();
        let counter = Arc::new(Counter::default());
        let as_dyn: Arc<dyn LifecycleListener> = counter.clone();

        set.add(Arc::clone(&as_dyn));
        set.for_each(|l| l.pause());
        assert_eq!(counter.pauses.load(Ordering::SeqCst), 1);

        assert!(set.remove(&as_dyn));
        assert!(!set.remove(&as_dyn));
        set.for_each(|l| l.pause());
        assert_eq!(counter.pauses.load(Ordering::SeqCst), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn callbacks_may_mutate_the_set() {
        struct SelfRemoving {
            set: Arc<ListenerSet<dyn LifecycleListener>>,
            me: Mutex<Option<Arc<dyn LifecycleListener>>>,
            calls: AtomicU32,
        }

        impl LifecycleListener for SelfRemoving {
            fn pause(&self) {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if let Some(me) = self.me.lock().take() {
                    self.set.remove(&me);
                }
            }
        }

        let set: Arc<ListenerSet<dyn LifecycleListener>> = Arc::new(ListenerSet::new());
        let listener = Arc::new(SelfRemoving {
            set: Arc::clone(&set),
            me: Mutex::new(None),
            calls: AtomicU32::new(0),
        });
        let as_dyn: Arc<dyn LifecycleListener> = listener.clone();
        *listener.me.lock() = Some(Arc::clone(&as_dyn));
        set.add(as_dyn);

        set.for_each(|l| l.pause());
        set.for_each(|l| l.pause());
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn snapshot_is_stable_across_later_adds() {
        let set: ListenerSet<dyn LifecycleListener> = ListenerSet::new();
        set.add(Arc::new(Counter::default()));
        let before = set.snapshot();
        set.add(Arc::new(Counter::default()));
        assert_eq!(before.len(), 1);
        assert_eq!(set.len(), 2);
    }
}
