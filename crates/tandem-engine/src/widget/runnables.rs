use std::mem;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::device::RenderMode;

type Runnable = Box<dyn FnOnce() + Send + 'static>;

/// Tasks posted to the widget render thread.
///
/// Posting requests a frame on the bound [`RenderMode`] so an on-demand
/// render loop wakes up to run them. Lock order is `pending`, then `mode`.
#[derive(Default)]
pub struct RunnableQueue {
    pending: Mutex<Vec<Runnable>>,
    mode: RwLock<Option<Arc<RenderMode>>>,
}

impl RunnableQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        let mut pending = self.pending.lock();
        pending.push(Box::new(task));
        if let Some(mode) = self.mode.read().as_ref() {
            mode.request_rendering();
        }
    }

    /// Runs every task queued so far, outside the lock. Tasks may post
    /// follow-ups, which run on the next call.
    pub fn run_pending(&self) -> usize {
        let batch = mem::take(&mut *self.pending.lock());
        let ran = batch.len();
        for task in batch {
            task();
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Binds the render mode of the surface draining this queue.
    pub(crate) fn bind(&self, mode: Arc<RenderMode>) {
        let pending = self.pending.lock();
        if !pending.is_empty() {
            mode.request_rendering();
        }
        *self.mode.write() = Some(mode);
    }

    pub(crate) fn unbind(&self) {
        let _pending = self.pending.lock();
        *self.mode.write() = None;
    }
}

impl std::fmt::Debug for RunnableQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnableQueue")
            .field("pending", &self.len())
            .field("bound", &self.mode.read().is_some())
            .finish()
    }
}
