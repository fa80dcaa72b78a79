use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::RwLock;

type Task<S> = Box<dyn FnOnce(&mut S, &UiCtx<'_>) + Send + 'static>;
type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

enum Envelope<S> {
    Run(Task<S>),
    Quit,
}

/// Returned when posting to a [`UiLoop`] that no longer exists.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("UI loop is closed")]
pub struct UiClosed;

/// Proof that the current code runs on the UI thread.
///
/// Only [`UiLoop`] creates it, and it is neither `Send` nor `Sync`, so
/// surface operations that demand a `&UiCtx` cannot run anywhere else.
pub struct UiCtx<'a> {
    thread: ThreadId,
    _not_send: PhantomData<&'a *const ()>,
}

impl UiCtx<'_> {
    fn new(owner: ThreadId) -> Self {
        let current = thread::current().id();
        assert_eq!(
            current, owner,
            "UI context requested off the UI thread ({current:?}, owner {owner:?})"
        );
        Self {
            thread: owner,
            _not_send: PhantomData,
        }
    }

    /// Identifier of the UI thread.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread
    }
}

/// Cloneable, thread-safe sender of UI tasks.
pub struct UiHandle<S> {
    tx: Sender<Envelope<S>>,
    waker: Arc<RwLock<Option<Waker>>>,
}

impl<S> Clone for UiHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            waker: Arc::clone(&self.waker),
        }
    }
}

impl<S> UiHandle<S> {
    /// Queues `task` to run on the UI thread with exclusive access to the
    /// loop state. Tasks run in posting order.
    pub fn post<F>(&self, task: F) -> Result<(), UiClosed>
    where
        F: FnOnce(&mut S, &UiCtx<'_>) + Send + 'static,
    {
        self.send(Envelope::Run(Box::new(task)))
    }

    /// Asks [`UiLoop::run`] to return once earlier tasks have run.
    pub fn quit(&self) -> Result<(), UiClosed> {
        self.send(Envelope::Quit)
    }

    fn send(&self, envelope: Envelope<S>) -> Result<(), UiClosed> {
        self.tx.send(envelope).map_err(|_| UiClosed)?;
        let waker = self.waker.read().clone();
        if let Some(waker) = waker {
            waker();
        }
        Ok(())
    }
}

impl<S> std::fmt::Debug for UiHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandle")
            .field("has_waker", &self.waker.read().is_some())
            .finish()
    }
}

/// Single-consumer task loop bound to the thread that created it.
///
/// `UiLoop` is `!Send`: the creating thread is the UI thread for its whole
/// life. State `S` is only ever touched from that thread.
pub struct UiLoop<S> {
    state: S,
    rx: Receiver<Envelope<S>>,
    handle: UiHandle<S>,
    owner: ThreadId,
    quit: bool,
    _not_send: PhantomData<*const ()>,
}

impl<S> UiLoop<S> {
    pub fn new(state: S) -> Self {
        Self::new_with(|_| state)
    }

    /// Builds the loop state with access to the loop's own handle, so the
    /// state can post follow-up work to itself.
    pub fn new_with(build: impl FnOnce(UiHandle<S>) -> S) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = UiHandle {
            tx,
            waker: Arc::new(RwLock::new(None)),
        };
        let state = build(handle.clone());
        Self {
            state,
            rx,
            handle,
            owner: thread::current().id(),
            quit: false,
            _not_send: PhantomData,
        }
    }

    pub fn handle(&self) -> UiHandle<S> {
        self.handle.clone()
    }

    /// Registers a callback invoked after every post, e.g. to wake a platform
    /// event loop that drives [`run_pending`](Self::run_pending).
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.handle.waker.write() = Some(Arc::new(waker));
    }

    pub fn clear_waker(&self) {
        *self.handle.waker.write() = None;
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    /// Whether a quit request has been processed.
    pub fn is_quit(&self) -> bool {
        self.quit
    }

    /// Runs `f` inline on the UI thread.
    ///
    /// Entry point for platform callbacks (pause, resume, focus, touch) that
    /// are already delivered on the UI thread.
    pub fn dispatch<R>(&mut self, f: impl FnOnce(&mut S, &UiCtx<'_>) -> R) -> R {
        let ctx = UiCtx::new(self.owner);
        f(&mut self.state, &ctx)
    }

    /// Runs every queued task without blocking. Returns the number run.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while !self.quit {
            match self.rx.try_recv() {
                Ok(envelope) => ran += self.handle_envelope(envelope),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        ran
    }

    /// Waits up to `timeout` for a task, then drains the queue.
    pub fn pump(&mut self, timeout: Duration) -> usize {
        if self.quit {
            return 0;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(envelope) => {
                let ran = self.handle_envelope(envelope);
                ran + self.run_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Runs tasks until a quit request arrives.
    pub fn run(&mut self) {
        while !self.quit {
            match self.rx.recv() {
                Ok(envelope) => {
                    self.handle_envelope(envelope);
                }
                Err(_) => break,
            }
        }
        log::debug!("UI loop finished");
    }

    fn handle_envelope(&mut self, envelope: Envelope<S>) -> usize {
        match envelope {
            Envelope::Run(task) => {
                let ctx = UiCtx::new(self.owner);
                task(&mut self.state, &ctx);
                1
            }
            Envelope::Quit => {
                log::debug!("UI loop quit requested");
                self.quit = true;
                0
            }
        }
    }
}
