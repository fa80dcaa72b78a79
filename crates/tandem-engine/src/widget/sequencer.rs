use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::device::{ContextSlot, RenderingContext};
use crate::runtime::{UiCtx, UiHandle};
use crate::sync::{Interrupt, WaitError};

use super::SequencerConfig;

/// Why an initialization attempt ended without a widget.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AbortReason {
    /// [`WidgetInitSequencer::interrupt`] was called while waiting.
    Interrupted,
    /// The configured context timeout elapsed.
    TimedOut,
    /// The UI loop was gone when creation was scheduled.
    UiClosed,
    /// The creation callback failed on the UI thread.
    CreationFailed,
    /// The init thread panicked before creation was scheduled.
    WorkerPanicked,
}

/// State of the current initialization attempt.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SequencerState {
    Idle,
    WaitingForContext,
    SchedulingCreation,
    Active,
    /// Terminal for the attempt; a new `initialize` starts over.
    Aborted(AbortReason),
}

impl SequencerState {
    /// Whether an attempt is between `initialize` and its final state.
    #[inline]
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            SequencerState::WaitingForContext | SequencerState::SchedulingCreation
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("widget initialization already in progress ({0:?})")]
    AlreadyInitializing(SequencerState),
    #[error("failed to spawn widget init thread: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Debug)]
struct Attempt {
    id: u64,
    state: SequencerState,
    interrupt: Interrupt,
    thread: Option<JoinHandle<()>>,
}

/// Attempt bookkeeping shared with the init thread and the UI task.
#[derive(Debug)]
struct Shared {
    attempt: Mutex<Attempt>,
}

impl Shared {
    /// Moves attempt `id` from `from` to `to`. Fails if the attempt was
    /// superseded, moved on, or interrupted.
    fn advance(&self, id: u64, from: SequencerState, to: SequencerState) -> bool {
        let mut attempt = self.attempt.lock();
        if attempt.id != id || attempt.state != from {
            return false;
        }
        if to == SequencerState::SchedulingCreation && attempt.interrupt.is_triggered() {
            attempt.state = SequencerState::Aborted(AbortReason::Interrupted);
            log::warn!("widget init {id}: interrupted after context became ready");
            return false;
        }
        attempt.state = to;
        log::debug!("widget init {id}: {from:?} -> {to:?}");
        true
    }

    fn abort(&self, id: u64, from: SequencerState, reason: AbortReason) {
        self.advance(id, from, SequencerState::Aborted(reason));
    }

    /// Aborts attempt `id` from whichever in-flight state it is in.
    fn abort_in_flight(&self, id: u64, reason: AbortReason) {
        let mut attempt = self.attempt.lock();
        if attempt.id == id && attempt.state.is_in_flight() {
            log::error!("widget init {id}: {:?} -> Aborted({reason:?})", attempt.state);
            attempt.state = SequencerState::Aborted(reason);
        }
    }
}

/// Ends the attempt if the init thread unwinds, so a panic never leaves it
/// in flight and blocking every later `initialize`.
struct AbortOnUnwind<'a> {
    shared: &'a Shared,
    id: u64,
}

impl Drop for AbortOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.shared.abort_in_flight(self.id, AbortReason::WorkerPanicked);
        }
    }
}

/// Runs widget initialization off the UI thread.
///
/// Each [`initialize`](Self::initialize) spawns one thread that blocks until
/// the host publishes its [`RenderingContext`], then posts surface creation
/// to the UI loop. Creation therefore never precedes the context, and always
/// runs on the UI thread.
pub struct WidgetInitSequencer<S> {
    shared: Arc<Shared>,
    slot: Arc<ContextSlot>,
    ui: UiHandle<S>,
    config: SequencerConfig,
}

impl<S> Clone for WidgetInitSequencer<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            slot: Arc::clone(&self.slot),
            ui: self.ui.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: 'static> WidgetInitSequencer<S> {
    pub fn new(slot: Arc<ContextSlot>, ui: UiHandle<S>, config: SequencerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                attempt: Mutex::new(Attempt {
                    id: 0,
                    state: SequencerState::Idle,
                    interrupt: Interrupt::new(),
                    thread: None,
                }),
            }),
            slot,
            ui,
            config,
        }
    }

    /// Starts a new attempt and returns its id.
    ///
    /// `create` runs on the UI thread with the published context. Rejected
    /// while another attempt is waiting or scheduled.
    pub fn initialize<F>(&self, create: F) -> Result<u64, SequencerError>
    where
        F: FnOnce(&mut S, &UiCtx<'_>, RenderingContext) -> anyhow::Result<()> + Send + 'static,
    {
        let mut attempt = self.shared.attempt.lock();
        if attempt.state.is_in_flight() {
            log::warn!(
                "widget init {}: rejecting second initialize while {:?}",
                attempt.id,
                attempt.state
            );
            return Err(SequencerError::AlreadyInitializing(attempt.state));
        }

        let id = attempt.id + 1;
        let interrupt = Interrupt::new();
        let worker = Worker {
            id,
            shared: Arc::clone(&self.shared),
            slot: Arc::clone(&self.slot),
            ui: self.ui.clone(),
            interrupt: interrupt.clone(),
            timeout: self.config.context_timeout,
        };

        let handle = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || worker.run(create))
            .map_err(SequencerError::Spawn)?;

        attempt.id = id;
        attempt.state = SequencerState::WaitingForContext;
        attempt.interrupt = interrupt;
        attempt.thread = Some(handle);
        log::info!("widget init {id}: started, waiting for rendering context");
        Ok(id)
    }
}

impl<S> WidgetInitSequencer<S> {
    /// Cancels an attempt that is still waiting for the context.
    ///
    /// Best effort: once creation has been scheduled the attempt completes.
    pub fn interrupt(&self) -> bool {
        let attempt = self.shared.attempt.lock();
        if attempt.state != SequencerState::WaitingForContext {
            return false;
        }
        log::debug!("widget init {}: interrupt requested", attempt.id);
        self.slot.interrupt(&attempt.interrupt);
        true
    }

    pub fn state(&self) -> SequencerState {
        self.shared.attempt.lock().state
    }

    /// Id of the latest attempt; `0` before the first.
    pub fn attempt(&self) -> u64 {
        self.shared.attempt.lock().id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state() == SequencerState::Active
    }

    /// Waits for the latest init thread to exit and returns the state.
    ///
    /// The thread exits after posting the creation task, so the state is
    /// `SchedulingCreation` until the UI loop runs it.
    pub fn join(&self) -> SequencerState {
        let handle = self.shared.attempt.lock().thread.take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("widget init thread panicked");
            }
        }
        self.state()
    }

    pub fn context_slot(&self) -> &Arc<ContextSlot> {
        &self.slot
    }
}

impl<S> std::fmt::Debug for WidgetInitSequencer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetInitSequencer")
            .field("attempt", &self.attempt())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Body of one init thread.
struct Worker<S> {
    id: u64,
    shared: Arc<Shared>,
    slot: Arc<ContextSlot>,
    ui: UiHandle<S>,
    interrupt: Interrupt,
    timeout: Option<Duration>,
}

impl<S: 'static> Worker<S> {
    fn run<F>(self, create: F)
    where
        F: FnOnce(&mut S, &UiCtx<'_>, RenderingContext) -> anyhow::Result<()> + Send + 'static,
    {
        let id = self.id;
        let _unwind = AbortOnUnwind {
            shared: &self.shared,
            id,
        };
        let context = match self.slot.wait(&self.interrupt, self.timeout) {
            Ok(context) => context,
            Err(err) => {
                log::warn!("widget init {id}: {err}; widget will not attach");
                let reason = match err {
                    WaitError::Interrupted => AbortReason::Interrupted,
                    WaitError::TimedOut(_) => AbortReason::TimedOut,
                };
                self.shared
                    .abort(id, SequencerState::WaitingForContext, reason);
                return;
            }
        };

        if !self.shared.advance(
            id,
            SequencerState::WaitingForContext,
            SequencerState::SchedulingCreation,
        ) {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let posted = self.ui.post(move |state, ui| {
            match create(state, ui, context) {
                Ok(()) => {
                    shared.advance(id, SequencerState::SchedulingCreation, SequencerState::Active);
                    log::info!("widget init {id}: widget surface active");
                }
                Err(err) => {
                    log::error!("widget init {id}: surface creation failed: {err:#}");
                    shared.abort(id, SequencerState::SchedulingCreation, AbortReason::CreationFailed);
                }
            }
        });

        if posted.is_err() {
            log::error!("widget init {id}: UI loop closed before creation");
            self.shared
                .abort(id, SequencerState::SchedulingCreation, AbortReason::UiClosed);
        }
    }
}
