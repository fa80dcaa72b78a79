use std::sync::Arc;

use crate::device::{AudioBackend, SurfaceInfo};
use crate::input::{InputBackend, InputDispatcher};
use crate::runtime::UiCtx;

use super::{FocusState, LifecycleError, LifecycleListener, LifecycleState, ListenerSet, ManagedSurface};

/// Pauses and disposes audio with the host; resume is owned by the
/// focus-deferral logic.
struct AudioListener {
    audio: Arc<dyn AudioBackend>,
}

impl LifecycleListener for AudioListener {
    fn pause(&self) {
        self.audio.pause();
    }

    fn dispose(&self) {
        self.audio.dispose();
    }
}

/// Owns the pause/resume/destroy protocol of the host surface and, once
/// installed, the widget surface, plus input suspension and audio deferral.
///
/// UI-thread confined. Pause always wins: a pause delivered while a widget
/// is being installed leaves the new widget paused.
pub struct LifecycleCoordinator {
    host: ManagedSurface,
    widget: Option<ManagedSurface>,
    input: InputDispatcher,
    focus: FocusState,
    waiting_for_audio: bool,
    paused: bool,
    listeners: Arc<ListenerSet<dyn LifecycleListener>>,
    audio: Arc<dyn AudioBackend>,
}

impl LifecycleCoordinator {
    pub fn new(host: ManagedSurface, audio: Arc<dyn AudioBackend>) -> Self {
        let listeners: Arc<ListenerSet<dyn LifecycleListener>> = Arc::new(ListenerSet::new());
        listeners.add(Arc::new(AudioListener {
            audio: Arc::clone(&audio),
        }));
        Self {
            host,
            widget: None,
            input: InputDispatcher::new(),
            focus: FocusState::Unknown,
            waiting_for_audio: false,
            paused: false,
            listeners,
            audio,
        }
    }

    /// Pauses host, widget, input and listeners, in that order.
    ///
    /// With `finishing`, both surfaces are destroyed and listeners receive
    /// `dispose` after `pause`. Repeating a non-finishing pause does nothing.
    pub fn pause(&mut self, ui: &UiCtx<'_>, finishing: bool) -> Result<(), LifecycleError> {
        if !self.host.pause(ui, finishing)? {
            return Ok(());
        }
        if let Some(widget) = self.widget.as_mut() {
            if let Err(err) = widget.pause(ui, finishing) {
                log::warn!("widget pause skipped: {err}");
            }
        }
        self.input.suspend(ui);

        self.listeners.for_each(|l| l.pause());
        if finishing {
            self.listeners.for_each(|l| l.dispose());
        }

        self.waiting_for_audio = false;
        self.paused = true;
        log::info!("paused (finishing: {finishing})");
        Ok(())
    }

    /// Resumes after a pause. Returns `Ok(false)` if not paused.
    ///
    /// Audio resumes here only when focus is not known to be lost; otherwise
    /// it waits for [`on_focus_changed`](Self::on_focus_changed).
    pub fn resume(&mut self, ui: &UiCtx<'_>) -> Result<bool, LifecycleError> {
        if self.host.state().is_destroyed() {
            return Err(LifecycleError::IllegalTransition {
                role: self.host.info().role,
                from: LifecycleState::Destroyed,
                op: "resume",
            });
        }
        if !self.paused {
            return Ok(false);
        }

        self.host.resume(ui)?;
        if let Some(widget) = self.widget.as_mut() {
            if let Err(err) = widget.resume(ui) {
                log::warn!("widget resume skipped: {err}");
            }
        }
        self.input.resume(ui);
        self.listeners.for_each(|l| l.resume());
        self.paused = false;

        self.start_audio();
        Ok(true)
    }

    /// Records the focus change. Returns whether deferred audio resumed.
    pub fn on_focus_changed(&mut self, _ui: &UiCtx<'_>, has_focus: bool) -> bool {
        self.focus = FocusState::from_focus(has_focus);
        if has_focus && self.waiting_for_audio {
            self.resume_audio();
            return true;
        }
        false
    }

    /// Resumes audio now if focus allows it, otherwise on the next gain.
    fn start_audio(&mut self) {
        self.waiting_for_audio = true;
        if self.focus.allows_audio() {
            self.resume_audio();
        } else {
            log::debug!("audio resume deferred until focus");
        }
    }

    fn resume_audio(&mut self) {
        self.audio.resume();
        self.waiting_for_audio = false;
    }

    /// Installs a created widget surface with its input backend.
    ///
    /// The surface starts rendering immediately, unless the host is paused,
    /// in which case it is paused right away and resumes with the host.
    /// Starting a widget goes through the same focus-gated audio resume as
    /// [`resume`](Self::resume).
    pub fn install_widget(
        &mut self,
        ui: &UiCtx<'_>,
        mut surface: ManagedSurface,
        input: Box<dyn InputBackend>,
    ) -> Result<(), LifecycleError> {
        if self.widget.as_ref().is_some_and(|w| !w.state().is_destroyed()) {
            return Err(LifecycleError::WidgetAlreadyAttached);
        }

        if self.paused {
            surface.pause(ui, false)?;
        } else {
            surface.start_rendering(ui);
            self.start_audio();
        }
        self.input.bind(ui, surface.info().id, input);
        log::info!(
            "widget surface {} installed ({}x{})",
            surface.info().id.get(),
            surface.info().width,
            surface.info().height
        );
        self.widget = Some(surface);
        Ok(())
    }

    /// Detaches the widget surface and its input backend.
    pub fn take_widget(&mut self, ui: &UiCtx<'_>) -> Option<ManagedSurface> {
        let widget = self.widget.take()?;
        if self.input.bound_surface() == Some(widget.info().id) {
            self.input.unbind(ui);
        }
        Some(widget)
    }

    /// Destroys and drops the widget surface, returning what it was.
    pub fn destroy_widget(&mut self, ui: &UiCtx<'_>) -> Option<SurfaceInfo> {
        let mut widget = self.take_widget(ui)?;
        widget.destroy(ui);
        Some(*widget.info())
    }

    pub fn host(&self) -> &ManagedSurface {
        &self.host
    }

    pub fn widget(&self) -> Option<&ManagedSurface> {
        self.widget.as_ref()
    }

    pub fn input(&self) -> &InputDispatcher {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputDispatcher {
        &mut self.input
    }

    #[inline]
    pub fn focus(&self) -> FocusState {
        self.focus
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn is_waiting_for_audio(&self) -> bool {
        self.waiting_for_audio
    }

    pub fn listeners(&self) -> &Arc<ListenerSet<dyn LifecycleListener>> {
        &self.listeners
    }
}
