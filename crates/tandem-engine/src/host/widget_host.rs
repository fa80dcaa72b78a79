use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::device::{
    AudioBackend, ContextError, ContextSlot, RenderMode, RenderingContext, SurfaceBackend,
    SurfaceInfo, SurfaceRole, WindowSystem,
};
use crate::input::{DispatchOutcome, DropReason, PointerEvent, SceneEntity};
use crate::lifecycle::{LifecycleCoordinator, LifecycleError, LifecycleListener, LifecycleState, ManagedSurface};
use crate::runtime::{UiClosed, UiCtx, UiHandle};
use crate::widget::{RunnableQueue, SequencerConfig, SequencerError, SequencerState, WidgetConfig, WidgetInitSequencer};

/// Host view settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Initial view size; widget surfaces take the size current when they
    /// are created.
    pub view_width: u32,
    pub view_height: u32,
    pub host_continuous_rendering: bool,
    pub sequencer: SequencerConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            view_width: 1280,
            view_height: 720,
            host_continuous_rendering: true,
            sequencer: SequencerConfig::default(),
        }
    }
}

/// Bridges the host render loop, the embedded widget and platform callbacks.
///
/// Lives inside a [`UiLoop`](crate::runtime::UiLoop); every `&mut self`
/// method takes the loop's [`UiCtx`].
pub struct WidgetHost {
    ui: UiHandle<WidgetHost>,
    view: (u32, u32),
    slot: Arc<ContextSlot>,
    sequencer: WidgetInitSequencer<WidgetHost>,
    window: Box<dyn WindowSystem>,
    lifecycle: LifecycleCoordinator,
    runnables: Arc<RunnableQueue>,
}

impl WidgetHost {
    pub fn new(
        ui: UiHandle<WidgetHost>,
        config: HostConfig,
        window: Box<dyn WindowSystem>,
        host_backend: Box<dyn SurfaceBackend>,
        audio: Arc<dyn AudioBackend>,
    ) -> Self {
        let info = SurfaceInfo::new(SurfaceRole::Host, config.view_width, config.view_height);
        let mode = Arc::new(RenderMode::new(config.host_continuous_rendering));
        let host = ManagedSurface::new(info, mode, host_backend);

        let slot = Arc::new(ContextSlot::new());
        let sequencer = WidgetInitSequencer::new(Arc::clone(&slot), ui.clone(), config.sequencer);

        Self {
            ui,
            view: (config.view_width, config.view_height),
            slot,
            sequencer,
            window,
            lifecycle: LifecycleCoordinator::new(host, audio),
            runnables: Arc::new(RunnableQueue::new()),
        }
    }

    // ── context handshake ──

    /// Shared slot the host render thread publishes its context into.
    pub fn context_slot(&self) -> Arc<ContextSlot> {
        Arc::clone(&self.slot)
    }

    pub fn on_context_ready(&self, context: RenderingContext) -> Result<(), ContextError> {
        self.slot.on_context_ready(context)
    }

    /// Starts widget initialization. Creation happens on the UI thread once
    /// the host context is published; a live widget is replaced.
    pub fn initialize_widget(&self, config: WidgetConfig) -> Result<u64, SequencerError> {
        self.sequencer
            .initialize(move |host: &mut WidgetHost, ui: &UiCtx<'_>, context| {
                host.attach_widget(ui, &config, context)
            })
    }

    fn attach_widget(
        &mut self,
        ui: &UiCtx<'_>,
        config: &WidgetConfig,
        context: RenderingContext,
    ) -> Result<()> {
        if self.lifecycle.host().state().is_destroyed() {
            bail!("host surface is destroyed; not creating widget {:?}", config.name);
        }

        self.runnables.unbind();
        if let Some(old) = self.lifecycle.destroy_widget(ui) {
            log::info!("replacing widget surface {}", old.id.get());
            self.window.destroy_surface(ui, &old);
        }

        let (width, height) = self.view;
        let info = SurfaceInfo::new(SurfaceRole::Widget, width, height);
        let mode = Arc::new(RenderMode::new(config.continuous_rendering));
        let surface_config = config.surface_config(width, height);

        let mut backend = self
            .window
            .create_surface(ui, &info, &surface_config, context, Arc::clone(&mode))
            .with_context(|| format!("creating surface for widget {:?}", config.name))?;

        if let Err(err) = self.window.attach_to_layout(ui, &info) {
            backend.destroy();
            self.window.destroy_surface(ui, &info);
            return Err(err.context(format!("attaching widget {:?} to layout", config.name)));
        }

        let input = self.window.create_input(ui, &info);
        let surface = ManagedSurface::new(info, Arc::clone(&mode), backend);
        self.lifecycle.install_widget(ui, surface, input)?;
        self.runnables.bind(mode);
        Ok(())
    }

    // ── platform lifecycle ──

    /// Pauses everything; with `finishing`, destroys both surfaces and
    /// cancels a pending widget initialization.
    pub fn on_pause(&mut self, ui: &UiCtx<'_>, finishing: bool) -> Result<(), LifecycleError> {
        if finishing && self.sequencer.interrupt() {
            log::debug!("pending widget initialization cancelled");
        }
        self.lifecycle.pause(ui, finishing)?;

        if finishing {
            self.runnables.unbind();
            if let Some(info) = self.lifecycle.widget().map(|w| *w.info()) {
                self.window.destroy_surface(ui, &info);
            }
        }
        Ok(())
    }

    pub fn on_resume(&mut self, ui: &UiCtx<'_>) -> Result<bool, LifecycleError> {
        self.lifecycle.resume(ui)
    }

    pub fn on_window_focus_changed(&mut self, ui: &UiCtx<'_>, has_focus: bool) -> bool {
        self.lifecycle.on_focus_changed(ui, has_focus)
    }

    /// Routes a touch received by the host view to the widget surface.
    pub fn on_touch_event(&mut self, ui: &UiCtx<'_>, event: &PointerEvent) -> DispatchOutcome {
        let Some(target) = self.lifecycle.widget().map(|w| *w.info()) else {
            log::trace!("{:?} #{} dropped: no widget surface", event.action, event.pointer_id);
            return DispatchOutcome::Dropped(DropReason::NoWidgetSurface);
        };
        self.lifecycle.input_mut().dispatch(ui, event, &target)
    }

    pub fn on_configuration_changed(&mut self, ui: &UiCtx<'_>, keyboard_available: bool) {
        self.lifecycle
            .input_mut()
            .set_keyboard_available(ui, keyboard_available);
    }

    /// Records the host view size used for the next widget surface.
    pub fn set_view_size(&mut self, _ui: &UiCtx<'_>, width: u32, height: u32) {
        self.view = (width, height);
    }

    #[inline]
    pub fn view_size(&self) -> (u32, u32) {
        self.view
    }

    /// Pauses with `finishing` and stops the UI loop. Callable from any thread.
    pub fn request_exit(ui: &UiHandle<WidgetHost>) -> Result<(), UiClosed> {
        ui.post(|host, ui| {
            if let Err(err) = host.on_pause(ui, true) {
                log::warn!("exit: {err}");
            }
        })?;
        ui.quit()
    }

    /// Handle of the UI loop this host lives in.
    pub fn ui_handle(&self) -> &UiHandle<WidgetHost> {
        &self.ui
    }

    // ── picking ──

    pub fn set_picked_object(&mut self, ui: &UiCtx<'_>, entity: Option<&Arc<dyn SceneEntity>>) {
        self.lifecycle.input_mut().set_pick_target(ui, entity);
    }

    pub fn picked_object(&self) -> Option<Arc<dyn SceneEntity>> {
        self.lifecycle.input().pick_target()
    }

    // ── listeners and runnables ──

    pub fn add_lifecycle_listener(&self, listener: Arc<dyn LifecycleListener>) {
        self.lifecycle.listeners().add(listener);
    }

    pub fn remove_lifecycle_listener(&self, listener: &Arc<dyn LifecycleListener>) -> bool {
        self.lifecycle.listeners().remove(listener)
    }

    /// Queues work for the widget render thread.
    pub fn post_runnable(&self, task: impl FnOnce() + Send + 'static) {
        self.runnables.post(task);
    }

    /// Queue drained by the widget render thread.
    pub fn runnables(&self) -> Arc<RunnableQueue> {
        Arc::clone(&self.runnables)
    }

    // ── introspection ──

    pub fn host_render_mode(&self) -> &Arc<RenderMode> {
        self.lifecycle.host().render_mode()
    }

    pub fn host_state(&self) -> LifecycleState {
        self.lifecycle.host().state()
    }

    pub fn widget_state(&self) -> Option<LifecycleState> {
        self.lifecycle.widget().map(ManagedSurface::state)
    }

    pub fn widget_info(&self) -> Option<SurfaceInfo> {
        self.lifecycle.widget().map(|w| *w.info())
    }

    pub fn texture_id(&self) -> Option<u32> {
        self.lifecycle.widget().and_then(ManagedSurface::texture_id)
    }

    pub fn sequencer_state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn sequencer(&self) -> &WidgetInitSequencer<WidgetHost> {
        &self.sequencer
    }

    /// True once a widget surface has been created and attached.
    pub fn is_initialised(&self) -> bool {
        self.sequencer.is_active()
    }

    pub fn lifecycle(&self) -> &LifecycleCoordinator {
        &self.lifecycle
    }
}
