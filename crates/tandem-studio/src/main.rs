use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use tandem_engine::coords::{Vec2, Viewport};
use tandem_engine::device::{
    AudioBackend, RenderMode, RenderingContext, SurfaceBackend, SurfaceConfig, SurfaceInfo,
    WindowSystem,
};
use tandem_engine::input::{InputBackend, PointerAction, PointerEvent, SceneEntity};
use tandem_engine::logging::{LoggingConfig, init_logging};
use tandem_engine::runtime::{UiCtx, UiLoop};
use tandem_engine::widget::{SequencerConfig, SequencerState, WidgetConfig};
use tandem_engine::{HostConfig, WidgetHost};

/// Every collaborator call, in order.
type Journal = Arc<Mutex<Vec<String>>>;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let context_delay = env_millis("TANDEM_CONTEXT_DELAY_MS")?.unwrap_or(Duration::from_millis(300));
    let context_timeout = env_millis("TANDEM_CONTEXT_TIMEOUT_MS")?;

    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║         TANDEM STUDIO  (headless)      ║");
    println!("  ║   host loop  ·  widget surface bridge  ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    let journal: Journal = Arc::default();
    let config = HostConfig {
        view_width: 1280,
        view_height: 720,
        host_continuous_rendering: false,
        sequencer: SequencerConfig {
            context_timeout,
            ..SequencerConfig::default()
        },
    };

    let mut ui = {
        let journal = Arc::clone(&journal);
        UiLoop::new_with(move |handle| {
            WidgetHost::new(
                handle,
                config,
                Box::new(LogWindow {
                    journal: Arc::clone(&journal),
                }),
                Box::new(LogSurface::new("host", &journal)),
                Arc::new(LogAudio {
                    journal: Arc::clone(&journal),
                }),
            )
        })
    };

    // ── context handshake ────────────────────────────────────────────────
    ui.state()
        .initialize_widget(WidgetConfig::named("dashboard"))
        .context("starting widget initialization")?;

    let slot = ui.state().context_slot();
    let render_thread = thread::Builder::new()
        .name("host-render".to_string())
        .spawn(move || {
            thread::sleep(context_delay);
            if let Some(context) = RenderingContext::from_raw(0x5EED) {
                if let Err(err) = slot.on_context_ready(context) {
                    log::error!("{err}");
                }
            }
        })
        .context("spawning host render thread")?;

    ui.dispatch(|host, ui| host.set_view_size(ui, 1920, 1080));
    wait_for_widget(&mut ui, Duration::from_secs(5))?;
    join_render_thread(render_thread)?;

    // ── input routing ────────────────────────────────────────────────────
    let source = Viewport::new(1920.0, 1080.0);
    let tap = PointerEvent::new(PointerAction::Down, 0, Vec2::new(960.0, 540.0), source);

    let outcome = ui.dispatch(|host, ui| host.on_touch_event(ui, &tap));
    log::info!("tap without pick target: {outcome:?}");

    let panel: Arc<dyn SceneEntity> = Arc::new(Panel { id: 17 });
    ui.dispatch(|host, ui| host.set_picked_object(ui, Some(&panel)));
    let outcome = ui.dispatch(|host, ui| host.on_touch_event(ui, &tap));
    log::info!("tap on picked panel: {outcome:?}");

    // ── lifecycle ────────────────────────────────────────────────────────
    ui.dispatch(|host, ui| host.on_pause(ui, false))?;
    ui.dispatch(|host, ui| host.on_window_focus_changed(ui, false));
    ui.dispatch(|host, ui| host.on_resume(ui))?;
    let resumed_audio = ui.dispatch(|host, ui| host.on_window_focus_changed(ui, true));
    log::info!("audio resumed on focus: {resumed_audio}");

    ui.state().post_runnable(|| log::info!("runnable executed on widget render thread"));
    let ran = ui.state().runnables().run_pending();
    log::debug!("widget render thread ran {ran} runnable(s)");

    WidgetHost::request_exit(&ui.handle()).context("requesting exit")?;
    ui.run();

    println!();
    println!("  Collaborator calls:");
    for entry in journal.lock().iter() {
        println!("    {entry}");
    }
    println!();
    Ok(())
}

/// Pumps the UI loop until the widget is attached or initialization failed.
fn wait_for_widget(ui: &mut UiLoop<WidgetHost>, limit: Duration) -> Result<()> {
    let deadline = Instant::now() + limit;
    loop {
        ui.pump(Duration::from_millis(20));
        match ui.state().sequencer_state() {
            SequencerState::Active => return Ok(()),
            SequencerState::Aborted(reason) => bail!("widget initialization aborted: {reason:?}"),
            _ if Instant::now() >= deadline => bail!("widget not attached after {limit:?}"),
            _ => {}
        }
    }
}

/// Surfaces a panic on the host render thread as an error.
fn join_render_thread(handle: JoinHandle<()>) -> Result<()> {
    if handle.join().is_err() {
        bail!("host render thread panicked");
    }
    Ok(())
}

fn env_millis(name: &str) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(raw) => {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{name} must be a number of milliseconds, got {raw:?}"))?;
            Ok(Some(Duration::from_millis(ms)))
        }
        Err(_) => Ok(None),
    }
}

// ── logging collaborators ────────────────────────────────────────────────

struct LogSurface {
    name: String,
    journal: Journal,
}

impl LogSurface {
    fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: Arc::clone(journal),
        }
    }

    fn record(&self, call: &str) {
        log::info!("[{}] {call}", self.name);
        self.journal.lock().push(format!("{}.{call}", self.name));
    }
}

impl SurfaceBackend for LogSurface {
    fn pause(&mut self) {
        self.record("pause");
    }
    fn resume(&mut self) {
        self.record("resume");
    }
    fn pause_view(&mut self) {
        self.record("pause_view");
    }
    fn resume_view(&mut self) {
        self.record("resume_view");
    }
    fn clear_managed_caches(&mut self) {
        self.record("clear_managed_caches");
    }
    fn destroy(&mut self) {
        self.record("destroy");
    }
    fn texture_id(&self) -> Option<u32> {
        Some(1)
    }
}

struct LogWindow {
    journal: Journal,
}

impl WindowSystem for LogWindow {
    fn create_surface(
        &mut self,
        _ui: &UiCtx<'_>,
        info: &SurfaceInfo,
        config: &SurfaceConfig,
        shared: RenderingContext,
        _mode: Arc<RenderMode>,
    ) -> Result<Box<dyn SurfaceBackend>> {
        self.journal.lock().push(format!(
            "window.create_surface {}x{} shared={:#x}",
            config.width,
            config.height,
            shared.raw()
        ));
        Ok(Box::new(LogSurface::new(
            format!("widget{}", info.id.get()),
            &self.journal,
        )))
    }

    fn attach_to_layout(&mut self, _ui: &UiCtx<'_>, info: &SurfaceInfo) -> Result<()> {
        self.journal
            .lock()
            .push(format!("window.attach_to_layout {}", info.id.get()));
        Ok(())
    }

    fn destroy_surface(&mut self, _ui: &UiCtx<'_>, info: &SurfaceInfo) {
        self.journal
            .lock()
            .push(format!("window.destroy_surface {}", info.id.get()));
    }

    fn create_input(&mut self, _ui: &UiCtx<'_>, _info: &SurfaceInfo) -> Box<dyn InputBackend> {
        Box::new(LogInput {
            journal: Arc::clone(&self.journal),
        })
    }
}

struct LogInput {
    journal: Journal,
}

impl InputBackend for LogInput {
    fn on_touch(&mut self, event: &PointerEvent) {
        self.journal.lock().push(format!(
            "input.touch {:?} ({:.0}, {:.0})",
            event.action, event.position.x, event.position.y
        ));
    }
    fn on_pause(&mut self) {
        self.journal.lock().push("input.pause".to_string());
    }
    fn on_resume(&mut self) {
        self.journal.lock().push("input.resume".to_string());
    }
}

struct LogAudio {
    journal: Journal,
}

impl AudioBackend for LogAudio {
    fn pause(&self) {
        self.journal.lock().push("audio.pause".to_string());
    }
    fn resume(&self) {
        self.journal.lock().push("audio.resume".to_string());
    }
    fn dispose(&self) {
        self.journal.lock().push("audio.dispose".to_string());
    }
}

/// A picked quad; the pick ray hit its upper-left quadrant.
struct Panel {
    id: u64,
}

impl SceneEntity for Panel {
    fn entity_id(&self) -> u64 {
        self.id
    }
    fn hit_uv(&self) -> Option<Vec2> {
        Some(Vec2::new(0.25, 0.25))
    }
}
