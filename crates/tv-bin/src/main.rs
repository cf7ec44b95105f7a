//! termview entrypoint.
use anyhow::Result;
use clap::{Parser, ValueEnum};
use core_config::{Config, load_from};
use core_events::{
    EVENT_CHANNEL_CAP, Event, EventSourceRegistry, InputEvent, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseButtons, MouseEvent, MouseEventKind, PointerEvent, TickEventSource,
    WheelDirection,
};
use core_input::{CrosstermInputSource, InputShutdown, paste_text};
use core_model::{Layout, LayoutRegion, Orientation, PaneSplitter, TerminalDisplay};
use core_render::{Canvas, CrosstermCanvas, FixedFont, Rect};
use core_terminal::{CrosstermBackend, TerminalBackend, TerminalCapabilities};
use std::fmt;
use std::io::{Stdout, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod echo;
mod pane_canvas;

use echo::{EchoSession, banner};
use pane_canvas::PaneCanvas;

const TICK_INTERVAL: Duration = Duration::from_millis(50);

#[inline]
fn log_paste(content: &str) {
    debug!(
        target: "input.paste",
        size_bytes = content.len(),
        line_count = content.lines().count(),
        "paste_commit"
    );
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Split {
    /// Side by side.
    H,
    /// Stacked.
    V,
}

impl From<Split> for Orientation {
    fn from(s: Split) -> Self {
        match s {
            Split::H => Orientation::Horizontal,
            Split::V => Orientation::Vertical,
        }
    }
}

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "termview", version, about = "Terminal display demo")]
struct Args {
    /// Configuration file path (overrides discovery of `termview.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Add a pane next to the newest one; repeat for more panes.
    #[arg(long = "split", value_enum)]
    split: Vec<Split>,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

struct RuntimeContext<'a> {
    config: Config,
    splits: Vec<Split>,
    capabilities: TerminalCapabilities,
    size: (u16, u16),
    terminal_guard: core_terminal::TerminalGuard<'a>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn run<'a>(&'a mut self) -> Result<RuntimeContext<'a>> {
        let args = Args::parse();
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        let config_override = args.config.is_some();
        let config = load_from(args.config.clone())?;
        let capabilities = TerminalCapabilities::detect();
        self.backend.set_title("termview")?;
        let size = self.backend.size()?;
        let guard = self.backend.enter_guard()?;

        info!(
            target: "runtime.startup",
            panes = args.split.len() + 1,
            config_override,
            truecolor = capabilities.truecolor,
            width = size.0,
            height = size.1,
            "bootstrap_complete"
        );

        Ok(RuntimeContext {
            config,
            splits: args.split,
            capabilities,
            size,
            terminal_guard: guard,
        })
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("termview.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "termview.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        if tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
            .is_ok()
        {
            self.log_guard = Some(guard);
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

enum LoopControl {
    Continue,
    Break { reason: ShutdownReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    CtrlC,
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CtrlC => "ctrl_c",
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

/// One display and the emulation behind it.
struct Pane {
    display: TerminalDisplay,
    session: EchoSession,
    region: LayoutRegion,
}

impl Pane {
    fn new(config: &Config) -> Self {
        let mut display = TerminalDisplay::new(config.file.clone());
        let mut session = EchoSession::new(banner());
        display.set_font(&FixedFont::cell_units(), &mut session);
        // one terminal column is the narrowest bar a cell canvas can show
        display.set_scrollbar_width(1, &mut session);
        Self {
            display,
            session,
            region: LayoutRegion::default(),
        }
    }

    fn place(&mut self, region: LayoutRegion) {
        self.region = region;
        self.display
            .resize(region.width as i32, region.height as i32, &mut self.session);
    }

    fn area(&self) -> Rect {
        Rect::new(
            self.region.x as i32,
            self.region.y as i32,
            self.region.width as i32,
            self.region.height as i32,
        )
    }

    /// Push whatever the emulation changed into the display.
    fn sync(&mut self, bell: &mut bool) {
        for _ in 0..self.session.take_rings() {
            self.display.bell(true, "Bell in termview", &mut self.session);
        }
        if self.session.take_beeps() > 0 {
            *bell = true;
        }
        if self.session.take_drag_started() {
            self.display.drag_finished();
        }
        if self.session.take_dirty() {
            let frame = self.session.frame();
            if frame.shifted != 0 {
                self.display.scroll_image(frame.shifted);
            }
            self.display.set_line_properties(frame.props);
            self.display.set_scroll(frame.cursor, frame.history);
            let update = self.display.set_image(&frame.image);
            trace!(
                target: "runtime",
                runs = update.report.runs.len(),
                dirty_rows = update.report.dirty_rows.len(),
                shifted = frame.shifted,
                "frame_pushed"
            );
        }
    }
}

struct TermviewRuntime<'a> {
    panes: Vec<Pane>,
    tree: PaneSplitter<usize>,
    layout: Layout<usize>,
    canvas: CrosstermCanvas<Stdout>,
    /// Pane that owns the pointer while a button is held.
    grab: Option<usize>,
    held: MouseButtons,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<tokio::task::JoinHandle<()>>,
    input_shutdown: Option<InputShutdown>,
    _terminal_guard: core_terminal::TerminalGuard<'a>,
}

impl<'a> TermviewRuntime<'a> {
    fn new(
        context: RuntimeContext<'a>,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
        input_shutdown: InputShutdown,
        source_handles: Vec<tokio::task::JoinHandle<()>>,
    ) -> Self {
        let RuntimeContext {
            config,
            splits,
            capabilities,
            size,
            terminal_guard,
        } = context;

        let mut tree = PaneSplitter::new(Orientation::Horizontal);
        let mut panes = vec![Pane::new(&config)];
        tree.add_container(0, Orientation::Horizontal);
        for split in splits {
            let id = panes.len();
            tree.set_focus(Some(id - 1));
            tree.add_container(id, split.into());
            panes.push(Pane::new(&config));
        }
        let focus = panes.len() - 1;
        tree.set_focus(Some(focus));
        panes[focus].display.focus_in();

        let canvas = CrosstermCanvas::new(stdout(), size.0, size.1, capabilities.truecolor);
        let mut runtime = Self {
            panes,
            tree,
            layout: Layout::new(Vec::new()),
            canvas,
            grab: None,
            held: MouseButtons::empty(),
            rx,
            tx: Some(tx),
            source_handles,
            input_shutdown: Some(input_shutdown),
            _terminal_guard: terminal_guard,
        };
        runtime.relayout(size.0, size.1);
        runtime
    }

    fn relayout(&mut self, width: u16, height: u16) {
        self.layout = self.tree.layout(LayoutRegion::new(0, 0, width, height));
        for (id, region) in self.layout.panes() {
            if let Some(pane) = self.panes.get_mut(*id) {
                pane.place(*region);
            }
        }
        debug!(target: "runtime", width, height, panes = self.layout.panes().len(), "relayout");
    }

    fn active(&self) -> Option<usize> {
        self.tree.active_container()
    }

    fn focus(&mut self, id: usize) {
        let previous = self.active();
        if previous == Some(id) {
            return;
        }
        if let Some(pane) = previous.and_then(|p| self.panes.get_mut(p)) {
            pane.display.focus_out();
        }
        self.tree.set_focus(Some(id));
        if let Some(pane) = self.panes.get_mut(id) {
            pane.display.focus_in();
        }
    }

    async fn run(&mut self) -> Result<()> {
        self.present();

        let span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter_loop = span.enter();

        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            let control = match &event {
                Event::Input(input) => self.handle_input_event(input),
                Event::RenderRequested => LoopControl::Continue,
                Event::Tick => self.handle_tick(),
                Event::Shutdown => LoopControl::Break {
                    reason: ShutdownReason::ShutdownEvent,
                },
            };
            match control {
                LoopControl::Break { reason } => {
                    shutdown_reason = reason;
                    break;
                }
                LoopControl::Continue => self.present(),
            }
        }

        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        Ok(())
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        if let Some(shutdown) = self.input_shutdown.take() {
            trace!(target: "runtime.shutdown", reason = reason.as_str(), "input_task_shutdown_signal");
            shutdown.signal();
        }
        if let Some(tx) = self.tx.take() {
            drop(tx);
        }
        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_stopped"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "event_source_task_error"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }
        log_shutdown_stage(reason, "complete");
    }

    fn handle_input_event(&mut self, input: &InputEvent) -> LoopControl {
        match input {
            InputEvent::Key(key) => return self.handle_key(key),
            InputEvent::Resize(w, h) => {
                self.canvas.resize(*w, *h);
                self.relayout(*w, *h);
            }
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse),
            InputEvent::Paste(text) => {
                log_paste(text);
                if let Some(text) = paste_text(Some(text.as_str()), false)
                    && let Some(pane) = self.active().and_then(|id| self.panes.get_mut(id))
                {
                    pane.display
                        .key_press(&KeyEvent::text(text), &mut pane.session);
                }
            }
            InputEvent::FocusGained => {
                if let Some(pane) = self.active().and_then(|id| self.panes.get_mut(id)) {
                    pane.display.focus_in();
                }
            }
            InputEvent::FocusLost => {
                if let Some(pane) = self.active().and_then(|id| self.panes.get_mut(id)) {
                    pane.display.focus_out();
                }
            }
        }
        LoopControl::Continue
    }

    fn handle_key(&mut self, key: &KeyEvent) -> LoopControl {
        if key.code == KeyCode::Char('c') && key.mods.contains(KeyModifiers::CTRL) {
            return LoopControl::Break {
                reason: ShutdownReason::CtrlC,
            };
        }
        let Some(pane) = self.active().and_then(|id| self.panes.get_mut(id)) else {
            return LoopControl::Continue;
        };
        if key.code == KeyCode::F(2) {
            let on = !pane.display.selection_mode();
            pane.display.set_selection_mode(on);
            return LoopControl::Continue;
        }
        if !pane.display.claims_shortcut(key) {
            trace!(target: "input.key", code = ?key.code, "unclaimed_key");
        }
        pane.display.key_press(key, &mut pane.session);
        LoopControl::Continue
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) {
        let target = match (mouse.kind, self.grab) {
            (MouseEventKind::Down(_), _) | (MouseEventKind::Moved, None) => None,
            (_, grab) => grab,
        }
        .or_else(|| {
            self.layout
                .pane_at(mouse.column, mouse.row)
                .map(|(id, _)| id)
        });
        let Some(id) = target else { return };
        if matches!(mouse.kind, MouseEventKind::Down(_)) {
            self.focus(id);
            self.grab = Some(id);
        }
        let Some(pane) = self.panes.get_mut(id) else {
            return;
        };
        let (x, y) = pane.region.local(mouse.column, mouse.row);
        let mods = mouse.mods;
        match mouse.kind {
            MouseEventKind::Down(button) => {
                self.held |= MouseButtons::from(button);
                pane.display
                    .mouse_press(PointerEvent::press(x, y, button, mods), &mut pane.session);
            }
            MouseEventKind::Drag(button) => {
                self.held |= MouseButtons::from(button);
                pane.display
                    .mouse_move(PointerEvent::moved(x, y, self.held, mods), &mut pane.session);
            }
            MouseEventKind::Moved => {
                pane.display.mouse_move(
                    PointerEvent::moved(x, y, MouseButtons::empty(), mods),
                    &mut pane.session,
                );
            }
            MouseEventKind::Up(button) => {
                self.held.remove(MouseButtons::from(button));
                if self.held.is_empty() {
                    self.grab = None;
                }
                pane.display
                    .mouse_release(PointerEvent::release(x, y, button, mods), &mut pane.session);
            }
            MouseEventKind::ScrollUp => {
                pane.display
                    .wheel(WheelDirection::Up, x, y, &mut pane.session);
            }
            MouseEventKind::ScrollDown => {
                pane.display
                    .wheel(WheelDirection::Down, x, y, &mut pane.session);
            }
        }
        if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
            trace!(target: "input.mouse", pane = id, x, y, "left_press_routed");
        }
    }

    fn handle_tick(&mut self) -> LoopControl {
        for pane in &mut self.panes {
            pane.display.tick();
        }
        LoopControl::Continue
    }

    /// Sync every pane, paint what changed and flush once.
    fn present(&mut self) {
        let mut bell = false;
        let mut painted = false;
        for pane in &mut self.panes {
            pane.sync(&mut bell);
            let area = pane.area();
            let canvas: &mut dyn Canvas = &mut self.canvas;
            let mut view = PaneCanvas::new(canvas, area);
            painted |= pane.display.paint(&mut view).is_some();
        }
        if painted {
            match self.canvas.present() {
                Ok(stats) => trace!(
                    target: "render.paint",
                    print_commands = stats.print_commands,
                    cells = stats.cells_printed,
                    "present"
                ),
                Err(err) => error!(target: "render.paint", ?err, "present_failed"),
            }
        }
        if bell {
            let mut out = stdout();
            if let Err(err) = out.write_all(b"\x07").and_then(|_| out.flush()) {
                warn!(target: "display.bell", %err, "beep_failed");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    let context = startup.run()?;
    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (input, input_shutdown) = CrosstermInputSource::new();
    let mut registry = EventSourceRegistry::new();
    registry.register(input);
    registry.register(TickEventSource::new(TICK_INTERVAL));
    let source_handles = registry.spawn_all(&tx);

    let mut runtime = TermviewRuntime::new(context, tx, rx, input_shutdown, source_handles);
    runtime.run().await
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::Subscriber;
    use tracing::dispatcher::Dispatch;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::Registry;

    #[derive(Clone, Default)]
    struct Capture {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    #[derive(Clone, Debug)]
    struct CapturedEvent {
        target: String,
        fields: Vec<(String, String)>,
    }

    #[derive(Default)]
    struct FieldCollector {
        fields: Vec<(String, String)>,
    }

    impl Visit for FieldCollector {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S> Layer<S> for Capture
    where
        S: Subscriber,
    {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut collector = FieldCollector::default();
            event.record(&mut collector);
            let meta = event.metadata();
            self.events.lock().unwrap().push(CapturedEvent {
                target: meta.target().to_string(),
                fields: collector.fields,
            });
        }
    }

    #[test]
    fn paste_log_redacts_content() {
        let capture = Capture::default();
        let events = capture.events.clone();
        let subscriber = Registry::default().with(capture);
        let dispatcher = Dispatch::new(subscriber);

        tracing::dispatcher::with_default(&dispatcher, || {
            super::log_paste("secret token\nsecond line");
        });

        let events = events.lock().unwrap();
        let event = events
            .iter()
            .find(|e| e.target == "input.paste")
            .expect("missing input.paste event");
        assert!(event.fields.iter().any(|(name, _)| name == "size_bytes"));
        assert!(event.fields.iter().any(|(name, _)| name == "line_count"));
        for (_, value) in &event.fields {
            assert!(!value.contains("secret"), "event leaked paste content: {value}");
        }
    }

    #[test]
    fn split_args_parse() {
        use clap::Parser;
        let args = super::Args::parse_from(["termview", "--split", "h", "--split", "v"]);
        assert_eq!(args.split, vec![super::Split::H, super::Split::V]);
        assert!(args.config.is_none());
    }

    #[test]
    fn pane_syncs_frames_into_display() {
        let config = core_config::Config::default();
        let mut pane = super::Pane::new(&config);
        pane.place(core_model::LayoutRegion::new(0, 0, 60, 20));
        let mut bell = false;
        pane.sync(&mut bell);
        assert_eq!(pane.session.size(), (pane.display.columns(), pane.display.lines()));
        assert!(pane.display.engine().image().row_text(0).starts_with("termview"));
        assert!(!bell);
    }
}
