//! Core event types and channel helpers for termview.
//!
//! Two directions meet here:
//! * Inbound: normalized key and pointer input (`InputEvent`, `KeyEvent`,
//!   `PointerEvent`) plus the runtime `Event` enum the demo event loop consumes.
//! * Outbound: `DisplayEvent`s a display reports to its emulation engine,
//!   delivered through the `DisplayHost` observer (see [`display`]).

use std::fmt;
use std::sync::atomic::AtomicU64;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

pub mod display;
pub use display::{DisplayEvent, DisplayHost, EventQueue, ReportButton, WheelDirection};

// The runtime uses a bounded mpsc channel sized by `EVENT_CHANNEL_CAP`; producers
// await capacity instead of dropping input.
pub const EVENT_CHANNEL_CAP: usize = 4096;

pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static CHANNEL_SENDS: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STARTS: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOPS: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    RenderRequested,
    /// Periodic monotonic tick driving display timers (blink, bell, indicators).
    Tick,
    Shutdown,
}

/// Trait implemented by any async event producer. Implementors hold their
/// configuration and spawn one background task that pushes `Event`s into the
/// shared channel, stopping once the channel is closed.
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn all registered sources, each with its own `Sender` clone.
    ///
    /// During shutdown the caller drops its last `Sender` before awaiting the
    /// returned handles so sources observe the closed channel and exit.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Emits `Event::Tick` every configured interval.
pub struct TickEventSource {
    interval: std::time::Duration,
}

impl TickEventSource {
    pub fn new(interval: std::time::Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).await.is_err() {
                    break;
                }
            }
        })
    }
}

/// Normalized input events delivered by the terminal input task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
    Mouse(MouseEvent),
    /// Bracketed or clipboard paste, delivered whole.
    Paste(String),
    FocusGained,
    FocusLost,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    BackTab,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
    /// Text-only event with no key identity (pasted selection).
    Unidentified,
}

/// A key press. `text` is what the key produces when typed; empty for keys
/// that only have an identity (arrows, function keys).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
    pub text: String,
}

impl KeyEvent {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        let text = match code {
            KeyCode::Char(c) if !mods.contains(KeyModifiers::CTRL) => c.to_string(),
            KeyCode::Char(c) if c.is_ascii_alphabetic() => {
                // Ctrl+letter produces the matching C0 control code.
                char::from(c.to_ascii_uppercase() as u8 - b'@').to_string()
            }
            KeyCode::Enter => "\r".to_string(),
            KeyCode::Tab => "\t".to_string(),
            KeyCode::Backspace => "\x7f".to_string(),
            KeyCode::Esc => "\x1b".to_string(),
            _ => String::new(),
        };
        Self { code, mods, text }
    }

    /// Text-only event used to hand pasted text to the emulation.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            code: KeyCode::Unidentified,
            mods: KeyModifiers::empty(),
            text: text.into(),
        }
    }

    pub fn is_ctrl_char(&self, ch: char) -> bool {
        self.mods.contains(KeyModifiers::CTRL)
            && matches!(self.code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&ch))
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

bitflags::bitflags! {
    /// Buttons held while a pointer event occurs.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        const LEFT   = 1;
        const MIDDLE = 2;
        const RIGHT  = 4;
    }
}

impl From<MouseButton> for MouseButtons {
    fn from(b: MouseButton) -> Self {
        match b {
            MouseButton::Left => MouseButtons::LEFT,
            MouseButton::Middle => MouseButtons::MIDDLE,
            MouseButton::Right => MouseButtons::RIGHT,
        }
    }
}

/// Terminal-cell mouse event as reported by the input task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub column: u16,
    pub row: u16,
    pub mods: KeyModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    Drag(MouseButton),
    ScrollUp,
    ScrollDown,
    Moved,
}

/// Pointer event in display-local pixel coordinates.
///
/// `button` is the button that changed state (press/release), `buttons` the
/// set held after the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    pub button: Option<MouseButton>,
    pub buttons: MouseButtons,
    pub mods: KeyModifiers,
}

impl PointerEvent {
    pub fn press(x: i32, y: i32, button: MouseButton, mods: KeyModifiers) -> Self {
        Self {
            x,
            y,
            button: Some(button),
            buttons: button.into(),
            mods,
        }
    }

    pub fn release(x: i32, y: i32, button: MouseButton, mods: KeyModifiers) -> Self {
        Self {
            x,
            y,
            button: Some(button),
            buttons: MouseButtons::empty(),
            mods,
        }
    }

    pub fn moved(x: i32, y: i32, buttons: MouseButtons, mods: KeyModifiers) -> Self {
        Self {
            x,
            y,
            button: None,
            buttons,
            mods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_display() {
        let k = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CTRL);
        let s = format!("{}", k);
        assert!(s.contains("Char"));
    }

    #[test]
    fn key_text_derivation() {
        assert_eq!(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::empty()).text, "a");
        assert_eq!(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CTRL).text, "\x13");
        assert_eq!(KeyEvent::new(KeyCode::Enter, KeyModifiers::empty()).text, "\r");
        assert!(KeyEvent::new(KeyCode::Up, KeyModifiers::empty()).text.is_empty());
        assert!(KeyEvent::new(KeyCode::Char('S'), KeyModifiers::CTRL).is_ctrl_char('s'));
    }

    #[test]
    fn pointer_constructors() {
        let p = PointerEvent::press(3, 4, MouseButton::Middle, KeyModifiers::SHIFT);
        assert_eq!(p.buttons, MouseButtons::MIDDLE);
        let r = PointerEvent::release(3, 4, MouseButton::Middle, KeyModifiers::empty());
        assert!(r.buttons.is_empty());
        assert_eq!(r.button, Some(MouseButton::Middle));
    }
}

#[cfg(test)]
mod tests_async_sources {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct MockOnceSource;

    impl AsyncEventSource for MockOnceSource {
        fn name(&self) -> &'static str {
            "mock_once"
        }
        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            tokio::spawn(async move {
                let _ = tx.send(Event::RenderRequested).await;
            })
        }
    }

    #[tokio::test]
    async fn registry_spawns_and_emits() {
        let (tx, mut rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        reg.register(MockOnceSource);
        reg.register(TickEventSource::new(Duration::from_millis(10)));
        let handles = reg.spawn_all(&tx);
        let mut got_render = false;
        let mut got_tick = false;
        let start = std::time::Instant::now();
        while start.elapsed() < Duration::from_millis(200) && (!got_render || !got_tick) {
            if let Ok(Some(ev)) = tokio::time::timeout(Duration::from_millis(5), rx.recv()).await {
                match ev {
                    Event::RenderRequested => got_render = true,
                    Event::Tick => got_tick = true,
                    _ => {}
                }
            }
        }
        assert!(got_render, "expected mock source to produce a render request");
        assert!(got_tick, "expected tick source to emit tick events");

        drop(tx);
        drop(rx);
        for handle in handles {
            let _ = tokio::time::timeout(Duration::from_millis(20), handle).await;
        }
    }

    struct MockCloseSource {
        flag: Arc<AtomicBool>,
    }

    impl AsyncEventSource for MockCloseSource {
        fn name(&self) -> &'static str {
            "mock_close"
        }

        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            let flag = self.flag;
            tokio::spawn(async move {
                tx.closed().await;
                flag.store(true, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn registry_sources_exit_on_channel_drop() {
        let (tx, rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        let flag = Arc::new(AtomicBool::new(false));
        reg.register(MockCloseSource { flag: flag.clone() });
        let handles = reg.spawn_all(&tx);

        drop(tx);
        drop(rx);

        for handle in handles {
            match tokio::time::timeout(Duration::from_millis(50), handle).await {
                Ok(join_res) => join_res.expect("source task should exit cleanly"),
                Err(_) => panic!("source task did not observe channel closure"),
            }
        }

        assert!(flag.load(Ordering::SeqCst));
    }
}
