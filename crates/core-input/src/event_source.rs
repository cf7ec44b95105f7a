//! Terminal input source backed by `crossterm::EventStream`.

use core_events::{
    ASYNC_INPUT_STARTS, ASYNC_INPUT_STOPS, AsyncEventSource, CHANNEL_SEND_FAILURES, CHANNEL_SENDS,
    Event, InputEvent, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::event::{
    Event as CEvent, EventStream, KeyCode as CKeyCode, KeyEvent as CKeyEvent,
    KeyEventKind as CKind, KeyModifiers as CMods, MouseButton as CButton,
    MouseEvent as CMouseEvent, MouseEventKind as CMouseKind,
};
use std::io;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{info, trace, warn};

/// Requests the input task to stop.
#[derive(Clone, Debug)]
pub struct InputShutdown {
    notify: Arc<Notify>,
}

impl InputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

/// Registry entry forwarding terminal input as `Event::Input`.
pub struct CrosstermInputSource {
    notify: Arc<Notify>,
}

impl CrosstermInputSource {
    pub fn new() -> (Self, InputShutdown) {
        let notify = Arc::new(Notify::new());
        (
            Self {
                notify: notify.clone(),
            },
            InputShutdown { notify },
        )
    }
}

impl AsyncEventSource for CrosstermInputSource {
    fn name(&self) -> &'static str {
        "crossterm_input"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let notify = self.notify;
        tokio::spawn(async move {
            InputTask::new(tx, EventStream::new(), notify).run().await;
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

struct InputTask<S> {
    sender: Sender<Event>,
    stream: S,
    shutdown: Arc<Notify>,
}

impl<S> InputTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<Event>, stream: S, shutdown: Arc<Notify>) -> Self {
        Self {
            sender,
            stream,
            shutdown,
        }
    }

    async fn run(mut self) -> ExitReason {
        info!(target: "input.thread", "input_task_started");
        ASYNC_INPUT_STARTS.fetch_add(1, Ordering::Relaxed);
        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.notified() => break ExitReason::ShutdownSignal,
                next = self.stream.next() => next,
            };
            let event = match next {
                None => break ExitReason::StreamEnded,
                Some(Err(err)) => {
                    warn!(target: "input.thread", error_kind = ?err.kind(), "input_stream_error");
                    break ExitReason::StreamError;
                }
                Some(Ok(event)) => event,
            };
            let Some(input) = map_event(event) else {
                continue;
            };
            if self.sender.send(Event::Input(input)).await.is_err() {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                break ExitReason::ChannelClosed;
            }
            CHANNEL_SENDS.fetch_add(1, Ordering::Relaxed);
        };
        ASYNC_INPUT_STOPS.fetch_add(1, Ordering::Relaxed);
        info!(target: "input.thread", reason = reason.as_str(), "input_task_stopped");
        reason
    }
}

pub fn map_event(event: CEvent) -> Option<InputEvent> {
    match event {
        CEvent::Key(key) => map_key(&key).map(InputEvent::Key),
        CEvent::Mouse(mouse) => map_mouse(&mouse).map(InputEvent::Mouse),
        CEvent::Resize(w, h) => {
            trace!(target: "input.event", w, h, "resize");
            Some(InputEvent::Resize(w, h))
        }
        CEvent::Paste(text) => {
            trace!(target: "input.paste", len = text.len(), "paste_event");
            Some(InputEvent::Paste(text))
        }
        CEvent::FocusGained => Some(InputEvent::FocusGained),
        CEvent::FocusLost => Some(InputEvent::FocusLost),
    }
}

pub fn map_mods(m: CMods) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    if m.contains(CMods::CONTROL) {
        out |= KeyModifiers::CTRL;
    }
    if m.contains(CMods::ALT) {
        out |= KeyModifiers::ALT;
    }
    if m.contains(CMods::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    out
}

pub fn map_key(key: &CKeyEvent) -> Option<KeyEvent> {
    if !matches!(key.kind, CKind::Press | CKind::Repeat) {
        return None;
    }
    let mods = map_mods(key.modifiers);
    let code = match key.code {
        CKeyCode::Char(c) => KeyCode::Char(c),
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Esc => KeyCode::Esc,
        CKeyCode::Backspace => KeyCode::Backspace,
        CKeyCode::Tab => KeyCode::Tab,
        CKeyCode::BackTab => KeyCode::BackTab,
        CKeyCode::Delete => KeyCode::Delete,
        CKeyCode::Insert => KeyCode::Insert,
        CKeyCode::Up => KeyCode::Up,
        CKeyCode::Down => KeyCode::Down,
        CKeyCode::Left => KeyCode::Left,
        CKeyCode::Right => KeyCode::Right,
        CKeyCode::Home => KeyCode::Home,
        CKeyCode::End => KeyCode::End,
        CKeyCode::PageUp => KeyCode::PageUp,
        CKeyCode::PageDown => KeyCode::PageDown,
        CKeyCode::F(n) => KeyCode::F(n),
        _ => return None,
    };
    trace!(target: "input.event", kind = "keypress", mods = ?mods);
    Some(KeyEvent::new(code, mods))
}

fn map_button(b: CButton) -> MouseButton {
    match b {
        CButton::Left => MouseButton::Left,
        CButton::Middle => MouseButton::Middle,
        CButton::Right => MouseButton::Right,
    }
}

pub fn map_mouse(m: &CMouseEvent) -> Option<MouseEvent> {
    let kind = match m.kind {
        CMouseKind::Down(b) => MouseEventKind::Down(map_button(b)),
        CMouseKind::Up(b) => MouseEventKind::Up(map_button(b)),
        CMouseKind::Drag(b) => MouseEventKind::Drag(map_button(b)),
        CMouseKind::Moved => MouseEventKind::Moved,
        CMouseKind::ScrollUp => MouseEventKind::ScrollUp,
        CMouseKind::ScrollDown => MouseEventKind::ScrollDown,
        CMouseKind::ScrollLeft | CMouseKind::ScrollRight => return None,
    };
    Some(MouseEvent {
        kind,
        column: m.column,
        row: m.row,
        mods: map_mods(m.modifiers),
    })
}
