//! Outbound display events and the host observer contract.
//!
//! A display never calls into the emulation directly. Every report goes
//! through [`DisplayHost::emit`] in the order it happened, synchronously on
//! the caller's thread.
//!
//! Sequencing contract for selections: `SelectionBegin` is followed by zero
//! or more `SelectionExtend` and is closed by `SelectionEnd`; a new
//! `SelectionBegin` may appear mid-gesture when the drag crosses its anchor.
//! `SelectionClear` may appear at any point and discards the selection.
//!
//! Coordinates in mouse reports are 1-based; selection coordinates are
//! 0-based viewport cells.

use crate::{KeyEvent, KeyModifiers};
use std::collections::VecDeque;

/// Mouse protocol button codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportButton {
    Left = 0,
    Middle = 1,
    Right = 2,
    /// Release, or motion with no button held.
    Release = 3,
}

impl ReportButton {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelDirection {
    Up,
    Down,
}

impl WheelDirection {
    /// Protocol code (4 = up, 5 = down).
    pub fn code(self) -> u8 {
        match self {
            WheelDirection::Up => 4,
            WheelDirection::Down => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    KeyPressed(KeyEvent),
    Mouse {
        button: ReportButton,
        column: i32,
        line: i32,
        motion: bool,
    },
    Wheel {
        direction: WheelDirection,
        column: i32,
        line: i32,
    },
    /// Capacity announcement after a geometry change; the emulation answers
    /// with a fresh image of that size.
    ResizeRequest { columns: usize, lines: usize },
    SelectionBegin {
        column: i32,
        line: i32,
        rectangular: bool,
    },
    SelectionExtend { column: i32, line: i32 },
    SelectionEnd { preserve_line_breaks: bool },
    SelectionClear,
    /// A selection gesture started (`true`) or finished (`false`).
    BusySelecting(bool),
    FlowControl { suspended: bool },
    DroppedText(String),
    /// Selected text is being dragged out; the host runs its drag loop and
    /// then calls `drag_finished` on the display.
    StartDrag { text: String },
    /// Context menu request at a pixel position.
    ConfigureRequest { x: i32, y: i32, mods: KeyModifiers },
    HistoryScrolled(i32),
    FontMetricsChanged { height: i32, width: i32 },
    Beep,
    Notify { visible: bool, message: String },
    /// Move the platform pointer back to this display-local position.
    WarpPointer { x: i32, y: i32 },
}

/// Observer implemented by whatever owns the emulation.
pub trait DisplayHost {
    fn emit(&mut self, event: DisplayEvent);

    /// Whether the emulation considers this 0-based viewport cell part of the
    /// current selection.
    fn is_selected(&self, _column: i32, _line: i32) -> bool {
        false
    }

    /// Text of the current selection, used as a drag payload.
    fn selection_text(&self) -> Option<String> {
        None
    }

    /// Clipboard (or primary selection) contents for middle-click paste.
    fn clipboard_text(&self) -> Option<String> {
        None
    }
}

/// Recording host: queues every event for the owner to poll and keeps a
/// stream-order model of the reported selection so `is_selected` answers
/// consistently with what was emitted.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<DisplayEvent>,
    anchor: Option<(i32, i32)>,
    extent: Option<(i32, i32)>,
    clipboard: Option<String>,
    selection_text: Option<String>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_clipboard(&mut self, text: impl Into<String>) {
        self.clipboard = Some(text.into());
    }

    pub fn set_selection_text(&mut self, text: impl Into<String>) {
        self.selection_text = Some(text.into());
    }

    pub fn pop(&mut self) -> Option<DisplayEvent> {
        self.events.pop_front()
    }

    pub fn drain(&mut self) -> Vec<DisplayEvent> {
        self.events.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Selected span in reading order, both ends inclusive.
    pub fn selected_span(&self) -> Option<((i32, i32), (i32, i32))> {
        let a = self.anchor?;
        let e = self.extent?;
        // (line, column) ordering
        let (a, e) = ((a.1, a.0), (e.1, e.0));
        let (lo, hi) = if a <= e { (a, e) } else { (e, a) };
        Some(((lo.1, lo.0), (hi.1, hi.0)))
    }
}

impl DisplayHost for EventQueue {
    fn emit(&mut self, event: DisplayEvent) {
        match &event {
            DisplayEvent::SelectionBegin { column, line, .. } => {
                self.anchor = Some((*column, *line));
                self.extent = None;
            }
            DisplayEvent::SelectionExtend { column, line } => {
                if self.anchor.is_some() {
                    self.extent = Some((*column, *line));
                }
            }
            DisplayEvent::SelectionClear => {
                self.anchor = None;
                self.extent = None;
            }
            _ => {}
        }
        self.events.push_back(event);
    }

    fn is_selected(&self, column: i32, line: i32) -> bool {
        match self.selected_span() {
            Some(((c0, l0), (c1, l1))) => (line, column) >= (l0, c0) && (line, column) <= (l1, c1),
            None => false,
        }
    }

    fn selection_text(&self) -> Option<String> {
        self.selection_text.clone()
    }

    fn clipboard_text(&self) -> Option<String> {
        self.clipboard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_tracks_reported_selection() {
        let mut q = EventQueue::new();
        q.emit(DisplayEvent::SelectionBegin {
            column: 6,
            line: 0,
            rectangular: false,
        });
        assert!(!q.is_selected(5, 0));
        q.emit(DisplayEvent::SelectionExtend { column: 2, line: 0 });
        assert!(q.is_selected(2, 0));
        assert!(q.is_selected(6, 0));
        assert!(!q.is_selected(7, 0));
        assert_eq!(q.selected_span(), Some(((2, 0), (6, 0))));
        q.emit(DisplayEvent::SelectionClear);
        assert!(!q.is_selected(3, 0));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn extend_without_begin_is_inert() {
        let mut q = EventQueue::new();
        q.emit(DisplayEvent::SelectionExtend { column: 1, line: 1 });
        assert_eq!(q.selected_span(), None);
        assert_eq!(q.drain().len(), 1);
        assert!(q.is_empty());
    }

    #[test]
    fn report_codes() {
        assert_eq!(ReportButton::Release.code(), 3);
        assert_eq!(WheelDirection::Down.code(), 5);
    }
}
