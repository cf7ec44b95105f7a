//! Pointer gesture routing.
//!
//! Decides what a press, move or release means before the display acts on
//! it. A display is either in selection mode (gestures select text) or in
//! passthrough mode (an application grabbed the mouse and every event becomes
//! a protocol report). Shift forces selection behavior in passthrough mode.

use core_events::{KeyModifiers, MouseButton, MouseButtons, ReportButton};

/// Whether a press over selected text may turn into a drag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    None,
    /// Pressed on selected text at this pixel; not moved far enough yet.
    Pending { x: i32, y: i32 },
    /// Handed to the host's drag loop; pointer moves are ignored.
    Dragging,
}

impl DragState {
    /// True once the pointer left the square of `threshold` pixels around the
    /// press point.
    pub fn exceeded(&self, x: i32, y: i32, threshold: i32) -> bool {
        match *self {
            DragState::Pending { x: sx, y: sy } => {
                x > sx + threshold || x < sx - threshold || y > sy + threshold || y < sy - threshold
            }
            _ => false,
        }
    }
}

/// Inputs to [`classify_press`].
#[derive(Clone, Copy, Debug)]
pub struct Press {
    pub button: MouseButton,
    pub mods: KeyModifiers,
    /// Selection mode (false: passthrough).
    pub selection_mode: bool,
    /// The host reports the cell under the pointer as selected.
    pub over_selection: bool,
    pub ctrl_drag: bool,
    /// A double click happened recently at this spot.
    pub triple_window: bool,
    /// This press completes a double click.
    pub double: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressAction {
    SelectLine,
    SelectWord,
    PendingDrag,
    BeginSelection,
    /// Paste the primary selection, with a trailing return when asked.
    Paste { append_return: bool },
    ContextMenu,
    Report(ReportButton),
}

fn selects(selection_mode: bool, mods: KeyModifiers) -> bool {
    selection_mode || mods.contains(KeyModifiers::SHIFT)
}

pub fn classify_press(p: &Press) -> PressAction {
    let select = selects(p.selection_mode, p.mods);
    match p.button {
        MouseButton::Left if p.triple_window => PressAction::SelectLine,
        MouseButton::Left if p.double => {
            if select {
                PressAction::SelectWord
            } else {
                PressAction::Report(ReportButton::Left)
            }
        }
        MouseButton::Left => {
            let ctrl = p.mods.contains(KeyModifiers::CTRL);
            if p.over_selection && (!p.ctrl_drag || ctrl) {
                PressAction::PendingDrag
            } else if select {
                PressAction::BeginSelection
            } else {
                PressAction::Report(ReportButton::Left)
            }
        }
        MouseButton::Middle if select => PressAction::Paste {
            append_return: p.mods.contains(KeyModifiers::CTRL),
        },
        MouseButton::Middle => PressAction::Report(ReportButton::Middle),
        MouseButton::Right if select => PressAction::ContextMenu,
        MouseButton::Right => PressAction::Report(ReportButton::Right),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveAction {
    Ignore,
    /// Motion report with the button held.
    Report(ReportButton),
    /// The pending drag left its square; start dragging the selection.
    StartDrag,
    ExtendSelection,
}

/// `x`/`y` are pixels; `selecting` is whether a selection gesture is live.
pub fn classify_move(
    buttons: MouseButtons,
    mods: KeyModifiers,
    selection_mode: bool,
    drag: DragState,
    (x, y): (i32, i32),
    threshold: i32,
    selecting: bool,
) -> MoveAction {
    if buttons.is_empty() {
        return MoveAction::Ignore;
    }
    if !selects(selection_mode, mods) {
        let button = if buttons.contains(MouseButtons::RIGHT) {
            ReportButton::Right
        } else if buttons.contains(MouseButtons::MIDDLE) {
            ReportButton::Middle
        } else {
            ReportButton::Left
        };
        return MoveAction::Report(button);
    }
    match drag {
        DragState::Pending { .. } if drag.exceeded(x, y, threshold) => MoveAction::StartDrag,
        DragState::Pending { .. } | DragState::Dragging => MoveAction::Ignore,
        DragState::None if !selecting || buttons.contains(MouseButtons::MIDDLE) => MoveAction::Ignore,
        DragState::None => MoveAction::ExtendSelection,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReleaseAction {
    /// Left button: the selection gesture is over.
    pub finish_selecting: bool,
    /// A pending drag never started; drop the selection.
    pub clear_selection: bool,
    /// Close the live selection range.
    pub end_selection: bool,
    /// Send a release report.
    pub report: bool,
}

pub fn classify_release(
    button: MouseButton,
    mods: KeyModifiers,
    selection_mode: bool,
    drag: DragState,
) -> ReleaseAction {
    let passthrough = !selects(selection_mode, mods);
    let mut action = ReleaseAction::default();
    match button {
        MouseButton::Left => {
            action.finish_selecting = true;
            if matches!(drag, DragState::Pending { .. }) {
                action.clear_selection = true;
            } else {
                action.end_selection = true;
                action.report = passthrough;
            }
        }
        MouseButton::Middle => action.report = !selection_mode,
        MouseButton::Right => action.report = !selection_mode && !mods.contains(KeyModifiers::SHIFT),
    }
    action
}

/// Protocol coordinates: 1-based, line shifted into the emulation's space.
pub fn report_position(column: i32, line: i32, scroll_value: i32, scroll_max: i32) -> (i32, i32) {
    (column + 1, line + 1 + scroll_value - scroll_max)
}

/// Detects the second press of a double click: same cell, within the
/// interval.
#[derive(Clone, Debug)]
pub struct ClickCounter {
    interval_ms: u64,
    last: Option<(u64, i32, i32)>,
}

impl ClickCounter {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Register a left press at `now_ms`. Returns true when it completes a
    /// double click; the press after that starts counting afresh.
    pub fn press(&mut self, now_ms: u64, column: i32, line: i32) -> bool {
        match self.last {
            Some((at, c, l))
                if c == column && l == line && now_ms.saturating_sub(at) <= self.interval_ms =>
            {
                self.last = None;
                true
            }
            _ => {
                self.last = Some((now_ms, column, line));
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
