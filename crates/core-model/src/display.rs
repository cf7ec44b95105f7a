//! `TerminalDisplay`: the widget a host embeds.
//!
//! Owns one `RenderEngine`, the selection gesture tracker, click and drag
//! state and the timers. Every state change the emulation has to hear about
//! goes out through the `DisplayHost` passed to the call; nothing is queued
//! inside the display. Timers advance only inside `tick`.

use crate::timers::{Clock, SystemClock, TimerKind, Timers};
use core_config::{BellMode, DisplayConfig, ScrollbarLocation};
use core_events::{
    DisplayEvent, DisplayHost, KeyEvent, KeyModifiers, MouseButton, PointerEvent, ReportButton,
    WheelDirection,
};
use core_grid::{Image, LineProperties, Point, WordCharacters};
use core_input::{
    ClickCounter, DragState, DropAction, DropMenu, DropOutcome, DropPayload, MoveAction, Press,
    PressAction, SelectionTracker, SelectionView, classify_move, classify_press, classify_release,
    keys, report_position, resolve_drop,
};
use core_render::paint::PaintSummary;
use core_render::{
    Canvas, ColorEntry, Composition, FontMeasure, ImageUpdate, PaintState, RenderEngine,
};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, trace};

/// Lines the history moves per autoscroll step while dragging a selection
/// past the top or bottom edge.
const AUTOSCROLL_LINES: i32 = 1;

fn view<'a>(engine: &'a RenderEngine, words: &'a WordCharacters) -> SelectionView<'a> {
    SelectionView {
        image: engine.image(),
        props: engine.line_properties(),
        columns: engine.used_columns(),
        lines: engine.used_lines(),
        words,
    }
}

pub struct TerminalDisplay {
    config: DisplayConfig,
    engine: RenderEngine,
    selection: SelectionTracker,
    words: WordCharacters,
    clicks: ClickCounter,
    drag: DragState,
    timers: Timers,
    clock: Box<dyn Clock>,
    epoch: Instant,
    drop_menu: Option<DropMenu>,
    bell_mode: BellMode,
    /// False: an application grabbed the mouse (passthrough).
    selection_mode: bool,
    focused: bool,
    blinking_cursor: bool,
    cursor_blink_off: bool,
    text_blink_off: bool,
    bell_allowed: bool,
    suspended: bool,
    possible_triple: bool,
}

impl TerminalDisplay {
    pub fn new(config: DisplayConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: DisplayConfig, clock: impl Clock + 'static) -> Self {
        let epoch = clock.now();
        let mut display = Self {
            engine: RenderEngine::new(&config),
            selection: SelectionTracker::new(),
            words: WordCharacters::new(config.selection.word_characters.clone()),
            clicks: ClickCounter::new(config.selection.double_click_ms),
            drag: DragState::None,
            timers: Timers::new(),
            clock: Box::new(clock),
            epoch,
            drop_menu: None,
            bell_mode: config.bell.mode,
            selection_mode: true,
            focused: false,
            blinking_cursor: false,
            cursor_blink_off: false,
            text_blink_off: false,
            bell_allowed: true,
            suspended: false,
            possible_triple: false,
            config,
        };
        display.set_blinking_cursor(display.config.blink.cursor);
        display
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    pub fn columns(&self) -> usize {
        self.engine.columns()
    }

    pub fn lines(&self) -> usize {
        self.engine.lines()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_blinking_cursor(&self) -> bool {
        self.blinking_cursor
    }

    pub fn cursor_blink_off(&self) -> bool {
        self.cursor_blink_off
    }

    pub fn text_blink_off(&self) -> bool {
        self.text_blink_off
    }

    pub fn bell_allowed(&self) -> bool {
        self.bell_allowed
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn drop_menu(&self) -> Option<&DropMenu> {
        self.drop_menu.as_ref()
    }

    pub fn is_timer_active(&self, kind: TimerKind) -> bool {
        self.timers.is_active(kind)
    }

    fn now_ms(&self) -> u64 {
        self.clock
            .now()
            .saturating_duration_since(self.epoch)
            .as_millis() as u64
    }

    fn announce(&self, changed: Option<(usize, usize)>, host: &mut dyn DisplayHost) {
        if let Some((columns, lines)) = changed {
            debug!(target: "render.geometry", columns, lines, "resize_request");
            host.emit(DisplayEvent::ResizeRequest { columns, lines });
        }
    }

    // ---- geometry ----

    pub fn set_font(&mut self, font: &dyn FontMeasure, host: &mut dyn DisplayHost) {
        let changed = self.engine.set_font(font);
        let cell = *self.engine.cell_metrics();
        host.emit(DisplayEvent::FontMetricsChanged {
            height: cell.height,
            width: cell.width,
        });
        self.announce(changed, host);
    }

    /// New pixel size of the widget.
    pub fn resize(&mut self, width: i32, height: i32, host: &mut dyn DisplayHost) {
        let changed = self.engine.resize(width, height);
        self.announce(changed, host);
    }

    pub fn set_fixed_size(&mut self, columns: usize, lines: usize, host: &mut dyn DisplayHost) {
        let changed = self.engine.set_fixed_size(columns, lines);
        self.announce(changed, host);
    }

    pub fn set_line_spacing(&mut self, spacing: u16, host: &mut dyn DisplayHost) {
        let changed = self.engine.set_line_spacing(spacing);
        self.announce(changed, host);
    }

    pub fn set_scrollbar_location(&mut self, location: ScrollbarLocation, host: &mut dyn DisplayHost) {
        let changed = self.engine.set_scrollbar_location(location);
        self.announce(changed, host);
    }

    pub fn set_scrollbar_width(&mut self, width: i32, host: &mut dyn DisplayHost) {
        let changed = self.engine.set_scrollbar_width(width);
        self.announce(changed, host);
    }

    // ---- content ----

    /// Push a new frame from the emulation.
    pub fn set_image(&mut self, image: &Image) -> ImageUpdate {
        let update = self.engine.set_image(image);
        let now = self.clock.now();
        if update.report.has_blinker {
            if !self.timers.is_active(TimerKind::TextBlink) {
                self.timers
                    .start_periodic(TimerKind::TextBlink, self.config.blink.text_ms, now);
                trace!(target: "display.timer", timer = "text_blink", "timer_started");
            }
        } else if self.timers.is_active(TimerKind::TextBlink) {
            self.timers.stop(TimerKind::TextBlink);
            self.text_blink_off = false;
            trace!(target: "display.timer", timer = "text_blink", "timer_stopped");
        }
        if update.size_hint.is_some() {
            self.timers
                .start_once(TimerKind::SizeHint, self.config.display.size_hint_ms, now);
        }
        update
    }

    pub fn scroll_image(&mut self, lines: i32) -> bool {
        self.engine.scroll_image(lines)
    }

    pub fn set_line_properties(&mut self, props: LineProperties) {
        self.engine.set_line_properties(props);
    }

    pub fn set_color_table(&mut self, table: &[ColorEntry]) {
        self.engine.set_color_table(table);
    }

    /// History position: `cursor` is the first visible history line,
    /// `lines` the history length.
    pub fn set_scroll(&mut self, cursor: i32, lines: i32) -> bool {
        self.engine.set_scroll(cursor, lines)
    }

    /// Selection mode on: gestures select text. Off: pointer events are
    /// reported to the application.
    pub fn set_selection_mode(&mut self, on: bool) {
        if self.selection_mode != on {
            debug!(target: "input.mouse", selection_mode = on, "mouse_mode_changed");
        }
        self.selection_mode = on;
    }

    pub fn set_composition(&mut self, composition: Composition) {
        self.engine.set_composition(composition);
    }

    pub fn clear_composition(&mut self) {
        self.engine.clear_composition();
    }

    pub fn output_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
        self.engine.set_suspended_banner(suspended);
    }

    // ---- cursor, focus, keys ----

    pub fn set_blinking_cursor(&mut self, blink: bool) {
        self.blinking_cursor = blink;
        if blink && self.focused {
            if !self.timers.is_active(TimerKind::CursorBlink) {
                self.timers.start_periodic(
                    TimerKind::CursorBlink,
                    self.config.blink.cursor_ms,
                    self.clock.now(),
                );
            }
        } else {
            self.timers.stop(TimerKind::CursorBlink);
        }
        self.show_cursor();
    }

    fn show_cursor(&mut self) {
        if self.cursor_blink_off {
            self.cursor_blink_off = false;
            self.engine.invalidate_cursor();
        }
    }

    pub fn focus_in(&mut self) {
        self.focused = true;
        self.engine.invalidate_cursor();
        if self.blinking_cursor {
            self.timers.start_periodic(
                TimerKind::CursorBlink,
                self.config.blink.cursor_ms,
                self.clock.now(),
            );
        }
        self.show_cursor();
    }

    pub fn focus_out(&mut self) {
        self.focused = false;
        self.timers.stop(TimerKind::CursorBlink);
        self.engine.invalidate_cursor();
        self.show_cursor();
    }

    /// Whether this key must reach `key_press` before the host's own
    /// shortcut dispatch.
    pub fn claims_shortcut(&self, key: &KeyEvent) -> bool {
        keys::claims_shortcut(key, self.focused, self.config.display.standalone)
    }

    pub fn key_press(&mut self, key: &KeyEvent, host: &mut dyn DisplayHost) {
        self.selection.reset();
        if self.blinking_cursor && self.focused {
            self.timers.start_periodic(
                TimerKind::CursorBlink,
                self.config.blink.cursor_ms,
                self.clock.now(),
            );
        }
        self.show_cursor();
        if let Some(suspended) = keys::flow_control(key) {
            debug!(target: "input.key", suspended, "flow_control");
            self.output_suspended(suspended);
            host.emit(DisplayEvent::FlowControl { suspended });
        }
        trace!(target: "input.key", len = key.text.len(), mods = ?key.mods, "key_pressed");
        host.emit(DisplayEvent::KeyPressed(key.clone()));
    }

    // ---- bell ----

    pub fn set_bell_mode(&mut self, mode: BellMode) {
        self.bell_mode = mode;
    }

    pub fn bell(&mut self, visible: bool, message: &str, host: &mut dyn DisplayHost) {
        if self.bell_mode == BellMode::None {
            return;
        }
        if !self.bell_allowed {
            trace!(target: "display.bell", "bell_suppressed");
            return;
        }
        let now = self.clock.now();
        self.bell_allowed = false;
        self.timers
            .start_once(TimerKind::BellEnable, self.config.bell.suppress_ms, now);
        debug!(target: "display.bell", mode = ?self.bell_mode, visible, "bell");
        match self.bell_mode {
            BellMode::System => host.emit(DisplayEvent::Beep),
            BellMode::Notify => host.emit(DisplayEvent::Notify {
                visible,
                message: message.to_string(),
            }),
            BellMode::Visual => {
                if !self.timers.is_active(TimerKind::VisualBell) {
                    self.engine.swap_default_colors();
                }
                self.timers
                    .start_once(TimerKind::VisualBell, self.config.bell.visual_ms, now);
            }
            BellMode::None => {}
        }
    }

    // ---- pointer ----

    fn reported(&self, column: i32, line: i32) -> (i32, i32) {
        let bar = self.engine.scrollbar();
        report_position(column, line, bar.value, bar.max)
    }

    fn report(&self, button: ReportButton, x: i32, y: i32, motion: bool, host: &mut dyn DisplayHost) {
        let (column, line) = self.engine.character_position(x, y);
        let (column, line) = self.reported(column, line);
        trace!(target: "input.mouse", button = button.code(), column, line, motion, "mouse_report");
        host.emit(DisplayEvent::Mouse {
            button,
            column,
            line,
            motion,
        });
    }

    pub fn mouse_press(&mut self, ev: PointerEvent, host: &mut dyn DisplayHost) {
        let Some(button) = ev.button else { return };
        let triple_window = button == MouseButton::Left && self.possible_triple;
        if !triple_window && !self.engine.geometry().inner_rect().contains(ev.x, ev.y) {
            return;
        }
        let (column, line) = self.engine.character_position(ev.x, ev.y);
        let here = Point::new(column, line);
        let double = if button == MouseButton::Left && !triple_window {
            let now = self.now_ms();
            self.clicks.press(now, column, line)
        } else {
            false
        };
        let over_selection = button == MouseButton::Left && host.is_selected(column, line);
        let action = classify_press(&Press {
            button,
            mods: ev.mods,
            selection_mode: self.selection_mode,
            over_selection,
            ctrl_drag: self.config.selection.ctrl_drag,
            triple_window,
            double,
        });
        trace!(target: "input.mouse", ?action, column, line, "press");
        let scroll = self.engine.scrollbar().value;
        match action {
            PressAction::SelectLine => {
                let v = view(&self.engine, &self.words);
                let from_word = self.config.selection.cut_to_beginning_of_line;
                self.selection.select_line(here, scroll, from_word, &v, host);
            }
            PressAction::SelectWord => {
                let v = view(&self.engine, &self.words);
                self.selection.select_word(here, scroll, &v, host);
                self.possible_triple = true;
                self.timers.start_once(
                    TimerKind::TripleClick,
                    self.config.selection.double_click_ms,
                    self.clock.now(),
                );
            }
            PressAction::PendingDrag => {
                host.emit(DisplayEvent::BusySelecting(true));
                self.drag = DragState::Pending { x: ev.x, y: ev.y };
            }
            PressAction::BeginSelection => {
                host.emit(DisplayEvent::BusySelecting(true));
                self.drag = DragState::None;
                self.selection.set_modifiers(ev.mods);
                self.selection.begin(here, scroll, host);
            }
            PressAction::Report(ReportButton::Left) if !double => {
                host.emit(DisplayEvent::BusySelecting(true));
                self.drag = DragState::None;
                self.selection.set_modifiers(ev.mods);
                self.report(ReportButton::Left, ev.x, ev.y, false, host);
            }
            PressAction::Report(b) => self.report(b, ev.x, ev.y, false, host),
            PressAction::Paste { append_return } => self.paste_selection(append_return, host),
            PressAction::ContextMenu => host.emit(DisplayEvent::ConfigureRequest {
                x: ev.x,
                y: ev.y,
                mods: ev.mods & (KeyModifiers::SHIFT | KeyModifiers::CTRL),
            }),
        }
    }

    fn paste_selection(&mut self, append_return: bool, host: &mut dyn DisplayHost) {
        let clipboard = host.clipboard_text();
        if let Some(text) = keys::paste_text(clipboard.as_deref(), append_return) {
            debug!(target: "input.mouse", len = text.len(), "paste");
            host.emit(DisplayEvent::KeyPressed(KeyEvent::text(text)));
            host.emit(DisplayEvent::SelectionClear);
        }
    }

    pub fn mouse_move(&mut self, ev: PointerEvent, host: &mut dyn DisplayHost) {
        let action = classify_move(
            ev.buttons,
            ev.mods,
            self.selection_mode,
            self.drag,
            (ev.x, ev.y),
            self.config.selection.drag_threshold,
            self.selection.is_selecting(),
        );
        match action {
            MoveAction::Ignore => {}
            MoveAction::Report(b) => self.report(b, ev.x, ev.y, true, host),
            MoveAction::StartDrag => {
                let text = host.selection_text().unwrap_or_default();
                host.emit(DisplayEvent::BusySelecting(false));
                host.emit(DisplayEvent::SelectionClear);
                self.drag = DragState::Dragging;
                debug!(target: "input.mouse", len = text.len(), "drag_started");
                host.emit(DisplayEvent::StartDrag { text });
            }
            MoveAction::ExtendSelection => self.extend_selection(ev.x, ev.y, host),
        }
    }

    /// Clamp the pointer into the used text block, autoscroll at its top
    /// and bottom edges and move the selection end.
    fn extend_selection(&mut self, x: i32, y: i32, host: &mut dyn DisplayHost) {
        let g = *self.engine.geometry();
        let right = g.bx + self.engine.used_columns() as i32 * g.cell_width;
        let top = g.by;
        let bottom = g.by + self.engine.used_lines() as i32 * g.cell_height - 1;

        let mut px = x;
        let mut py = y;
        if px < g.bx {
            px = g.bx;
        }
        if px > right - 1 {
            px = right;
        }
        if py < top {
            py = top;
        }
        if py > bottom {
            py = bottom;
        }
        if (px, py) != (x, y) {
            host.emit(DisplayEvent::WarpPointer { x: px, y: py });
        }

        let mut autoscrolled = false;
        if py == bottom
            && let Some(value) = self.engine.nudge_scroll(AUTOSCROLL_LINES)
        {
            host.emit(DisplayEvent::HistoryScrolled(value));
            autoscrolled = true;
        }
        if py == top
            && let Some(value) = self.engine.nudge_scroll(-AUTOSCROLL_LINES)
        {
            host.emit(DisplayEvent::HistoryScrolled(value));
            autoscrolled = true;
        }

        let (column, line) = self.engine.character_position(px, py);
        let scroll = self.engine.scrollbar().value;
        let v = view(&self.engine, &self.words);
        self.selection
            .extend(Point::new(column, line), scroll, autoscrolled, &v, host);
    }

    pub fn mouse_release(&mut self, ev: PointerEvent, host: &mut dyn DisplayHost) {
        let Some(button) = ev.button else { return };
        let action = classify_release(button, ev.mods, self.selection_mode, self.drag);
        if action.finish_selecting {
            host.emit(DisplayEvent::BusySelecting(false));
        }
        if action.clear_selection {
            host.emit(DisplayEvent::SelectionClear);
        }
        if action.end_selection {
            self.selection.release(host);
        }
        if action.report {
            self.report(ReportButton::Release, ev.x, ev.y, false, host);
        }
        if button == MouseButton::Left {
            self.drag = DragState::None;
        }
    }

    /// The host's drag loop ended.
    pub fn drag_finished(&mut self) {
        self.drag = DragState::None;
    }

    pub fn wheel(&mut self, direction: WheelDirection, x: i32, y: i32, host: &mut dyn DisplayHost) {
        if self.selection_mode {
            let lines = self.config.selection.wheel_lines;
            let delta = match direction {
                WheelDirection::Up => -lines,
                WheelDirection::Down => lines,
            };
            if let Some(value) = self.engine.nudge_scroll(delta) {
                host.emit(DisplayEvent::HistoryScrolled(value));
            }
            return;
        }
        let (column, line) = self.engine.character_position(x, y);
        let (column, line) = self.reported(column, line);
        host.emit(DisplayEvent::Wheel {
            direction,
            column,
            line,
        });
    }

    // ---- drag and drop ----

    /// Text and mail drops are sent right away; file and URL drops park a
    /// menu until `activate_drop`.
    pub fn drop_payload(&mut self, payload: DropPayload, host: &mut dyn DisplayHost) -> Option<&DropMenu> {
        match resolve_drop(payload) {
            DropOutcome::Paste(text) => {
                self.drop_menu = None;
                if !text.is_empty() {
                    host.emit(DisplayEvent::DroppedText(text));
                }
                None
            }
            DropOutcome::Menu(menu) => {
                self.drop_menu = Some(menu);
                self.drop_menu.as_ref()
            }
        }
    }

    /// Run `action` from the parked menu. False when there is no menu or the
    /// action is disabled; the menu stays parked in the latter case.
    pub fn activate_drop(
        &mut self,
        action: DropAction,
        is_dir: impl Fn(&Path) -> Option<bool>,
        host: &mut dyn DisplayHost,
    ) -> bool {
        let Some(menu) = self.drop_menu.take() else {
            return false;
        };
        match menu.activate(action, is_dir) {
            Some(text) => {
                host.emit(DisplayEvent::DroppedText(text));
                true
            }
            None => {
                self.drop_menu = Some(menu);
                false
            }
        }
    }

    // ---- timers ----

    /// Fire expired timers. Returns whether anything waits to be painted.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        for kind in self.timers.expire(now) {
            trace!(target: "display.timer", timer = ?kind, "timer_fired");
            match kind {
                TimerKind::TextBlink => {
                    self.text_blink_off = !self.text_blink_off;
                    self.engine.invalidate_blinking();
                }
                TimerKind::CursorBlink => {
                    self.cursor_blink_off = !self.cursor_blink_off;
                    self.engine.invalidate_cursor();
                }
                TimerKind::BellEnable => self.bell_allowed = true,
                TimerKind::VisualBell => self.engine.swap_default_colors(),
                TimerKind::SizeHint => self.engine.hide_size_hint(),
                TimerKind::TripleClick => self.possible_triple = false,
            }
        }
        self.engine.has_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // ---- painting ----

    /// Paint pending damage. `None` when nothing was pending.
    pub fn paint(&mut self, canvas: &mut dyn Canvas) -> Option<PaintSummary> {
        self.engine.paint(
            canvas,
            PaintState {
                text_blink_off: self.text_blink_off,
                cursor_blink_off: self.cursor_blink_off,
                focused: self.focused,
            },
        )
    }

    pub fn print(&self, canvas: &mut dyn Canvas, friendly: bool, exact: bool) -> PaintSummary {
        self.engine.print(canvas, friendly, exact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timers::ManualClock;
    use core_events::{EventQueue, KeyCode, MouseButtons};
    use core_grid::{Cell, Rendition};
    use core_render::{FixedFont, RecordingCanvas};

    const CW: i32 = 8;
    const CH: i32 = 16;

    fn display(columns: i32, lines: i32) -> (TerminalDisplay, ManualClock, EventQueue) {
        let mut config = DisplayConfig::default();
        config.display.scrollbar = ScrollbarLocation::None;
        let clock = ManualClock::new();
        let mut d = TerminalDisplay::with_clock(config, clock.clone());
        let mut host = EventQueue::new();
        d.set_font(&FixedFont::new("mono", CW, CH, 12), &mut host);
        d.resize(columns * CW + 2, lines * CH + 1, &mut host);
        host.drain();
        (d, clock, host)
    }

    /// Pixel at the middle of a cell.
    fn px(column: i32, line: i32) -> (i32, i32) {
        (1 + column * CW + CW / 2, 1 + line * CH + CH / 2)
    }

    fn click(d: &mut TerminalDisplay, host: &mut EventQueue, column: i32, line: i32, mods: KeyModifiers) {
        let (x, y) = px(column, line);
        d.mouse_press(PointerEvent::press(x, y, MouseButton::Left, mods), host);
        d.mouse_release(PointerEvent::release(x, y, MouseButton::Left, mods), host);
    }

    #[test]
    fn font_and_resize_announce_grid() {
        let mut d = TerminalDisplay::with_clock(DisplayConfig::default(), ManualClock::new());
        let mut host = EventQueue::new();
        d.set_font(&FixedFont::new("mono", CW, CH, 12), &mut host);
        assert_eq!(
            host.pop(),
            Some(DisplayEvent::FontMetricsChanged {
                height: CH,
                width: CW
            })
        );
        host.drain();
        d.set_scrollbar_location(ScrollbarLocation::None, &mut host);
        host.drain();
        d.resize(20 * CW + 2, 5 * CH + 1, &mut host);
        assert_eq!(
            host.drain(),
            vec![DisplayEvent::ResizeRequest {
                columns: 20,
                lines: 5
            }]
        );
        d.resize(20 * CW + 2, 5 * CH + 1, &mut host);
        assert!(host.is_empty());
    }

    #[test]
    fn double_click_selects_word_then_triple_selects_line() {
        let (mut d, clock, mut host) = display(20, 3);
        d.set_image(&Image::from_lines(20, &["foo bar baz"]));
        click(&mut d, &mut host, 5, 0, KeyModifiers::empty());
        clock.advance(100);
        click(&mut d, &mut host, 5, 0, KeyModifiers::empty());
        assert_eq!(host.selected_span(), Some(((4, 0), (6, 0))));
        assert!(d.is_timer_active(TimerKind::TripleClick));

        clock.advance(100);
        host.drain();
        click(&mut d, &mut host, 1, 0, KeyModifiers::empty());
        let span = host.selected_span().expect("line selected");
        assert_eq!(span.0, (0, 0));
        assert_eq!(span.1.1, 0);
    }

    #[test]
    fn triple_window_closes_after_timeout() {
        let (mut d, clock, mut host) = display(20, 3);
        d.set_image(&Image::from_lines(20, &["foo bar"]));
        click(&mut d, &mut host, 1, 0, KeyModifiers::empty());
        click(&mut d, &mut host, 1, 0, KeyModifiers::empty());
        clock.advance(400);
        d.tick();
        assert!(!d.is_timer_active(TimerKind::TripleClick));
        host.drain();
        let (x, y) = px(1, 0);
        d.mouse_press(PointerEvent::press(x, y, MouseButton::Left, KeyModifiers::empty()), &mut host);
        assert!(!host.iter().any(|e| matches!(e, DisplayEvent::SelectionExtend { .. })));
    }

    #[test]
    fn drag_selection_reports_begin_and_end() {
        let (mut d, _clock, mut host) = display(20, 3);
        d.set_image(&Image::from_lines(20, &["hello world"]));
        let (x0, y0) = px(1, 0);
        let (x1, y1) = px(7, 0);
        d.mouse_press(PointerEvent::press(x0, y0, MouseButton::Left, KeyModifiers::empty()), &mut host);
        d.mouse_move(PointerEvent::moved(x1, y1, MouseButtons::LEFT, KeyModifiers::empty()), &mut host);
        d.mouse_release(PointerEvent::release(x1, y1, MouseButton::Left, KeyModifiers::empty()), &mut host);
        let events = host.drain();
        assert_eq!(events[0], DisplayEvent::BusySelecting(true));
        assert!(events.contains(&DisplayEvent::SelectionBegin {
            column: 1,
            line: 0,
            rectangular: false
        }));
        assert!(events.iter().any(|e| matches!(e, DisplayEvent::SelectionEnd { .. })));
        assert!(events.contains(&DisplayEvent::BusySelecting(false)));
    }

    #[test]
    fn passthrough_reports_are_one_based() {
        let (mut d, _clock, mut host) = display(20, 5);
        d.set_image(&Image::new(5, 20));
        d.set_selection_mode(false);
        let (x, y) = px(3, 2);
        d.mouse_press(PointerEvent::press(x, y, MouseButton::Right, KeyModifiers::empty()), &mut host);
        d.mouse_release(PointerEvent::release(x, y, MouseButton::Right, KeyModifiers::empty()), &mut host);
        assert_eq!(
            host.drain(),
            vec![
                DisplayEvent::Mouse {
                    button: ReportButton::Right,
                    column: 4,
                    line: 3,
                    motion: false
                },
                DisplayEvent::Mouse {
                    button: ReportButton::Release,
                    column: 4,
                    line: 3,
                    motion: false
                },
            ]
        );
        d.wheel(WheelDirection::Up, x, y, &mut host);
        assert_eq!(
            host.pop(),
            Some(DisplayEvent::Wheel {
                direction: WheelDirection::Up,
                column: 4,
                line: 3
            })
        );
    }

    #[test]
    fn shift_selects_in_passthrough() {
        let (mut d, _clock, mut host) = display(20, 5);
        d.set_image(&Image::from_lines(20, &["abc"]));
        d.set_selection_mode(false);
        let (x, y) = px(0, 0);
        d.mouse_press(PointerEvent::press(x, y, MouseButton::Left, KeyModifiers::SHIFT), &mut host);
        assert!(!host.iter().any(|e| matches!(e, DisplayEvent::Mouse { .. })));
        assert!(d.selection().is_selecting());
    }

    #[test]
    fn middle_click_pastes_clipboard() {
        let (mut d, _clock, mut host) = display(20, 3);
        d.set_image(&Image::new(3, 20));
        host.set_clipboard("ls\n-l");
        let (x, y) = px(0, 0);
        d.mouse_press(PointerEvent::press(x, y, MouseButton::Middle, KeyModifiers::CTRL), &mut host);
        assert_eq!(
            host.drain(),
            vec![
                DisplayEvent::KeyPressed(KeyEvent::text("ls\r-l\r")),
                DisplayEvent::SelectionClear,
            ]
        );
    }

    #[test]
    fn right_click_requests_context_menu() {
        let (mut d, _clock, mut host) = display(20, 3);
        d.set_image(&Image::new(3, 20));
        let (x, y) = px(2, 1);
        d.mouse_press(
            PointerEvent::press(x, y, MouseButton::Right, KeyModifiers::SHIFT | KeyModifiers::ALT),
            &mut host,
        );
        assert_eq!(
            host.pop(),
            Some(DisplayEvent::ConfigureRequest {
                x,
                y,
                mods: KeyModifiers::SHIFT
            })
        );
    }

    #[test]
    fn dragging_selected_text_starts_drag() {
        let (mut d, _clock, mut host) = display(20, 3);
        d.set_image(&Image::from_lines(20, &["foo bar"]));
        host.emit(DisplayEvent::SelectionBegin {
            column: 0,
            line: 0,
            rectangular: false,
        });
        host.emit(DisplayEvent::SelectionExtend { column: 2, line: 0 });
        host.set_selection_text("foo");
        host.drain();

        let (x, y) = px(1, 0);
        d.mouse_press(PointerEvent::press(x, y, MouseButton::Left, KeyModifiers::empty()), &mut host);
        assert_eq!(d.drag_state(), DragState::Pending { x, y });
        d.mouse_move(PointerEvent::moved(x + 2, y, MouseButtons::LEFT, KeyModifiers::empty()), &mut host);
        assert!(matches!(d.drag_state(), DragState::Pending { .. }));
        d.mouse_move(PointerEvent::moved(x + 10, y, MouseButtons::LEFT, KeyModifiers::empty()), &mut host);
        assert_eq!(d.drag_state(), DragState::Dragging);
        assert_eq!(
            host.drain(),
            vec![
                DisplayEvent::BusySelecting(true),
                DisplayEvent::BusySelecting(false),
                DisplayEvent::SelectionClear,
                DisplayEvent::StartDrag { text: "foo".into() },
            ]
        );
        d.drag_finished();
        assert_eq!(d.drag_state(), DragState::None);
    }

    #[test]
    fn bell_is_rate_limited() {
        let (mut d, clock, mut host) = display(10, 2);
        d.bell(false, "", &mut host);
        d.bell(false, "", &mut host);
        assert_eq!(host.drain(), vec![DisplayEvent::Beep]);
        clock.advance(500);
        d.tick();
        assert!(d.bell_allowed());
        d.set_bell_mode(BellMode::Notify);
        d.bell(true, "done", &mut host);
        assert_eq!(
            host.drain(),
            vec![DisplayEvent::Notify {
                visible: true,
                message: "done".into()
            }]
        );
    }

    #[test]
    fn visual_bell_swaps_and_restores_colors() {
        let (mut d, clock, mut host) = display(10, 2);
        d.set_bell_mode(BellMode::Visual);
        let fg = d.engine().palette().default_foreground();
        d.bell(true, "", &mut host);
        assert!(host.is_empty());
        assert_eq!(d.engine().palette().default_background(), fg);
        clock.advance(200);
        d.tick();
        assert_eq!(d.engine().palette().default_foreground(), fg);
    }

    #[test]
    fn bell_mode_none_is_silent() {
        let (mut d, _clock, mut host) = display(10, 2);
        d.set_bell_mode(BellMode::None);
        d.bell(true, "x", &mut host);
        assert!(host.is_empty());
        assert!(d.bell_allowed());
    }

    #[test]
    fn text_blink_timer_follows_blinking_cells() {
        let (mut d, clock, _host) = display(10, 2);
        let mut img = Image::from_lines(10, &["blink"]);
        let cell = Cell::new('b').with_rendition(Rendition::BLINK);
        img.set(0, 0, cell);
        d.set_image(&img);
        assert!(d.is_timer_active(TimerKind::TextBlink));
        clock.advance(500);
        d.tick();
        assert!(d.text_blink_off());

        d.set_image(&Image::from_lines(10, &["plain"]));
        assert!(!d.is_timer_active(TimerKind::TextBlink));
        assert!(!d.text_blink_off());
    }

    #[test]
    fn cursor_blinks_only_while_focused() {
        let (mut d, clock, mut host) = display(10, 2);
        d.set_blinking_cursor(true);
        assert!(!d.is_timer_active(TimerKind::CursorBlink));
        d.focus_in();
        assert!(d.is_timer_active(TimerKind::CursorBlink));
        clock.advance(1000);
        d.tick();
        assert!(d.cursor_blink_off());

        d.key_press(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::empty()), &mut host);
        assert!(!d.cursor_blink_off());
        d.focus_out();
        assert!(!d.is_timer_active(TimerKind::CursorBlink));
    }

    #[test]
    fn flow_control_keys_toggle_banner() {
        let (mut d, _clock, mut host) = display(40, 4);
        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CTRL);
        d.key_press(&ctrl_s, &mut host);
        assert!(d.is_suspended());
        assert!(d.engine().is_suspended_banner_shown());
        assert_eq!(
            host.drain(),
            vec![
                DisplayEvent::FlowControl { suspended: true },
                DisplayEvent::KeyPressed(ctrl_s),
            ]
        );
        d.key_press(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CTRL), &mut host);
        assert!(!d.is_suspended());
    }

    #[test]
    fn size_hint_hides_after_timeout() {
        let (mut d, clock, mut host) = display(10, 4);
        d.set_image(&Image::new(4, 10));
        d.resize(12 * CW + 2, 4 * CH + 1, &mut host);
        let update = d.set_image(&Image::new(4, 12));
        assert_eq!(update.size_hint, Some((12, 4)));
        assert!(d.is_timer_active(TimerKind::SizeHint));
        clock.advance(3000);
        assert!(d.tick());
        assert!(d.engine().size_hint().is_none());
    }

    #[test]
    fn autoscroll_at_bottom_edge() {
        let (mut d, _clock, mut host) = display(10, 3);
        d.set_image(&Image::from_lines(10, &["a", "b", "c"]));
        d.set_scroll(0, 10);
        let (x, y) = px(0, 0);
        d.mouse_press(PointerEvent::press(x, y, MouseButton::Left, KeyModifiers::empty()), &mut host);
        host.drain();
        d.mouse_move(PointerEvent::moved(x, 500, MouseButtons::LEFT, KeyModifiers::empty()), &mut host);
        let events = host.drain();
        assert!(matches!(events[0], DisplayEvent::WarpPointer { .. }));
        assert_eq!(events[1], DisplayEvent::HistoryScrolled(1));
    }

    #[test]
    fn wheel_in_selection_mode_scrolls_history() {
        let (mut d, _clock, mut host) = display(10, 3);
        d.set_image(&Image::new(3, 10));
        d.set_scroll(5, 10);
        let (x, y) = px(0, 0);
        d.wheel(WheelDirection::Up, x, y, &mut host);
        assert_eq!(host.drain(), vec![DisplayEvent::HistoryScrolled(2)]);
    }

    #[test]
    fn dropped_file_waits_for_menu() {
        let (mut d, _clock, mut host) = display(10, 3);
        let menu = d
            .drop_payload(DropPayload::Urls(vec!["file:///tmp/a".into()]), &mut host)
            .expect("menu");
        assert_eq!(menu.file_count(), 1);
        assert!(host.is_empty());
        assert!(d.activate_drop(DropAction::Copy, |_| None, &mut host));
        assert_eq!(
            host.drain(),
            vec![DisplayEvent::DroppedText("kfmclient copy '/tmp/a' .\n".into())]
        );
        assert!(!d.activate_drop(DropAction::Copy, |_| None, &mut host));

        d.drop_payload(DropPayload::Text("echo".into()), &mut host);
        assert_eq!(host.drain(), vec![DisplayEvent::DroppedText("echo".into())]);
    }

    #[test]
    fn claims_override_keys_when_focused() {
        let (mut d, _clock, _host) = display(10, 3);
        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::empty());
        assert!(!d.claims_shortcut(&tab));
        d.focus_in();
        assert!(d.claims_shortcut(&tab));
        assert!(d.claims_shortcut(&KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CTRL)));
    }

    #[test]
    fn paint_draws_pushed_text() {
        let (mut d, _clock, _host) = display(10, 2);
        d.set_image(&Image::from_lines(10, &["hi"]));
        let mut canvas = RecordingCanvas::new();
        let summary = d.paint(&mut canvas).expect("first frame paints");
        assert!(summary.runs > 0);
        assert!(canvas.texts().iter().any(|t| t.starts_with("hi")));
        assert!(d.paint(&mut canvas).is_none());
    }
}
