//! Line-echo emulation feeding one display.
//!
//! Typed text is echoed on a prompt line; Enter commits it to the history.
//! Committed lines soft-wrap at the display width, so long lines exercise
//! wrapped-line selection. The session is the `DisplayHost` of its display:
//! it keeps the selection the display reports, answers `is_selected` and
//! paints selected cells reversed in the frames it produces.

use core_events::{DisplayEvent, DisplayHost};
use core_grid::{
    CONTINUATION, Cell, CellColor, Image, LineProperties, LineProperty, Rendition, char_width,
};
use std::mem;
use tracing::{debug, info, trace};
use unicode_segmentation::UnicodeSegmentation;

const PROMPT: &str = "$ ";

/// One frame ready for `TerminalDisplay::set_image`.
pub struct Frame {
    pub image: Image,
    pub props: LineProperties,
    /// First visible history row.
    pub cursor: i32,
    /// Rows above the last page.
    pub history: i32,
    /// Rows the view moved since the last frame at the same size.
    pub shifted: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Span {
    anchor: (usize, usize),
    extent: Option<(usize, usize)>,
    rectangular: bool,
}

pub struct EchoSession {
    lines: Vec<Vec<Cell>>,
    input: String,
    columns: usize,
    rows: usize,
    /// First visible physical row.
    top: usize,
    follow: bool,
    last_top: Option<usize>,
    selection: Option<Span>,
    clipboard: Option<String>,
    suspended: bool,
    held: Vec<String>,
    dirty: bool,
    drag_started: bool,
    /// BEL characters received; the runtime rings the display bell.
    rings: usize,
    /// `Beep` requests from the display.
    beeps: usize,
}

fn cells(text: &str, template: Cell) -> Vec<Cell> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let cell = Cell { ch, ..template };
        out.push(cell);
        if char_width(ch) == 2 {
            out.push(cell.continuation());
        }
    }
    out
}

fn plain(text: &str) -> Vec<Cell> {
    cells(text, Cell::BLANK)
}

/// Demo lines shown above the prompt.
pub fn banner() -> Vec<Vec<Cell>> {
    let mut palette = plain("colors ");
    for i in 0..8u8 {
        let sample = Cell::BLANK.with_bg(CellColor::System(i));
        palette.extend(cells("  ", sample));
    }
    palette.extend(plain(" "));
    for i in 0..8u8 {
        let sample = Cell::BLANK
            .with_fg(CellColor::System(i))
            .with_rendition(Rendition::BOLD);
        palette.extend(cells("#", sample));
    }

    let mut styles = plain("styles ");
    styles.extend(cells("bold", Cell::BLANK.with_rendition(Rendition::BOLD)));
    styles.extend(plain(" "));
    styles.extend(cells("underline", Cell::BLANK.with_rendition(Rendition::UNDERLINE)));
    styles.extend(plain(" "));
    styles.extend(cells("reverse", Cell::BLANK.with_rendition(Rendition::REVERSE)));
    styles.extend(plain(" "));
    styles.extend(cells(
        "blink",
        Cell::BLANK
            .with_fg(CellColor::System(1))
            .with_rendition(Rendition::BLINK),
    ));
    styles.extend(plain(" "));
    styles.extend(cells("rgb", Cell::BLANK.with_fg(CellColor::Rgb(0xFF, 0x80, 0x00))));

    vec![
        plain("termview - type to echo, Enter commits, Ctrl+C quits"),
        plain("F2 mouse reports, Ctrl+G bell, Ctrl+S/Ctrl+Q flow control"),
        palette,
        styles,
        plain("boxes  ┌──┬──┐ ╔══╗ ┏━━┓ ╭──╮"),
        plain("       │ab│cd│ ║ef║ ┃gh┃ │ij│"),
        plain("       └──┴──┘ ╚══╝ ┗━━┛ ╰──╯"),
        plain("wide   漢字かな ＡＢＣ"),
        Vec::new(),
    ]
}

impl EchoSession {
    pub fn new(banner: Vec<Vec<Cell>>) -> Self {
        Self {
            lines: banner,
            input: String::new(),
            columns: 1,
            rows: 1,
            top: 0,
            follow: true,
            last_top: None,
            selection: None,
            clipboard: None,
            suspended: false,
            held: Vec::new(),
            dirty: true,
            drag_started: false,
            rings: 0,
            beeps: 0,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    pub fn take_dirty(&mut self) -> bool {
        mem::take(&mut self.dirty)
    }

    /// The display asked the host to run a drag; the demo has no drag loop.
    pub fn take_drag_started(&mut self) -> bool {
        mem::take(&mut self.drag_started)
    }

    pub fn take_rings(&mut self) -> usize {
        mem::take(&mut self.rings)
    }

    pub fn take_beeps(&mut self) -> usize {
        mem::take(&mut self.beeps)
    }

    #[cfg(test)]
    pub fn input(&self) -> &str {
        &self.input
    }

    fn prompt_line(&self) -> Vec<Cell> {
        let mut line = plain(PROMPT);
        line.extend(plain(&self.input));
        line
    }

    /// Physical rows with their wrapped flag. The last logical line is the
    /// prompt.
    fn layout(&self) -> Vec<(Vec<Cell>, bool)> {
        let width = self.columns.max(1);
        let prompt = self.prompt_line();
        let mut out = Vec::new();
        for line in self.lines.iter().chain(std::iter::once(&prompt)) {
            if line.is_empty() {
                out.push((Vec::new(), false));
                continue;
            }
            let mut row: Vec<Cell> = Vec::with_capacity(width);
            let mut i = 0;
            while i < line.len() {
                let cell = line[i];
                let wide = line.get(i + 1).is_some_and(Cell::is_continuation);
                let need = if wide { 2 } else { 1 };
                if row.len() + need > width && !row.is_empty() {
                    out.push((mem::take(&mut row), true));
                }
                row.push(cell);
                if wide {
                    row.push(line[i + 1]);
                    i += 1;
                }
                i += 1;
            }
            out.push((row, false));
        }
        out
    }

    fn history(&self, total: usize) -> usize {
        total.saturating_sub(self.rows)
    }

    fn follow_bottom(&mut self) {
        if self.follow {
            let total = self.layout().len();
            self.top = self.history(total);
        }
    }

    fn type_text(&mut self, text: &str) {
        if self.suspended {
            self.held.push(text.to_string());
            return;
        }
        for ch in text.chars() {
            match ch {
                '\r' | '\n' => {
                    let line = self.prompt_line();
                    self.lines.push(line);
                    self.input.clear();
                }
                '\x7f' | '\x08' => {
                    if let Some((at, _)) = self.input.grapheme_indices(true).next_back() {
                        self.input.truncate(at);
                    }
                }
                '\x07' => self.rings += 1,
                c if c.is_control() => {}
                c => self.input.push(c),
            }
        }
        self.follow = true;
        self.follow_bottom();
        self.dirty = true;
    }

    fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
        if !suspended {
            for text in mem::take(&mut self.held) {
                self.type_text(&text);
            }
        }
    }

    fn ordered(&self) -> Option<((usize, usize), (usize, usize), bool)> {
        let span = self.selection?;
        let extent = span.extent?;
        let (a, b) = ((span.anchor.1, span.anchor.0), (extent.1, extent.0));
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Some(((lo.1, lo.0), (hi.1, hi.0), span.rectangular))
    }

    /// Selection test in absolute row coordinates.
    fn covers(&self, column: usize, row: usize) -> bool {
        let Some((lo, hi, rectangular)) = self.ordered() else {
            return false;
        };
        if rectangular {
            let (c0, c1) = (lo.0.min(hi.0), lo.0.max(hi.0));
            return (lo.1..=hi.1).contains(&row) && (c0..=c1).contains(&column);
        }
        (row, column) >= (lo.1, lo.0) && (row, column) <= (hi.1, hi.0)
    }

    fn selected_text(&self, preserve_line_breaks: bool) -> Option<String> {
        let (lo, hi, rectangular) = self.ordered()?;
        let rows = self.layout();
        let mut out = String::new();
        for (r, (row, wrapped)) in rows.iter().enumerate().take(hi.1 + 1).skip(lo.1) {
            let (from, to) = if rectangular {
                (lo.0.min(hi.0), lo.0.max(hi.0))
            } else {
                (
                    if r == lo.1 { lo.0 } else { 0 },
                    if r == hi.1 { hi.0 } else { usize::MAX },
                )
            };
            let text: String = row
                .iter()
                .enumerate()
                .filter(|(c, cell)| *c >= from && *c <= to && cell.ch != CONTINUATION)
                .map(|(_, cell)| cell.ch)
                .collect();
            out.push_str(if *wrapped && !rectangular {
                &text
            } else {
                text.trim_end()
            });
            if r < hi.1 && (rectangular || !*wrapped) {
                out.push(if preserve_line_breaks { '\n' } else { ' ' });
            }
        }
        Some(out)
    }

    /// Render the visible page.
    pub fn frame(&mut self) -> Frame {
        let rows = self.layout();
        let history = self.history(rows.len());
        self.top = self.top.min(history);
        let mut image = Image::new(self.rows, self.columns);
        let mut props = LineProperties::new();
        let prompt_row = rows.len().saturating_sub(1);
        for y in 0..self.rows {
            let r = self.top + y;
            let Some((row, wrapped)) = rows.get(r) else {
                break;
            };
            for (x, cell) in row.iter().enumerate().take(self.columns) {
                let mut cell = *cell;
                if self.covers(x, r) {
                    cell.rendition.toggle(Rendition::REVERSE);
                }
                image.set(y, x, cell);
            }
            if *wrapped {
                props.set(y, LineProperty::WRAPPED);
            }
            if r == prompt_row && !self.suspended {
                let x = row.len().min(self.columns.saturating_sub(1));
                if let Some(cell) = image.get_mut(y, x) {
                    cell.rendition.insert(Rendition::CURSOR);
                }
            }
        }
        let shifted = match self.last_top {
            Some(last) => self.top as i32 - last as i32,
            None => 0,
        };
        self.last_top = Some(self.top);
        Frame {
            image,
            props,
            cursor: self.top as i32,
            history: history as i32,
            shifted,
        }
    }
}

impl DisplayHost for EchoSession {
    fn emit(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::KeyPressed(key) => self.type_text(&key.text),
            DisplayEvent::DroppedText(text) => {
                debug!(target: "input.dnd", len = text.len(), "dropped_text");
                self.type_text(&text);
            }
            DisplayEvent::Mouse {
                button,
                column,
                line,
                motion,
            } => {
                let code = button.code() + if motion { 32 } else { 0 };
                self.type_text(&format!("[M{code};{column};{line}]"));
            }
            DisplayEvent::Wheel {
                direction,
                column,
                line,
            } => {
                self.type_text(&format!("[W{};{column};{line}]", direction.code()));
            }
            DisplayEvent::ResizeRequest { columns, lines } => {
                self.columns = columns.max(1);
                self.rows = lines.max(1);
                self.last_top = None;
                self.selection = None;
                self.follow_bottom();
                self.dirty = true;
            }
            DisplayEvent::SelectionBegin {
                column,
                line,
                rectangular,
            } => {
                let row = (line.max(0) as usize) + self.top;
                self.selection = Some(Span {
                    anchor: (column.max(0) as usize, row),
                    extent: None,
                    rectangular,
                });
                self.dirty = true;
            }
            DisplayEvent::SelectionExtend { column, line } => {
                let row = (line.max(0) as usize) + self.top;
                if let Some(span) = &mut self.selection {
                    span.extent = Some((column.max(0) as usize, row));
                    self.dirty = true;
                }
            }
            DisplayEvent::SelectionEnd {
                preserve_line_breaks,
            } => {
                if let Some(text) = self.selected_text(preserve_line_breaks) {
                    trace!(target: "input.selection", len = text.len(), "selection_copied");
                    self.clipboard = Some(text);
                }
            }
            DisplayEvent::SelectionClear => {
                if self.selection.take().is_some() {
                    self.dirty = true;
                }
            }
            DisplayEvent::FlowControl { suspended } => self.set_suspended(suspended),
            DisplayEvent::HistoryScrolled(value) => {
                let total = self.layout().len();
                self.top = (value.max(0) as usize).min(self.history(total));
                self.follow = self.top == self.history(total);
                self.dirty = true;
            }
            DisplayEvent::StartDrag { text } => {
                debug!(target: "input.mouse", len = text.len(), "drag_requested");
                self.drag_started = true;
            }
            DisplayEvent::Beep => self.beeps += 1,
            DisplayEvent::Notify { visible, message } => {
                info!(target: "display.bell", visible, message = message.as_str(), "notify");
            }
            DisplayEvent::ConfigureRequest { x, y, mods } => {
                debug!(target: "input.mouse", x, y, ?mods, "context_menu");
            }
            DisplayEvent::BusySelecting(_)
            | DisplayEvent::FontMetricsChanged { .. }
            | DisplayEvent::WarpPointer { .. } => {}
        }
    }

    fn is_selected(&self, column: i32, line: i32) -> bool {
        if column < 0 || line < 0 {
            return false;
        }
        self.covers(column as usize, line as usize + self.top)
    }

    fn selection_text(&self) -> Option<String> {
        self.selected_text(true)
    }

    fn clipboard_text(&self) -> Option<String> {
        self.clipboard.clone()
    }
}
