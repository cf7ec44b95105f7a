//! Pixel rectangles and the cell grid laid over the widget.

use crate::font::CellMetrics;
use core_config::ScrollbarLocation;

/// Width reserved for the scrollbar when it is shown.
pub const SCROLLBAR_WIDTH: i32 = 16;
/// Blank margin around the text block.
pub const RIM: i32 = 1;

/// Axis-aligned pixel rectangle; `right()`/`bottom()` are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        if r <= x || b <= y {
            Rect::default()
        } else {
            Rect::new(x, y, r - x, b - y)
        }
    }

    /// Bounding box of both; an empty side is ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let r = self.right().max(other.right());
        let b = self.bottom().max(other.bottom());
        Rect::new(x, y, r - x, b - y)
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Where the text grid sits inside the widget and how large it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Whole widget area.
    pub widget: Rect,
    /// Text origin.
    pub bx: i32,
    pub by: i32,
    pub content_width: i32,
    pub content_height: i32,
    pub cell_width: i32,
    pub cell_height: i32,
    pub columns: usize,
    pub lines: usize,
    pub scrollbar: Option<Rect>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            widget: Rect::default(),
            bx: RIM,
            by: RIM,
            content_width: 0,
            content_height: 0,
            cell_width: 1,
            cell_height: 1,
            columns: 1,
            lines: 1,
            scrollbar: None,
        }
    }
}

impl Geometry {
    /// Lay the grid over a `width x height` widget. Degenerate sizes clamp to
    /// a 1x1 grid. `fixed` pins the grid dimensions regardless of pixels.
    pub fn calc(
        width: i32,
        height: i32,
        cell: &CellMetrics,
        location: ScrollbarLocation,
        fixed: Option<(usize, usize)>,
    ) -> Self {
        Self::calc_with_bar(width, height, cell, location, SCROLLBAR_WIDTH, fixed)
    }

    /// `calc` with an explicit scrollbar width (text-cell backends use one
    /// column).
    pub fn calc_with_bar(
        width: i32,
        height: i32,
        cell: &CellMetrics,
        location: ScrollbarLocation,
        bar_width: i32,
        fixed: Option<(usize, usize)>,
    ) -> Self {
        let widget = Rect::new(0, 0, width.max(0), height.max(0));
        let (bx, content_width, scrollbar) = match location {
            ScrollbarLocation::None => (RIM, widget.width - 2 * RIM, None),
            ScrollbarLocation::Left => (
                RIM + bar_width,
                widget.width - 2 * RIM - bar_width,
                Some(Rect::new(0, 0, bar_width, widget.height)),
            ),
            ScrollbarLocation::Right => (
                RIM,
                widget.width - 2 * RIM - bar_width,
                Some(Rect::new(widget.width - bar_width, 0, bar_width, widget.height)),
            ),
        };
        let by = RIM;
        let content_height = widget.height - 2 * RIM + 1;
        let cell_width = cell.width.max(1);
        let cell_height = cell.height.max(1);
        let (columns, lines) = match fixed {
            Some((c, l)) => (c.max(1), l.max(1)),
            None => (
                (content_width / cell_width).max(1) as usize,
                (content_height / cell_height).max(1) as usize,
            ),
        };
        Self {
            widget,
            bx,
            by,
            content_width: content_width.max(0),
            content_height: content_height.max(0),
            cell_width,
            cell_height,
            columns,
            lines,
            scrollbar,
        }
    }

    /// Pixel rectangle of `len` cells starting at `(column, line)`.
    pub fn cells_rect(&self, column: usize, line: usize, len: usize) -> Rect {
        Rect::new(
            self.bx + self.cell_width * column as i32,
            self.by + self.cell_height * line as i32,
            self.cell_width * len as i32,
            self.cell_height,
        )
    }

    /// Rectangle covering `lines x columns` cells from the origin.
    pub fn block_rect(&self, columns: usize, lines: usize) -> Rect {
        Rect::new(
            self.bx,
            self.by,
            self.cell_width * columns as i32,
            self.cell_height * lines as i32,
        )
    }

    /// Area the emulation occupies including the rim.
    pub fn emulation_rect(&self) -> Rect {
        Rect::new(
            0,
            0,
            self.columns as i32 * self.cell_width + 2 * RIM,
            self.lines as i32 * self.cell_height + 2 * RIM,
        )
    }

    /// The emulation block placed at the text origin (rim included).
    pub fn emulation_area(&self) -> Rect {
        self.emulation_rect().translate(self.bx - RIM, self.by - RIM)
    }

    /// Widget area without the scrollbar.
    pub fn inner_rect(&self) -> Rect {
        match self.scrollbar {
            Some(bar) if bar.x == 0 => Rect::new(
                bar.width,
                0,
                self.widget.width - bar.width,
                self.widget.height,
            ),
            Some(bar) => Rect::new(0, 0, self.widget.width - bar.width, self.widget.height),
            None => self.widget,
        }
    }

    /// Strips of the inner area not covered by the emulation block.
    pub fn margins(&self) -> Vec<Rect> {
        let inner = self.inner_rect();
        let emu = self.emulation_area();
        let strips = [
            // top
            Rect::new(inner.x, inner.y, inner.width, emu.y - inner.y),
            // bottom
            Rect::new(inner.x, emu.bottom(), inner.width, inner.bottom() - emu.bottom()),
            // left
            Rect::new(inner.x, emu.y, emu.x - inner.x, emu.height),
            // right
            Rect::new(emu.right(), emu.y, inner.right() - emu.right(), emu.height),
        ];
        strips.into_iter().filter(|r| !r.is_empty()).collect()
    }

    /// Cell under a widget-relative pixel, unclamped (may be negative or
    /// past the grid).
    pub fn raw_cell_at(&self, x: i32, y: i32) -> (i32, i32) {
        (
            (x - self.bx).div_euclid(self.cell_width),
            (y - self.by).div_euclid(self.cell_height),
        )
    }

    /// Cell under a pixel clamped to `[0, used - 1]` on each axis.
    pub fn character_position(&self, x: i32, y: i32, used_columns: usize, used_lines: usize) -> (i32, i32) {
        let (column, line) = self.raw_cell_at(x, y);
        let max_c = used_columns.max(1) as i32 - 1;
        let max_l = used_lines.max(1) as i32 - 1;
        (column.clamp(0, max_c), line.clamp(0, max_l))
    }

    /// Text rectangle the pointer is confined to while selecting.
    pub fn text_rect(&self) -> Rect {
        Rect::new(self.bx, self.by, self.content_width, self.content_height)
    }
}
