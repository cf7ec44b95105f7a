//! Crossterm canvas: a `Canvas` over a terminal, one pixel per cell.
//!
//! Paint calls land in a back buffer of terminal cells. `flush` compares it
//! with the buffer as last flushed and emits only changed cells, batching
//! consecutive cells of one row that share a style into a single `Print`
//! (same batching rule as a plain text writer: any style change or gap
//! starts a new command).
//!
//! Cell mapping:
//! * `fill_rect` sets the background and blanks the glyph.
//! * `draw_text` places glyphs (wide glyphs claim two cells) and keeps the
//!   background already painted.
//! * Box drawing, underline and bold are native cell attributes here, so the
//!   stroke based decorations of pixel canvases are overridden.
//! * `scroll` moves buffer rows; the next flush emits the moved cells.

use crate::canvas::{Canvas, TextStyle};
use crate::geometry::Rect;
use crate::palette::Rgba;
use anyhow::Result;
use core_grid::char_width;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
};
use std::io::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TermCell {
    ch: char,
    fg: Rgba,
    bg: Rgba,
    bold: bool,
    underline: bool,
    /// Right half of a wide glyph printed in the previous cell.
    wide_tail: bool,
}

impl TermCell {
    const BLANK: TermCell = TermCell {
        ch: ' ',
        fg: Rgba::WHITE,
        bg: Rgba::BLACK,
        bold: false,
        underline: false,
        wide_tail: false,
    };

    /// Never equal to a painted cell; forces the first flush to emit all.
    const UNKNOWN: TermCell = TermCell {
        ch: '\u{FFFF}',
        ..TermCell::BLANK
    };

    fn same_style(&self, other: &TermCell) -> bool {
        self.fg == other.fg
            && self.bg == other.bg
            && self.bold == other.bold
            && self.underline == other.underline
    }
}

/// Counters of the last flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub print_commands: u64,
    pub cells_printed: u64,
}

pub struct CrosstermCanvas<W: Write> {
    out: W,
    width: i32,
    height: i32,
    back: Vec<TermCell>,
    front: Vec<TermCell>,
    clip: Option<Rect>,
    truecolor: bool,
    last_flush: FlushStats,
}

impl<W: Write> CrosstermCanvas<W> {
    pub fn new(out: W, width: u16, height: u16, truecolor: bool) -> Self {
        let mut canvas = Self {
            out,
            width: 0,
            height: 0,
            back: Vec::new(),
            front: Vec::new(),
            clip: None,
            truecolor,
            last_flush: FlushStats::default(),
        };
        canvas.resize(width, height);
        canvas
    }

    /// Reallocate for a new terminal size; the next flush redraws everything.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width as i32;
        self.height = height as i32;
        let n = width as usize * height as usize;
        self.back = vec![TermCell::BLANK; n];
        self.front = vec![TermCell::UNKNOWN; n];
    }

    /// Force the next flush to re-emit every cell.
    pub fn invalidate(&mut self) {
        self.front.fill(TermCell::UNKNOWN);
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn last_flush(&self) -> FlushStats {
        self.last_flush
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Back buffer text of one row (wide tails skipped).
    pub fn row_text(&self, y: i32) -> String {
        if y < 0 || y >= self.height {
            return String::new();
        }
        let start = (y * self.width) as usize;
        self.back[start..start + self.width as usize]
            .iter()
            .filter(|c| !c.wide_tail)
            .map(|c| c.ch)
            .collect()
    }

    pub fn background_at(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|i| self.back[i].bg)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    fn bounds(&self) -> Rect {
        let full = Rect::new(0, 0, self.width, self.height);
        match self.clip {
            Some(clip) => full.intersect(&clip),
            None => full,
        }
    }

    fn cells_mut(&mut self, rect: Rect, mut f: impl FnMut(&mut TermCell)) {
        let area = rect.intersect(&self.bounds());
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if let Some(i) = self.index(x, y) {
                    f(&mut self.back[i]);
                }
            }
        }
    }

    fn color(&self, c: Rgba) -> Color {
        if self.truecolor {
            Color::Rgb {
                r: c.r,
                g: c.g,
                b: c.b,
            }
        } else {
            Color::AnsiValue(ansi256(c))
        }
    }

    fn put_glyph(&mut self, x: i32, y: i32, ch: char, fg: Rgba, bold: bool, limit: &Rect) {
        let wide = char_width(ch) == 2;
        if !limit.contains(x, y) || (wide && !limit.contains(x + 1, y)) {
            return;
        }
        if let Some(i) = self.index(x, y) {
            let cell = &mut self.back[i];
            cell.ch = ch;
            cell.fg = fg;
            cell.bold = bold;
            cell.wide_tail = false;
        }
        if wide {
            if let Some(i) = self.index(x + 1, y) {
                let bg = self.back[i - 1].bg;
                self.back[i] = TermCell {
                    ch: ' ',
                    fg,
                    bg,
                    bold,
                    underline: false,
                    wide_tail: true,
                };
            }
        }
    }

    /// Emit the changed cells and flush the writer.
    pub fn present(&mut self) -> Result<FlushStats> {
        let mut stats = FlushStats::default();
        let mut run = String::new();
        let mut run_style: Option<TermCell> = None;
        let mut cursor: Option<(i32, i32)> = None;

        for y in 0..self.height {
            for x in 0..self.width {
                let i = (y * self.width + x) as usize;
                let cell = self.back[i];
                let unchanged = cell == self.front[i];
                let contiguous = cursor == Some((x, y));
                let same = run_style.is_some_and(|s| s.same_style(&cell));
                if cell.wide_tail {
                    self.front[i] = cell;
                    if contiguous {
                        cursor = Some((x + 1, y));
                    }
                    continue;
                }
                if unchanged {
                    continue;
                }
                if !(contiguous && same) {
                    self.emit_run(&mut run, &mut stats)?;
                    if !contiguous {
                        queue!(self.out, MoveTo(x as u16, y as u16))?;
                    }
                    if !same {
                        self.emit_style(&cell)?;
                        run_style = Some(cell);
                    }
                }
                run.push(cell.ch);
                stats.cells_printed += 1;
                cursor = Some((x + char_width(cell.ch).max(1) as i32, y));
                self.front[i] = cell;
            }
        }
        self.emit_run(&mut run, &mut stats)?;
        if run_style.is_some() {
            queue!(self.out, SetAttribute(Attribute::Reset))?;
        }
        self.out.flush()?;
        self.last_flush = stats;
        tracing::trace!(
            target: "render.paint",
            prints = stats.print_commands,
            cells = stats.cells_printed,
            "terminal_flush"
        );
        Ok(stats)
    }

    fn emit_run(&mut self, run: &mut String, stats: &mut FlushStats) -> Result<()> {
        if run.is_empty() {
            return Ok(());
        }
        queue!(self.out, Print(std::mem::take(run)))?;
        stats.print_commands += 1;
        Ok(())
    }

    fn emit_style(&mut self, cell: &TermCell) -> Result<()> {
        let (fg, bg) = (self.color(cell.fg), self.color(cell.bg));
        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            SetForegroundColor(fg),
            SetBackgroundColor(bg)
        )?;
        if cell.bold {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        if cell.underline {
            queue!(self.out, SetAttribute(Attribute::Underlined))?;
        }
        Ok(())
    }
}

impl<W: Write> Canvas for CrosstermCanvas<W> {
    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.cells_mut(rect, |c| {
            *c = TermCell {
                bg: color,
                fg: c.fg,
                ..TermCell::BLANK
            };
        });
    }

    fn draw_rect(&mut self, rect: Rect, color: Rgba) {
        if rect.is_empty() {
            return;
        }
        if rect.width == 1 || rect.height == 1 {
            // too small for a frame: mark the cells instead
            self.cells_mut(rect, |c| {
                c.underline = true;
                c.fg = color;
            });
            return;
        }
        let (l, t, r, b) = (rect.x, rect.y, rect.right() - 1, rect.bottom() - 1);
        let limit = self.bounds();
        for x in l + 1..r {
            self.put_glyph(x, t, '─', color, false, &limit);
            self.put_glyph(x, b, '─', color, false, &limit);
        }
        for y in t + 1..b {
            self.put_glyph(l, y, '│', color, false, &limit);
            self.put_glyph(r, y, '│', color, false, &limit);
        }
        self.put_glyph(l, t, '┌', color, false, &limit);
        self.put_glyph(r, t, '┐', color, false, &limit);
        self.put_glyph(l, b, '└', color, false, &limit);
        self.put_glyph(r, b, '┘', color, false, &limit);
    }

    fn draw_text(&mut self, rect: Rect, _baseline: i32, text: &str, style: &TextStyle) {
        let limit = rect.intersect(&self.bounds());
        let mut x = rect.x;
        for ch in text.chars() {
            let w = char_width(ch).max(1) as i32;
            self.put_glyph(x, rect.y, ch, style.color, style.bold, &limit);
            x += match style.advance {
                Some(advance) => advance * w,
                None => w * style.scale_x.max(1) as i32,
            };
        }
    }

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Rgba, _width: u8) {
        let limit = self.bounds();
        if from.1 == to.1 {
            for x in from.0.min(to.0)..=from.0.max(to.0) {
                self.put_glyph(x, from.1, '─', color, false, &limit);
            }
        } else if from.0 == to.0 {
            for y in from.1.min(to.1)..=from.1.max(to.1) {
                self.put_glyph(from.0, y, '│', color, false, &limit);
            }
        }
    }

    fn draw_point(&mut self, x: i32, y: i32, color: Rgba, _width: u8) {
        let limit = self.bounds();
        self.put_glyph(x, y, '·', color, false, &limit);
    }

    fn scroll(&mut self, rect: Rect, dy: i32) {
        let area = rect.intersect(&Rect::new(0, 0, self.width, self.height));
        if area.is_empty() || dy == 0 {
            return;
        }
        let rows: Vec<i32> = if dy < 0 {
            (area.y..area.bottom()).collect()
        } else {
            (area.y..area.bottom()).rev().collect()
        };
        for y in rows {
            let src_y = y - dy;
            for x in area.x..area.right() {
                if let (Some(dst), Some(src)) = (self.index(x, y), self.index(x, src_y)) {
                    self.back[dst] = self.back[src];
                }
            }
        }
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn flush(&mut self) -> Result<()> {
        self.present().map(|_| ())
    }

    fn underline(&mut self, rect: Rect, _baseline: i32, color: Rgba) {
        self.cells_mut(rect, |c| {
            c.underline = true;
            c.fg = color;
        });
    }

    fn overstrike(&mut self, rect: Rect, _baseline: i32, _text: &str, _style: &TextStyle) {
        self.cells_mut(rect, |c| c.bold = true);
    }

    fn draw_box_glyphs(&mut self, rect: Rect, cell: (i32, i32), text: &str, color: Rgba, bold: bool) {
        let limit = rect.intersect(&self.bounds());
        for (i, ch) in text.chars().enumerate() {
            self.put_glyph(rect.x + cell.0 * i as i32, rect.y, ch, color, bold, &limit);
        }
    }
}

/// Nearest xterm 256-color index.
fn ansi256(c: Rgba) -> u8 {
    let (r, g, b) = (c.r as i32, c.g as i32, c.b as i32);
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return (232 + (r - 8) * 24 / 240) as u8;
    }
    let level = |v: i32| if v < 48 { 0 } else if v < 115 { 1 } else { (v - 35) / 40 };
    (16 + 36 * level(r) + 6 * level(g) + level(b)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(w: u16, h: u16) -> CrosstermCanvas<Vec<u8>> {
        CrosstermCanvas::new(Vec::new(), w, h, true)
    }

    #[test]
    fn text_and_fill_land_in_cells() {
        let mut c = canvas(10, 2);
        c.fill_rect(Rect::new(0, 0, 10, 1), Rgba::rgb(1, 2, 3));
        c.draw_text(Rect::new(2, 0, 3, 1), 0, "abc", &TextStyle::plain(Rgba::WHITE));
        assert_eq!(c.row_text(0), "  abc     ");
        assert_eq!(c.background_at(3, 0), Some(Rgba::rgb(1, 2, 3)));
    }

    #[test]
    fn text_is_clipped_to_rect() {
        let mut c = canvas(10, 1);
        c.draw_text(Rect::new(0, 0, 2, 1), 0, "abcdef", &TextStyle::plain(Rgba::WHITE));
        assert_eq!(c.row_text(0), "ab        ");
    }

    #[test]
    fn wide_glyph_claims_two_cells() {
        let mut c = canvas(6, 1);
        let style = TextStyle {
            advance: Some(1),
            ..TextStyle::plain(Rgba::WHITE)
        };
        c.draw_text(Rect::new(0, 0, 6, 1), 0, "中b", &style);
        // the glyph advances two cells, so 'b' lands on column 2
        assert_eq!(c.row_text(0), "中b   ");
    }

    #[test]
    fn scroll_moves_rows_up() {
        let mut c = canvas(3, 3);
        for (y, t) in ["aaa", "bbb", "ccc"].iter().enumerate() {
            c.draw_text(Rect::new(0, y as i32, 3, 1), 0, t, &TextStyle::plain(Rgba::WHITE));
        }
        c.scroll(Rect::new(0, 0, 3, 2), -1);
        assert_eq!(c.row_text(0), "bbb");
        assert_eq!(c.row_text(1), "ccc");
        assert_eq!(c.row_text(2), "ccc");
    }

    #[test]
    fn second_flush_emits_only_changes() {
        let mut c = canvas(4, 2);
        c.draw_text(Rect::new(0, 0, 4, 1), 0, "abcd", &TextStyle::plain(Rgba::WHITE));
        let first = c.present().expect("flush");
        assert_eq!(first.cells_printed, 8);
        let unchanged = c.present().expect("flush");
        assert_eq!(unchanged.cells_printed, 0);
        c.draw_text(Rect::new(1, 1, 1, 1), 0, "z", &TextStyle::plain(Rgba::WHITE));
        let one = c.present().expect("flush");
        assert_eq!((one.print_commands, one.cells_printed), (1, 1));
    }

    #[test]
    fn box_glyphs_and_decorations_are_cell_attributes() {
        let mut c = canvas(4, 1);
        c.draw_box_glyphs(Rect::new(0, 0, 2, 1), (1, 1), "─┼", Rgba::WHITE, false);
        c.underline(Rect::new(0, 0, 2, 1), 0, Rgba::WHITE);
        c.overstrike(Rect::new(0, 0, 1, 1), 0, "─", &TextStyle::plain(Rgba::WHITE));
        assert_eq!(c.row_text(0), "─┼  ");
        assert!(c.back[0].bold && c.back[0].underline);
        assert!(!c.back[1].bold);
    }

    #[test]
    fn gray_maps_to_ramp() {
        assert_eq!(ansi256(Rgba::rgb(0, 0, 0)), 16);
        assert_eq!(ansi256(Rgba::rgb(255, 0, 0)), 196);
        assert_eq!(ansi256(Rgba::rgb(128, 128, 128)), 244);
    }
}
