//! Paint target abstraction.
//!
//! The renderer only needs a handful of 2D primitives. Backends implement
//! `Canvas`; `RecordingCanvas` keeps every call for inspection and is what the
//! tests assert against.

use crate::geometry::Rect;
use crate::linefont::draw_line_char_string;
use crate::palette::Rgba;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    pub color: Rgba,
    /// Request a genuine bold face.
    pub bold: bool,
    /// Horizontal scale factor (2 on double-width lines).
    pub scale_x: u8,
    /// Vertical scale factor (2 on double-height lines).
    pub scale_y: u8,
    /// Place glyphs on a fixed cell grid of this many pixels per column
    /// (wide glyphs take two columns) instead of the font's own advances.
    pub advance: Option<i32>,
}

impl TextStyle {
    pub fn plain(color: Rgba) -> Self {
        Self {
            color,
            bold: false,
            scale_x: 1,
            scale_y: 1,
            advance: None,
        }
    }
}

pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    /// One pixel outline just inside `rect`.
    fn draw_rect(&mut self, rect: Rect, color: Rgba);
    /// Draw `text` inside `rect`; `baseline` is absolute.
    fn draw_text(&mut self, rect: Rect, baseline: i32, text: &str, style: &TextStyle);
    /// Inclusive end points.
    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Rgba, width: u8);
    fn draw_point(&mut self, x: i32, y: i32, color: Rgba, width: u8);
    /// Fill `rect` with the pixels found at `rect` shifted by `-dy`. Pixels
    /// outside `rect` are left as they were.
    fn scroll(&mut self, rect: Rect, dy: i32);
    fn set_clip(&mut self, clip: Option<Rect>);
    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    // Decorations. Pixel canvases stroke them; text-cell backends override
    // these with native cell attributes.

    /// Underline a run whose glyphs sit on `baseline`.
    fn underline(&mut self, rect: Rect, baseline: i32, color: Rgba) {
        let y = baseline + 1;
        self.draw_line((rect.x, y), (rect.right() - 1, y), color, 1);
    }

    /// Embolden a run by redrawing it one pixel to the right, clipped to
    /// the run.
    fn overstrike(&mut self, rect: Rect, baseline: i32, text: &str, style: &TextStyle) {
        self.set_clip(Some(rect));
        self.draw_text(rect.translate(1, 0), baseline, text, style);
        self.set_clip(None);
    }

    /// Box drawing characters, one per `cell_w x cell_h` cell.
    fn draw_box_glyphs(&mut self, rect: Rect, cell: (i32, i32), text: &str, color: Rgba, bold: bool) {
        draw_line_char_string(self, rect.x, rect.y, cell.0, cell.1, text, color, bold);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaintOp {
    Fill {
        rect: Rect,
        color: Rgba,
    },
    Outline {
        rect: Rect,
        color: Rgba,
    },
    Text {
        rect: Rect,
        baseline: i32,
        text: String,
        style: TextStyle,
    },
    Line {
        from: (i32, i32),
        to: (i32, i32),
        color: Rgba,
        width: u8,
    },
    Point {
        x: i32,
        y: i32,
        color: Rgba,
        width: u8,
    },
    Scroll {
        rect: Rect,
        dy: i32,
    },
    Clip(Option<Rect>),
}

#[derive(Debug, Default)]
pub struct RecordingCanvas {
    ops: Vec<PaintOp>,
    flushes: usize,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    pub fn take(&mut self) -> Vec<PaintOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Text strings in paint order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<(Rect, Rgba)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Fill { rect, color } => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }

    pub fn scrolls(&self) -> Vec<(Rect, i32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Scroll { rect, dy } => Some((*rect, *dy)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.ops.push(PaintOp::Fill { rect, color });
    }
    fn draw_rect(&mut self, rect: Rect, color: Rgba) {
        self.ops.push(PaintOp::Outline { rect, color });
    }
    fn draw_text(&mut self, rect: Rect, baseline: i32, text: &str, style: &TextStyle) {
        self.ops.push(PaintOp::Text {
            rect,
            baseline,
            text: text.to_string(),
            style: *style,
        });
    }
    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Rgba, width: u8) {
        self.ops.push(PaintOp::Line {
            from,
            to,
            color,
            width,
        });
    }
    fn draw_point(&mut self, x: i32, y: i32, color: Rgba, width: u8) {
        self.ops.push(PaintOp::Point { x, y, color, width });
    }
    fn scroll(&mut self, rect: Rect, dy: i32) {
        self.ops.push(PaintOp::Scroll { rect, dy });
    }
    fn set_clip(&mut self, clip: Option<Rect>) {
        self.ops.push(PaintOp::Clip(clip));
    }
    fn flush(&mut self) -> anyhow::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
