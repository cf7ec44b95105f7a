//! Canvas view of one pane: shifts every call by the pane origin and keeps
//! painting inside the pane.

use core_render::{Canvas, Rect, Rgba, TextStyle};

pub struct PaneCanvas<'a> {
    inner: &'a mut dyn Canvas,
    area: Rect,
}

impl<'a> PaneCanvas<'a> {
    pub fn new(inner: &'a mut dyn Canvas, area: Rect) -> Self {
        inner.set_clip(Some(area));
        Self { inner, area }
    }

    fn at(&self, rect: Rect) -> Rect {
        rect.translate(self.area.x, self.area.y)
    }
}

impl Drop for PaneCanvas<'_> {
    fn drop(&mut self) {
        self.inner.set_clip(None);
    }
}

impl Canvas for PaneCanvas<'_> {
    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let rect = self.at(rect);
        self.inner.fill_rect(rect, color);
    }

    fn draw_rect(&mut self, rect: Rect, color: Rgba) {
        let rect = self.at(rect);
        self.inner.draw_rect(rect, color);
    }

    fn draw_text(&mut self, rect: Rect, baseline: i32, text: &str, style: &TextStyle) {
        let rect = self.at(rect);
        self.inner
            .draw_text(rect, baseline + self.area.y, text, style);
    }

    fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Rgba, width: u8) {
        let (dx, dy) = (self.area.x, self.area.y);
        self.inner
            .draw_line((from.0 + dx, from.1 + dy), (to.0 + dx, to.1 + dy), color, width);
    }

    fn draw_point(&mut self, x: i32, y: i32, color: Rgba, width: u8) {
        self.inner
            .draw_point(x + self.area.x, y + self.area.y, color, width);
    }

    fn scroll(&mut self, rect: Rect, dy: i32) {
        let rect = self.at(rect).intersect(&self.area);
        self.inner.scroll(rect, dy);
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        let clip = match clip {
            Some(rect) => self.at(rect).intersect(&self.area),
            None => self.area,
        };
        self.inner.set_clip(Some(clip));
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.inner.flush()
    }

    fn underline(&mut self, rect: Rect, baseline: i32, color: Rgba) {
        let rect = self.at(rect);
        self.inner.underline(rect, baseline + self.area.y, color);
    }

    fn overstrike(&mut self, rect: Rect, baseline: i32, text: &str, style: &TextStyle) {
        let rect = self.at(rect);
        self.inner
            .overstrike(rect, baseline + self.area.y, text, style);
    }

    fn draw_box_glyphs(&mut self, rect: Rect, cell: (i32, i32), text: &str, color: Rgba, bold: bool) {
        let rect = self.at(rect);
        self.inner.draw_box_glyphs(rect, cell, text, color, bold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_render::{PaintOp, RecordingCanvas};

    #[test]
    fn shifts_and_clips_to_pane() {
        let mut rec = RecordingCanvas::new();
        {
            let mut pane = PaneCanvas::new(&mut rec, Rect::new(40, 2, 40, 10));
            pane.fill_rect(Rect::new(1, 1, 3, 1), Rgba::BLACK);
            pane.set_clip(None);
        }
        assert_eq!(
            rec.ops(),
            &[
                PaintOp::Clip(Some(Rect::new(40, 2, 40, 10))),
                PaintOp::Fill {
                    rect: Rect::new(41, 3, 3, 1),
                    color: Rgba::BLACK
                },
                PaintOp::Clip(Some(Rect::new(40, 2, 40, 10))),
                PaintOp::Clip(None),
            ]
        );
    }
}
