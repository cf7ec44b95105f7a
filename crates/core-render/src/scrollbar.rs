//! History scrollbar model and painting.

use crate::canvas::Canvas;
use crate::geometry::Rect;
use crate::palette::Rgba;

const TRACK: Rgba = Rgba::rgb(0xD8, 0xD8, 0xD8);
const THUMB: Rgba = Rgba::rgb(0x80, 0x80, 0x80);

/// `value` ranges over `0..=max`; `page` is the visible line count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollbarState {
    pub value: i32,
    pub max: i32,
    pub page: i32,
}

impl ScrollbarState {
    /// Update range and position. Returns true when anything changed.
    pub fn set_scroll(&mut self, cursor: i32, lines: i32) -> bool {
        let next = ScrollbarState {
            value: cursor.clamp(0, lines.max(0)),
            max: lines.max(0),
            page: self.page,
        };
        let changed = next != *self;
        *self = next;
        changed
    }

    pub fn set_page(&mut self, page: i32) {
        self.page = page.max(1);
    }

    /// Move by `delta` lines, clamped. Returns the new value when it moved.
    pub fn nudge(&mut self, delta: i32) -> Option<i32> {
        let value = (self.value + delta).clamp(0, self.max);
        if value == self.value {
            return None;
        }
        self.value = value;
        Some(value)
    }

    pub fn at_bottom(&self) -> bool {
        self.value >= self.max
    }

    /// Thumb rectangle inside `track`.
    pub fn thumb(&self, track: Rect) -> Rect {
        if track.is_empty() {
            return Rect::default();
        }
        let total = (self.max + self.page).max(1) as i64;
        let h = track.height as i64;
        let thumb_h = ((self.page.max(1) as i64 * h) / total).clamp(4_i64.min(h), h);
        let y = if self.max == 0 {
            0
        } else {
            ((h - thumb_h) * self.value as i64) / self.max as i64
        };
        let (x, w) = if track.width > 2 {
            (track.x + 1, track.width - 2)
        } else {
            (track.x, track.width)
        };
        Rect::new(x, track.y + y as i32, w, thumb_h as i32)
    }

    pub fn paint(&self, canvas: &mut dyn Canvas, track: Rect) {
        if track.is_empty() {
            return;
        }
        canvas.fill_rect(track, TRACK);
        canvas.fill_rect(self.thumb(track), THUMB);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;

    #[test]
    fn set_scroll_reports_change_once() {
        let mut s = ScrollbarState::default();
        assert!(s.set_scroll(10, 100));
        assert!(!s.set_scroll(10, 100));
        assert_eq!((s.value, s.max), (10, 100));
    }

    #[test]
    fn value_clamped_to_range() {
        let mut s = ScrollbarState::default();
        s.set_scroll(500, 20);
        assert_eq!(s.value, 20);
        assert!(s.at_bottom());
        assert_eq!(s.nudge(-25), Some(0));
        assert_eq!(s.nudge(-1), None);
    }

    #[test]
    fn thumb_tracks_value() {
        let mut s = ScrollbarState::default();
        s.set_page(10);
        s.set_scroll(0, 90);
        let track = Rect::new(0, 0, 16, 100);
        assert_eq!(s.thumb(track), Rect::new(1, 0, 14, 10));
        s.set_scroll(90, 90);
        assert_eq!(s.thumb(track), Rect::new(1, 90, 14, 10));
        let mut canvas = RecordingCanvas::new();
        s.paint(&mut canvas, track);
        assert_eq!(canvas.fills().len(), 2);
    }
}
