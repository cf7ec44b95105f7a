//! Dirty region tracking.
//!
//! Collects pixel rectangles that need repainting between frames. Marks are
//! cheap pushes; normalization happens once when the region is taken.
//!
//! Invariants:
//! * Rectangles returned by `take` are non-empty, sorted top-to-bottom then
//!   left-to-right, and free of duplicates.
//! * Vertically adjacent rectangles with identical horizontal extent are
//!   merged, so a block of dirty rows comes back as one rectangle.
//! * After `take`, internal storage is cleared (one-shot consumption).

use crate::geometry::Rect;

#[derive(Debug, Default, Clone)]
pub struct DirtyRegion {
    rects: Vec<Rect>,
}

impl DirtyRegion {
    pub fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Add a rectangle; empty rectangles are ignored.
    pub fn add(&mut self, rect: Rect) {
        if !rect.is_empty() {
            self.rects.push(rect);
        }
    }

    pub fn extend<I: IntoIterator<Item = Rect>>(&mut self, rects: I) {
        for r in rects {
            self.add(r);
        }
    }

    /// Shift everything already marked (used when the canvas scrolls under
    /// pending damage).
    pub fn translate(&mut self, dy: i32) {
        for r in &mut self.rects {
            *r = r.translate(0, dy);
        }
    }

    /// Drop the parts of the region outside `bounds`.
    pub fn clip(&mut self, bounds: Rect) {
        self.rects = self
            .rects
            .drain(..)
            .map(|r| r.intersect(&bounds))
            .filter(|r| !r.is_empty())
            .collect();
    }

    pub fn bounding(&self) -> Rect {
        self.rects
            .iter()
            .fold(Rect::default(), |acc, r| acc.union(r))
    }

    /// Consume the normalized rectangle list.
    pub fn take(&mut self) -> Vec<Rect> {
        if self.rects.is_empty() {
            return Vec::new();
        }
        let mut v: Vec<Rect> = self.rects.drain(..).collect();
        v.sort_unstable_by_key(|r| (r.x, r.width, r.y, r.height));
        v.dedup();
        let mut merged: Vec<Rect> = Vec::with_capacity(v.len());
        for r in v {
            if let Some(last) = merged.last_mut() {
                if last.x == r.x && last.width == r.width && r.y <= last.bottom() {
                    let bottom = last.bottom().max(r.bottom());
                    last.height = bottom - last.y;
                    continue;
                }
            }
            merged.push(r);
        }
        merged.sort_unstable_by_key(|r| (r.y, r.x));
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }
}
