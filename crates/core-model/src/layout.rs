//! Screen regions assigned to panes.
//!
//! A `Layout` is the flattened result of laying out a pane tree over an
//! area: one region per container, in tree order. Regions are in terminal
//! cell units. Equal-share splitting truncates, so the regions of a split
//! may leave a few cells uncovered at its far edge.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutRegion {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl LayoutRegion {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && y >= self.y
            && (x as u32) < self.x as u32 + self.width as u32
            && (y as u32) < self.y as u32 + self.height as u32
    }

    /// `(x, y)` relative to the region origin.
    pub fn local(&self, x: u16, y: u16) -> (i32, i32) {
        (x as i32 - self.x as i32, y as i32 - self.y as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout<C> {
    panes: Vec<(C, LayoutRegion)>,
}

impl<C: Copy + PartialEq> Layout<C> {
    pub fn new(panes: Vec<(C, LayoutRegion)>) -> Self {
        Self { panes }
    }

    /// One container covering the whole area.
    pub fn single(container: C, width: u16, height: u16) -> Self {
        Self {
            panes: vec![(container, LayoutRegion::new(0, 0, width, height))],
        }
    }

    pub fn panes(&self) -> &[(C, LayoutRegion)] {
        &self.panes
    }

    pub fn region_of(&self, container: C) -> Option<LayoutRegion> {
        self.panes
            .iter()
            .find(|(c, _)| *c == container)
            .map(|(_, r)| *r)
    }

    /// Pane under a screen cell.
    pub fn pane_at(&self, x: u16, y: u16) -> Option<(C, LayoutRegion)> {
        self.panes.iter().copied().find(|(_, r)| r.contains(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_layout_covers_area() {
        let l = Layout::single(7u32, 80, 24);
        assert_eq!(l.panes().len(), 1);
        assert_eq!(l.region_of(7), Some(LayoutRegion::new(0, 0, 80, 24)));
        assert_eq!(l.pane_at(79, 23).map(|p| p.0), Some(7));
        assert_eq!(l.pane_at(80, 0), None);
    }

    #[test]
    fn local_coordinates() {
        let r = LayoutRegion::new(40, 2, 40, 10);
        assert!(r.contains(40, 2) && !r.contains(39, 2));
        assert_eq!(r.local(45, 3), (5, 1));
    }
}
