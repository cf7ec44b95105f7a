//! Incremental image diff: the comparison half of `set_image`.
//!
//! For every row both images share, a column is dirty when its cell changed
//! or it lies in the active composition span. The dirty mask is dilated by one
//! column on each side because a glyph may spill into its neighbors. Dirty
//! columns are then grouped into runs of cells that share colors, rendition,
//! line-drawing class and double-width class; each run becomes one paint call.
//! Finally the cached row is overwritten with the new one.
//!
//! Works purely in cell space; pixel rectangles are derived by the engine.

use core_grid::{Cell, Image, LineProperties, LineProperty, is_line_draw};

/// Preedit span of an input method, in columns of one line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Composition {
    pub line: usize,
    pub start: usize,
    pub end: usize,
    /// Selected sub-span inside the preedit text.
    pub selection: Option<(usize, usize)>,
}

impl Composition {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    fn forces(&self, row: usize, column: usize) -> bool {
        row == self.line && column >= self.start && column < self.end
    }

    /// Whether a run `[start, start + len)` on `row` lies in the preedit text
    /// and in its selection.
    pub fn classify(&self, row: usize, start: usize, len: usize) -> (bool, bool) {
        if row != self.line || self.is_empty() {
            return (false, false);
        }
        let inside = start + 1 >= self.start && start + len <= self.end;
        let selected = inside && self.selection.is_some_and(|(s, e)| s < e);
        (inside, selected)
    }
}

/// One merged paint run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirtyRun {
    pub row: usize,
    pub start: usize,
    /// Columns covered, continuation cells included.
    pub columns: usize,
    /// Printable code points (continuations skipped).
    pub text: String,
    /// Attributes shared by every cell of the run.
    pub cell: Cell,
    pub line_draw: bool,
    pub double_width: bool,
}

impl DirtyRun {
    pub fn end(&self) -> usize {
        self.start + self.columns
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub runs: Vec<DirtyRun>,
    /// Rows that need any repaint, ascending.
    pub dirty_rows: Vec<usize>,
    /// Rows that repaint in full (double-height or double-width lines).
    pub full_rows: Vec<usize>,
    pub has_blinker: bool,
    pub cells_diffed: usize,
}

impl DiffReport {
    pub fn is_clean(&self) -> bool {
        self.dirty_rows.is_empty()
    }

    pub fn runs_in_row(&self, row: usize) -> impl Iterator<Item = &DirtyRun> {
        self.runs.iter().filter(move |r| r.row == row)
    }
}

/// Diff `new` against `cache` over `lines x columns` and copy `new` into
/// `cache` for that block. `lines`/`columns` must not exceed either image.
pub fn diff_image(
    cache: &mut Image,
    new: &Image,
    lines: usize,
    columns: usize,
    props: &LineProperties,
    composition: Option<&Composition>,
) -> DiffReport {
    let lines = lines.min(cache.rows()).min(new.rows());
    let columns = columns.min(cache.columns()).min(new.columns());
    let mut report = DiffReport::default();
    // mask[x + 1] is column x; the extra slots absorb the dilation overhang
    let mut mask = vec![false; columns + 2];

    for y in 0..lines {
        mask.iter_mut().for_each(|m| *m = false);
        for x in 0..columns {
            let forced = composition.is_some_and(|c| c.forces(y, x));
            if forced || new.get(y, x) != cache.get(y, x) {
                mask[x] = true;
                mask[x + 1] = true;
                mask[x + 2] = true;
            }
        }
        let dirty = |x: usize| mask[x + 1];
        report.cells_diffed += columns;

        let mut update_line = false;
        let mut x = 0;
        while x < columns {
            if !dirty(x) || new.get(y, x).is_continuation() {
                x += 1;
                continue;
            }
            let first = *new.get(y, x);
            let line_draw = is_line_draw(first.ch);
            let double_width = new.get(y, x + 1).is_continuation();
            let mut text = String::new();
            text.push(first.ch);
            let mut len = 1;
            while len < columns - x {
                let c = new.get(y, x + len);
                if c.is_continuation() {
                    len += 1;
                    continue;
                }
                if !c.same_attributes(&first)
                    || !dirty(x + len)
                    || is_line_draw(c.ch) != line_draw
                    || new.get(y, x + len + 1).is_continuation() != double_width
                {
                    break;
                }
                text.push(c.ch);
                len += 1;
            }
            report.runs.push(DirtyRun {
                row: y,
                start: x,
                columns: len,
                text,
                cell: first,
                line_draw,
                double_width,
            });
            update_line = true;
            x += len;
        }

        let prop = props.get(y);
        // both halves of a double-height line always repaint
        let full_row = prop.contains(LineProperty::DOUBLE_HEIGHT)
            || (update_line && prop.contains(LineProperty::DOUBLE_WIDTH));
        if full_row {
            report.full_rows.push(y);
        }
        if update_line || full_row {
            report.dirty_rows.push(y);
        }

        cache.row_mut(y)[..columns].copy_from_slice(&new.row(y)[..columns]);
    }

    // rows and columns outside the diffed block still count
    report.has_blinker = new.cells().iter().any(Cell::blinks);

    tracing::trace!(
        target: "render.diff",
        rows = lines,
        columns,
        runs = report.runs.len(),
        dirty_rows = report.dirty_rows.len(),
        "image_diff"
    );
    report
}
