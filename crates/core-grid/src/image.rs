//! Bounds-checked row-major cell grid.

use crate::cell::{CONTINUATION, Cell};
use crate::width::char_width;

static BLANK: Cell = Cell::BLANK;

/// Grid coordinate. Signed because selection arithmetic steps one column
/// past either edge before clamping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    /// Row first so the derived ordering is reading order.
    pub line: i32,
    pub column: i32,
}

impl Point {
    pub const fn new(column: i32, line: i32) -> Self {
        Self { line, column }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl Image {
    /// Blank grid of the given size.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![Cell::BLANK; rows * columns],
        }
    }

    /// Build from a flat row-major vector. Missing cells are blank, extra
    /// cells are dropped.
    pub fn from_cells(rows: usize, columns: usize, mut cells: Vec<Cell>) -> Self {
        cells.resize(rows * columns, Cell::BLANK);
        Self {
            rows,
            columns,
            cells,
        }
    }

    /// Build from text lines using default attributes. Double-width glyphs
    /// take two columns, the second holding a continuation cell.
    pub fn from_lines(columns: usize, lines: &[&str]) -> Self {
        let mut image = Self::new(lines.len(), columns);
        for (row, text) in lines.iter().enumerate() {
            image.write_str(row, 0, text, Cell::BLANK);
        }
        image
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at `(row, column)`, or the blank sentinel when out of range.
    pub fn get(&self, row: usize, column: usize) -> &Cell {
        if row < self.rows && column < self.columns {
            &self.cells[row * self.columns + column]
        } else {
            &BLANK
        }
    }

    /// Signed variant of [`Image::get`] for selection scans.
    pub fn at(&self, point: Point) -> &Cell {
        if point.line < 0 || point.column < 0 {
            return &BLANK;
        }
        self.get(point.line as usize, point.column as usize)
    }

    pub fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut Cell> {
        if row < self.rows && column < self.columns {
            Some(&mut self.cells[row * self.columns + column])
        } else {
            None
        }
    }

    /// Store a cell; out-of-range writes are ignored and report `false`.
    pub fn set(&mut self, row: usize, column: usize, cell: Cell) -> bool {
        match self.get_mut(row, column) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Row slice, empty when `row` is out of range.
    pub fn row(&self, row: usize) -> &[Cell] {
        if row < self.rows {
            &self.cells[row * self.columns..(row + 1) * self.columns]
        } else {
            &[]
        }
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [Cell] {
        if row < self.rows {
            &mut self.cells[row * self.columns..(row + 1) * self.columns]
        } else {
            &mut []
        }
    }

    /// Write `text` starting at `(row, column)` with `template`'s attributes.
    /// Stops at the end of the row. Returns the column after the last cell
    /// written.
    pub fn write_str(&mut self, row: usize, column: usize, text: &str, template: Cell) -> usize {
        let mut col = column;
        for ch in text.chars() {
            let width = char_width(ch);
            if col + width > self.columns {
                break;
            }
            let cell = Cell { ch, ..template };
            self.set(row, col, cell);
            if width == 2 {
                self.set(row, col + 1, cell.continuation());
            }
            col += width;
        }
        col
    }

    /// Copy the overlapping top-left block of `rows x columns` cells from
    /// `src`.
    pub fn copy_region_from(&mut self, src: &Image, rows: usize, columns: usize) {
        let rows = rows.min(self.rows).min(src.rows);
        let columns = columns.min(self.columns).min(src.columns);
        for row in 0..rows {
            let from = &src.row(row)[..columns];
            self.row_mut(row)[..columns].copy_from_slice(from);
        }
    }

    /// Shift the block of the first `span` rows by `n` rows: positive moves
    /// content up, negative down. Rows uncovered by the shift keep their old
    /// (stale) content. No-op when `|n| >= span`.
    pub fn scroll_rows(&mut self, n: isize, span: usize) {
        let span = span.min(self.rows);
        let shift = n.unsigned_abs();
        if n == 0 || shift >= span {
            return;
        }
        let stride = self.columns;
        let kept = (span - shift) * stride;
        if n > 0 {
            self.cells.copy_within(shift * stride..shift * stride + kept, 0);
        } else {
            self.cells.copy_within(0..kept, shift * stride);
        }
    }

    pub fn any_blinking(&self) -> bool {
        self.cells.iter().any(Cell::blinks)
    }

    /// Text of a row with continuation cells skipped.
    pub fn row_text(&self, row: usize) -> String {
        self.row(row)
            .iter()
            .filter(|c| c.ch != CONTINUATION)
            .map(|c| c.ch)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Rendition;

    #[test]
    fn zero_sized_image_is_valid() {
        let img = Image::new(0, 0);
        assert!(img.is_empty());
        assert_eq!(img.get(0, 0), &Cell::BLANK);
        assert!(img.row(0).is_empty());
    }

    #[test]
    fn out_of_range_reads_return_blank() {
        let img = Image::from_lines(3, &["abc"]);
        assert_eq!(img.get(0, 2).ch, 'c');
        assert_eq!(img.get(0, 3), &Cell::BLANK);
        assert_eq!(img.at(Point::new(-1, 0)), &Cell::BLANK);
    }

    #[test]
    fn wide_glyph_writes_continuation() {
        let img = Image::from_lines(4, &["a中b"]);
        assert_eq!(img.get(0, 1).ch, '中');
        assert!(img.get(0, 2).is_continuation());
        assert_eq!(img.get(0, 3).ch, 'b');
        assert_eq!(img.row_text(0), "a中b");
    }

    #[test]
    fn wide_glyph_not_split_at_row_end() {
        let img = Image::from_lines(2, &["a中"]);
        assert_eq!(img.get(0, 1), &Cell::BLANK);
    }

    #[test]
    fn scroll_rows_up_and_down() {
        let mut img = Image::from_lines(1, &["0", "1", "2", "3"]);
        img.scroll_rows(1, 4);
        assert_eq!(
            (0..4).map(|r| img.row_text(r)).collect::<Vec<_>>(),
            vec!["1", "2", "3", "3"]
        );
        img.scroll_rows(-2, 4);
        assert_eq!(
            (0..4).map(|r| img.row_text(r)).collect::<Vec<_>>(),
            vec!["1", "2", "1", "2"]
        );
        img.scroll_rows(4, 4);
        assert_eq!(img.row_text(0), "1");
    }

    #[test]
    fn copy_region_clamps_to_both_images() {
        let src = Image::from_lines(3, &["abc", "def"]);
        let mut dst = Image::new(3, 2);
        dst.copy_region_from(&src, 3, 3);
        assert_eq!(dst.row_text(0), "ab");
        assert_eq!(dst.row_text(1), "de");
        assert_eq!(dst.row_text(2), "  ");
    }

    #[test]
    fn blink_detection() {
        let mut img = Image::new(2, 2);
        assert!(!img.any_blinking());
        img.set(1, 1, Cell::new('x').with_rendition(Rendition::BLINK));
        assert!(img.any_blinking());
    }
}
