//! Font measurement and derived cell metrics.

/// Representative characters whose average advance defines the cell width.
pub const REPCHAR: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefgjijklmnopqrstuvwxyz0123456789./+@";

/// Averages above this are treated as bogus and replaced by the max advance.
const MAX_SANE_WIDTH: i32 = 200;

/// What the renderer needs to know about a font. Backends with real glyph
/// rasterizers implement this over their font handle.
pub trait FontMeasure {
    fn advance(&self, ch: char) -> i32;
    fn max_advance(&self) -> i32;
    fn height(&self) -> i32;
    fn ascent(&self) -> i32;

    fn text_width(&self, text: &str) -> i32 {
        text.chars().map(|c| self.advance(c)).sum()
    }
}

/// Monospace font description with explicit pixel metrics. The crossterm
/// backend uses a 1x1 instance (one pixel per terminal cell).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedFont {
    pub family: String,
    pub width: i32,
    pub height: i32,
    pub ascent: i32,
}

impl FixedFont {
    pub fn new(family: impl Into<String>, width: i32, height: i32, ascent: i32) -> Self {
        Self {
            family: family.into(),
            width,
            height,
            ascent,
        }
    }

    /// One pixel per character cell.
    pub fn cell_units() -> Self {
        Self::new("terminal", 1, 1, 1)
    }
}

impl FontMeasure for FixedFont {
    fn advance(&self, _ch: char) -> i32 {
        self.width
    }
    fn max_advance(&self) -> i32 {
        self.width
    }
    fn height(&self) -> i32 {
        self.height
    }
    fn ascent(&self) -> i32 {
        self.ascent
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellMetrics {
    pub width: i32,
    /// Font height plus line spacing.
    pub height: i32,
    pub ascent: i32,
    pub line_spacing: i32,
    /// Every representative glyph shares one advance.
    pub fixed_pitch: bool,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            ascent: 1,
            line_spacing: 0,
            fixed_pitch: true,
        }
    }
}

impl CellMetrics {
    pub fn measure(font: &dyn FontMeasure, line_spacing: u16) -> Self {
        let count = REPCHAR.chars().count() as f64;
        let mut width = (font.text_width(REPCHAR) as f64 / count).round() as i32;
        let first = REPCHAR.chars().next().map(|c| font.advance(c)).unwrap_or(0);
        let fixed_pitch = REPCHAR.chars().all(|c| font.advance(c) == first);
        if width > MAX_SANE_WIDTH {
            width = font.max_advance();
        }
        let line_spacing = line_spacing as i32;
        Self {
            width: width.max(1),
            height: (font.height() + line_spacing).max(1),
            ascent: font.ascent(),
            line_spacing,
            fixed_pitch,
        }
    }

    /// Baseline offset from the top of a cell.
    pub fn baseline(&self) -> i32 {
        self.ascent + self.line_spacing / 2
    }
}
