//! Single character cell and its color references.

use bitflags::bitflags;

/// Palette slot of the default foreground color.
pub const DEFAULT_FORE: u8 = 0;
/// Palette slot of the default background color.
pub const DEFAULT_BACK: u8 = 1;
/// Code point stored in the right half of a double-width glyph.
pub const CONTINUATION: char = '\0';

bitflags! {
    /// Display modifiers attached to a cell.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Rendition: u8 {
        const BOLD        = 1 << 0;
        const BLINK       = 1 << 1;
        const UNDERLINE   = 1 << 2;
        const REVERSE     = 1 << 3;
        /// The emulation marks the cell under the text cursor with this bit.
        const CURSOR      = 1 << 4;
        const TRANSPARENT = 1 << 5;
    }
}

/// Color reference resolved through the display palette at paint time.
///
/// `Default` and `System` index the palette (`Default(0|1)` are the normal
/// defaults, `Default(10|11)` the intense ones; `System(0..8)` normal and
/// `System(8..16)` intense). `Indexed` follows the xterm 256 color layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    #[default]
    Undefined,
    Default(u8),
    System(u8),
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl CellColor {
    pub const FOREGROUND: CellColor = CellColor::Default(DEFAULT_FORE);
    pub const BACKGROUND: CellColor = CellColor::Default(DEFAULT_BACK);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub fg: CellColor,
    pub bg: CellColor,
    pub rendition: Rendition,
}

impl Cell {
    /// Space in default colors; also what out-of-range reads return.
    pub const BLANK: Cell = Cell {
        ch: ' ',
        fg: CellColor::FOREGROUND,
        bg: CellColor::BACKGROUND,
        rendition: Rendition::empty(),
    };

    pub const fn new(ch: char) -> Self {
        Cell { ch, ..Self::BLANK }
    }

    pub fn with_fg(mut self, fg: CellColor) -> Self {
        self.fg = fg;
        self
    }

    pub fn with_bg(mut self, bg: CellColor) -> Self {
        self.bg = bg;
        self
    }

    pub fn with_rendition(mut self, rendition: Rendition) -> Self {
        self.rendition = rendition;
        self
    }

    /// Continuation cell carrying this cell's attributes.
    pub fn continuation(&self) -> Self {
        Cell {
            ch: CONTINUATION,
            ..*self
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.ch == CONTINUATION
    }

    /// True when colors and rendition match; the code point is ignored.
    pub fn same_attributes(&self, other: &Cell) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.rendition == other.rendition
    }

    pub fn blinks(&self) -> bool {
        self.rendition.contains(Rendition::BLINK)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}
