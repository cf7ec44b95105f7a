//! Indexed color table and translucent background blending.
//!
//! Table layout (`TABLE_COLORS` entries):
//! `0` default fg, `1` default bg, `2..10` system colors,
//! `10` intense default fg, `11` intense default bg, `12..20` intense system colors.

use core_grid::{Cell, CellColor, DEFAULT_BACK, DEFAULT_FORE, Rendition};

pub const TABLE_COLORS: usize = 20;
pub const INTENSE_OFFSET: usize = 10;
/// Fixed source weight of the translucent background blend (about 75%).
pub const TRANSLUCENT_SOURCE_ALPHA: u32 = 192;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(0xFF, 0xFF, 0xFF);
    /// Preedit span highlight.
    pub const DARK_CYAN: Rgba = Rgba::rgb(0, 0x80, 0x80);
    /// Preedit selection highlight.
    pub const DARK_GRAY: Rgba = Rgba::rgb(0x80, 0x80, 0x80);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorEntry {
    pub color: Rgba,
    /// Background in this slot is not painted.
    pub transparent: bool,
    /// Text in this slot is painted bold.
    pub bold: bool,
}

impl ColorEntry {
    pub const fn new(color: Rgba, transparent: bool, bold: bool) -> Self {
        Self {
            color,
            transparent,
            bold,
        }
    }
}

const fn entry(r: u8, g: u8, b: u8, transparent: bool, bold: bool) -> ColorEntry {
    ColorEntry::new(Rgba::rgb(r, g, b), transparent, bold)
}

pub const BASE_COLOR_TABLE: [ColorEntry; TABLE_COLORS] = [
    // normal
    entry(0x00, 0x00, 0x00, false, false), // default fg
    entry(0xFF, 0xFF, 0xFF, true, false),  // default bg
    entry(0x00, 0x00, 0x00, false, false), // black
    entry(0xB2, 0x18, 0x18, false, false), // red
    entry(0x18, 0xB2, 0x18, false, false), // green
    entry(0xB2, 0x68, 0x18, false, false), // yellow
    entry(0x18, 0x18, 0xB2, false, false), // blue
    entry(0xB2, 0x18, 0xB2, false, false), // magenta
    entry(0x18, 0xB2, 0xB2, false, false), // cyan
    entry(0xB2, 0xB2, 0xB2, false, false), // white
    // intense
    entry(0x00, 0x00, 0x00, false, true),
    entry(0xFF, 0xFF, 0xFF, true, false),
    entry(0x68, 0x68, 0x68, false, false),
    entry(0xFF, 0x54, 0x54, false, false),
    entry(0x54, 0xFF, 0x54, false, false),
    entry(0xFF, 0xFF, 0x54, false, false),
    entry(0x54, 0x54, 0xFF, false, false),
    entry(0xFF, 0x54, 0xFF, false, false),
    entry(0x54, 0xFF, 0xFF, false, false),
    entry(0xFF, 0xFF, 0xFF, false, false),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    entries: [ColorEntry; TABLE_COLORS],
    swapped: bool,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: BASE_COLOR_TABLE,
            swapped: false,
        }
    }
}

impl Palette {
    /// Replace leading entries with `table`; a 16 entry table leaves the
    /// last intense slots untouched.
    pub fn set_table(&mut self, table: &[ColorEntry]) {
        let n = table.len().min(TABLE_COLORS);
        self.entries[..n].copy_from_slice(&table[..n]);
        self.swapped = false;
    }

    pub fn entries(&self) -> &[ColorEntry; TABLE_COLORS] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> &ColorEntry {
        &self.entries[index.min(TABLE_COLORS - 1)]
    }

    pub fn default_foreground(&self) -> Rgba {
        self.entries[DEFAULT_FORE as usize].color
    }

    pub fn default_background(&self) -> Rgba {
        self.entries[DEFAULT_BACK as usize].color
    }

    /// Exchange default fg and bg (visual bell). Calling twice restores.
    pub fn swap_defaults(&mut self) {
        self.entries.swap(DEFAULT_FORE as usize, DEFAULT_BACK as usize);
        self.swapped = !self.swapped;
    }

    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    /// The cell color reference currently meaning "default background".
    pub fn default_background_ref(&self) -> CellColor {
        if self.swapped {
            CellColor::Default(DEFAULT_FORE)
        } else {
            CellColor::Default(DEFAULT_BACK)
        }
    }

    fn slot(color: CellColor) -> Option<usize> {
        match color {
            CellColor::Undefined => Some(DEFAULT_FORE as usize),
            CellColor::Default(i) => Some(i as usize),
            CellColor::System(i) if i < 8 => Some(2 + i as usize),
            CellColor::System(i) => Some(2 + INTENSE_OFFSET + (i as usize - 8)),
            CellColor::Indexed(i) if i < 8 => Some(2 + i as usize),
            CellColor::Indexed(i) if i < 16 => Some(2 + INTENSE_OFFSET + (i as usize - 8)),
            CellColor::Indexed(_) | CellColor::Rgb(..) => None,
        }
    }

    pub fn resolve(&self, color: CellColor) -> Rgba {
        match Self::slot(color) {
            Some(slot) => self.entry(slot).color,
            None => match color {
                CellColor::Rgb(r, g, b) => Rgba::rgb(r, g, b),
                CellColor::Indexed(i) => color256(i),
                _ => self.default_foreground(),
            },
        }
    }

    pub fn is_transparent(&self, cell: &Cell) -> bool {
        cell.rendition.contains(Rendition::TRANSPARENT)
            || Self::slot(cell.bg).is_some_and(|s| self.entry(s).transparent)
    }

    pub fn is_bold(&self, cell: &Cell) -> bool {
        cell.rendition.contains(Rendition::BOLD)
            || Self::slot(cell.fg).is_some_and(|s| self.entry(s).bold)
    }
}

/// xterm 256 color cube and grayscale ramp for indices 16..=255.
fn color256(i: u8) -> Rgba {
    if i >= 232 {
        let v = (i - 232) * 10 + 8;
        return Rgba::rgb(v, v, v);
    }
    let n = i - 16;
    let level = |c: u8| if c == 0 { 0 } else { c * 40 + 55 };
    Rgba::rgb(level(n / 36), level((n / 6) % 6), level(n % 6))
}

/// Blend a background color over the translucency backdrop, alpha included.
/// The source weight is fixed regardless of the backdrop's own alpha.
pub fn blend(color: Rgba, backdrop: Rgba) -> Rgba {
    let src = TRANSLUCENT_SOURCE_ALPHA;
    let dst = 255 - src;
    let mix = |c: u8, b: u8| ((c as u32 * src) / 255 + (b as u32 * dst) / 255).min(255) as u8;
    Rgba {
        r: mix(color.r, backdrop.r),
        g: mix(color.g, backdrop.g),
        b: mix(color.b, backdrop.b),
        a: mix(color.a, backdrop.a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_system_and_intense() {
        let p = Palette::default();
        assert_eq!(p.resolve(CellColor::System(1)), Rgba::rgb(0xB2, 0x18, 0x18));
        assert_eq!(p.resolve(CellColor::System(9)), Rgba::rgb(0xFF, 0x54, 0x54));
        assert_eq!(p.resolve(CellColor::Indexed(9)), Rgba::rgb(0xFF, 0x54, 0x54));
        assert_eq!(p.resolve(CellColor::BACKGROUND), Rgba::WHITE);
        assert_eq!(p.resolve(CellColor::Rgb(1, 2, 3)), Rgba::rgb(1, 2, 3));
    }

    #[test]
    fn resolves_256_cube_and_ramp() {
        let p = Palette::default();
        assert_eq!(p.resolve(CellColor::Indexed(16)), Rgba::rgb(0, 0, 0));
        assert_eq!(p.resolve(CellColor::Indexed(196)), Rgba::rgb(255, 0, 0));
        assert_eq!(p.resolve(CellColor::Indexed(232)), Rgba::rgb(8, 8, 8));
        assert_eq!(p.resolve(CellColor::Indexed(255)), Rgba::rgb(238, 238, 238));
    }

    #[test]
    fn blend_uses_fixed_weight() {
        let out = blend(Rgba::rgb(255, 255, 255), Rgba::rgba(0, 0, 0, 0));
        assert_eq!(out, Rgba::rgba(192, 192, 192, 192));
        let out = blend(Rgba::rgb(0, 0, 0), Rgba::rgba(255, 255, 255, 255));
        assert_eq!(out, Rgba::rgba(63, 63, 63, 255));
    }

    #[test]
    fn swap_defaults_round_trips() {
        let mut p = Palette::default();
        p.swap_defaults();
        assert_eq!(p.default_background(), Rgba::BLACK);
        assert_eq!(p.default_background_ref(), CellColor::Default(DEFAULT_FORE));
        p.swap_defaults();
        assert_eq!(p, Palette::default());
    }

    #[test]
    fn short_table_keeps_tail() {
        let mut p = Palette::default();
        let red = ColorEntry::new(Rgba::rgb(255, 0, 0), false, false);
        p.set_table(&[red; 16]);
        assert_eq!(p.entry(15).color, Rgba::rgb(255, 0, 0));
        assert_eq!(p.entry(19), &BASE_COLOR_TABLE[19]);
    }

    #[test]
    fn transparency_and_bold_flags() {
        let p = Palette::default();
        assert!(p.is_transparent(&Cell::BLANK));
        assert!(!p.is_transparent(&Cell::BLANK.with_bg(CellColor::System(0))));
        let intense_fg = Cell::new('x').with_fg(CellColor::Default(10));
        assert!(p.is_bold(&intense_fg));
    }
}
