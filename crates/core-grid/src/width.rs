//! Column width helpers.

use crate::cell::CONTINUATION;
use unicode_width::UnicodeWidthChar;

/// Number of grid columns a code point occupies (0, 1 or 2).
///
/// Control characters report 1 so stray codes still consume a cell.
pub fn char_width(ch: char) -> usize {
    if ch == CONTINUATION {
        return 0;
    }
    match ch.width() {
        Some(0) | None => 1,
        Some(w) => w.min(2),
    }
}

/// Box drawing block U+2500..U+257F, painted with vector primitives.
/// The diagonals U+2571..U+2573 have no stroke form and render as text.
#[inline]
pub fn is_line_draw(ch: char) -> bool {
    (ch as u32 & 0xFF80) == 0x2500 && !('\u{2571}'..='\u{2573}').contains(&ch)
}
