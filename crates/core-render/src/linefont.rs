//! Box drawing glyphs (U+2500..U+257F) painted from a 5x5 segment mask.
//!
//! Cell positions of the mask (`cx`/`cy` is the cell center, `ex`/`ey` the
//! last pixel):
//!
//! ```text
//!          TOP_L TOP_C TOP_R
//! LEFT_T   INT11 INT12 INT13   RIGHT_T
//! LEFT_C   INT21 INT22 INT23   RIGHT_C
//! LEFT_B   INT31 INT32 INT33   RIGHT_B
//!          BOT_L BOT_C BOT_R
//! ```
//!
//! Vertical strokes sit at `cx-1 | cx | cx+1`, horizontal ones at
//! `cy-1 | cy | cy+1`; the `INT` cells are single points around the center.
//! The table is generated from the weight of each glyph's four arms so it
//! stays consistent across light, heavy and double variants.

use crate::canvas::Canvas;
use crate::palette::Rgba;
use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Segments: u32 {
        const TOP_L   = 1 << 1;
        const TOP_C   = 1 << 2;
        const TOP_R   = 1 << 3;

        const LEFT_T  = 1 << 5;
        const INT11   = 1 << 6;
        const INT12   = 1 << 7;
        const INT13   = 1 << 8;
        const RIGHT_T = 1 << 9;

        const LEFT_C  = 1 << 10;
        const INT21   = 1 << 11;
        const INT22   = 1 << 12;
        const INT23   = 1 << 13;
        const RIGHT_C = 1 << 14;

        const LEFT_B  = 1 << 15;
        const INT31   = 1 << 16;
        const INT32   = 1 << 17;
        const INT33   = 1 << 18;
        const RIGHT_B = 1 << 19;

        const BOT_L   = 1 << 21;
        const BOT_C   = 1 << 22;
        const BOT_R   = 1 << 23;
    }
}

// arm weights
const N: u8 = 0;
const L: u8 = 1;
const H: u8 = 2;
const D: u8 = 3;

/// (up, right, down, left) per code point, indexed by `ch - 0x2500`.
#[rustfmt::skip]
const ARMS: [[u8; 4]; 128] = [
    // 2500 ─ ━ │ ┃ ┄ ┅ ┆ ┇ ┈ ┉ ┊ ┋
    [N, L, N, L], [N, H, N, H], [L, N, L, N], [H, N, H, N],
    [N, L, N, L], [N, H, N, H], [L, N, L, N], [H, N, H, N],
    [N, L, N, L], [N, H, N, H], [L, N, L, N], [H, N, H, N],
    // 250C ┌ ┍ ┎ ┏
    [N, L, L, N], [N, H, L, N], [N, L, H, N], [N, H, H, N],
    // 2510 ┐ ┑ ┒ ┓
    [N, N, L, L], [N, N, L, H], [N, N, H, L], [N, N, H, H],
    // 2514 └ ┕ ┖ ┗
    [L, L, N, N], [L, H, N, N], [H, L, N, N], [H, H, N, N],
    // 2518 ┘ ┙ ┚ ┛
    [L, N, N, L], [L, N, N, H], [H, N, N, L], [H, N, N, H],
    // 251C ├ ┝ ┞ ┟ ┠ ┡ ┢ ┣
    [L, L, L, N], [L, H, L, N], [H, L, L, N], [L, L, H, N],
    [H, L, H, N], [H, H, L, N], [L, H, H, N], [H, H, H, N],
    // 2524 ┤ ┥ ┦ ┧ ┨ ┩ ┪ ┫
    [L, N, L, L], [L, N, L, H], [H, N, L, L], [L, N, H, L],
    [H, N, H, L], [H, N, L, H], [L, N, H, H], [H, N, H, H],
    // 252C ┬ ┭ ┮ ┯ ┰ ┱ ┲ ┳
    [N, L, L, L], [N, L, L, H], [N, H, L, L], [N, H, L, H],
    [N, L, H, L], [N, L, H, H], [N, H, H, L], [N, H, H, H],
    // 2534 ┴ ┵ ┶ ┷ ┸ ┹ ┺ ┻
    [L, L, N, L], [L, L, N, H], [L, H, N, L], [L, H, N, H],
    [H, L, N, L], [H, L, N, H], [H, H, N, L], [H, H, N, H],
    // 253C ┼ ┽ ┾ ┿
    [L, L, L, L], [L, L, L, H], [L, H, L, L], [L, H, L, H],
    // 2540 ╀ ╁ ╂ ╃ ╄ ╅ ╆ ╇
    [H, L, L, L], [L, L, H, L], [H, L, H, L], [H, L, L, H],
    [H, H, L, L], [L, L, H, H], [L, H, H, L], [H, H, L, H],
    // 2548 ╈ ╉ ╊ ╋
    [L, H, H, H], [H, L, H, H], [H, H, H, L], [H, H, H, H],
    // 254C ╌ ╍ ╎ ╏
    [N, L, N, L], [N, H, N, H], [L, N, L, N], [H, N, H, N],
    // 2550 ═ ║ ╒ ╓ ╔ ╕ ╖ ╗
    [N, D, N, D], [D, N, D, N], [N, D, L, N], [N, L, D, N],
    [N, D, D, N], [N, N, L, D], [N, N, D, L], [N, N, D, D],
    // 2558 ╘ ╙ ╚ ╛ ╜ ╝
    [L, D, N, N], [D, L, N, N], [D, D, N, N],
    [L, N, N, D], [D, N, N, L], [D, N, N, D],
    // 255E ╞ ╟ ╠ ╡ ╢ ╣
    [L, D, L, N], [D, L, D, N], [D, D, D, N],
    [L, N, L, D], [D, N, D, L], [D, N, D, D],
    // 2564 ╤ ╥ ╦ ╧ ╨ ╩
    [N, D, L, D], [N, L, D, L], [N, D, D, D],
    [L, D, N, D], [D, L, N, L], [D, D, N, D],
    // 256A ╪ ╫ ╬
    [L, D, L, D], [D, L, D, L], [D, D, D, D],
    // 256D ╭ ╮ ╯ ╰ (rounded, drawn square)
    [N, L, L, N], [N, N, L, L], [L, N, N, L], [L, L, N, N],
    // 2571 ╱ ╲ ╳ (no segment form, painted as text)
    [N, N, N, N], [N, N, N, N], [N, N, N, N],
    // 2574 ╴ ╵ ╶ ╷ ╸ ╹ ╺ ╻
    [N, N, N, L], [L, N, N, N], [N, L, N, N], [N, N, L, N],
    [N, N, N, H], [H, N, N, N], [N, H, N, N], [N, N, H, N],
    // 257C ╼ ╽ ╾ ╿
    [N, H, N, L], [L, N, H, N], [N, L, N, H], [H, N, L, N],
];

const UP: usize = 0;
const RIGHT: usize = 1;
const DOWN: usize = 2;
const LEFT: usize = 3;

const CENTER: u32 = Segments::INT11.bits()
    | Segments::INT12.bits()
    | Segments::INT13.bits()
    | Segments::INT21.bits()
    | Segments::INT22.bits()
    | Segments::INT23.bits()
    | Segments::INT31.bits()
    | Segments::INT32.bits()
    | Segments::INT33.bits();

/// Segments of one arm: `[light, heavy, double]`.
const fn arm(dir: usize) -> [u32; 3] {
    match dir {
        UP => [
            Segments::TOP_C.bits() | Segments::INT12.bits() | Segments::INT22.bits(),
            Segments::TOP_L.bits() | Segments::TOP_C.bits() | Segments::TOP_R.bits() | CENTER,
            Segments::TOP_L.bits()
                | Segments::TOP_R.bits()
                | Segments::INT11.bits()
                | Segments::INT13.bits(),
        ],
        RIGHT => [
            Segments::RIGHT_C.bits() | Segments::INT23.bits() | Segments::INT22.bits(),
            Segments::RIGHT_T.bits() | Segments::RIGHT_C.bits() | Segments::RIGHT_B.bits() | CENTER,
            Segments::RIGHT_T.bits()
                | Segments::RIGHT_B.bits()
                | Segments::INT13.bits()
                | Segments::INT33.bits(),
        ],
        DOWN => [
            Segments::BOT_C.bits() | Segments::INT32.bits() | Segments::INT22.bits(),
            Segments::BOT_L.bits() | Segments::BOT_C.bits() | Segments::BOT_R.bits() | CENTER,
            Segments::BOT_L.bits()
                | Segments::BOT_R.bits()
                | Segments::INT31.bits()
                | Segments::INT33.bits(),
        ],
        _ => [
            Segments::LEFT_C.bits() | Segments::INT21.bits() | Segments::INT22.bits(),
            Segments::LEFT_T.bits() | Segments::LEFT_C.bits() | Segments::LEFT_B.bits() | CENTER,
            Segments::LEFT_T.bits()
                | Segments::LEFT_B.bits()
                | Segments::INT11.bits()
                | Segments::INT31.bits(),
        ],
    }
}

const fn glyph_mask(arms: [u8; 4]) -> u32 {
    let mut mask = 0u32;
    let mut dir = 0;
    while dir < 4 {
        let w = arms[dir];
        if w != N {
            mask |= arm(dir)[(w - 1) as usize];
        }
        dir += 1;
    }
    let count = (arms[0] != N) as u8 + (arms[1] != N) as u8 + (arms[2] != N) as u8 + (arms[3] != N) as u8;
    // straight double strokes close the gap over the center
    if arms[LEFT] == D && arms[RIGHT] == D && arms[UP] != D && arms[DOWN] != D {
        mask |= Segments::INT12.bits() | Segments::INT32.bits();
    }
    if arms[UP] == D && arms[DOWN] == D && arms[LEFT] != D && arms[RIGHT] != D {
        mask |= Segments::INT21.bits() | Segments::INT23.bits();
    }
    // double corners get their outer bend
    if count == 2 {
        if arms[DOWN] == D && arms[RIGHT] == D {
            mask |= Segments::INT11.bits() | Segments::INT12.bits() | Segments::INT21.bits();
        } else if arms[DOWN] == D && arms[LEFT] == D {
            mask |= Segments::INT13.bits() | Segments::INT12.bits() | Segments::INT23.bits();
        } else if arms[UP] == D && arms[RIGHT] == D {
            mask |= Segments::INT31.bits() | Segments::INT32.bits() | Segments::INT21.bits();
        } else if arms[UP] == D && arms[LEFT] == D {
            mask |= Segments::INT33.bits() | Segments::INT32.bits() | Segments::INT23.bits();
        }
    }
    mask
}

const fn build_table() -> [u32; 128] {
    let mut table = [0u32; 128];
    let mut i = 0;
    while i < 128 {
        table[i] = glyph_mask(ARMS[i]);
        i += 1;
    }
    table
}

pub static LINE_CHARS: [u32; 128] = build_table();

/// Segment mask for a box drawing character, empty for anything else.
pub fn segments(ch: char) -> Segments {
    if !core_grid::is_line_draw(ch) {
        return Segments::empty();
    }
    Segments::from_bits_truncate(LINE_CHARS[(ch as u32 & 0x7F) as usize])
}

/// Paint one glyph into the cell at `(x, y)` of size `w x h`.
#[allow(clippy::too_many_arguments)]
pub fn draw_line_char<C: Canvas + ?Sized>(
    canvas: &mut C,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    ch: char,
    color: Rgba,
    pen: u8,
) {
    let seg = segments(ch);
    if seg.is_empty() {
        return;
    }
    let cx = x + w / 2;
    let cy = y + h / 2;
    let ex = x + w - 1;
    let ey = y + h - 1;
    let mut line = |on: Segments, from: (i32, i32), to: (i32, i32)| {
        if seg.contains(on) {
            canvas.draw_line(from, to, color, pen);
        }
    };

    line(Segments::TOP_L, (cx - 1, y), (cx - 1, cy - 2));
    line(Segments::TOP_C, (cx, y), (cx, cy - 2));
    line(Segments::TOP_R, (cx + 1, y), (cx + 1, cy - 2));

    line(Segments::BOT_L, (cx - 1, cy + 2), (cx - 1, ey));
    line(Segments::BOT_C, (cx, cy + 2), (cx, ey));
    line(Segments::BOT_R, (cx + 1, cy + 2), (cx + 1, ey));

    line(Segments::LEFT_T, (x, cy - 1), (cx - 2, cy - 1));
    line(Segments::LEFT_C, (x, cy), (cx - 2, cy));
    line(Segments::LEFT_B, (x, cy + 1), (cx - 2, cy + 1));

    line(Segments::RIGHT_T, (cx + 2, cy - 1), (ex, cy - 1));
    line(Segments::RIGHT_C, (cx + 2, cy), (ex, cy));
    line(Segments::RIGHT_B, (cx + 2, cy + 1), (ex, cy + 1));

    let points = [
        (Segments::INT11, cx - 1, cy - 1),
        (Segments::INT12, cx, cy - 1),
        (Segments::INT13, cx + 1, cy - 1),
        (Segments::INT21, cx - 1, cy),
        (Segments::INT22, cx, cy),
        (Segments::INT23, cx + 1, cy),
        (Segments::INT31, cx - 1, cy + 1),
        (Segments::INT32, cx, cy + 1),
        (Segments::INT33, cx + 1, cy + 1),
    ];
    for (bit, px, py) in points {
        if seg.contains(bit) {
            canvas.draw_point(px, py, color, pen);
        }
    }
}

/// Paint a run of box drawing characters, one per cell.
#[allow(clippy::too_many_arguments)]
pub fn draw_line_char_string<C: Canvas + ?Sized>(
    canvas: &mut C,
    x: i32,
    y: i32,
    cell_w: i32,
    cell_h: i32,
    text: &str,
    color: Rgba,
    bold: bool,
) {
    let pen = if bold { 3 } else { 1 };
    for (i, ch) in text.chars().enumerate() {
        draw_line_char(canvas, x + cell_w * i as i32, y, cell_w, cell_h, ch, color, pen);
    }
}
