//! Character cell grid model shared by the renderer and the input layers.
//!
//! The emulation engine produces `Image` snapshots; the display keeps its own
//! copy as the diff baseline for the next snapshot. Nothing in this crate
//! paints or talks to a host, it only describes content.
//!
//! Invariants:
//! * An `Image` always holds exactly `rows * columns` cells. A zero-sized image
//!   is valid and simply contains nothing.
//! * Reads outside the grid return the blank sentinel (`Image::get`), which is
//!   how scans past the last column terminate without special cases.
//! * A cell whose code point is `'\0'` is the continuation (right half) of a
//!   double-width glyph stored in the previous column.

pub mod cell;
pub mod class;
pub mod image;
pub mod line;
pub mod width;

pub use cell::{CONTINUATION, Cell, CellColor, DEFAULT_BACK, DEFAULT_FORE, Rendition};
pub use class::{CharClass, DEFAULT_WORD_CHARACTERS, WordCharacters};
pub use image::{Image, Point};
pub use line::{LineProperties, LineProperty};
pub use width::{char_width, is_line_draw};
