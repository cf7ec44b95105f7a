//! Terminal display renderer: turns a character grid into paint calls.
//!
//! The emulation pushes whole `Image`s at the engine. The engine keeps the
//! last image it saw, diffs the new one against it and queues pixel damage on
//! the scheduler. `paint` then drains the scheduler and repaints only what the
//! frame plan names: scroll blits first, then dirty rectangles, then overlays
//! (size hint, suspended-output banner, scrollbar).
//!
//! Pieces:
//! - `geometry`: widget layout, scrollbar placement, pixel/cell conversion.
//! - `font`: cell metrics derived from a `FontMeasure`.
//! - `palette`: 20-entry color table and translucent blending.
//! - `diff`: cell-space comparison producing merged paint runs.
//! - `dirty` / `scheduler`: pixel damage collection and per-frame collapse
//!   (may escalate to a full repaint).
//! - `paint`: run painting with renditions, cursor, preedit and selection.
//! - `linefont`: box drawing glyphs stroked from segment tables.
//! - `canvas`: the backend trait plus a recording canvas for tests.
//! - `writer`: crossterm backed canvas with batched cell emission.
//! - `metrics`: paint path counters.
//!
//! Invariants:
//! - After `set_image`, the cached image equals the pushed image over the
//!   used extent; cells outside it are blank.
//! - Every cell whose content changed is covered by some dirty rectangle of
//!   the next frame plan.
//! - A pending full repaint subsumes all partial damage and scrolls.

pub mod canvas;
pub mod diff;
pub mod dirty;
pub mod engine;
pub mod font;
pub mod geometry;
pub mod linefont;
pub mod metrics;
pub mod paint;
pub mod palette;
pub mod scheduler;
pub mod scrollbar;
pub mod writer;

pub use canvas::{Canvas, PaintOp, RecordingCanvas, TextStyle};
pub use diff::{Composition, DiffReport, DirtyRun};
pub use engine::{ImageUpdate, PaintState, RenderEngine, SUSPENDED_BANNER};
pub use font::{CellMetrics, FixedFont, FontMeasure};
pub use geometry::{Geometry, Rect};
pub use metrics::RenderPathMetricsSnapshot;
pub use palette::{ColorEntry, Palette, Rgba};
pub use scheduler::{FramePlan, RenderDelta, RenderScheduler};
pub use writer::{CrosstermCanvas, FlushStats};
