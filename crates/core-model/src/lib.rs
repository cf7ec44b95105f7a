//! Display widget and pane arrangement.
//!
//! `TerminalDisplay` is what a host embeds per terminal: it takes images and
//! input, paints through a `Canvas` and reports back through a
//! `DisplayHost`. `PaneSplitter` arranges any number of displays in nested
//! horizontal/vertical splits and answers which one is active.
//!
//! Invariants:
//! * Display operations never fail; out-of-range input is clamped or ignored.
//! * Timers only fire inside `TerminalDisplay::tick`, against the injected
//!   clock.
//! * Every container appears in at most one leaf of a splitter tree.

pub mod display;
pub mod layout;
pub mod splitter;
pub mod timers;

pub use display::TerminalDisplay;
pub use layout::{Layout, LayoutRegion};
pub use splitter::{Orientation, PaneShape, PaneSplitter};
pub use timers::{Clock, ManualClock, SystemClock, TimerKind, Timers};
