//! Input handling for the terminal display.
//!
//! Everything here decides what a key, pointer or drop means; nothing paints.
//! `selection` tracks select gestures and reports them through a
//! `DisplayHost`, `mouse` routes presses/moves/releases between selection and
//! protocol reports, `keys` holds the override-key and flow-control rules,
//! `dnd` turns dropped URLs into shell text and `event_source` feeds crossterm
//! input into the runtime channel.

pub mod dnd;
pub mod event_source;
pub mod keys;
pub mod mouse;
pub mod selection;

pub use dnd::{DropAction, DropMenu, DropOutcome, DropPayload, resolve_drop, shell_quote};
pub use event_source::{CrosstermInputSource, InputShutdown, map_event};
pub use keys::{claims_shortcut, flow_control, paste_text};
pub use mouse::{
    ClickCounter, DragState, MoveAction, Press, PressAction, ReleaseAction, classify_move,
    classify_press, classify_release, report_position,
};
pub use selection::{Granularity, SelectionTracker, SelectionView};
