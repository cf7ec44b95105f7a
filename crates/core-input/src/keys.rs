//! Keyboard side of the display: override keys, flow control and paste text.

use core_events::{KeyCode, KeyEvent, KeyModifiers};

/// Keys the focused display takes before the host's shortcut dispatch.
///
/// Tab and Delete always belong to the display; Ctrl+anything does too
/// unless the display runs standalone (no host menus to compete with).
pub fn claims_shortcut(key: &KeyEvent, focused: bool, standalone: bool) -> bool {
    if !focused {
        return false;
    }
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Delete => true,
        _ => key.mods.contains(KeyModifiers::CTRL) && !standalone,
    }
}

/// Ctrl+S suspends output, Ctrl+Q resumes it.
pub fn flow_control(key: &KeyEvent) -> Option<bool> {
    if key.is_ctrl_char('s') {
        Some(true)
    } else if key.is_ctrl_char('q') {
        Some(false)
    } else {
        None
    }
}

/// Text sent to the emulation for a middle-click paste: newlines become
/// carriage returns, and Ctrl adds a final return.
pub fn paste_text(clipboard: Option<&str>, append_return: bool) -> Option<String> {
    let text = clipboard?;
    if text.is_empty() {
        return None;
    }
    let mut out = text.replace('\n', "\r");
    if append_return {
        out.push('\r');
    }
    Some(out)
}
