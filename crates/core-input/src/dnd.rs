//! Drag-and-drop payloads turned into text for the emulation.
//!
//! A drop of one local file offers paste, cd, copy, link and move. Several
//! files rule out cd; remote URLs rule out cd and link. Plain text and mail
//! links are pasted without asking.

use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropPayload {
    Urls(Vec<String>),
    Text(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropAction {
    Paste,
    Cd,
    Copy,
    Link,
    Move,
}

impl DropAction {
    pub const ALL: [DropAction; 5] = [
        DropAction::Paste,
        DropAction::Cd,
        DropAction::Move,
        DropAction::Copy,
        DropAction::Link,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DropAction::Paste => "Paste",
            DropAction::Cd => "Change Directory",
            DropAction::Copy => "Copy Here",
            DropAction::Link => "Link Here",
            DropAction::Move => "Move Here",
        }
    }

    fn command(self) -> Option<&'static str> {
        match self {
            DropAction::Copy => Some("kfmclient copy "),
            DropAction::Link => Some("ln -s "),
            DropAction::Move => Some("kfmclient move "),
            DropAction::Paste | DropAction::Cd => None,
        }
    }
}

/// Wrap in single quotes; embedded quotes become `'\''`.
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

/// What to do with a drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// Send this text right away.
    Paste(String),
    /// Ask the user; the host shows the menu and calls [`DropMenu::activate`].
    Menu(DropMenu),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropMenu {
    text: String,
    file_count: usize,
    cd: bool,
    link: bool,
}

impl DropMenu {
    pub fn is_enabled(&self, action: DropAction) -> bool {
        match action {
            DropAction::Cd => self.cd,
            DropAction::Link => self.link,
            _ => true,
        }
    }

    pub fn enabled(&self) -> Vec<DropAction> {
        DropAction::ALL
            .into_iter()
            .filter(|a| self.is_enabled(*a))
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Text to send for `action`; `None` when the action is disabled.
    /// `is_dir` answers whether a local path names a directory (`None` when
    /// it cannot be inspected).
    pub fn activate(
        &self,
        action: DropAction,
        is_dir: impl Fn(&Path) -> Option<bool>,
    ) -> Option<String> {
        if !self.is_enabled(action) {
            return None;
        }
        let operand = if self.file_count == 1 {
            shell_quote(&self.text)
        } else {
            self.text.clone()
        };
        let out = match action {
            DropAction::Paste => operand,
            DropAction::Cd => {
                let path = Path::new(&self.text);
                let dir = match is_dir(path) {
                    Some(false) => path
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from("/")),
                    _ => path.to_path_buf(),
                };
                format!("cd {}\n", shell_quote(&dir.to_string_lossy()))
            }
            other => {
                let command = other.command().unwrap_or_default();
                format!("{command}{operand} .\n")
            }
        };
        debug!(target: "input.dnd", ?action, len = out.len(), "drop_activated");
        Some(out)
    }
}

/// Local file path for a `file:` URL or a bare absolute path.
fn local_path(raw: &str) -> Option<String> {
    if raw.starts_with('/') {
        return Some(raw.to_string());
    }
    let url = Url::parse(raw).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path()
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

fn is_mailto(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|u| u.scheme() == "mailto")
}

pub fn resolve_drop(payload: DropPayload) -> DropOutcome {
    let urls = match payload {
        DropPayload::Text(text) => {
            debug!(target: "input.dnd", len = text.len(), "drop_text");
            return DropOutcome::Paste(text);
        }
        DropPayload::Urls(urls) if urls.is_empty() => return DropOutcome::Paste(String::new()),
        DropPayload::Urls(urls) => urls,
    };

    let many = urls.len() > 1;
    let mut menu = DropMenu {
        text: String::new(),
        file_count: 0,
        cd: !many,
        link: true,
    };
    for raw in &urls {
        if is_mailto(raw) {
            debug!(target: "input.dnd", count = urls.len(), "drop_mailto");
            return DropOutcome::Paste(urls.join(" "));
        }
        let item = match local_path(raw) {
            Some(path) => path,
            None => {
                menu.cd = false;
                menu.link = false;
                raw.clone()
            }
        };
        if menu.file_count > 0 {
            menu.text.push(' ');
        }
        menu.file_count += 1;
        if many {
            menu.text.push_str(&shell_quote(&item));
        } else {
            menu.text.push_str(&item);
        }
    }
    debug!(
        target: "input.dnd",
        count = menu.file_count,
        cd = menu.cd,
        link = menu.link,
        "drop_menu"
    );
    DropOutcome::Menu(menu)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(urls: &[&str]) -> DropMenu {
        match resolve_drop(DropPayload::Urls(urls.iter().map(|s| s.to_string()).collect())) {
            DropOutcome::Menu(m) => m,
            other => panic!("expected menu, got {other:?}"),
        }
    }

    #[test]
    fn quoting() {
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn single_local_file_enables_everything() {
        let m = menu(&["file:///tmp/notes.txt"]);
        assert_eq!(m.enabled().len(), 5);
        assert_eq!(
            m.activate(DropAction::Paste, |_| None).as_deref(),
            Some("'/tmp/notes.txt'")
        );
        assert_eq!(
            m.activate(DropAction::Cd, |_| Some(false)).as_deref(),
            Some("cd '/tmp'\n")
        );
        assert_eq!(
            m.activate(DropAction::Link, |_| None).as_deref(),
            Some("ln -s '/tmp/notes.txt' .\n")
        );
        assert_eq!(
            m.activate(DropAction::Move, |_| None).as_deref(),
            Some("kfmclient move '/tmp/notes.txt' .\n")
        );
    }

    #[test]
    fn cd_into_directory_keeps_path() {
        let m = menu(&["/srv/data"]);
        assert_eq!(
            m.activate(DropAction::Cd, |_| Some(true)).as_deref(),
            Some("cd '/srv/data'\n")
        );
    }

    #[test]
    fn several_files_disable_cd() {
        let m = menu(&["file:///a", "file:///b c"]);
        assert!(!m.is_enabled(DropAction::Cd));
        assert!(m.is_enabled(DropAction::Link));
        assert_eq!(m.activate(DropAction::Cd, |_| None), None);
        assert_eq!(
            m.activate(DropAction::Copy, |_| None).as_deref(),
            Some("kfmclient copy '/a' '/b c' .\n")
        );
    }

    #[test]
    fn remote_urls_disable_cd_and_link() {
        let m = menu(&["https://example.org/x"]);
        assert_eq!(
            m.enabled(),
            vec![DropAction::Paste, DropAction::Move, DropAction::Copy]
        );
    }

    #[test]
    fn mail_and_text_paste_directly() {
        assert_eq!(
            resolve_drop(DropPayload::Urls(vec!["mailto:a@b.org".into()])),
            DropOutcome::Paste("mailto:a@b.org".into())
        );
        assert_eq!(
            resolve_drop(DropPayload::Text("echo hi".into())),
            DropOutcome::Paste("echo hi".into())
        );
    }
}
