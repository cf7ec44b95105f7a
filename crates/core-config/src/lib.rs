//! Display configuration loading and parsing.
//!
//! Parses `termview.toml` (or an override path supplied by the binary) into a
//! `ConfigFile` whose sections mirror the display concerns: `[display]`,
//! `[display.translucency]`, `[blink]`, `[bell]` and `[selection]`. Every
//! field has a default so a missing file, a missing section or a missing key
//! all yield the same behavior as an empty file. Unknown fields are ignored.
//!
//! The parsed value is injected into each display at construction; nothing
//! here is process-global. `Config::clamp` bounds timer intervals and line
//! spacing, logging every adjustment on the `config` target.

use serde::Deserialize;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Shortest accepted timer interval; faster timers would spin the event loop.
pub const MIN_INTERVAL_MS: u64 = 50;
pub const MAX_LINE_SPACING: u16 = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScrollbarLocation {
    None,
    Left,
    #[default]
    Right,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoldMode {
    /// Redraw the run one pixel to the right.
    #[default]
    Overstrike,
    /// Ask the canvas for a genuine bold face.
    Font,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BellMode {
    #[default]
    System,
    Notify,
    Visual,
    None,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TranslucencyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub backdrop: [u8; 3],
    #[serde(default = "TranslucencyConfig::default_alpha")]
    pub alpha: u8,
}

impl Default for TranslucencyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backdrop: [0, 0, 0],
            alpha: Self::default_alpha(),
        }
    }
}

impl TranslucencyConfig {
    const fn default_alpha() -> u8 {
        255
    }

    /// Translucent painting only applies when enabled with a non-opaque backdrop.
    pub fn is_active(&self) -> bool {
        self.enabled && self.alpha < 255
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DisplaySection {
    #[serde(default = "DisplaySection::default_antialias")]
    pub antialias: bool,
    /// Standalone hosts keep Ctrl shortcuts for themselves.
    #[serde(default)]
    pub standalone: bool,
    #[serde(default)]
    pub line_spacing: u16,
    #[serde(default)]
    pub scrollbar: ScrollbarLocation,
    #[serde(default)]
    pub bold: BoldMode,
    #[serde(default = "DisplaySection::default_terminal_size_hint")]
    pub terminal_size_hint: bool,
    #[serde(default = "DisplaySection::default_size_hint_ms")]
    pub size_hint_ms: u64,
    #[serde(default)]
    pub translucency: TranslucencyConfig,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            antialias: Self::default_antialias(),
            standalone: false,
            line_spacing: 0,
            scrollbar: ScrollbarLocation::default(),
            bold: BoldMode::default(),
            terminal_size_hint: Self::default_terminal_size_hint(),
            size_hint_ms: Self::default_size_hint_ms(),
            translucency: TranslucencyConfig::default(),
        }
    }
}

impl DisplaySection {
    const fn default_antialias() -> bool {
        true
    }
    const fn default_terminal_size_hint() -> bool {
        true
    }
    const fn default_size_hint_ms() -> u64 {
        3000
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BlinkSection {
    #[serde(default = "BlinkSection::default_text_ms")]
    pub text_ms: u64,
    #[serde(default = "BlinkSection::default_cursor_ms")]
    pub cursor_ms: u64,
    /// Initial blinking-cursor mode.
    #[serde(default)]
    pub cursor: bool,
}

impl Default for BlinkSection {
    fn default() -> Self {
        Self {
            text_ms: Self::default_text_ms(),
            cursor_ms: Self::default_cursor_ms(),
            cursor: false,
        }
    }
}

impl BlinkSection {
    const fn default_text_ms() -> u64 {
        500
    }
    const fn default_cursor_ms() -> u64 {
        1000
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BellSection {
    #[serde(default)]
    pub mode: BellMode,
    #[serde(default = "BellSection::default_suppress_ms")]
    pub suppress_ms: u64,
    #[serde(default = "BellSection::default_visual_ms")]
    pub visual_ms: u64,
}

impl Default for BellSection {
    fn default() -> Self {
        Self {
            mode: BellMode::default(),
            suppress_ms: Self::default_suppress_ms(),
            visual_ms: Self::default_visual_ms(),
        }
    }
}

impl BellSection {
    const fn default_suppress_ms() -> u64 {
        500
    }
    const fn default_visual_ms() -> u64 {
        200
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SelectionSection {
    #[serde(default = "SelectionSection::default_word_characters")]
    pub word_characters: String,
    /// Dragging selected text requires Ctrl.
    #[serde(default)]
    pub ctrl_drag: bool,
    #[serde(default)]
    pub cut_to_beginning_of_line: bool,
    #[serde(default = "SelectionSection::default_double_click_ms")]
    pub double_click_ms: u64,
    #[serde(default = "SelectionSection::default_drag_threshold")]
    pub drag_threshold: i32,
    #[serde(default = "SelectionSection::default_wheel_lines")]
    pub wheel_lines: i32,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            word_characters: Self::default_word_characters(),
            ctrl_drag: false,
            cut_to_beginning_of_line: false,
            double_click_ms: Self::default_double_click_ms(),
            drag_threshold: Self::default_drag_threshold(),
            wheel_lines: Self::default_wheel_lines(),
        }
    }
}

impl SelectionSection {
    fn default_word_characters() -> String {
        ":@-./_~".to_string()
    }
    const fn default_double_click_ms() -> u64 {
        400
    }
    const fn default_drag_threshold() -> i32 {
        4
    }
    const fn default_wheel_lines() -> i32 {
        3
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub display: DisplaySection,
    #[serde(default)]
    pub blink: BlinkSection,
    #[serde(default)]
    pub bell: BellSection,
    #[serde(default)]
    pub selection: SelectionSection,
}

/// The value a display is constructed with.
pub type DisplayConfig = ConfigFile;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("termview.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("termview").join("termview.toml");
    }
    PathBuf::from("termview.toml")
}

/// Strict parse used by `load_from` and by callers that want the error.
pub fn parse_str(content: &str) -> Result<ConfigFile, ConfigError> {
    Ok(toml::from_str::<ConfigFile>(content)?)
}

/// Load configuration, falling back to defaults when the file is missing or
/// malformed. The result is already clamped.
pub fn load_from(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = path.unwrap_or_else(discover);
    let mut cfg = match fs::read_to_string(&path) {
        Ok(content) => match parse_str(&content) {
            Ok(file) => Config {
                raw: Some(content),
                file,
            },
            Err(err) => {
                warn!(target: "config", path = %path.display(), %err, "config_parse_failed");
                Config::default()
            }
        },
        Err(_) => Config::default(),
    };
    cfg.clamp();
    Ok(cfg)
}

impl Config {
    /// Bound intervals and spacing to workable values. Returns how many fields
    /// were adjusted.
    pub fn clamp(&mut self) -> usize {
        let mut adjusted = 0;
        let f = &mut self.file;
        for (name, value) in [
            ("blink.text_ms", &mut f.blink.text_ms),
            ("blink.cursor_ms", &mut f.blink.cursor_ms),
            ("bell.suppress_ms", &mut f.bell.suppress_ms),
            ("bell.visual_ms", &mut f.bell.visual_ms),
            ("selection.double_click_ms", &mut f.selection.double_click_ms),
            ("display.size_hint_ms", &mut f.display.size_hint_ms),
        ] {
            if *value < MIN_INTERVAL_MS {
                info!(
                    target: "config",
                    field = name,
                    raw = *value,
                    clamped = MIN_INTERVAL_MS,
                    "interval_clamped"
                );
                *value = MIN_INTERVAL_MS;
                adjusted += 1;
            }
        }
        if f.display.line_spacing > MAX_LINE_SPACING {
            info!(
                target: "config",
                raw = f.display.line_spacing,
                clamped = MAX_LINE_SPACING,
                "line_spacing_clamped"
            );
            f.display.line_spacing = MAX_LINE_SPACING;
            adjusted += 1;
        }
        if f.selection.drag_threshold < 0 {
            f.selection.drag_threshold = 0;
            adjusted += 1;
        }
        adjusted
    }
}
