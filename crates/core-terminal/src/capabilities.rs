//! Terminal capability probing.
//!
//! Detection runs once at startup and only reads the environment; nothing is
//! written to the terminal. The crossterm canvas consults `truecolor` to
//! decide between 24-bit colors and the nearest 256-color index.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    /// 24-bit SGR colors.
    pub truecolor: bool,
    /// Mouse reporting can be requested (every crossterm platform).
    pub mouse: bool,
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        let colorterm = std::env::var("COLORTERM").ok();
        Self::from_colorterm(colorterm.as_deref())
    }

    /// `COLORTERM` of `truecolor` or `24bit` (any case) enables 24-bit color.
    pub fn from_colorterm(colorterm: Option<&str>) -> Self {
        let truecolor = colorterm.is_some_and(|v| {
            let v = v.trim();
            v.eq_ignore_ascii_case("truecolor") || v.eq_ignore_ascii_case("24bit")
        });
        Self {
            truecolor,
            mouse: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorterm_values() {
        assert!(TerminalCapabilities::from_colorterm(Some("truecolor")).truecolor);
        assert!(TerminalCapabilities::from_colorterm(Some("24BIT")).truecolor);
        assert!(!TerminalCapabilities::from_colorterm(Some("256color")).truecolor);
        assert!(!TerminalCapabilities::from_colorterm(None).truecolor);
    }
}
