//! Character classes used by word selection.

/// Extra characters treated as part of a word unless configured otherwise.
pub const DEFAULT_WORD_CHARACTERS: &str = ":@-./_~";

/// Equivalence class of a code point for selection boundary expansion.
///
/// `Other` carries the character itself: two punctuation marks are the same
/// class only when they are the same character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharClass {
    Space,
    Word,
    Other(char),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordCharacters {
    extra: String,
}

impl Default for WordCharacters {
    fn default() -> Self {
        Self::new(DEFAULT_WORD_CHARACTERS)
    }
}

impl WordCharacters {
    pub fn new(extra: impl Into<String>) -> Self {
        Self {
            extra: extra.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.extra
    }

    pub fn classify(&self, ch: char) -> CharClass {
        if ch.is_whitespace() {
            CharClass::Space
        } else if ch.is_alphanumeric() || self.contains(ch) {
            CharClass::Word
        } else {
            CharClass::Other(ch)
        }
    }

    fn contains(&self, ch: char) -> bool {
        self.extra
            .chars()
            .any(|c| c == ch || c.to_lowercase().eq(ch.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        let wc = WordCharacters::default();
        assert_eq!(wc.classify(' '), CharClass::Space);
        assert_eq!(wc.classify('\t'), CharClass::Space);
        assert_eq!(wc.classify('x'), CharClass::Word);
        assert_eq!(wc.classify('7'), CharClass::Word);
        assert_eq!(wc.classify('/'), CharClass::Word);
        assert_eq!(wc.classify('@'), CharClass::Word);
        assert_eq!(wc.classify('('), CharClass::Other('('));
    }

    #[test]
    fn punctuation_is_only_equal_to_itself() {
        let wc = WordCharacters::new("");
        assert_eq!(wc.classify('('), wc.classify('('));
        assert_ne!(wc.classify('('), wc.classify(')'));
        assert_eq!(wc.classify('.'), CharClass::Other('.'));
    }
}
