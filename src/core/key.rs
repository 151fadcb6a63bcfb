//! # Key Identity
//!
//! The capture layer hands us a `KeyPress`: the literal character a key
//! produced (if any) and its symbolic name (if it has one). The tally only
//! ever sees the derived identifier string.
//!
//! ```text
//! KeyPress { literal: Some('q'), named: None }        → "q"
//! KeyPress { literal: None,      named: Some("ESC") } → "ESC"
//! KeyPress { literal: Some(' '), named: Some("SPACE")} → "SPACE"
//! ```

/// Named key that ends the capture loop.
pub const EXIT_KEY: &str = "ESC";

/// Named key that raw mode delivers instead of SIGINT.
pub const INTERRUPT_KEY: &str = "CTRL+C";

/// A single key-press event as delivered by a key source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPress {
    pub literal: Option<char>,
    pub named: Option<String>,
}

impl KeyPress {
    /// A key with a symbolic name (e.g. `ESC`, `F5`).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            literal: None,
            named: Some(name.into()),
        }
    }

    /// A key that only produces a character.
    pub fn literal(c: char) -> Self {
        Self {
            literal: Some(c),
            named: None,
        }
    }

    /// Derives the key-identifier: named form first, literal fallback.
    /// Returns `None` for events that carry neither.
    pub fn identifier(&self) -> Option<String> {
        match (&self.named, self.literal) {
            (Some(name), _) if !name.is_empty() => Some(name.clone()),
            (_, Some(c)) => Some(c.to_string()),
            _ => None,
        }
    }

    /// Same as [`identifier`](Self::identifier), but lowercases literal
    /// characters. Named keys are left alone.
    pub fn folded_identifier(&self) -> Option<String> {
        match (&self.named, self.literal) {
            (Some(name), _) if !name.is_empty() => Some(name.clone()),
            (_, Some(c)) => Some(c.to_lowercase().collect()),
            _ => None,
        }
    }

    pub fn is_exit(&self) -> bool {
        self.named.as_deref() == Some(EXIT_KEY)
    }

    pub fn is_interrupt(&self) -> bool {
        self.named.as_deref() == Some(INTERRUPT_KEY)
    }
}
