//! Command keywords understood by the dispatcher.

use std::fmt;

/// Recognised command keyword, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Transmit an APDU to the card.
    Apdu,
    /// Reset the card and return its ATR/select response.
    Reset,
    /// Reserved for reader enumeration; not implemented.
    Enum,
    /// Anything else, kept verbatim for logging.
    Unknown(String),
}

impl CommandKind {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("APDU") {
            CommandKind::Apdu
        } else if name.eq_ignore_ascii_case("RESET") {
            CommandKind::Reset
        } else if name.eq_ignore_ascii_case("ENUM") {
            CommandKind::Enum
        } else {
            CommandKind::Unknown(name.to_string())
        }
    }

    /// Canonical keyword.
    pub fn as_str(&self) -> &str {
        match self {
            CommandKind::Apdu => "APDU",
            CommandKind::Reset => "RESET",
            CommandKind::Enum => "ENUM",
            CommandKind::Unknown(name) => name,
        }
    }

    /// Bounded label for metrics; unknown keywords share one label.
    pub fn metric_label(&self) -> &'static str {
        match self {
            CommandKind::Apdu => "APDU",
            CommandKind::Reset => "RESET",
            CommandKind::Enum => "ENUM",
            CommandKind::Unknown(_) => "OTHER",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
