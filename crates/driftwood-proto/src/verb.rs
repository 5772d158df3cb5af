//! Message verbs: alphabetic commands and three-digit numeric replies.

use std::fmt;

use crate::response::Response;

/// The command or reply identifier of one protocol line.
///
/// Verbs compare case-sensitively: `PRIVMSG` and `privmsg` are distinct.
/// Numeric replies are normalised to their value, so `001` and the
/// constant [`Response::RPL_WELCOME`] produce the same verb.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Alphabetic command such as `PRIVMSG` or `JOIN`.
    Command(String),
    /// Three-digit numeric reply.
    Numeric(u16),
}

impl Verb {
    /// Classify a raw verb token.
    pub fn parse(token: &str) -> Self {
        if token.len() == 3 && token.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(code) = token.parse() {
                return Verb::Numeric(code);
            }
        }
        Verb::Command(token.to_owned())
    }

    /// Build a command verb.
    pub fn command(name: &str) -> Self {
        Verb::Command(name.to_owned())
    }

    /// The numeric code, if this is a numeric reply.
    pub fn code(&self) -> Option<u16> {
        match self {
            Verb::Numeric(code) => Some(*code),
            Verb::Command(_) => None,
        }
    }

    /// Whether this verb is the given command name.
    pub fn is(&self, name: &str) -> bool {
        matches!(self, Verb::Command(cmd) if cmd == name)
    }
}

impl From<Response> for Verb {
    fn from(response: Response) -> Self {
        Verb::Numeric(response.code())
    }
}

impl From<&str> for Verb {
    fn from(token: &str) -> Self {
        Verb::parse(token)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verb::Command(cmd) => f.write_str(cmd),
            Verb::Numeric(code) => write!(f, "{code:03}"),
        }
    }
}
