//! IRC message prefix types.
//!
//! A prefix identifies the origin of a message. It is either a server
//! name or a user's `nick!user@host` mask. Clients routinely see
//! partial masks (`nick` alone, or `nick@host`), so ident and host are
//! optional.

use std::fmt;
use std::str::FromStr;

/// IRC message prefix: the sender of a line.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Prefix {
    /// Server name (e.g., "irc.example.com").
    ServerName(String),
    /// User prefix: nickname with optional ident and host.
    Nickname {
        /// Nickname.
        nick: String,
        /// Ident (the part after `!`), if sent.
        ident: Option<String>,
        /// Hostname (the part after `@`), if sent.
        host: Option<String>,
    },
}

impl Prefix {
    /// Parse a prefix string (without the leading `:`).
    ///
    /// This is a lenient parser: a bare name containing a dot is taken
    /// as a server name, anything else as a nickname. Without a `!` the
    /// ident and host remain unknown.
    pub fn new_from_str(s: &str) -> Self {
        match s.split_once('!') {
            Some((nick, rest)) => {
                let (ident, host) = match rest.split_once('@') {
                    Some((ident, host)) => (ident, Some(host.to_owned())),
                    None => (rest, None),
                };
                Prefix::Nickname {
                    nick: nick.to_owned(),
                    ident: Some(ident.to_owned()),
                    host,
                }
            }
            None if s.contains('.') && !s.contains('@') => Prefix::ServerName(s.to_owned()),
            None => Prefix::Nickname {
                nick: s.to_owned(),
                ident: None,
                host: None,
            },
        }
    }

    /// Create a full user prefix.
    pub fn new(nick: impl Into<String>, ident: impl Into<String>, host: impl Into<String>) -> Self {
        Prefix::Nickname {
            nick: nick.into(),
            ident: Some(ident.into()),
            host: Some(host.into()),
        }
    }

    /// The name of the sender: the nickname, or the server name.
    pub fn name(&self) -> &str {
        match self {
            Prefix::ServerName(name) => name,
            Prefix::Nickname { nick, .. } => nick,
        }
    }

    /// Get the nickname if this is a user prefix.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Prefix::Nickname { nick, .. } => Some(nick),
            Prefix::ServerName(_) => None,
        }
    }

    /// Get the ident if one was sent.
    pub fn ident(&self) -> Option<&str> {
        match self {
            Prefix::Nickname { ident, .. } => ident.as_deref(),
            Prefix::ServerName(_) => None,
        }
    }

    /// Get the hostname if one was sent.
    pub fn host(&self) -> Option<&str> {
        match self {
            Prefix::Nickname { host, .. } => host.as_deref(),
            Prefix::ServerName(_) => None,
        }
    }
}

impl FromStr for Prefix {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Prefix::new_from_str(s))
    }
}

impl From<&str> for Prefix {
    fn from(s: &str) -> Self {
        Prefix::new_from_str(s)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname { nick, ident, host } => {
                f.write_str(nick)?;
                if let Some(ident) = ident {
                    write!(f, "!{ident}")?;
                }
                if let Some(host) = host {
                    write!(f, "@{host}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_mask() {
        let prefix = Prefix::new_from_str("nick!user@host.example.com");
        assert_eq!(prefix.nick(), Some("nick"));
        assert_eq!(prefix.ident(), Some("user"));
        assert_eq!(prefix.host(), Some("host.example.com"));
    }

    #[test]
    fn test_bare_nick_has_no_host() {
        let prefix = Prefix::new_from_str("nick");
        assert_eq!(prefix.nick(), Some("nick"));
        assert_eq!(prefix.ident(), None);
        assert_eq!(prefix.host(), None);
    }

    #[test]
    fn test_server_name() {
        let prefix = Prefix::new_from_str("irc.example.com");
        assert_eq!(prefix, Prefix::ServerName("irc.example.com".into()));
        assert_eq!(prefix.name(), "irc.example.com");
        assert_eq!(prefix.nick(), None);
    }

    #[test]
    fn test_display_roundtrip() {
        for raw in ["nick!user@host", "irc.example.com", "nick"] {
            assert_eq!(Prefix::new_from_str(raw).to_string(), raw);
        }
    }
}
