//! IRC message parsing and serialisation.
//!
//! A protocol line has the shape:
//!
//! ```text
//! [@tags] [:prefix] <verb> [params...] [:trailing]
//! ```
//!
//! Tags are accepted and discarded; the session never negotiates them.
//! The first parameter starting with `:` consumes the rest of the line,
//! spaces included.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    sequence::preceded,
    IResult,
};

use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;
use crate::verb::Verb;

/// A parsed or outbound protocol message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Sender of the message, if the line carried one.
    pub prefix: Option<Prefix>,
    /// Command or numeric reply.
    pub verb: Verb,
    /// Parameters, the trailing one included as the last element.
    pub params: Vec<String>,
}

fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

fn parse_verb(input: &str) -> IResult<&str, &str> {
    take_while1(|c| c != ' ')(input)
}

/// Split the remainder after the verb into parameters.
///
/// Runs of spaces separate parameters. A token starting with `:` takes
/// the rest of the line verbatim.
fn parse_params(mut rest: &str) -> Vec<&str> {
    let mut params = Vec::new();

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    params
}

impl Message {
    /// Build a message from parts.
    pub fn new<I, S>(verb: impl Into<Verb>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Message {
            prefix: None,
            verb: verb.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach a sender prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Parse one line (terminator already removed, though a stray CRLF is
    /// tolerated).
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let invalid = |cause| ProtocolError::InvalidMessage {
            string: line.to_owned(),
            cause,
        };

        let input = line.trim_end_matches(['\r', '\n']);
        if input.trim().is_empty() {
            return Err(invalid(MessageParseError::EmptyMessage));
        }

        let (input, _tags) = opt(parse_tags)(input)
            .map_err(|_| invalid(MessageParseError::EmptyMessage))?;
        let (input, _) = space0::<_, nom::error::Error<&str>>(input)
            .map_err(|_| invalid(MessageParseError::EmptyMessage))?;

        let (input, prefix) = if input.starts_with(':') {
            let (rest, raw) = parse_prefix(input)
                .map_err(|_| invalid(MessageParseError::InvalidPrefix(input.to_owned())))?;
            (rest, Some(Prefix::new_from_str(raw)))
        } else {
            (input, None)
        };

        let input = input.trim_start_matches(' ');
        let (rest, verb) = parse_verb(input).map_err(|_| {
            invalid(if prefix.is_some() {
                MessageParseError::MissingVerb
            } else {
                MessageParseError::EmptyMessage
            })
        })?;

        Ok(Message {
            prefix,
            verb: Verb::parse(verb),
            params: parse_params(rest).into_iter().map(str::to_owned).collect(),
        })
    }

    /// Parameter at `index`, if present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The last parameter, which carries free text for most verbs.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Nickname of the sender, if the prefix names a user.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nick)
    }

    /// Serialise without the line terminator.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }

    /// `PRIVMSG target :text`
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Message::new("PRIVMSG", [target.into(), text.into()])
    }

    /// `NOTICE target :text`
    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Self {
        Message::new("NOTICE", [target.into(), text.into()])
    }

    /// `JOIN channel`
    pub fn join(channel: impl Into<String>) -> Self {
        Message::new("JOIN", [channel.into()])
    }

    /// `PART channel [:reason]`
    pub fn part(channel: impl Into<String>, reason: Option<&str>) -> Self {
        let mut params = vec![channel.into()];
        params.extend(reason.map(str::to_owned));
        Message::new("PART", params)
    }

    /// `NICK nickname`
    pub fn nick(nickname: impl Into<String>) -> Self {
        Message::new("NICK", [nickname.into()])
    }

    /// `USER user hostname servername :realname`
    pub fn user(user: &str, hostname: &str, servername: &str, realname: &str) -> Self {
        Message::new("USER", [user, hostname, servername, realname])
    }

    /// `QUIT :message`
    pub fn quit(message: impl Into<String>) -> Self {
        Message::new("QUIT", [message.into()])
    }

    /// `WHO mask`, or `WHO mask %uhnfar` for the extended reply layout.
    pub fn who(mask: impl Into<String>, extended: bool) -> Self {
        let mut params = vec![mask.into()];
        if extended {
            params.push(WHOX_FIELDS.to_owned());
        }
        Message::new("WHO", params)
    }

    /// `WHOIS nickname`
    pub fn whois(nickname: impl Into<String>) -> Self {
        Message::new("WHOIS", [nickname.into()])
    }

    /// `PING :token`
    pub fn ping(token: impl Into<String>) -> Self {
        Message::new("PING", [token.into()])
    }

    /// `PONG :token`
    pub fn pong(token: impl Into<String>) -> Self {
        Message::new("PONG", [token.into()])
    }

    /// `MODE target modes [args...]`
    pub fn mode<I, S>(target: impl Into<String>, modes: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut params = vec![target.into(), modes.into()];
        params.extend(args.into_iter().map(Into::into));
        Message::new("MODE", params)
    }
}

/// Field selector for extended WHO: ident, host, nick, flags, account,
/// realname.
pub const WHOX_FIELDS: &str = "%uhnfar";

/// Verbs whose final parameter is free text and always sent as trailing,
/// with the parameter position that text occupies.
const TEXT_VERBS: &[(&str, usize)] = &[
    ("PRIVMSG", 2),
    ("NOTICE", 2),
    ("PART", 2),
    ("TOPIC", 2),
    ("USER", 4),
    ("QUIT", 1),
    ("PING", 1),
    ("PONG", 1),
];

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{prefix} ")?;
        }
        write!(f, "{}", self.verb)?;

        let force_trailing = match &self.verb {
            Verb::Command(cmd) => TEXT_VERBS
                .iter()
                .any(|(verb, position)| *verb == cmd.as_str() && self.params.len() == *position),
            Verb::Numeric(_) => false,
        };
        let last = self.params.len().saturating_sub(1);

        for (i, param) in self.params.iter().enumerate() {
            let needs_colon = i == last
                && (force_trailing
                    || param.is_empty()
                    || param.contains(' ')
                    || param.starts_with(':'));
            if needs_colon {
                write!(f, " :{param}")?;
            } else {
                write!(f, " {param}")?;
            }
        }

        Ok(())
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privmsg_with_trailing() {
        let msg = Message::parse(":nick!user@host PRIVMSG #chan :hello world").unwrap();
        assert_eq!(msg.prefix, Some(Prefix::new("nick", "user", "host")));
        assert_eq!(msg.verb, Verb::command("PRIVMSG"));
        assert_eq!(msg.params, vec!["#chan", "hello world"]);
        assert_eq!(msg.source_nickname(), Some("nick"));
    }

    #[test]
    fn test_parse_without_prefix() {
        let msg = Message::parse("PING :irc.example.com").unwrap();
        assert_eq!(msg.prefix, None);
        assert!(msg.verb.is("PING"));
        assert_eq!(msg.trailing(), Some("irc.example.com"));
    }

    #[test]
    fn test_parse_numeric() {
        let msg = Message::parse(":srv.example 005 me CHANTYPES=# NAMESX :are supported").unwrap();
        assert_eq!(msg.verb, Verb::Numeric(5));
        assert_eq!(msg.params, vec!["me", "CHANTYPES=#", "NAMESX", "are supported"]);
    }

    #[test]
    fn test_trailing_keeps_inner_spaces_and_colons() {
        let msg = Message::parse(":a!b@c PRIVMSG #x :one  two :three").unwrap();
        assert_eq!(msg.param(1), Some("one  two :three"));
    }

    #[test]
    fn test_empty_trailing() {
        let msg = Message::parse(":a!b@c TOPIC #x :").unwrap();
        assert_eq!(msg.params, vec!["#x", ""]);
    }

    #[test]
    fn test_tags_are_skipped() {
        let msg = Message::parse("@time=2024-01-01T00:00:00Z :a!b@c JOIN #x").unwrap();
        assert_eq!(msg.source_nickname(), Some("a"));
        assert_eq!(msg.params, vec!["#x"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Message::parse(""),
            Err(ProtocolError::InvalidMessage {
                cause: MessageParseError::EmptyMessage,
                ..
            })
        ));
        assert!(matches!(
            Message::parse(":nick!user@host"),
            Err(ProtocolError::InvalidMessage {
                cause: MessageParseError::MissingVerb,
                ..
            })
        ));
        assert!(matches!(
            Message::parse(": JOIN #x"),
            Err(ProtocolError::InvalidMessage {
                cause: MessageParseError::InvalidPrefix(_),
                ..
            })
        ));
    }

    #[test]
    fn test_serialize_outbound() {
        assert_eq!(Message::privmsg("#chan", "hi").to_wire(), "PRIVMSG #chan :hi");
        assert_eq!(Message::join("#chan").to_wire(), "JOIN #chan");
        assert_eq!(Message::nick("bot").to_wire(), "NICK bot");
        assert_eq!(
            Message::user("bot", "-", "-", "Drift Wood").to_wire(),
            "USER bot - - :Drift Wood"
        );
        assert_eq!(Message::who("#chan", true).to_wire(), "WHO #chan %uhnfar");
        assert_eq!(Message::who("nick", false).to_wire(), "WHO nick");
        assert_eq!(Message::part("#chan", None).to_wire(), "PART #chan");
        assert_eq!(Message::pong("tok").to_wire(), "PONG :tok");
        assert_eq!(Message::mode("#chan", "+o", ["nick"]).to_wire(), "MODE #chan +o nick");
    }

    #[test]
    fn test_serialize_with_prefix() {
        let msg = Message::privmsg("#x", "hello there").with_prefix(Prefix::new("n", "u", "h"));
        assert_eq!(msg.to_string(), ":n!u@h PRIVMSG #x :hello there");
    }
}
