//! ISUPPORT (005) parsing and the server capability table.
//!
//! Each 005 reply carries `KEY=VALUE` or bare `KEY` tokens between the
//! target nickname and the trailing text. Values are coerced to an
//! integer when they parse as one, then to a float, and kept as text
//! otherwise. A bare token means the feature is present. `-KEY` withdraws
//! a previously advertised key.

use std::collections::HashMap;
use std::fmt;

/// Maximum outbound line length used until the server advertises `TOPICLEN`.
pub const DEFAULT_MAX_LINE_LEN: usize = 300;

/// Channel prefix characters assumed until the server sends `CHANTYPES`.
pub const DEFAULT_CHANTYPES: &str = "#&";

/// Membership prefix table assumed until the server sends `PREFIX`.
pub const DEFAULT_PREFIX: &str = "(ov)@+";

/// A typed ISUPPORT value.
#[derive(Clone, Debug, PartialEq)]
pub enum SupportValue {
    /// Value parsed as an integer.
    Int(i64),
    /// Value parsed as a float but not an integer.
    Float(f64),
    /// Any other value.
    Str(String),
    /// Token without a value.
    Flag(bool),
}

impl SupportValue {
    /// Coerce a raw token value.
    pub fn coerce(raw: &str) -> Self {
        if let Ok(int) = raw.parse::<i64>() {
            SupportValue::Int(int)
        } else if let Ok(float) = raw.parse::<f64>() {
            SupportValue::Float(float)
        } else {
            SupportValue::Str(raw.to_owned())
        }
    }

    /// Text value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SupportValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SupportValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for SupportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportValue::Int(i) => write!(f, "{i}"),
            SupportValue::Float(x) => write!(f, "{x}"),
            SupportValue::Str(s) => f.write_str(s),
            SupportValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// One parsed token.
#[derive(Clone, Debug, PartialEq)]
pub enum SupportToken {
    /// `KEY` or `KEY=VALUE`.
    Set(String, SupportValue),
    /// `-KEY`.
    Unset(String),
}

/// Parse a single ISUPPORT token. Empty tokens yield `None`.
pub fn parse_token(token: &str) -> Option<SupportToken> {
    if token.is_empty() {
        return None;
    }
    if let Some(key) = token.strip_prefix('-') {
        return (!key.is_empty()).then(|| SupportToken::Unset(key.to_owned()));
    }
    match token.split_once('=') {
        Some((key, value)) => Some(SupportToken::Set(key.to_owned(), SupportValue::coerce(value))),
        None => Some(SupportToken::Set(token.to_owned(), SupportValue::Flag(true))),
    }
}

/// Parsed `PREFIX` value, e.g. `(ov)@+`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixSpec {
    /// Mode letters, e.g. `ov`.
    pub modes: String,
    /// Membership symbols, e.g. `@+`, in the same order as `modes`.
    pub symbols: String,
}

impl PrefixSpec {
    /// Parse a `PREFIX` value. A value without parentheses is taken as a
    /// bare symbol list.
    pub fn parse(s: &str) -> Option<Self> {
        match s.strip_prefix('(').and_then(|rest| rest.split_once(')')) {
            Some((modes, symbols)) if !symbols.is_empty() => Some(PrefixSpec {
                modes: modes.to_owned(),
                symbols: symbols.to_owned(),
            }),
            Some(_) => None,
            None if !s.is_empty() && !s.starts_with('(') => Some(PrefixSpec {
                modes: String::new(),
                symbols: s.to_owned(),
            }),
            None => None,
        }
    }

    /// Mode letter granted by a membership symbol.
    pub fn mode_for_symbol(&self, symbol: char) -> Option<char> {
        self.symbols
            .chars()
            .position(|c| c == symbol)
            .and_then(|i| self.modes.chars().nth(i))
    }

    /// Whether the mode letter is a membership mode.
    pub fn is_prefix_mode(&self, mode: char) -> bool {
        self.modes.contains(mode)
    }
}

/// Parsed `CHANMODES` value.
///
/// Types A and B always take a parameter, type C only when set, type D
/// never.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChanModes {
    /// Type A: list modes.
    pub a: String,
    /// Type B: always parameterised.
    pub b: String,
    /// Type C: parameterised when set.
    pub c: String,
    /// Type D: flags.
    pub d: String,
}

impl ChanModes {
    /// Parse a value like `beI,k,l,imnpst`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(4, ',');
        let (a, b, c, d) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
        Some(ChanModes {
            a: a.to_owned(),
            b: b.to_owned(),
            c: c.to_owned(),
            d: d.to_owned(),
        })
    }

    /// Whether the mode consumes a parameter in the given direction.
    pub fn takes_param(&self, mode: char, adding: bool) -> bool {
        self.a.contains(mode) || self.b.contains(mode) || (adding && self.c.contains(mode))
    }
}

/// Capability table advertised by the server.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Supported {
    entries: HashMap<String, SupportValue>,
}

impl Supported {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the parameters of one 005 reply.
    ///
    /// The first parameter (our nickname) and the last (human readable
    /// text) are skipped.
    pub fn merge_reply(&mut self, params: &[String]) {
        if params.len() < 2 {
            return;
        }
        self.merge_tokens(params[1..params.len() - 1].iter().map(String::as_str));
    }

    /// Merge raw tokens.
    pub fn merge_tokens<'a>(&mut self, tokens: impl IntoIterator<Item = &'a str>) {
        for token in tokens.into_iter().filter_map(parse_token) {
            match token {
                SupportToken::Set(key, value) => {
                    self.entries.insert(key, value);
                }
                SupportToken::Unset(key) => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&SupportValue> {
        self.entries.get(key)
    }

    /// Whether a key is advertised.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of advertised keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been advertised.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Channel prefix characters.
    pub fn chantypes(&self) -> String {
        self.get("CHANTYPES")
            .map(ToString::to_string)
            .unwrap_or_else(|| DEFAULT_CHANTYPES.to_owned())
    }

    /// Whether a target names a channel.
    pub fn is_channel(&self, target: &str) -> bool {
        target
            .chars()
            .next()
            .is_some_and(|c| self.chantypes().contains(c))
    }

    /// Membership prefix table.
    pub fn prefix(&self) -> PrefixSpec {
        self.get("PREFIX")
            .and_then(SupportValue::as_str)
            .and_then(PrefixSpec::parse)
            .or_else(|| PrefixSpec::parse(DEFAULT_PREFIX))
            .unwrap_or_else(|| PrefixSpec {
                modes: "ov".into(),
                symbols: "@+".into(),
            })
    }

    /// Channel mode classes, if advertised.
    pub fn chanmodes(&self) -> Option<ChanModes> {
        self.get("CHANMODES")
            .and_then(SupportValue::as_str)
            .and_then(ChanModes::parse)
    }

    /// Maximum outbound line length in characters: `TOPICLEN`, or 300.
    pub fn max_line_len(&self) -> usize {
        self.get("TOPICLEN")
            .and_then(SupportValue::as_int)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_LINE_LEN)
    }

    /// Advertised network name.
    pub fn network(&self) -> Option<&str> {
        self.get("NETWORK").and_then(SupportValue::as_str)
    }
}
