//! User-related types.

use std::collections::BTreeSet;

use driftwood_proto::CaseMap;
use serde::Deserialize;

use super::ChannelId;

/// Stable handle for a user within one session's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub(super) u64);

/// Privilege level of a message sender, derived from its host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Banned = 0,
    #[default]
    Standard = 1,
    Trusted = 2,
    Elevated = 3,
    Op = 4,
    Admin = 5,
}

/// A user known to the session.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub nickname: String,
    pub ident: Option<String>,
    pub host: Option<String>,
    pub realname: Option<String>,
    /// Services account, when the server reports one.
    pub account: Option<String>,
    pub away: bool,
    pub away_message: Option<String>,
    /// Seconds idle, from WHOIS.
    pub idle: Option<u64>,
    /// Unix time of sign-on, from WHOIS.
    pub signon: Option<i64>,
    pub modes: BTreeSet<char>,
    pub access: Access,
    /// Channels shared with us (name → id).
    pub channels: CaseMap<ChannelId>,
}

impl User {
    pub(super) fn new(id: UserId, nickname: &str) -> Self {
        Self {
            id,
            nickname: nickname.to_string(),
            ident: None,
            host: None,
            realname: None,
            account: None,
            away: false,
            away_message: None,
            idle: None,
            signon: None,
            modes: BTreeSet::new(),
            access: Access::default(),
            channels: CaseMap::new(),
        }
    }

    /// `nick!ident@host`, with `*` for unknown parts.
    pub fn mask(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nickname,
            self.ident.as_deref().unwrap_or("*"),
            self.host.as_deref().unwrap_or("*")
        )
    }

    /// Modes as a string like "+iw".
    pub fn mode_string(&self) -> String {
        std::iter::once('+').chain(self.modes.iter().copied()).collect()
    }
}

/// Snapshot of who sent a line.
///
/// Built for every prefixed line; refers to a registered user when the
/// nickname is known, otherwise describes a transient sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub nickname: String,
    pub ident: Option<String>,
    pub host: Option<String>,
    pub access: Access,
    /// Registry id when the sender shares a channel with us.
    pub id: Option<UserId>,
}

impl Sender {
    /// `nick!ident@host`, with `*` for unknown parts.
    pub fn mask(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nickname,
            self.ident.as_deref().unwrap_or("*"),
            self.host.as_deref().unwrap_or("*")
        )
    }
}
