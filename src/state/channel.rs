//! Channel-related types.

use std::collections::BTreeSet;

use driftwood_proto::CaseMap;

use super::UserId;

/// Stable handle for a channel within one session's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub(super) u64);

/// Channel topic with metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topic {
    pub text: String,
    /// `nick!ident@host` or bare nickname of whoever set it.
    pub set_by: Option<String>,
    /// Unix time of the change.
    pub set_at: Option<i64>,
}

/// A channel the local user is in.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub topic: Topic,
    /// Flag modes (no parameter) currently set.
    pub modes: BTreeSet<char>,
    /// Members (nickname → id).
    pub users: CaseMap<UserId>,
}

impl Channel {
    pub(super) fn new(id: ChannelId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            topic: Topic::default(),
            modes: BTreeSet::new(),
            users: CaseMap::new(),
        }
    }

    pub fn has_member(&self, nickname: &str) -> bool {
        self.users.contains_key(nickname)
    }

    /// Modes as a string like "+nt".
    pub fn mode_string(&self) -> String {
        std::iter::once('+').chain(self.modes.iter().copied()).collect()
    }
}
