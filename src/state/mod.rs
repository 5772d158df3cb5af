//! Session state model.
//!
//! Users and channels live in id-keyed arenas owned by [`SessionState`];
//! cross references (`User::channels`, `Channel::users`) hold ids, never
//! owning pointers. Name lookups go through case-insensitive indexes.
//!
//! Invariants kept by every mutator here:
//! - a user is registered iff it shares at least one known channel with
//!   us, or is the local user;
//! - `Channel::users` and `User::channels` mirror each other;
//! - a rename re-keys the user in the registry and in every channel.

mod channel;
mod user;

pub use channel::{Channel, ChannelId, Topic};
pub use user::{Access, Sender, User, UserId};

use std::collections::HashMap;

use driftwood_proto::{CaseMap, Prefix, Supported, irc_eq};

use crate::error::HandlerError;

/// Everything the session has learned from the server on the current
/// connection.
#[derive(Debug)]
pub struct SessionState {
    /// Current nickname; renegotiated on collisions and renames.
    pub nickname: String,
    /// Server name taken from the welcome reply, used for keepalive.
    pub server_host: Option<String>,
    pub connected: bool,
    pub welcomed: bool,
    /// Capability table from 005 replies.
    pub supported: Supported,
    users: HashMap<UserId, User>,
    user_index: CaseMap<UserId>,
    channels: HashMap<ChannelId, Channel>,
    channel_index: CaseMap<ChannelId>,
    local: Option<UserId>,
    next_id: u64,
}

impl SessionState {
    pub fn new(nickname: &str) -> Self {
        Self {
            nickname: nickname.to_string(),
            server_host: None,
            connected: false,
            welcomed: false,
            supported: Supported::new(),
            users: HashMap::new(),
            user_index: CaseMap::new(),
            channels: HashMap::new(),
            channel_index: CaseMap::new(),
            local: None,
            next_id: 0,
        }
    }

    /// Forget everything learned on the previous connection.
    pub fn reset(&mut self, nickname: &str) {
        self.nickname = nickname.to_string();
        self.server_host = None;
        self.connected = false;
        self.welcomed = false;
        self.supported.clear();
        self.users.clear();
        self.user_index.clear();
        self.channels.clear();
        self.channel_index.clear();
        self.local = None;
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Whether a nickname is ours.
    pub fn is_local(&self, nickname: &str) -> bool {
        irc_eq(nickname, &self.nickname)
    }

    pub fn user(&self, nickname: &str) -> Option<&User> {
        self.user_index.get(nickname).and_then(|id| self.users.get(id))
    }

    pub fn user_mut(&mut self, nickname: &str) -> Option<&mut User> {
        let id = *self.user_index.get(nickname)?;
        self.users.get_mut(&id)
    }

    pub fn user_by_id(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channel_index.get(name).and_then(|id| self.channels.get(id))
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        let id = *self.channel_index.get(name)?;
        self.channels.get_mut(&id)
    }

    pub fn channel_by_id(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn local_user(&self) -> Option<&User> {
        self.local.and_then(|id| self.users.get(&id))
    }

    /// Register (or re-key) the local user under `nickname`.
    pub fn set_local_user(&mut self, nickname: &str) -> UserId {
        if let Some(id) = self.local {
            if let Some(previous) = self.users.get(&id).map(|u| u.nickname.clone()) {
                if previous != nickname {
                    // Registered, so the rename cannot fail.
                    let _ = self.rename(&previous, nickname);
                }
                self.nickname = nickname.to_string();
                return id;
            }
        }

        self.nickname = nickname.to_string();
        let id = self.ensure_user(nickname);
        self.local = Some(id);
        id
    }

    fn ensure_user(&mut self, nickname: &str) -> UserId {
        if let Some(id) = self.user_index.get(nickname) {
            return *id;
        }
        let id = UserId(self.next_id());
        self.users.insert(id, User::new(id, nickname));
        self.user_index.insert(nickname, id);
        id
    }

    /// Record ident and host for a registered user. `None` leaves the
    /// stored value untouched.
    pub fn update_identity(&mut self, nickname: &str, ident: Option<&str>, host: Option<&str>) {
        if let Some(user) = self.user_mut(nickname) {
            if let Some(ident) = ident {
                user.ident = Some(ident.to_string());
            }
            if let Some(host) = host {
                user.host = Some(host.to_string());
            }
        }
    }

    /// Describe the sender of a line.
    ///
    /// A registered user gets its ident, host and access refreshed; an
    /// unknown nickname yields a transient sender that is not stored.
    /// Server prefixes yield `None`.
    pub fn resolve_sender<F>(&mut self, prefix: &Prefix, access_for: F) -> Option<Sender>
    where
        F: Fn(Option<&str>) -> Access,
    {
        let Prefix::Nickname { nick, ident, host } = prefix else {
            return None;
        };

        match self.user_mut(nick) {
            Some(user) => {
                if let Some(ident) = ident {
                    user.ident = Some(ident.clone());
                }
                if let Some(host) = host {
                    user.host = Some(host.clone());
                }
                user.access = access_for(user.host.as_deref());
                Some(Sender {
                    nickname: user.nickname.clone(),
                    ident: user.ident.clone(),
                    host: user.host.clone(),
                    access: user.access,
                    id: Some(user.id),
                })
            }
            None => Some(Sender {
                nickname: nick.clone(),
                ident: ident.clone(),
                host: host.clone(),
                access: access_for(host.as_deref()),
                id: None,
            }),
        }
    }

    /// Create a channel entry if it does not exist yet.
    pub fn add_channel(&mut self, name: &str) -> ChannelId {
        if let Some(id) = self.channel_index.get(name) {
            return *id;
        }
        let id = ChannelId(self.next_id());
        self.channels.insert(id, Channel::new(id, name));
        self.channel_index.insert(name, id);
        id
    }

    /// Add `nickname` to a known channel, registering the user if needed.
    pub fn add_member(&mut self, channel: &str, nickname: &str) -> Result<UserId, HandlerError> {
        let channel_id = *self
            .channel_index
            .get(channel)
            .ok_or_else(|| HandlerError::NoSuchChannel(channel.to_string()))?;
        let user_id = self.ensure_user(nickname);

        if let Some(chan) = self.channels.get_mut(&channel_id) {
            chan.users.insert(nickname, user_id);
            if let Some(user) = self.users.get_mut(&user_id) {
                user.channels.insert(&chan.name, channel_id);
            }
        }
        Ok(user_id)
    }

    /// Remove `nickname` from a channel.
    ///
    /// When the nickname is ours the whole channel is dropped, together
    /// with every member that no longer shares a channel with us.
    pub fn remove_member(&mut self, channel: &str, nickname: &str) -> Result<(), HandlerError> {
        if !self.channel_index.contains_key(channel) {
            return Err(HandlerError::NoSuchChannel(channel.to_string()));
        }
        if self.is_local(nickname) {
            self.remove_channel(channel);
            return Ok(());
        }

        let user_id = *self
            .user_index
            .get(nickname)
            .ok_or_else(|| HandlerError::NoSuchUser(nickname.to_string()))?;
        if let Some(chan) = self.channel_mut(channel) {
            chan.users.remove(nickname);
        }
        if let Some(user) = self.users.get_mut(&user_id) {
            user.channels.remove(channel);
        }
        self.prune(user_id);
        Ok(())
    }

    /// Drop a channel and detach all of its members.
    pub fn remove_channel(&mut self, name: &str) -> Option<Channel> {
        let id = self.channel_index.remove(name)?;
        let channel = self.channels.remove(&id)?;

        for member in channel.users.values() {
            if let Some(user) = self.users.get_mut(member) {
                user.channels.remove(name);
            }
        }
        for member in channel.users.values() {
            self.prune(*member);
        }
        Some(channel)
    }

    /// Remove a user from every channel and from the registry.
    pub fn remove_user(&mut self, nickname: &str) -> Option<User> {
        let id = self.user_index.remove(nickname)?;
        let user = self.users.remove(&id)?;

        for channel_id in user.channels.values() {
            if let Some(chan) = self.channels.get_mut(channel_id) {
                chan.users.remove(nickname);
            }
        }
        if self.local == Some(id) {
            self.local = None;
        }
        Some(user)
    }

    /// Rename a user everywhere it is referenced.
    ///
    /// Renaming ourselves also updates [`SessionState::nickname`], even if
    /// the local user is not registered yet.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), HandlerError> {
        let local = self.is_local(old);
        if local {
            self.nickname = new.to_string();
        }

        let Some(id) = self.user_index.remove(old) else {
            return if local {
                Ok(())
            } else {
                Err(HandlerError::NoSuchUser(old.to_string()))
            };
        };

        // A stale entry under the new nickname belongs to someone who is gone.
        if self.user_index.get(new).is_some_and(|other| *other != id) {
            self.remove_user(new);
        }

        if let Some(user) = self.users.get_mut(&id) {
            user.nickname = new.to_string();
            for channel_id in user.channels.values() {
                if let Some(chan) = self.channels.get_mut(channel_id) {
                    chan.users.remove(old);
                    chan.users.insert(new, id);
                }
            }
        }
        self.user_index.insert(new, id);
        Ok(())
    }

    fn prune(&mut self, id: UserId) {
        if self.local == Some(id) {
            return;
        }
        let orphaned = self.users.get(&id).is_some_and(|u| u.channels.is_empty());
        if orphaned {
            if let Some(user) = self.users.remove(&id) {
                self.user_index.remove(&user.nickname);
            }
        }
    }
}
