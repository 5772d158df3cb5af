//! Reply table: one handler per inbound verb.
//!
//! Handlers are the only code that mutates [`SessionState`]. They run on
//! the read loop with the state write lock held, so they are plain
//! synchronous functions; anything that needs to wait (commands, user
//! callbacks) runs after the lock is released.
//!
//! Handlers are grouped by concern:
//! - [`registration`]: welcome, ISUPPORT, nickname negotiation, PING/PONG
//! - [`channel`]: JOIN, PART, KICK, TOPIC, NAMES, MODE
//! - [`user`]: QUIT, NICK, WHO/WHOX and WHOIS replies
//! - [`messaging`]: PRIVMSG and NOTICE

mod channel;
mod messaging;
mod registration;
mod user;

pub use registration::next_nickname;

use std::collections::HashMap;

use driftwood_proto::{Message, Response, Verb};
use tracing::info;

use crate::commands::IncomingMessage;
use crate::config::NetworkConfig;
use crate::error::{HandlerError, HandlerResult};
use crate::outbox::{Outbox, prepare_line};
use crate::state::{Sender, SessionState};

/// Something a handler wants the session to act on once the state lock
/// is released.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The server accepted our registration; keepalive should start.
    Welcomed,
    /// A PRIVMSG to hand to the command dispatcher.
    Message(IncomingMessage),
}

/// Handler context passed to each reply handler.
pub struct ReplyContext<'a> {
    pub state: &'a mut SessionState,
    pub outbox: &'a Outbox,
    pub config: &'a NetworkConfig,
    /// Sender of the line; `None` for server prefixes.
    pub sender: Option<Sender>,
    pub events: Vec<SessionEvent>,
}

impl ReplyContext<'_> {
    /// Queue an outbound message.
    pub fn send(&self, message: Message) {
        let max_len = self.state.supported.max_line_len();
        self.outbox.push(prepare_line(&message.to_wire(), max_len), true);
    }

    /// The user who sent the line.
    pub fn sender(&self, message: &Message) -> Result<&Sender, HandlerError> {
        self.sender
            .as_ref()
            .ok_or_else(|| HandlerError::MissingSender(message.verb.to_string()))
    }
}

/// Parameter `index` or a `NeedMoreParams` error.
pub(crate) fn param(message: &Message, index: usize) -> Result<&str, HandlerError> {
    message
        .param(index)
        .ok_or_else(|| HandlerError::NeedMoreParams(message.verb.to_string()))
}

/// Signature shared by all reply handlers.
pub type ReplyHandler = fn(&mut ReplyContext<'_>, &Message) -> HandlerResult;

/// Case-sensitive verb → handler table, built once per session.
pub struct ReplyTable {
    handlers: HashMap<Verb, ReplyHandler>,
}

impl std::fmt::Debug for ReplyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyTable")
            .field("verbs", &self.handlers.len())
            .finish()
    }
}

impl Default for ReplyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyTable {
    /// Create a table with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<Verb, ReplyHandler> = HashMap::new();
        let mut command = |name: &str, handler: ReplyHandler| {
            handlers.insert(Verb::command(name), handler);
        };

        // Connection/registration handlers
        command("PING", registration::ping);
        command("PONG", registration::pong);
        command("ERROR", registration::error);

        // Channel handlers
        command("JOIN", channel::join);
        command("PART", channel::part);
        command("KICK", channel::kick);
        command("TOPIC", channel::topic);
        command("MODE", channel::mode);

        // User handlers
        command("QUIT", user::quit);
        command("NICK", user::nick);

        // Messaging handlers
        command("PRIVMSG", messaging::privmsg);
        command("NOTICE", messaging::notice);

        let mut numeric = |response: Response, handler: ReplyHandler| {
            handlers.insert(Verb::from(response), handler);
        };

        numeric(Response::RPL_WELCOME, registration::welcome);
        numeric(Response::RPL_ISUPPORT, registration::isupport);
        numeric(Response::ERR_NICKNAMEINUSE, registration::nickname_in_use);
        numeric(Response::ERR_ERRONEUSNICKNAME, registration::erroneous_nickname);
        for informational in [
            Response::RPL_YOURHOST,
            Response::RPL_CREATED,
            Response::RPL_MYINFO,
            Response::RPL_STATSCONN,
            Response::RPL_LUSERCLIENT,
            Response::RPL_LUSEROP,
            Response::RPL_LUSERUNKNOWN,
            Response::RPL_LUSERCHANNELS,
            Response::RPL_LUSERME,
            Response::RPL_LOCALUSERS,
            Response::RPL_GLOBALUSERS,
            Response::RPL_MOTDSTART,
            Response::RPL_MOTD,
            Response::RPL_ENDOFMOTD,
        ] {
            numeric(informational, registration::log_reply);
        }

        numeric(Response::RPL_TOPIC, channel::topic_reply);
        numeric(Response::RPL_TOPICWHOTIME, channel::topic_who_time);
        numeric(Response::RPL_NAMREPLY, channel::names_reply);
        numeric(Response::RPL_ENDOFNAMES, channel::end_of_list);
        numeric(Response::RPL_CHANNELMODEIS, channel::channel_mode_is);

        numeric(Response::RPL_WHOREPLY, user::who_reply);
        numeric(Response::RPL_WHOSPCRPL, user::whox_reply);
        numeric(Response::RPL_ENDOFWHO, channel::end_of_list);
        numeric(Response::RPL_WHOISUSER, user::whois_user);
        numeric(Response::RPL_AWAY, user::away);
        numeric(Response::RPL_WHOISIDLE, user::whois_idle);
        numeric(Response::RPL_WHOISACCOUNT, user::whois_account);

        Self { handlers }
    }

    /// Handler for `verb`, if the table knows it.
    pub fn get(&self, verb: &Verb) -> Option<ReplyHandler> {
        self.handlers.get(verb).copied()
    }

    pub fn contains(&self, verb: &Verb) -> bool {
        self.handlers.contains_key(verb)
    }
}

/// Fallback for verbs without a handler.
pub fn unsupported(message: &Message) {
    info!(verb = %message.verb, line = %message, "unsupported message");
}
