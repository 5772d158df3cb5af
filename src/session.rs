//! One client session: state, outbound queue, reply table and callbacks
//! for a single network.
//!
//! The supervisor feeds every inbound line to [`Session::handle_line`].
//! Everything else on this type is for code that drives the session:
//! outbound helpers, waiters and state inspection.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use driftwood_proto::{Message, Verb};
use parking_lot::{RwLock, RwLockReadGuard};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::callbacks::{CallbackRegistry, CallbackToken, Waiter};
use crate::commands::CommandDispatcher;
use crate::config::NetworkConfig;
use crate::error::HandlerError;
use crate::outbox::{Outbox, prepare_line};
use crate::replies::{ReplyContext, ReplyTable, SessionEvent, unsupported};
use crate::state::SessionState;
use crate::supervisor::LinkState;

/// A connection to one network and everything known about it.
pub struct Session {
    name: String,
    config: NetworkConfig,
    state: RwLock<SessionState>,
    pub(crate) outbox: Outbox,
    callbacks: Arc<CallbackRegistry>,
    replies: ReplyTable,
    dispatcher: Arc<dyn CommandDispatcher>,
    link: watch::Sender<LinkState>,
    reconnect: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("address", &self.config.address)
            .field("link", &*self.link.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(name: impl Into<String>, config: NetworkConfig, dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        let (link, _) = watch::channel(LinkState::Idle);
        Self {
            name: name.into(),
            state: RwLock::new(SessionState::new(&config.nickname)),
            reconnect: AtomicBool::new(config.reconnect),
            config,
            outbox: Outbox::new(),
            callbacks: Arc::new(CallbackRegistry::new()),
            replies: ReplyTable::new(),
            dispatcher,
            link,
        }
    }

    /// Network name from the configuration table.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Read access to the state model.
    ///
    /// Hold the guard briefly: the read loop needs the write lock for
    /// every inbound line.
    pub fn state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read()
    }

    /// Current nickname, including any pending collision fallback.
    pub fn nickname(&self) -> String {
        self.state.read().nickname.clone()
    }

    /// Whether `target` names a channel on this network.
    pub fn is_channel(&self, target: &str) -> bool {
        self.state.read().supported.is_channel(target)
    }

    // ========================================================================
    // Link state
    // ========================================================================

    pub fn link_state(&self) -> LinkState {
        *self.link.borrow()
    }

    /// Watch link state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.link.subscribe()
    }

    pub(crate) fn set_link(&self, next: LinkState) {
        let previous = self.link.send_replace(next);
        if previous != next {
            info!(network = %self.name, from = ?previous, to = ?next, "link state");
        }
    }

    pub fn reconnect_enabled(&self) -> bool {
        self.reconnect.load(Ordering::SeqCst)
    }

    /// Stop the supervisor from reconnecting after the current connection.
    pub fn disable_reconnect(&self) {
        self.reconnect.store(false, Ordering::SeqCst);
    }

    /// Mark the socket as up.
    pub(crate) fn mark_connected(&self) {
        self.state.write().connected = true;
    }

    /// Forget the previous connection: clear the state model and replace
    /// the outbound queue, dropping unsent lines.
    pub(crate) fn reset_connection(&self) {
        self.state.write().reset(&self.config.nickname);
        self.outbox.reset();
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Queue a raw line. Control characters are escaped and the line is
    /// cut at the server's advertised length.
    pub fn write(&self, line: &str) {
        let max_len = self.state.read().supported.max_line_len();
        self.outbox.push(prepare_line(line, max_len), true);
    }

    /// Queue a raw line without logging it when it is sent.
    pub fn write_quiet(&self, line: &str) {
        let max_len = self.state.read().supported.max_line_len();
        self.outbox.push(prepare_line(line, max_len), false);
    }

    pub fn send(&self, message: &Message) {
        self.write(&message.to_wire());
    }

    pub fn msg(&self, target: &str, text: &str) {
        self.send(&Message::privmsg(target, text));
    }

    pub fn notice(&self, target: &str, text: &str) {
        self.send(&Message::notice(target, text));
    }

    pub fn join(&self, channel: &str) {
        self.send(&Message::join(channel));
    }

    pub fn part(&self, channel: &str, reason: Option<&str>) {
        self.send(&Message::part(channel, reason));
    }

    pub fn nick(&self, nickname: &str) {
        self.send(&Message::nick(nickname));
    }

    pub fn user(&self, username: &str, hostname: &str, servername: &str, realname: &str) {
        self.send(&Message::user(username, hostname, servername, realname));
    }

    /// Send `QUIT` and disable reconnection.
    pub fn quit(&self, reason: Option<&str>) {
        self.disable_reconnect();
        let reason = reason.map_or_else(|| self.config.quit_message(), str::to_string);
        self.send(&Message::quit(reason));
    }

    /// `WHO <mask>`, optionally requesting the `%uhnfar` WHOX fields.
    pub fn who(&self, mask: &str, extended: bool) {
        self.send(&Message::who(mask, extended));
    }

    pub fn whois(&self, nickname: &str) {
        self.send(&Message::whois(nickname));
    }

    pub fn mode(&self, target: &str, modes: &str, args: &[&str]) {
        self.send(&Message::mode(target, modes, args.iter().copied()));
    }

    /// Send `NICK` and `USER` for the current nickname.
    pub fn register(&self) {
        let nickname = self.nickname();
        self.nick(&nickname);
        self.user(
            &self.config.username(),
            self.config.hostname(),
            self.config.servername(),
            self.config.realname(),
        );
    }

    // ========================================================================
    // Callbacks
    // ========================================================================

    /// Resolve with the next message carrying any of `verbs`.
    ///
    /// The waiter is registered before this returns; add a timeout with
    /// `tokio::time::timeout` if the reply might never come.
    pub fn on<I, V>(&self, verbs: I) -> Waiter
    where
        I: IntoIterator<Item = V>,
        V: Into<Verb>,
    {
        self.callbacks.wait_for(verbs)
    }

    /// Run `callback` for every message carrying any of `verbs`, after
    /// the reply table has handled it.
    pub fn register_callback<I, V, F>(&self, verbs: I, callback: F) -> CallbackToken
    where
        I: IntoIterator<Item = V>,
        V: Into<Verb>,
        F: Fn(&Message) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks.register(verbs, callback)
    }

    pub fn unregister_callback(&self, token: CallbackToken) -> bool {
        self.callbacks.unregister(token)
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Process one inbound line.
    ///
    /// Runs the reply handler under the state write lock, then the
    /// callbacks for the verb, then hands PRIVMSG traffic to the command
    /// dispatcher in spawned tasks. Returns the events the handler raised.
    pub fn handle_line(self: &Arc<Self>, line: &str) -> Vec<SessionEvent> {
        debug!("<< {line}");

        let message = match Message::parse(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(network = %self.name, error = %e, "unparseable line");
                return Vec::new();
            }
        };

        if message.prefix.is_none() {
            self.server_line(&message);
            return Vec::new();
        }

        let events = self.apply(&message);
        if self.replies.contains(&message.verb) {
            self.callbacks.run(&message.verb, &message);
        }

        for event in &events {
            if let SessionEvent::Message(incoming) = event {
                let session = Arc::clone(self);
                let dispatcher = Arc::clone(&self.dispatcher);
                let incoming = incoming.clone();
                tokio::spawn(async move {
                    dispatcher.dispatch(session, incoming).await;
                });
            }
        }
        events
    }

    /// Lines without a sender come from the server we are connected to.
    fn server_line(&self, message: &Message) {
        if message.verb.is("PING") {
            let token = message.param(0).unwrap_or_default();
            self.write_quiet(&Message::pong(token).to_wire());
        } else if message.verb.is("ERROR") {
            warn!(network = %self.name, "server error: {}", message.trailing().unwrap_or_default());
        } else {
            info!(network = %self.name, "{message}");
        }
    }

    fn apply(&self, message: &Message) -> Vec<SessionEvent> {
        let Some(handler) = self.replies.get(&message.verb) else {
            unsupported(message);
            return Vec::new();
        };

        let mut state = self.state.write();
        let sender = message
            .prefix
            .as_ref()
            .and_then(|prefix| state.resolve_sender(prefix, |host| self.config.access_for(host)));
        let mut ctx = ReplyContext {
            state: &mut *state,
            outbox: &self.outbox,
            config: &self.config,
            sender,
            events: Vec::new(),
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| handler(&mut ctx, message)));
        let events = std::mem::take(&mut ctx.events);
        drop(state);

        let failure = match outcome {
            Ok(Ok(())) => return events,
            Ok(Err(e)) => e,
            Err(payload) => HandlerError::from_panic(payload),
        };
        error!(
            network = %self.name,
            verb = %message.verb,
            line = %message,
            error = %failure,
            code = failure.error_code(),
            "handler failed"
        );
        events
    }
}
