//! Command dispatch for PRIVMSG traffic.
//!
//! The session hands every PRIVMSG to a [`CommandDispatcher`] in its own
//! task. [`CommandRouter`] is the stock dispatcher: it recognises lines
//! starting with the command prefix, picks the longest registered command
//! path, checks the sender's access and reports failures back to whoever
//! asked.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use driftwood_proto::Message;
use tracing::{Instrument, debug, warn};

use crate::session::Session;
use crate::state::{Access, Sender};
use crate::telemetry::{CommandTimer, spans};

/// Reply sent when a sender lacks the access a command requires.
pub const ACCESS_DENIED: &str = "You do not have access to this command";

/// A PRIVMSG as seen by the dispatcher.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub sender: Sender,
    /// Channel or nickname the message was addressed to.
    pub receiver: String,
    pub text: String,
    pub message: Message,
}

/// Receives every PRIVMSG the session sees.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, session: Arc<Session>, message: IncomingMessage);
}

/// Dispatcher that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

#[async_trait]
impl CommandDispatcher for NoopDispatcher {
    async fn dispatch(&self, _session: Arc<Session>, _message: IncomingMessage) {}
}

/// One parsed command invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Matched command path, lowercased (e.g. `["price", "watch"]`).
    pub path: Vec<String>,
    pub sender: Sender,
    pub receiver: String,
    /// Where replies go: the channel for channel messages, otherwise the
    /// sender.
    pub target: String,
    /// The arguments joined by single spaces.
    pub line: String,
    /// Words after the command path.
    pub args: Vec<String>,
}

/// A command routed by [`CommandRouter`].
#[async_trait]
pub trait Command: Send + Sync {
    /// Lowest access level allowed to run the command.
    fn min_access(&self) -> Access {
        Access::Standard
    }

    async fn run(&self, session: Arc<Session>, invocation: Invocation) -> anyhow::Result<()>;
}

/// Prefix/path/access router.
pub struct CommandRouter {
    prefix: String,
    commands: HashMap<Vec<String>, Arc<dyn Command>>,
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter")
            .field("prefix", &self.prefix)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn path_key<'a>(words: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    words.into_iter().map(str::to_lowercase).collect()
}

impl CommandRouter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: HashMap::new(),
        }
    }

    /// Register a command under a space-separated path such as
    /// `"price watch"`. A later registration for the same path wins.
    pub fn register<C>(&mut self, path: &str, command: C) -> &mut Self
    where
        C: Command + 'static,
    {
        self.commands
            .insert(path_key(path.split_whitespace()), Arc::new(command));
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Longest registered path that prefixes `words`, with its length.
    pub fn resolve(&self, words: &[&str]) -> Option<(Arc<dyn Command>, usize)> {
        (1..=words.len()).rev().find_map(|depth| {
            self.commands
                .get(&path_key(words[..depth].iter().copied()))
                .map(|command| (Arc::clone(command), depth))
        })
    }
}

#[async_trait]
impl CommandDispatcher for CommandRouter {
    async fn dispatch(&self, session: Arc<Session>, message: IncomingMessage) {
        let Some(line) = message.text.strip_prefix(self.prefix.as_str()) else {
            return;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((command, depth)) = self.resolve(&words) else {
            debug!(line, "no command matches");
            return;
        };

        let target = if session.is_channel(&message.receiver) {
            message.receiver.clone()
        } else {
            message.sender.nickname.clone()
        };
        let invocation = Invocation {
            path: path_key(words[..depth].iter().copied()),
            sender: message.sender.clone(),
            receiver: message.receiver.clone(),
            target: target.clone(),
            line: words[depth..].join(" "),
            args: words[depth..].iter().map(|w| w.to_string()).collect(),
        };
        let span = spans::command(&invocation.path.join(" "), &message.sender.nickname, Some(target.as_str()));

        if message.sender.access < command.min_access() {
            debug!(parent: &span, access = ?message.sender.access, "access denied");
            session.msg(&target, ACCESS_DENIED);
            return;
        }

        let _timer = CommandTimer::new(invocation.path.join(" "));
        if let Err(e) = command.run(Arc::clone(&session), invocation).instrument(span.clone()).await {
            warn!(parent: &span, error = %e, "command failed");
            session.msg(&target, &format!("{e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Record(Arc<Mutex<Vec<Invocation>>>);

    #[async_trait]
    impl Command for Record {
        async fn run(&self, _session: Arc<Session>, invocation: Invocation) -> anyhow::Result<()> {
            self.0.lock().push(invocation);
            Ok(())
        }
    }

    struct AdminOnly;

    #[async_trait]
    impl Command for AdminOnly {
        fn min_access(&self) -> Access {
            Access::Admin
        }

        async fn run(&self, session: Arc<Session>, invocation: Invocation) -> anyhow::Result<()> {
            session.msg(&invocation.target, "done");
            Ok(())
        }
    }

    struct Fails;

    #[async_trait]
    impl Command for Fails {
        async fn run(&self, _session: Arc<Session>, _invocation: Invocation) -> anyhow::Result<()> {
            anyhow::bail!("feed unavailable")
        }
    }

    fn session() -> Arc<Session> {
        Arc::new(Session::new(
            "test",
            NetworkConfig::new("irc.example.com", "drift"),
            Arc::new(NoopDispatcher),
        ))
    }

    fn incoming(receiver: &str, text: &str, access: Access) -> IncomingMessage {
        IncomingMessage {
            sender: Sender {
                nickname: "alice".to_string(),
                ident: Some("a".to_string()),
                host: Some("alice.host".to_string()),
                access,
                id: None,
            },
            receiver: receiver.to_string(),
            text: text.to_string(),
            message: Message::privmsg(receiver, text),
        }
    }

    fn sent(session: &Session) -> Vec<String> {
        let mut rx = session.outbox.take_receiver().unwrap();
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line.text);
        }
        lines
    }

    #[test]
    fn test_longest_path_wins() {
        let mut router = CommandRouter::new("%");
        router.register("price", Record::default());
        router.register("price watch", Record::default());

        let (_, depth) = router.resolve(&["PRICE", "watch", "gpu"]).unwrap();
        assert_eq!(depth, 2);
        let (_, depth) = router.resolve(&["price", "gpu"]).unwrap();
        assert_eq!(depth, 1);
        assert!(router.resolve(&["help"]).is_none());
    }

    #[tokio::test]
    async fn test_channel_command_replies_to_channel() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut router = CommandRouter::new("%");
        router.register("price watch", Record(Arc::clone(&calls)));

        router
            .dispatch(session(), incoming("#deals", "%price watch rtx 4090", Access::Standard))
            .await;

        let calls = calls.lock();
        let invocation = &calls[0];
        assert_eq!(invocation.path, vec!["price", "watch"]);
        assert_eq!(invocation.args, vec!["rtx", "4090"]);
        assert_eq!(invocation.target, "#deals");
        assert_eq!(invocation.line, "rtx 4090");
    }

    #[tokio::test]
    async fn test_private_command_replies_to_sender() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut router = CommandRouter::new("%");
        router.register("echo", Record(Arc::clone(&calls)));

        router
            .dispatch(session(), incoming("drift", "%echo hi", Access::Standard))
            .await;
        let calls = calls.lock();
        assert_eq!(calls[0].target, "alice");
        assert_eq!(calls[0].line, "hi");
        assert_eq!(calls[0].args, vec!["hi"]);
    }

    #[tokio::test]
    async fn test_unprefixed_text_is_ignored() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut router = CommandRouter::new("%");
        router.register("echo", Record(Arc::clone(&calls)));

        let session = session();
        router
            .dispatch(Arc::clone(&session), incoming("#a", "echo hi", Access::Standard))
            .await;
        assert!(calls.lock().is_empty());
        assert!(sent(&session).is_empty());
    }

    #[tokio::test]
    async fn test_access_is_enforced() {
        let mut router = CommandRouter::new("%");
        router.register("quit", AdminOnly);

        let session = session();
        router
            .dispatch(Arc::clone(&session), incoming("#a", "%quit", Access::Trusted))
            .await;
        router
            .dispatch(Arc::clone(&session), incoming("#a", "%quit", Access::Admin))
            .await;

        assert_eq!(
            sent(&session),
            vec![format!("PRIVMSG #a :{ACCESS_DENIED}"), "PRIVMSG #a :done".to_string()]
        );
    }

    #[tokio::test]
    async fn test_command_error_is_reported_to_target() {
        let mut router = CommandRouter::new("!");
        router.register("price", Fails);

        let session = session();
        router
            .dispatch(Arc::clone(&session), incoming("#a", "!price", Access::Standard))
            .await;
        assert_eq!(sent(&session), vec!["PRIVMSG #a :feed unavailable"]);
    }
}
