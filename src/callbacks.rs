//! Callback and waiter registry.
//!
//! External code subscribes to verbs with [`CallbackRegistry::register`]
//! and receives every matching message after the reply table has handled
//! it. A [`Waiter`] is a single-shot subscription resolving a future.

use std::collections::HashMap;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use driftwood_proto::{Message, Verb};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::error;

use crate::error::HandlerError;

/// Function invoked for each matching message.
pub type Callback = Arc<dyn Fn(&Message) -> anyhow::Result<()> + Send + Sync>;

/// Opaque handle returned by registration, used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackToken(u64);

enum Entry {
    Handler(Callback),
    Waiter(Mutex<Option<oneshot::Sender<Message>>>),
}

type Slot = (CallbackToken, Arc<Entry>);

/// Verb-keyed callback lists, each in registration order.
#[derive(Default)]
pub struct CallbackRegistry {
    next_token: AtomicU64,
    entries: Mutex<HashMap<Verb, Vec<Slot>>>,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("verbs", &self.entries.lock().len())
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert<I, V>(&self, verbs: I, entry: Entry) -> CallbackToken
    where
        I: IntoIterator<Item = V>,
        V: Into<Verb>,
    {
        let token = CallbackToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let entry = Arc::new(entry);
        let mut entries = self.entries.lock();
        for verb in verbs {
            entries
                .entry(verb.into())
                .or_default()
                .push((token, Arc::clone(&entry)));
        }
        token
    }

    /// Register `callback` for every verb in `verbs`.
    pub fn register<I, V, F>(&self, verbs: I, callback: F) -> CallbackToken
    where
        I: IntoIterator<Item = V>,
        V: Into<Verb>,
        F: Fn(&Message) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.insert(verbs, Entry::Handler(Arc::new(callback)))
    }

    /// Register a single-shot waiter for any of `verbs`.
    ///
    /// The waiter is registered immediately, so a reply that arrives
    /// before the future is first polled is not missed.
    pub fn wait_for<I, V>(self: &Arc<Self>, verbs: I) -> Waiter
    where
        I: IntoIterator<Item = V>,
        V: Into<Verb>,
    {
        let (tx, rx) = oneshot::channel();
        let token = self.insert(verbs, Entry::Waiter(Mutex::new(Some(tx))));
        Waiter {
            rx,
            token,
            registry: Arc::clone(self),
        }
    }

    /// Remove every entry registered under `token`. Returns whether
    /// anything was removed.
    pub fn unregister(&self, token: CallbackToken) -> bool {
        let mut removed = false;
        let mut entries = self.entries.lock();
        entries.retain(|_, slots| {
            let before = slots.len();
            slots.retain(|(t, _)| *t != token);
            removed |= slots.len() != before;
            !slots.is_empty()
        });
        removed
    }

    /// Number of registrations for `verb`.
    pub fn count(&self, verb: &Verb) -> usize {
        self.entries.lock().get(verb).map_or(0, Vec::len)
    }

    /// Invoke every callback for `verb` in registration order.
    ///
    /// Each callback is isolated: an error or panic is logged and the
    /// remaining callbacks still run. Returns the failures.
    pub fn run(&self, verb: &Verb, message: &Message) -> Vec<HandlerError> {
        let slots: Vec<Slot> = match self.entries.lock().get(verb) {
            Some(slots) => slots.clone(),
            None => return Vec::new(),
        };

        let mut failures = Vec::new();
        for (token, entry) in slots {
            match entry.as_ref() {
                Entry::Handler(callback) => {
                    let outcome = catch_unwind(AssertUnwindSafe(|| callback(message)));
                    let failure = match outcome {
                        Ok(Ok(())) => continue,
                        Ok(Err(e)) => HandlerError::Callback(format!("{e:#}")),
                        Err(payload) => HandlerError::from_panic(payload),
                    };
                    error!(
                        verb = %verb,
                        line = %message,
                        error = %failure,
                        code = failure.error_code(),
                        "callback failed"
                    );
                    failures.push(failure);
                }
                Entry::Waiter(slot) => {
                    if let Some(tx) = slot.lock().take() {
                        // The waiter may have been dropped already.
                        let _ = tx.send(message.clone());
                    }
                    self.unregister(token);
                }
            }
        }
        failures
    }
}

/// Future resolving with the first message matching a waiter's verbs.
///
/// Dropping it unregisters the waiter. Resolves to `None` only if the
/// registration was removed by someone else before a match arrived.
#[must_use = "a waiter does nothing unless awaited"]
pub struct Waiter {
    rx: oneshot::Receiver<Message>,
    token: CallbackToken,
    registry: Arc<CallbackRegistry>,
}

impl Waiter {
    pub fn token(&self) -> CallbackToken {
        self.token
    }
}

impl Future for Waiter {
    type Output = Option<Message>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        self.registry.unregister(self.token);
    }
}
