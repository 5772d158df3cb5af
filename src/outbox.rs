//! Outbound line queue.
//!
//! Writers never block: lines are sanitised, truncated and pushed onto an
//! unbounded FIFO. A single drain task per connection pops them in order,
//! writes each one and then sleeps for the throttle interval.

use std::time::Duration;

use driftwood_proto::LineCodec;
use futures_util::SinkExt;
use parking_lot::Mutex;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SessionError;

/// Marker appended to a line cut at the length limit.
pub const TRUNCATION_MARKER: &str = " <...>";

/// One queued line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundLine {
    pub text: String,
    /// Keepalive pings are sent without logging.
    pub log: bool,
}

/// Replace control characters with `[<code>]` and cut the result to
/// `max_len` characters, marking the cut.
pub fn prepare_line(line: &str, max_len: usize) -> String {
    let mut escaped = String::with_capacity(line.len());
    for c in line.chars() {
        if (c as u32) < 0x20 {
            escaped.push_str(&format!("[{}]", c as u32));
        } else {
            escaped.push(c);
        }
    }

    if escaped.chars().count() > max_len {
        let mut cut: String = escaped.chars().take(max_len).collect();
        cut.push_str(TRUNCATION_MARKER);
        cut
    } else {
        escaped
    }
}

/// Producer side of the queue, shared by everything that writes.
#[derive(Debug)]
pub struct Outbox {
    tx: Mutex<mpsc::UnboundedSender<OutboundLine>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<OutboundLine>>>,
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Outbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Mutex::new(tx),
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Queue a prepared line. Lines queued while no connection is up wait
    /// for the next drain loop or are dropped by [`Outbox::reset`].
    pub fn push(&self, text: String, log: bool) {
        // The receiver only disappears during teardown; the line is
        // dropped together with the rest of the queue then.
        let _ = self.tx.lock().send(OutboundLine { text, log });
    }

    /// Hand the consumer side to a drain loop.
    pub fn take_receiver(&self) -> Option<mpsc::UnboundedReceiver<OutboundLine>> {
        self.rx.lock().take()
    }

    /// Drop every unsent line and start a fresh queue.
    pub fn reset(&self) {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.tx.lock() = tx;
        *self.rx.lock() = Some(rx);
    }
}

/// Write queued lines until cancelled or the queue is replaced.
///
/// Returns an error when the socket write fails, which ends the
/// connection.
pub async fn drain<W>(
    mut rx: mpsc::UnboundedReceiver<OutboundLine>,
    mut writer: FramedWrite<W, LineCodec>,
    throttle: Duration,
    cancel: CancellationToken,
) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = rx.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        if line.log {
            info!(">> {}", line.text);
        }
        writer.send(line.text).await.map_err(SessionError::WriteFailed)?;

        if !throttle.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(throttle) => {}
            }
        }
    }

    debug!(pending = rx.len(), "drain loop stopped");
    Ok(())
}
