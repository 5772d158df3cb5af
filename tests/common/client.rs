//! Server-side view of a connected session.
//!
//! Reads what the session sends and writes raw server lines back.

use std::time::Duration;

use driftwood::proto::Message;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

use super::server::SERVER_NAME;

/// One accepted connection.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Send a raw line; CRLF is appended.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send a numeric or command from the server prefix.
    pub async fn send_from_server(&mut self, rest: &str) -> anyhow::Result<()> {
        self.send_raw(&format!(":{SERVER_NAME} {rest}")).await
    }

    /// Receive a single line from the session.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a line with a timeout. EOF is an error.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Message> {
        let mut line = String::new();
        let read = timeout(dur, self.reader.read_line(&mut line)).await??;
        if read == 0 {
            anyhow::bail!("connection closed");
        }
        Ok(Message::parse(line.trim_end_matches(['\r', '\n']))?)
    }

    /// Receive lines until the predicate returns true.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<Message>>
    where
        F: FnMut(&Message) -> bool,
    {
        let mut messages = Vec::new();
        loop {
            let msg = self.recv().await?;
            let done = predicate(&msg);
            messages.push(msg);
            if done {
                break;
            }
        }
        Ok(messages)
    }

    /// Skip lines until one with `verb` arrives and return it.
    pub async fn expect(&mut self, verb: &str) -> anyhow::Result<Message> {
        let mut messages = self.recv_until(|msg| msg.verb.is(verb)).await?;
        messages
            .pop()
            .ok_or_else(|| anyhow::anyhow!("no {verb} received"))
    }

    /// Read the NICK/USER registration and return the nickname.
    pub async fn registration(&mut self) -> anyhow::Result<String> {
        let nick = self.expect("NICK").await?;
        self.expect("USER").await?;
        nick.param(0)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("NICK without a nickname"))
    }

    /// Accept registration under `nickname`.
    pub async fn welcome(&mut self, nickname: &str) -> anyhow::Result<()> {
        self.send_from_server(&format!("001 {nickname} :Welcome to the test network {nickname}"))
            .await
    }

    /// Whether the session closed its side within `dur`.
    pub async fn closed_within(&mut self, dur: Duration) -> bool {
        let mut line = String::new();
        loop {
            line.clear();
            match timeout(dur, self.reader.read_line(&mut line)).await {
                Ok(Ok(0)) | Ok(Err(_)) => return true,
                Ok(Ok(_)) => continue,
                Err(_) => return false,
            }
        }
    }
}
