//! Integration tests for command dispatch over a live connection.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{Running, TestServer, wait_for_link};
use driftwood::proto::Response;
use driftwood::{Access, Command, CommandRouter, Invocation, LinkState, Session};

struct Echo;

#[async_trait]
impl Command for Echo {
    async fn run(&self, session: Arc<Session>, invocation: Invocation) -> anyhow::Result<()> {
        session.msg(&invocation.target, &invocation.args.join(" "));
        Ok(())
    }
}

/// Looks the sender up with WHO and reports what the server said.
struct WhoAmI;

#[async_trait]
impl Command for WhoAmI {
    async fn run(&self, session: Arc<Session>, invocation: Invocation) -> anyhow::Result<()> {
        let nickname = invocation.sender.nickname.clone();
        let end_of_who = session.on([Response::RPL_ENDOFWHO]);
        session.who(&nickname, true);
        tokio::time::timeout(Duration::from_secs(2), end_of_who).await?;

        let account = session
            .state()
            .user(&nickname)
            .and_then(|user| user.account.clone());
        let reply = match account {
            Some(account) => format!("{nickname} is logged in as {account}"),
            None => format!("{nickname} is not logged in"),
        };
        session.msg(&invocation.target, &reply);
        Ok(())
    }
}

struct Part;

#[async_trait]
impl Command for Part {
    fn min_access(&self) -> Access {
        Access::Admin
    }

    async fn run(&self, session: Arc<Session>, invocation: Invocation) -> anyhow::Result<()> {
        let channel = invocation
            .args
            .first()
            .cloned()
            .unwrap_or_else(|| invocation.target.clone());
        session.part(&channel, None);
        Ok(())
    }
}

async fn connected(server: &TestServer) -> (Running, common::TestClient) {
    let mut config = server.network("drift");
    config
        .privileges
        .insert("admin.host".to_string(), Access::Admin);

    let mut router = CommandRouter::new("%");
    router
        .register("echo", Echo)
        .register("whoami", WhoAmI)
        .register("part", Part);
    let running = Running::start(Session::new("test", config, Arc::new(router)));

    let mut conn = server.accept().await.unwrap();
    conn.registration().await.unwrap();
    conn.welcome("drift").await.unwrap();
    wait_for_link(&running.session, LinkState::Active).await.unwrap();
    conn.send_raw(":drift!drift@client.host JOIN #rust").await.unwrap();
    conn.expect("WHO").await.unwrap();
    (running, conn)
}

#[tokio::test]
async fn test_echo_in_channel() {
    let server = TestServer::spawn().await.unwrap();
    let (running, mut conn) = connected(&server).await;

    conn.send_raw(":alice!a@alice.host PRIVMSG #rust :%echo hello there")
        .await
        .unwrap();
    let reply = conn.expect("PRIVMSG").await.unwrap();
    assert_eq!(reply.params, vec!["#rust", "hello there"]);

    running.stop().await.unwrap();
}

#[tokio::test]
async fn test_private_command_replies_to_sender() {
    let server = TestServer::spawn().await.unwrap();
    let (running, mut conn) = connected(&server).await;

    conn.send_raw(":alice!a@alice.host PRIVMSG drift :%echo psst")
        .await
        .unwrap();
    let reply = conn.expect("PRIVMSG").await.unwrap();
    assert_eq!(reply.params, vec!["alice", "psst"]);

    running.stop().await.unwrap();
}

#[tokio::test]
async fn test_command_awaits_server_reply() {
    let server = TestServer::spawn().await.unwrap();
    let (running, mut conn) = connected(&server).await;

    conn.send_raw(":alice!a@alice.host JOIN #rust").await.unwrap();
    conn.expect("WHO").await.unwrap();

    conn.send_raw(":alice!a@alice.host PRIVMSG #rust :%whoami")
        .await
        .unwrap();
    let who = conn.expect("WHO").await.unwrap();
    assert_eq!(who.params, vec!["alice", "%uhnfar"]);

    conn.send_from_server("354 drift a alice.host alice H alice_acct :Alice")
        .await
        .unwrap();
    conn.send_from_server("315 drift alice :End of /WHO list.")
        .await
        .unwrap();

    let reply = conn.expect("PRIVMSG").await.unwrap();
    assert_eq!(reply.params, vec!["#rust", "alice is logged in as alice_acct"]);

    running.stop().await.unwrap();
}

#[tokio::test]
async fn test_access_denied_then_allowed() {
    let server = TestServer::spawn().await.unwrap();
    let (running, mut conn) = connected(&server).await;

    conn.send_raw(":mallory!m@elsewhere PRIVMSG #rust :%part")
        .await
        .unwrap();
    let denied = conn.expect("PRIVMSG").await.unwrap();
    assert_eq!(
        denied.params,
        vec!["#rust", "You do not have access to this command"]
    );

    conn.send_raw(":boss!b@admin.host PRIVMSG #rust :%part")
        .await
        .unwrap();
    let part = conn.expect("PART").await.unwrap();
    assert_eq!(part.param(0), Some("#rust"));

    running.stop().await.unwrap();
}
