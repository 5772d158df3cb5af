//! Parsing of lines as servers actually send them.

use driftwood_proto::{Message, Prefix, Response, Supported, Verb};

#[test]
fn test_welcome() {
    let msg = Message::parse(":irc.example.net 001 drift :Welcome to the Example IRC Network drift!d@host")
        .unwrap();
    assert_eq!(msg.prefix, Some(Prefix::ServerName("irc.example.net".into())));
    assert_eq!(msg.verb, Verb::from(Response::RPL_WELCOME));
    assert_eq!(msg.param(0), Some("drift"));
}

#[test]
fn test_names_reply() {
    let msg = Message::parse(":irc.example.net 353 drift = #rust :@alice +bob carol").unwrap();
    assert_eq!(msg.verb, Verb::from(Response::RPL_NAMREPLY));
    assert_eq!(msg.params, ["drift", "=", "#rust", "@alice +bob carol"]);
}

#[test]
fn test_whox_reply() {
    let msg = Message::parse(":irc.example.net 354 drift alice host.example alice H@ alice_acct :Alice A").unwrap();
    assert_eq!(msg.params.len(), 7);
    assert_eq!(msg.trailing(), Some("Alice A"));
}

#[test]
fn test_isupport_reply_feeds_table() {
    let msg = Message::parse(
        ":irc.example.net 005 drift CHANTYPES=# NAMESX PREFIX=(qov)~@+ TOPICLEN=390 :are supported by this server",
    )
    .unwrap();

    let mut supported = Supported::new();
    supported.merge_reply(&msg.params);

    assert_eq!(supported.chantypes(), "#");
    assert!(supported.contains("NAMESX"));
    assert_eq!(supported.prefix().symbols, "~@+");
    assert_eq!(supported.max_line_len(), 390);
}

#[test]
fn test_server_ping_without_prefix() {
    let msg = Message::parse("PING :irc.example.net").unwrap();
    assert!(msg.prefix.is_none());
    assert_eq!(Message::pong(msg.trailing().unwrap()).to_wire(), "PONG :irc.example.net");
}

#[test]
fn test_privmsg_survives_serialisation() {
    for text in ["hello", "hello world", ":starts with colon", ""] {
        let wire = Message::privmsg("#chan", text).to_wire();
        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed.param(1), Some(text), "wire line was {wire:?}");
    }
}
