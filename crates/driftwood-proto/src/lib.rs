//! # driftwood-proto
//!
//! Protocol-level building blocks for the driftwood IRC client: case
//! mapping, message parsing and serialisation, numeric replies, ISUPPORT
//! handling and (with the `tokio` feature) a line codec.
//!
//! Nothing in this crate performs I/O on its own.
//!
//! ```rust
//! use driftwood_proto::{Message, Prefix, Verb};
//!
//! let msg: Message = ":nick!user@host PRIVMSG #chan :hello world".parse().unwrap();
//! assert_eq!(msg.prefix, Some(Prefix::new("nick", "user", "host")));
//! assert_eq!(msg.verb, Verb::command("PRIVMSG"));
//! assert_eq!(msg.params, ["#chan", "hello world"]);
//!
//! assert_eq!(Message::privmsg("#rust", "hi there").to_wire(), "PRIVMSG #rust :hi there");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod error;
pub mod isupport;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod prefix;
pub mod response;
pub mod verb;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower, CaseMap};
pub use self::error::{MessageParseError, ProtocolError};
pub use self::isupport::{ChanModes, PrefixSpec, SupportValue, Supported};
#[cfg(feature = "tokio")]
pub use self::line::{InboundEncoding, LineCodec, MAX_INBOUND_LINE};
pub use self::message::{Message, WHOX_FIELDS};
pub use self::prefix::Prefix;
pub use self::response::Response;
pub use self::verb::Verb;
