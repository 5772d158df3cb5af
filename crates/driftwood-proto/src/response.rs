//! IRC numeric reply codes tracked by the client session.
//!
//! Only the numerics a client needs for session bookkeeping are listed.
//! Anything else arrives as a plain [`Verb::Numeric`](crate::Verb) and is
//! logged by the default handler.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

#![allow(non_camel_case_types)]

use std::fmt;

/// IRC server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    // === Connection Registration (001-099) ===
    /// 001 - Welcome to the IRC network
    RPL_WELCOME = 1,
    /// 002 - Your host is running version
    RPL_YOURHOST = 2,
    /// 003 - Server creation date
    RPL_CREATED = 3,
    /// 004 - Server info (name, version, user modes, channel modes)
    RPL_MYINFO = 4,
    /// 005 - Server supported features (ISUPPORT)
    RPL_ISUPPORT = 5,

    // === Command Responses (200-399) ===
    /// 250 - Highest connection count
    RPL_STATSCONN = 250,
    /// 251 - User/service/server counts
    RPL_LUSERCLIENT = 251,
    /// 252 - Operator count
    RPL_LUSEROP = 252,
    /// 253 - Unknown connection count
    RPL_LUSERUNKNOWN = 253,
    /// 254 - Channel count
    RPL_LUSERCHANNELS = 254,
    /// 255 - Local client/server counts
    RPL_LUSERME = 255,
    /// 265 - Local user count
    RPL_LOCALUSERS = 265,
    /// 266 - Global user count
    RPL_GLOBALUSERS = 266,
    /// 301 - User is away
    RPL_AWAY = 301,
    /// 311 - WHOIS user info
    RPL_WHOISUSER = 311,
    /// 315 - End of WHO
    RPL_ENDOFWHO = 315,
    /// 317 - WHOIS idle time
    RPL_WHOISIDLE = 317,
    /// 324 - Channel modes
    RPL_CHANNELMODEIS = 324,
    /// 330 - WHOIS account name
    RPL_WHOISACCOUNT = 330,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 333 - Who set the topic and when
    RPL_TOPICWHOTIME = 333,
    /// 352 - WHO reply
    RPL_WHOREPLY = 352,
    /// 353 - NAMES reply
    RPL_NAMREPLY = 353,
    /// 354 - WHOX reply
    RPL_WHOSPCRPL = 354,
    /// 366 - End of NAMES
    RPL_ENDOFNAMES = 366,
    /// 372 - MOTD line
    RPL_MOTD = 372,
    /// 375 - MOTD start
    RPL_MOTDSTART = 375,
    /// 376 - End of MOTD
    RPL_ENDOFMOTD = 376,

    // === Error Replies (400-599) ===
    /// 432 - Erroneous nickname
    ERR_ERRONEUSNICKNAME = 432,
    /// 433 - Nickname is already in use
    ERR_NICKNAMEINUSE = 433,
}

impl Response {
    /// Every known response, in ascending code order.
    pub const ALL: [Response; 30] = [
        Response::RPL_WELCOME,
        Response::RPL_YOURHOST,
        Response::RPL_CREATED,
        Response::RPL_MYINFO,
        Response::RPL_ISUPPORT,
        Response::RPL_STATSCONN,
        Response::RPL_LUSERCLIENT,
        Response::RPL_LUSEROP,
        Response::RPL_LUSERUNKNOWN,
        Response::RPL_LUSERCHANNELS,
        Response::RPL_LUSERME,
        Response::RPL_LOCALUSERS,
        Response::RPL_GLOBALUSERS,
        Response::RPL_AWAY,
        Response::RPL_WHOISUSER,
        Response::RPL_ENDOFWHO,
        Response::RPL_WHOISIDLE,
        Response::RPL_CHANNELMODEIS,
        Response::RPL_WHOISACCOUNT,
        Response::RPL_TOPIC,
        Response::RPL_TOPICWHOTIME,
        Response::RPL_WHOREPLY,
        Response::RPL_NAMREPLY,
        Response::RPL_WHOSPCRPL,
        Response::RPL_ENDOFNAMES,
        Response::RPL_MOTD,
        Response::RPL_MOTDSTART,
        Response::RPL_ENDOFMOTD,
        Response::ERR_ERRONEUSNICKNAME,
        Response::ERR_NICKNAMEINUSE,
    ];

    /// Returns the numeric code as u16.
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Creates a Response from a numeric code.
    pub fn from_code(code: u16) -> Option<Response> {
        Self::ALL.iter().copied().find(|r| r.code() == code)
    }

    /// Check if this is an error response (4xx, 5xx).
    #[inline]
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code())
    }

    /// Check if this is a connection registration response (001-099).
    #[inline]
    pub fn is_registration(&self) -> bool {
        self.code() < 100
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.code())
    }
}
