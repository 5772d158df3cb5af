//! Registration, capability and connection-level replies.

use driftwood_proto::{Message, irc_eq};
use tracing::{debug, info, warn};

use super::{ReplyContext, SessionEvent, param};
use crate::error::HandlerResult;

/// 001: the server accepted our registration.
pub fn welcome(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let nickname = param(msg, 0)?;
    ctx.state.set_local_user(nickname);
    ctx.state.server_host = msg.prefix.as_ref().map(|p| p.name().to_string());
    ctx.state.welcomed = true;

    info!(nickname, server = ?ctx.state.server_host, "welcomed");

    for channel in &ctx.config.autojoin {
        ctx.send(Message::join(channel.as_str()));
    }
    ctx.events.push(SessionEvent::Welcomed);
    Ok(())
}

/// 005: merge advertised capabilities.
pub fn isupport(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    ctx.state.supported.merge_reply(&msg.params);
    debug!(keys = ctx.state.supported.len(), "capabilities updated");
    Ok(())
}

/// Next nickname to try after a collision.
///
/// The counter always follows the configured nickname `base`: `bot9`
/// retries as `bot91`, then `bot92`. Anything that is not `base` plus a
/// counter starts over at `base1`.
pub fn next_nickname(base: &str, current: &str) -> String {
    let counter = current
        .get(..base.len())
        .filter(|head| irc_eq(head, base))
        .and_then(|_| current.get(base.len()..))
        .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|suffix| suffix.parse::<u64>().ok());
    match counter {
        Some(n) => format!("{base}{}", n.saturating_add(1)),
        None => format!("{base}1"),
    }
}

/// 433: nickname in use. Only renegotiated before welcome; later
/// collisions come from explicit NICK requests and are just reported.
pub fn nickname_in_use(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    if ctx.state.welcomed {
        warn!(nickname = msg.param(1).unwrap_or_default(), "nickname in use");
        return Ok(());
    }

    let next = next_nickname(&ctx.config.nickname, &ctx.state.nickname);
    info!(taken = %ctx.state.nickname, next = %next, "nickname in use, retrying");
    ctx.state.nickname = next.clone();
    ctx.send(Message::nick(next));
    Ok(())
}

/// 432: the server rejected a nickname outright.
pub fn erroneous_nickname(_ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    warn!(
        nickname = msg.param(1).unwrap_or_default(),
        reason = msg.trailing().unwrap_or_default(),
        "erroneous nickname"
    );
    Ok(())
}

/// PING with a prefix; answered like the bare form.
pub fn ping(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let token = msg.trailing().unwrap_or_default();
    ctx.send(Message::pong(token));
    Ok(())
}

pub fn pong(_ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    debug!(token = msg.trailing().unwrap_or_default(), "pong");
    Ok(())
}

/// Server-side ERROR; the server closes the link right after.
pub fn error(_ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    warn!(reason = msg.trailing().unwrap_or_default(), "server error");
    Ok(())
}

/// Informational numerics (002-004, LUSERS, MOTD).
pub fn log_reply(_ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let text = msg.params.get(1..).unwrap_or_default().join(" ");
    info!(verb = %msg.verb, "{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_nickname() {
        assert_eq!(next_nickname("drift", "drift"), "drift1");
        assert_eq!(next_nickname("drift", "drift1"), "drift2");
        assert_eq!(next_nickname("drift", "drift9"), "drift10");
    }

    #[test]
    fn test_next_nickname_keeps_configured_digits() {
        assert_eq!(next_nickname("bot9", "bot9"), "bot91");
        assert_eq!(next_nickname("bot9", "bot91"), "bot92");
        assert_eq!(next_nickname("r2d2", "r2d2"), "r2d21");
        assert_eq!(next_nickname("r2d2", "r2d29"), "r2d210");
    }

    #[test]
    fn test_next_nickname_restarts_from_base() {
        // Renamed away from the configured nick before welcome.
        assert_eq!(next_nickname("drift", "other"), "drift1");
        assert_eq!(next_nickname("drift", "DRIFT3"), "drift4");
    }
}
