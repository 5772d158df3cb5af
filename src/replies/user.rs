//! User lifecycle and WHO/WHOIS replies.

use driftwood_proto::Message;
use tracing::debug;

use super::{ReplyContext, param};
use crate::error::{HandlerError, HandlerResult};

pub fn quit(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let nickname = ctx.sender(msg)?.nickname.clone();
    ctx.state
        .remove_user(&nickname)
        .map(|_| ())
        .ok_or(HandlerError::NoSuchUser(nickname))
}

pub fn nick(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let new = param(msg, 0)?;
    let old = ctx.sender(msg)?.nickname.clone();
    ctx.state.rename(&old, new)
}

/// 352: `<me> <channel> <ident> <host> <server> <nick> <flags> :<hops> <realname>`.
pub fn who_reply(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let ident = param(msg, 2)?;
    let host = param(msg, 3)?;
    let nickname = param(msg, 5)?;
    let flags = param(msg, 6)?;
    let trailing = param(msg, 7)?;
    let realname = trailing.split_once(' ').map_or("", |(_, name)| name);

    let Some(user) = ctx.state.user_mut(nickname) else {
        debug!(nickname, "who reply for an unknown user");
        return Ok(());
    };
    user.ident = Some(ident.to_string());
    user.host = Some(host.to_string());
    user.realname = Some(realname.to_string());
    user.away = flags.starts_with('G');
    Ok(())
}

/// 354 for `%uhnfar`: `<me> <ident> <host> <nick> <flags> <account> :<realname>`.
pub fn whox_reply(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let ident = param(msg, 1)?;
    let host = param(msg, 2)?;
    let nickname = param(msg, 3)?;
    let flags = param(msg, 4)?;
    let account = param(msg, 5)?;
    let realname = param(msg, 6)?;

    let Some(user) = ctx.state.user_mut(nickname) else {
        debug!(nickname, "whox reply for an unknown user");
        return Ok(());
    };
    user.ident = Some(ident.to_string());
    user.host = Some(host.to_string());
    user.away = flags.starts_with('G');
    user.account = (account != "0").then(|| account.to_string());
    user.realname = Some(realname.to_string());
    Ok(())
}

/// 311: `<me> <nick> <ident> <host> * :<realname>`.
pub fn whois_user(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let nickname = param(msg, 1)?;
    let ident = param(msg, 2)?;
    let host = param(msg, 3)?;
    let realname = msg.params.get(5).or(msg.params.last());

    if let Some(user) = ctx.state.user_mut(nickname) {
        user.ident = Some(ident.to_string());
        user.host = Some(host.to_string());
        user.realname = realname.cloned();
    }
    Ok(())
}

/// 301: `<me> <nick> :<message>`.
pub fn away(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let nickname = param(msg, 1)?;
    let message = msg.param(2).map(str::to_string);

    if let Some(user) = ctx.state.user_mut(nickname) {
        user.away = true;
        user.away_message = message;
    }
    Ok(())
}

/// 317: `<me> <nick> <idle> <signon> :seconds idle, signon time`.
pub fn whois_idle(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let nickname = param(msg, 1)?;
    let idle = param(msg, 2)?.parse().ok();
    let signon = msg.param(3).and_then(|s| s.parse().ok());

    if let Some(user) = ctx.state.user_mut(nickname) {
        user.idle = idle;
        user.signon = signon;
    }
    Ok(())
}

/// 330: `<me> <nick> <account> :is logged in as`.
pub fn whois_account(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let nickname = param(msg, 1)?;
    let account = param(msg, 2)?;

    if let Some(user) = ctx.state.user_mut(nickname) {
        user.account = Some(account.to_string());
    }
    Ok(())
}
