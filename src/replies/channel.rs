//! Channel membership, topic and mode replies.

use driftwood_proto::{ChanModes, Message};
use tracing::debug;

use super::{ReplyContext, param};
use crate::error::{HandlerError, HandlerResult};
use crate::state::SessionState;

/// Mode classes assumed until the server advertises `CHANMODES`.
const DEFAULT_CHANMODES: &str = "beI,k,l,imnpst";

pub fn join(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let channel = param(msg, 0)?;
    let sender = ctx.sender(msg)?.clone();

    if ctx.state.is_local(&sender.nickname) {
        ctx.state.add_channel(channel);
        ctx.send(Message::who(channel, true));
    } else {
        ctx.send(Message::who(sender.nickname.as_str(), true));
    }

    ctx.state.add_member(channel, &sender.nickname)?;
    ctx.state
        .update_identity(&sender.nickname, sender.ident.as_deref(), sender.host.as_deref());
    if let Some(user) = ctx.state.user_mut(&sender.nickname) {
        user.access = sender.access;
    }
    Ok(())
}

pub fn part(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let channel = param(msg, 0)?;
    let nickname = ctx.sender(msg)?.nickname.clone();
    ctx.state.remove_member(channel, &nickname)
}

pub fn kick(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let channel = param(msg, 0)?;
    let kicked = param(msg, 1)?;
    debug!(channel, kicked, reason = msg.param(2).unwrap_or_default(), "kick");
    ctx.state.remove_member(channel, kicked)
}

/// Live topic change.
pub fn topic(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let channel = param(msg, 0)?;
    let text = param(msg, 1)?;
    let setter = ctx.sender(msg)?.mask();

    let chan = ctx
        .state
        .channel_mut(channel)
        .ok_or_else(|| HandlerError::NoSuchChannel(channel.to_string()))?;
    chan.topic.text = text.to_string();
    chan.topic.set_by = Some(setter);
    chan.topic.set_at = Some(chrono::Utc::now().timestamp());
    Ok(())
}

/// 332: topic on join or on request.
pub fn topic_reply(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let channel = param(msg, 1)?;
    let text = param(msg, 2)?;
    let chan = ctx
        .state
        .channel_mut(channel)
        .ok_or_else(|| HandlerError::NoSuchChannel(channel.to_string()))?;
    chan.topic.text = text.to_string();
    Ok(())
}

/// 333: who set the topic and when.
pub fn topic_who_time(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let channel = param(msg, 1)?;
    let setter = param(msg, 2)?;
    let set_at = param(msg, 3)?.parse::<i64>().ok();
    let chan = ctx
        .state
        .channel_mut(channel)
        .ok_or_else(|| HandlerError::NoSuchChannel(channel.to_string()))?;
    chan.topic.set_by = Some(setter.to_string());
    chan.topic.set_at = set_at;
    Ok(())
}

/// 353: `<me> [=*@] <channel> :<names>`.
pub fn names_reply(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    if msg.params.len() < 3 {
        return Err(HandlerError::NeedMoreParams(msg.verb.to_string()));
    }
    let channel = &msg.params[msg.params.len() - 2];
    let names = &msg.params[msg.params.len() - 1];

    if ctx.state.channel(channel).is_none() {
        debug!(channel = %channel, "names for a channel we are not in");
        return Ok(());
    }

    let symbols = ctx.state.supported.prefix().symbols;
    for entry in names.split(' ').filter(|n| !n.is_empty()) {
        let entry = entry.trim_start_matches(|c| symbols.contains(c));
        // userhost-in-names sends full masks.
        let (nickname, rest) = entry.split_once('!').unwrap_or((entry, ""));
        if nickname.is_empty() {
            continue;
        }
        ctx.state.add_member(channel, nickname)?;
        if let Some((ident, host)) = rest.split_once('@') {
            ctx.state.update_identity(nickname, Some(ident), Some(host));
        }
    }
    Ok(())
}

/// 366 and 315: end of a NAMES or WHO listing.
pub fn end_of_list(_ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    debug!(verb = %msg.verb, target = msg.param(1).unwrap_or_default(), "end of list");
    Ok(())
}

/// MODE on a channel or on ourselves.
pub fn mode(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let target = param(msg, 0)?;
    let modes = param(msg, 1)?;
    let args = msg.params.get(2..).unwrap_or_default();

    if ctx.state.supported.is_channel(target) {
        apply_channel_modes(ctx.state, target, modes, args)
    } else if ctx.state.is_local(target) {
        if let Some(user) = ctx.state.user_mut(target) {
            apply_flags(&mut user.modes, modes);
        }
        Ok(())
    } else {
        debug!(target, modes, "mode change for another user");
        Ok(())
    }
}

/// 324: `<me> <channel> <modes> [args...]`.
pub fn channel_mode_is(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let channel = param(msg, 1)?;
    let modes = param(msg, 2)?;
    let args = msg.params.get(3..).unwrap_or_default();
    apply_channel_modes(ctx.state, channel, modes, args)
}

/// Apply a mode string to a channel.
///
/// Only flag modes are stored; list, parameterised and membership modes
/// consume their argument and are otherwise ignored.
fn apply_channel_modes(
    state: &mut SessionState,
    channel: &str,
    modes: &str,
    args: &[String],
) -> HandlerResult {
    let prefix = state.supported.prefix();
    let classes = state
        .supported
        .chanmodes()
        .or_else(|| ChanModes::parse(DEFAULT_CHANMODES))
        .unwrap_or_default();
    let chan = state
        .channel_mut(channel)
        .ok_or_else(|| HandlerError::NoSuchChannel(channel.to_string()))?;

    let mut args = args.iter();
    let mut adding = true;
    for c in modes.chars() {
        match c {
            '+' => adding = true,
            '-' => adding = false,
            c if prefix.is_prefix_mode(c) || classes.takes_param(c, adding) => {
                args.next();
            }
            c if adding => {
                chan.modes.insert(c);
            }
            c => {
                chan.modes.remove(&c);
            }
        }
    }
    Ok(())
}

fn apply_flags(set: &mut std::collections::BTreeSet<char>, modes: &str) {
    let mut adding = true;
    for c in modes.chars() {
        match c {
            '+' => adding = true,
            '-' => adding = false,
            c if adding => {
                set.insert(c);
            }
            c => {
                set.remove(&c);
            }
        }
    }
}
