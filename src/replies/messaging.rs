//! PRIVMSG and NOTICE.

use driftwood_proto::Message;
use tracing::info;

use super::{ReplyContext, SessionEvent, param};
use crate::commands::IncomingMessage;
use crate::error::HandlerResult;

/// Queue the message for the command dispatcher.
pub fn privmsg(ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let receiver = param(msg, 0)?;
    let text = param(msg, 1)?;
    let sender = ctx.sender(msg)?.clone();

    ctx.events.push(SessionEvent::Message(IncomingMessage {
        sender,
        receiver: receiver.to_string(),
        text: text.to_string(),
        message: msg.clone(),
    }));
    Ok(())
}

pub fn notice(_ctx: &mut ReplyContext<'_>, msg: &Message) -> HandlerResult {
    let from = msg.prefix.as_ref().map(|p| p.name()).unwrap_or("*");
    info!(from, target = msg.param(0).unwrap_or_default(), "notice: {}", msg.trailing().unwrap_or_default());
    Ok(())
}
