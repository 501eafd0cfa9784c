//! Event routing and the handlers behind it

pub mod commands;
pub mod correction;
pub mod membership;
pub mod messages;
pub mod presence;
pub mod template;
pub mod workflow;

use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::core::models::InboundEvent;
use crate::slack::SlackBot;

/// Dispatches one inbound event to its handler.
pub async fn handle_event(bot: &SlackBot, event: InboundEvent) {
    let correlation_id = Uuid::new_v4().to_string();
    let span = info_span!("slack_event", %correlation_id);

    async {
        match event {
            InboundEvent::Message(message) => messages::handle_message(bot, message).await,
            InboundEvent::AppMention(mention) => {
                commands::handle_app_mention(bot, &mention).await;
            }
            InboundEvent::MemberJoinedChannel(member) => {
                membership::handle_member_joined(bot, &member).await;
            }
            InboundEvent::MemberLeftChannel(member) => {
                membership::handle_member_left(bot, &member).await;
            }
            InboundEvent::FunctionExecuted(step) => {
                workflow::handle_function_executed(bot, step).await;
            }
            InboundEvent::Unsupported => debug!("Ignoring unsupported event"),
        }
    }
    .instrument(span)
    .await;
}
