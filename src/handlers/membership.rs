use tracing::{info, warn};

use crate::core::models::MembershipEvent;
use crate::slack::SlackBot;
use crate::slack::client::OutgoingMessage;
use crate::slack::response_builder::{member_joined_text, member_left_text};

fn is_announced(bot: &SlackBot, event: &MembershipEvent) -> bool {
    bot.config().slack_channel.as_deref() == Some(event.channel.as_str())
}

/// Tells the owner when someone leaves the announced channel.
pub async fn handle_member_left(bot: &SlackBot, event: &MembershipEvent) {
    if !is_announced(bot, event) {
        return;
    }

    info!(user = %event.user, channel = %event.channel, "Member left");
    if let Err(e) = bot
        .notify_owner(member_left_text(&event.user, &event.channel))
        .await
    {
        warn!("Failed to report member leaving: {}", e);
    }
}

/// Welcomes new members of the announced channel.
pub async fn handle_member_joined(bot: &SlackBot, event: &MembershipEvent) {
    if !is_announced(bot, event) {
        return;
    }

    info!(user = %event.user, channel = %event.channel, "Member joined");

    let message = OutgoingMessage::new(&event.channel)
        .with_text(member_joined_text(&event.user, bot.owner_id()));

    if let Err(e) = bot.bot().post_message(&message).await {
        warn!("Failed to welcome new member: {}", e);
    }
}
