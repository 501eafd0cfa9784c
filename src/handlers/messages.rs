use tracing::debug;

use super::{correction, template};
use crate::core::models::{CachedMessage, MessageEvent, MessageSubtype};
use crate::slack::SlackBot;

/// Runs the message handlers in order, stopping at the first one that takes
/// the message over. Cache maintenance always comes last.
pub async fn handle_message(bot: &SlackBot, event: MessageEvent) {
    if template::send_template_message(bot, &event).await {
        return;
    }
    if correction::replace_text(bot, &event).await.is_handled() {
        return;
    }
    maintain_cache(bot, event);
}

/// Caches the owner's new messages and forgets the ones the owner deleted.
pub fn maintain_cache(bot: &SlackBot, event: MessageEvent) {
    if event.subtype == Some(MessageSubtype::MessageDeleted) {
        if let Some(previous) = event.previous_message.as_deref()
            && previous.is_cacheable_kind()
            && bot.is_owner(previous.user.as_deref())
        {
            debug!(channel = %event.channel, ts = %previous.ts, "Forgetting deleted message");
            bot.cache().remove(&event.channel, &previous.ts);
        }
        return;
    }

    if event.is_cacheable_kind() && bot.is_owner(event.user.as_deref()) {
        debug!(channel = %event.channel, ts = %event.ts, "Caching message");
        bot.cache().insert(CachedMessage::from(event));
    }
}
