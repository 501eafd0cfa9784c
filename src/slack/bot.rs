use std::sync::Arc;

use tracing::{error, info};

use super::client::{MessagingService, OutgoingMessage, SlackClient};
use crate::core::cache::MessageCache;
use crate::core::config::AppConfig;
use crate::errors::SlackError;
use crate::store::KeyValueStore;

/// Everything an event handler needs: both Slack identities, the message
/// cache and the key/value store.
pub struct SlackBot {
    config: AppConfig,
    bot: Arc<dyn MessagingService>,
    owner: Arc<dyn MessagingService>,
    cache: Arc<MessageCache>,
    store: Arc<dyn KeyValueStore>,
}

impl SlackBot {
    #[must_use]
    pub fn new(
        config: AppConfig,
        bot: Arc<dyn MessagingService>,
        owner: Arc<dyn MessagingService>,
        cache: Arc<MessageCache>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            config,
            bot,
            owner,
            cache,
            store,
        }
    }

    /// Builds real Slack clients for the bot and owner tokens.
    #[must_use]
    pub fn from_config(config: &AppConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let cache = MessageCache::new(config.message_cache_size, config.message_cache_duplicates);

        Self::new(
            config.clone(),
            Arc::new(SlackClient::new(config.slack_bot_token.clone())),
            Arc::new(SlackClient::new(config.slack_user_token.clone())),
            Arc::new(cache),
            store,
        )
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Acts as the bot user.
    #[must_use]
    pub fn bot(&self) -> &dyn MessagingService {
        self.bot.as_ref()
    }

    /// Acts as the owner, with the user token.
    #[must_use]
    pub fn owner(&self) -> &dyn MessagingService {
        self.owner.as_ref()
    }

    #[must_use]
    pub fn cache(&self) -> &MessageCache {
        &self.cache
    }

    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.config.slack_owner
    }

    #[must_use]
    pub fn is_owner(&self, user: Option<&str>) -> bool {
        user == Some(self.owner_id())
    }

    /// Deletes one of the owner's messages. Failures are logged and swallowed,
    /// so callers can run this alongside their real work.
    pub async fn delete_as_owner(&self, channel: &str, ts: &str) {
        log_delete(self.owner(), channel, ts).await;
    }

    /// Deletes a message the bot posted. Failures are logged and swallowed.
    pub async fn delete_as_bot(&self, channel: &str, ts: &str) {
        log_delete(self.bot(), channel, ts).await;
    }

    /// Sends a message from the bot to the owner's DM.
    ///
    /// # Errors
    ///
    /// Returns an error if the Slack API call fails.
    pub async fn notify_owner(&self, text: impl Into<String>) -> Result<(), SlackError> {
        let message = OutgoingMessage::new(self.owner_id()).with_text(text);
        self.bot.post_message(&message).await.map(|_| ())
    }
}

async fn log_delete(client: &dyn MessagingService, channel: &str, ts: &str) {
    match client.delete_message(channel, ts).await {
        Ok(()) => info!(
            "Successfully deleted message with ts {} from channel {}",
            ts, channel
        ),
        Err(e) => error!("Failed to delete message {} in {}: {}", ts, channel, e),
    }
}
