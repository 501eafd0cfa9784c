use std::sync::Arc;
use std::time::Duration;

use sidekick::core::config::AppConfig;
use sidekick::errors::SlackError;
use sidekick::handlers::presence::run_presence_poller;
use sidekick::slack::SlackBot;
use sidekick::slack::listener::run_socket_mode;
use sidekick::store::SsmStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sidekick::setup_logging();

    let config = AppConfig::from_env().map_err(SlackError::ConfigError)?;

    let store = Arc::new(SsmStore::from_env(config.kv_param_prefix.clone()).await);
    let bot = Arc::new(SlackBot::from_config(&config, store));

    if config.presence_poll_seconds > 0 {
        info!(every_secs = config.presence_poll_seconds, "Starting presence poller");
        tokio::spawn(run_presence_poller(
            bot.clone(),
            Duration::from_secs(config.presence_poll_seconds),
        ));
    }

    info!(owner = %config.slack_owner, cache_size = config.message_cache_size, "Starting sidekick");
    run_socket_mode(bot, &config.slack_app_token).await
}
