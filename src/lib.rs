/// Sidekick - a personal Slack bot that acts on its owner's behalf.
///
/// The bot listens over Socket Mode and keeps a bounded cache of the owner's
/// recent messages. Posting `s/find/replace` rewrites the newest cached
/// message in the same thread, both its plain text and every text node of its
/// Block Kit blocks. On top of that it handles a few owner-only text
/// commands, `/me` time templates, membership notices and a presence poller
/// for watched users.
///
/// # Architecture
///
/// The system uses:
/// - slack-morphism Socket Mode for inbound events
/// - reqwest and slack-morphism for Web API calls, as the bot and as the owner
/// - AWS SSM Parameter Store for the small key/value state
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sidekick::core::config::AppConfig;
/// use sidekick::errors::SlackError;
/// use sidekick::slack::SlackBot;
/// use sidekick::store::SsmStore;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     sidekick::setup_logging();
///
///     let config = AppConfig::from_env().map_err(SlackError::ConfigError)?;
///     let store = Arc::new(SsmStore::from_env(config.kv_param_prefix.clone()).await);
///     let bot = Arc::new(SlackBot::from_config(&config, store));
///
///     sidekick::slack::listener::run_socket_mode(bot, &config.slack_app_token).await
/// }
/// ```
// Module declarations
pub mod blocks;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod slack;
pub mod store;
pub mod utils;

/// Configure structured JSON logging.
///
/// The level comes from `RUST_LOG`, falling back to `info` (or `debug` with
/// the `debug-logs` feature).
///
/// # Example
///
/// ```
/// sidekick::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if cfg!(feature = "debug-logs") {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
