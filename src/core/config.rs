use std::env;
use std::str::FromStr;

use crate::core::cache::{DEFAULT_CACHE_CAPACITY, DuplicatePolicy};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_bot_token: String,
    pub slack_user_token: String,
    pub slack_app_token: String,
    /// The only user whose commands are obeyed and whose messages are cached.
    pub slack_owner: String,
    pub slack_bot_user_id: String,
    /// Channel whose joins and leaves are announced.
    pub slack_channel: Option<String>,
    pub kv_param_prefix: String,
    pub message_cache_size: usize,
    pub message_cache_duplicates: DuplicatePolicy,
    pub refresh_cache_on_correction: bool,
    /// Zero disables the presence poller.
    pub presence_poll_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            slack_bot_token: env::var("SLACK_BOT_TOKEN")
                .map_err(|e| format!("SLACK_BOT_TOKEN: {}", e))?,
            slack_user_token: env::var("SLACK_USER_TOKEN")
                .map_err(|e| format!("SLACK_USER_TOKEN: {}", e))?,
            slack_app_token: env::var("SLACK_APP_TOKEN")
                .map_err(|e| format!("SLACK_APP_TOKEN: {}", e))?,
            slack_owner: env::var("SLACK_OWNER").map_err(|e| format!("SLACK_OWNER: {}", e))?,
            slack_bot_user_id: env::var("SLACK_BOT_USER_ID")
                .map_err(|e| format!("SLACK_BOT_USER_ID: {}", e))?,
            slack_channel: env::var("SLACK_CHANNEL").ok().filter(|c| !c.is_empty()),
            kv_param_prefix: env::var("KV_PARAM_PREFIX")
                .unwrap_or_else(|_| "/sidekick/kv/".to_string()),
            message_cache_size: parse_var("MESSAGE_CACHE_SIZE", DEFAULT_CACHE_CAPACITY)?,
            message_cache_duplicates: parse_var("MESSAGE_CACHE_DUPLICATES", DuplicatePolicy::Keep)?,
            refresh_cache_on_correction: parse_var("REFRESH_CACHE_ON_CORRECTION", false)?,
            presence_poll_seconds: parse_var("PRESENCE_POLL_SECONDS", 60)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| format!("{}: {}", name, e)),
        _ => Ok(default),
    }
}
