//! Periodic presence check for watched users.
//!
//! Each user's last seen presence lives in the `watched_users` map of the
//! key/value store. Changes are reported to the owner by DM and the map is
//! written back once per round.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, error, info};

use super::commands::WatchedUsers;
use crate::errors::SlackError;
use crate::slack::SlackBot;
use crate::slack::response_builder::{presence_changed_text, presence_failed_text};
use crate::store::{WATCHED_USERS_KEY, get_json, set_json};

/// Polls every watched user once. Returns whether any status changed.
///
/// # Errors
///
/// Returns an error if the watched users cannot be read or written back.
pub async fn check_presence(bot: &SlackBot) -> Result<bool, SlackError> {
    let Some(mut watched) = get_json::<WatchedUsers>(bot.store(), WATCHED_USERS_KEY).await? else {
        debug!("No watched users");
        return Ok(false);
    };

    let checks = watched
        .iter()
        .map(|(user, last)| check_user(bot, user.clone(), last.clone()));
    let changes: Vec<(String, String)> = join_all(checks).await.into_iter().flatten().collect();

    if changes.is_empty() {
        return Ok(false);
    }

    for (user, status) in changes {
        watched.insert(user, status);
    }
    set_json(bot.store(), WATCHED_USERS_KEY, &watched).await?;

    Ok(true)
}

async fn check_user(bot: &SlackBot, user: String, last: String) -> Option<(String, String)> {
    match report_change(bot, &user, &last).await {
        Ok(Some(status)) => Some((user, status)),
        Ok(None) => None,
        Err(e) => {
            error!(%user, "Presence check failed: {}", e);
            if let Err(e) = bot
                .notify_owner(presence_failed_text(&user, &e.to_string()))
                .await
            {
                error!(%user, "Failed to report presence check failure: {}", e);
            }
            None
        }
    }
}

async fn report_change(
    bot: &SlackBot,
    user: &str,
    last: &str,
) -> Result<Option<String>, SlackError> {
    let status = bot.bot().get_user_presence(user).await?;
    if status == last {
        return Ok(None);
    }

    info!(%user, from = %last, to = %status, "Presence changed");
    bot.notify_owner(presence_changed_text(user, last, &status))
        .await?;
    Ok(Some(status))
}

/// Runs `check_presence` forever at the given interval.
pub async fn run_presence_poller(bot: Arc<SlackBot>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(e) = check_presence(&bot).await {
            error!("Presence poll failed: {}", e);
        }
    }
}
