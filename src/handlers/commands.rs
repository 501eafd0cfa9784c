//! Owner-only text commands sent by mentioning the bot.
//!
//! `@bot /del`, `/echo`, `/channel`, `/here`, `/watch`, `/unwatch`,
//! `/addsnippet`, `/delsnippet` and `/snippets`. Anything else is ignored.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::core::models::AppMentionEvent;
use crate::errors::SlackError;
use crate::slack::SlackBot;
use crate::slack::response_builder::{
    BroadcastKind, NO_USER_PROVIDED_TEXT, THREAD_ONLY_DELETE_TEXT, add_snippet_usage_text,
    build_broadcast_message, build_echo_message, snippet_added_text, snippet_list_text,
    snippet_not_found_text, snippet_removed_text, watch_started_text, watch_stopped_text,
};
use crate::store::{SNIPPETS_KEY, WATCHED_USERS_KEY, get_json, set_json};
use crate::utils::text::{find_user_mention, strip_bot_mention, text_after};

/// Status recorded for a user that has just been watched.
pub const NEW_WATCH_STATUS: &str = "new";

pub type WatchedUsers = BTreeMap<String, String>;
pub type Snippets = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextCommand {
    Delete,
    Echo(String),
    Broadcast { kind: BroadcastKind, text: String },
    Watch(Option<String>),
    Unwatch(Option<String>),
    /// `None` when the key or value is missing.
    AddSnippet(Option<(String, String)>),
    DeleteSnippet(String),
    ListSnippets,
}

impl TextCommand {
    /// Parses the mention text with the bot's own mention already removed.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text == "/del" {
            return Some(TextCommand::Delete);
        }
        if text.starts_with("/echo") {
            return Some(TextCommand::Echo(text_after(text, 6).to_string()));
        }
        for kind in [BroadcastKind::Channel, BroadcastKind::Here] {
            let prefix = format!("/{}", kind.as_str());
            if text.starts_with(&prefix) {
                let rest = text_after(text, prefix.len() + 1).to_string();
                return Some(TextCommand::Broadcast { kind, text: rest });
            }
        }
        if let Some(args) = text.strip_prefix("/watch") {
            return Some(TextCommand::Watch(mentioned_user(args)));
        }
        if let Some(args) = text.strip_prefix("/unwatch") {
            return Some(TextCommand::Unwatch(mentioned_user(args)));
        }
        if text.starts_with("/addsnippet") {
            return Some(TextCommand::AddSnippet(parse_snippet(text)));
        }
        if text.starts_with("/delsnippet") {
            let key = text.split(' ').nth(1).unwrap_or_default();
            return Some(TextCommand::DeleteSnippet(key.to_string()));
        }
        if text.starts_with("/snippets") {
            return Some(TextCommand::ListSnippets);
        }
        None
    }
}

fn mentioned_user(args: &str) -> Option<String> {
    find_user_mention(args.trim()).map(ToString::to_string)
}

fn parse_snippet(text: &str) -> Option<(String, String)> {
    let mut parts = text.split(' ').skip(1);
    let key = parts.next().filter(|k| !k.is_empty())?;
    let value: Vec<&str> = parts.collect();
    if value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.join(" ")))
}

/// Handles an `app_mention` from the owner.
pub async fn handle_app_mention(bot: &SlackBot, event: &AppMentionEvent) {
    if !bot.is_owner(event.user.as_deref()) {
        return;
    }
    let Some(text) = event.text.as_deref() else {
        return;
    };

    let text = strip_bot_mention(text, &bot.config().slack_bot_user_id);
    let Some(command) = TextCommand::parse(&text) else {
        return;
    };

    info!(channel = %event.channel, ?command, "Running text command");

    if let Err(e) = run_command(bot, event, command).await {
        error!(channel = %event.channel, "Text command failed: {}", e);
    }
}

async fn run_command(
    bot: &SlackBot,
    event: &AppMentionEvent,
    command: TextCommand,
) -> Result<(), SlackError> {
    let channel = event.channel.as_str();
    let thread_ts = event.thread_ts.as_deref();

    match command {
        TextCommand::Delete => match thread_ts {
            Some(parent) => {
                tokio::join!(
                    bot.delete_as_bot(channel, parent),
                    bot.delete_as_owner(channel, &event.ts),
                );
            }
            None => {
                let user = event.user.as_deref().unwrap_or(bot.owner_id());
                bot.bot()
                    .post_ephemeral(channel, user, THREAD_ONLY_DELETE_TEXT, None)
                    .await?;
            }
        },
        TextCommand::Echo(text) => {
            let message = build_echo_message(channel, thread_ts, &text);
            let (posted, ()) = tokio::join!(
                bot.bot().post_message(&message),
                bot.delete_as_owner(channel, &event.ts),
            );
            posted?;
        }
        TextCommand::Broadcast { kind, text } => {
            let message = build_broadcast_message(channel, thread_ts, kind, &text, Vec::new());
            bot.owner().post_message(&message).await?;
            bot.delete_as_owner(channel, &event.ts).await;
        }
        TextCommand::Watch(user) => {
            bot.delete_as_owner(channel, &event.ts).await;
            let Some(user) = user else {
                return tell_owner(bot, channel, thread_ts, NO_USER_PROVIDED_TEXT).await;
            };

            let mut watched: WatchedUsers =
                get_json(bot.store(), WATCHED_USERS_KEY).await?.unwrap_or_default();
            watched.insert(user.clone(), NEW_WATCH_STATUS.to_string());
            set_json(bot.store(), WATCHED_USERS_KEY, &watched).await?;

            tell_owner(bot, channel, thread_ts, &watch_started_text(&user)).await?;
        }
        TextCommand::Unwatch(user) => {
            bot.delete_as_owner(channel, &event.ts).await;
            let Some(user) = user else {
                return tell_owner(bot, channel, thread_ts, NO_USER_PROVIDED_TEXT).await;
            };

            let mut watched: WatchedUsers =
                get_json(bot.store(), WATCHED_USERS_KEY).await?.unwrap_or_default();
            watched.remove(&user);
            set_json(bot.store(), WATCHED_USERS_KEY, &watched).await?;

            tell_owner(bot, channel, thread_ts, &watch_stopped_text(&user)).await?;
        }
        TextCommand::AddSnippet(None) => {
            let usage = add_snippet_usage_text(&bot.config().slack_bot_user_id);
            tell_owner(bot, channel, thread_ts, &usage).await?;
        }
        TextCommand::AddSnippet(Some((key, value))) => {
            let mut snippets: Snippets =
                get_json(bot.store(), SNIPPETS_KEY).await?.unwrap_or_default();
            snippets.insert(key.clone(), value.clone());
            set_json(bot.store(), SNIPPETS_KEY, &snippets).await?;

            acknowledge(
                bot,
                event,
                &snippet_added_text(&key, &value),
                "white_check_mark",
            )
            .await?;
        }
        TextCommand::DeleteSnippet(key) => {
            let mut snippets: Snippets =
                get_json(bot.store(), SNIPPETS_KEY).await?.unwrap_or_default();

            if snippets.remove(&key).is_some() {
                set_json(bot.store(), SNIPPETS_KEY, &snippets).await?;
                acknowledge(bot, event, &snippet_removed_text(&key), "white_check_mark").await?;
            } else {
                acknowledge(bot, event, &snippet_not_found_text(&key), "bangbang").await?;
            }
        }
        TextCommand::ListSnippets => {
            let (snippets, ()) = tokio::join!(
                get_json::<Snippets>(bot.store(), SNIPPETS_KEY),
                bot.delete_as_owner(channel, &event.ts),
            );
            let text = snippet_list_text(&snippets?.unwrap_or_default());
            tell_owner(bot, channel, thread_ts, &text).await?;
        }
    }

    Ok(())
}

/// Ephemeral reply from the bot, visible only to the owner.
async fn tell_owner(
    bot: &SlackBot,
    channel: &str,
    thread_ts: Option<&str>,
    text: &str,
) -> Result<(), SlackError> {
    bot.bot()
        .post_ephemeral(channel, bot.owner_id(), text, thread_ts)
        .await
}

/// Ephemeral reply plus a reaction on the command message.
async fn acknowledge(
    bot: &SlackBot,
    event: &AppMentionEvent,
    text: &str,
    reaction: &str,
) -> Result<(), SlackError> {
    let (replied, reacted) = tokio::join!(
        tell_owner(bot, &event.channel, event.thread_ts.as_deref(), text),
        bot.bot().add_reaction(&event.channel, &event.ts, reaction),
    );
    if let Err(e) = reacted {
        warn!("Failed to add {} reaction: {}", reaction, e);
    }
    replied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_delete_only() {
        assert_eq!(TextCommand::parse("/del"), Some(TextCommand::Delete));
        assert_eq!(TextCommand::parse("/del now"), None);
        assert_eq!(TextCommand::parse("hello"), None);
    }

    #[test]
    fn parses_echo_and_broadcasts() {
        assert_eq!(
            TextCommand::parse("/echo hi @channel"),
            Some(TextCommand::Echo("hi @channel".to_string()))
        );
        assert_eq!(
            TextCommand::parse("/echo"),
            Some(TextCommand::Echo(String::new()))
        );
        assert_eq!(
            TextCommand::parse("/here lunch?"),
            Some(TextCommand::Broadcast {
                kind: BroadcastKind::Here,
                text: "lunch?".to_string()
            })
        );
        assert_eq!(
            TextCommand::parse("/channel big news"),
            Some(TextCommand::Broadcast {
                kind: BroadcastKind::Channel,
                text: "big news".to_string()
            })
        );
    }

    #[test]
    fn parses_watch_targets() {
        assert_eq!(
            TextCommand::parse("/watch <@U123ABC>"),
            Some(TextCommand::Watch(Some("U123ABC".to_string())))
        );
        assert_eq!(
            TextCommand::parse("/unwatch <@U123ABC>"),
            Some(TextCommand::Unwatch(Some("U123ABC".to_string())))
        );
        assert_eq!(TextCommand::parse("/watch"), Some(TextCommand::Watch(None)));
    }

    #[test]
    fn parses_snippet_commands() {
        assert_eq!(
            TextCommand::parse("/addsnippet !hi hello there"),
            Some(TextCommand::AddSnippet(Some((
                "!hi".to_string(),
                "hello there".to_string()
            ))))
        );
        assert_eq!(
            TextCommand::parse("/addsnippet !hi"),
            Some(TextCommand::AddSnippet(None))
        );
        assert_eq!(
            TextCommand::parse("/delsnippet !hi"),
            Some(TextCommand::DeleteSnippet("!hi".to_string()))
        );
        assert_eq!(
            TextCommand::parse("/snippets"),
            Some(TextCommand::ListSnippets)
        );
    }
}
