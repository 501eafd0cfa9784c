//! Texts and messages the bot sends back to Slack.

use crate::blocks::Block;
use crate::slack::client::OutgoingMessage;
use crate::utils::text::transform_echo_text;

pub const NO_CACHED_MESSAGE_TEXT: &str = "i didn't find any cached messages by you in this thread :c";
pub const THREAD_ONLY_DELETE_TEXT: &str = "You can only delete a thread message";
pub const NO_USER_PROVIDED_TEXT: &str = "no user provided </3";
pub const NO_SNIPPETS_TEXT: &str = "There are no snippets.";
pub const MISCONFIGURED_STEP_TEXT: &str =
    "i- i dont know how to do that! is the step misconfigured?";
pub const NO_CHANNEL_INPUT_TEXT: &str = "no channel was given to the step";

/// Broadcast mentions that `/channel` and `/here` can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastKind {
    Channel,
    Here,
}

impl BroadcastKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BroadcastKind::Channel => "channel",
            BroadcastKind::Here => "here",
        }
    }
}

/// A message that pings everyone, posted as the owner. `extra` blocks follow the ping.
#[must_use]
pub fn build_broadcast_message(
    channel: &str,
    thread_ts: Option<&str>,
    kind: BroadcastKind,
    text: &str,
    extra: Vec<Block>,
) -> OutgoingMessage {
    let kind = kind.as_str();
    let mut blocks = vec![Block::mrkdwn_section(format!("<!{kind}|> {text}"))];
    blocks.extend(extra);

    OutgoingMessage::new(channel)
        .with_text(format!("@{kind} {text}"))
        .with_blocks(blocks)
        .with_thread_ts(thread_ts)
}

#[must_use]
pub fn build_echo_message(channel: &str, thread_ts: Option<&str>, text: &str) -> OutgoingMessage {
    OutgoingMessage::new(channel)
        .with_blocks(vec![Block::mrkdwn_section(transform_echo_text(text))])
        .with_thread_ts(thread_ts)
}

#[must_use]
pub fn watch_started_text(user: &str) -> String {
    format!("started watching <@{user}>!")
}

#[must_use]
pub fn watch_stopped_text(user: &str) -> String {
    format!("stopped watching <@{user}>!")
}

#[must_use]
pub fn add_snippet_usage_text(bot_user_id: &str) -> String {
    format!("usage: <@{bot_user_id}> /addsnippet !key some value")
}

#[must_use]
pub fn snippet_added_text(key: &str, value: &str) -> String {
    format!("`{key}` added (`{value}`)!")
}

#[must_use]
pub fn snippet_removed_text(key: &str) -> String {
    format!("`{key}` removed!")
}

#[must_use]
pub fn snippet_not_found_text(key: &str) -> String {
    format!("`{key}` not found")
}

/// Lists snippets in iteration order.
#[must_use]
pub fn snippet_list_text<'a>(snippets: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    let lines: Vec<String> = snippets
        .into_iter()
        .map(|(key, value)| format!("- `{key}` (`{value}`)"))
        .collect();

    if lines.is_empty() {
        NO_SNIPPETS_TEXT.to_string()
    } else {
        format!("All snippets: \n{}", lines.join("\n"))
    }
}

#[must_use]
pub fn member_left_text(user: &str, channel: &str) -> String {
    format!("hey... <@{user}> just left <#{channel}>.")
}

#[must_use]
pub fn member_joined_text(user: &str, owner: &str) -> String {
    format!(
        "hey there <@{user}> welcome to my channel! i yap a bit in here at random intervals.\n\n<@{owner}> come out and greet them!!!"
    )
}

#[must_use]
pub fn presence_changed_text(user: &str, old: &str, new: &str) -> String {
    format!("<@{user}>'s status changed from `{old}` to `{new}`")
}

#[must_use]
pub fn presence_failed_text(user: &str, error: &str) -> String {
    format!("Failed to update status for <@{user}>:\n```\n{error}\n```")
}
