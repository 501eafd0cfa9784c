//! `s/find/replace` corrections of the owner's recent messages.
//!
//! A correction command is deleted as soon as it is recognised. The newest
//! cached message in the same channel and thread scope is rewritten with the
//! substitution applied to its text and to every text node of its blocks.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::blocks::{Substitute, substitute_text};
use crate::core::models::{CachedMessage, MessageEvent};
use crate::errors::SlackError;
use crate::slack::SlackBot;
use crate::slack::response_builder::NO_CACHED_MESSAGE_TEXT;

static CORRECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^s/([^/]+?)/([^/]*?)$").expect("static regex compile"));

/// A parsed `s/find/replace` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction<'a> {
    pub find: &'a str,
    pub replace: &'a str,
}

/// Parses the whole message as a correction command. `find` is never empty
/// and neither part contains a `/`.
#[must_use]
pub fn parse_correction(text: &str) -> Option<Correction<'_>> {
    let caps = CORRECTION_RE.captures(text)?;
    Some(Correction {
        find: caps.get(1)?.as_str(),
        replace: caps.get(2).map_or("", |m| m.as_str()),
    })
}

impl Correction<'_> {
    /// Returns the corrected copy of `message`.
    #[must_use]
    pub fn apply(&self, message: &CachedMessage) -> CachedMessage {
        let mut corrected = message.clone();
        corrected.text = message
            .text
            .as_deref()
            .map(|text| substitute_text(text, self.find, self.replace));
        corrected.blocks.substitute(self.find, self.replace);
        corrected
    }
}

#[derive(Debug)]
pub enum CorrectionOutcome {
    /// The message was not a correction command from the owner.
    NotACorrection,
    /// Nothing cached in this scope; the owner was told.
    NoCachedMessage,
    Corrected(CachedMessage),
    UpdateFailed(SlackError),
}

impl CorrectionOutcome {
    /// Anything but `NotACorrection` ends the message handler chain.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        !matches!(self, CorrectionOutcome::NotACorrection)
    }
}

/// Runs the correction flow for one inbound message.
pub async fn replace_text(bot: &SlackBot, event: &MessageEvent) -> CorrectionOutcome {
    if event.subtype.is_some() || !bot.is_owner(event.user.as_deref()) {
        return CorrectionOutcome::NotACorrection;
    }
    let Some(correction) = event.text.as_deref().and_then(parse_correction) else {
        return CorrectionOutcome::NotACorrection;
    };

    info!(channel = %event.channel, ts = %event.ts, "Applying correction");

    // The command's deletion neither blocks nor fails the edit.
    let (_, outcome) = tokio::join!(
        bot.delete_as_owner(&event.channel, &event.ts),
        correct_latest(bot, event, correction),
    );
    outcome
}

async fn correct_latest(
    bot: &SlackBot,
    event: &MessageEvent,
    correction: Correction<'_>,
) -> CorrectionOutcome {
    let thread_ts = event.thread_ts.as_deref();
    let target = bot
        .cache()
        .query(&event.channel, thread_ts)
        .into_iter()
        .find(CachedMessage::is_correctable);

    let Some(target) = target else {
        debug!(channel = %event.channel, ?thread_ts, "No cached message to correct");
        if let Err(e) = bot
            .owner()
            .post_ephemeral(&event.channel, bot.owner_id(), NO_CACHED_MESSAGE_TEXT, thread_ts)
            .await
        {
            warn!("Failed to tell the owner nothing was cached: {}", e);
        }
        return CorrectionOutcome::NoCachedMessage;
    };

    let corrected = correction.apply(&target);
    let blocks = corrected.blocks.as_deref().unwrap_or(&[]);

    match bot
        .owner()
        .update_message(
            &corrected.channel,
            &corrected.ts,
            corrected.text.as_deref(),
            Some(blocks),
        )
        .await
    {
        Ok(()) => {
            info!(channel = %corrected.channel, ts = %corrected.ts, "Corrected cached message");
            if bot.config().refresh_cache_on_correction {
                bot.cache().refresh(&corrected);
            }
            CorrectionOutcome::Corrected(corrected)
        }
        Err(e) => {
            error!(channel = %corrected.channel, ts = %corrected.ts, "Failed to apply correction: {}", e);
            CorrectionOutcome::UpdateFailed(e)
        }
    }
}
