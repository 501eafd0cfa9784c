//! `/me` messages with `{...}` time templates, reposted as Slack date tokens.
//!
//! `{14:30}` becomes `<!date^UNIX^{time}|14:30>`, rendered in every reader's
//! own timezone. A template may carry a leading format (`{r 14:30}` for a
//! relative time, or any Slack date format string) and a date
//! (`{2024-06-01 14:30:15}`, `{6-1 14:30}`). Missing date parts default to
//! today in the owner's timezone.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::core::models::{MessageEvent, MessageSubtype};
use crate::slack::SlackBot;
use crate::slack::client::OutgoingMessage;

static TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\{([^0-9]*?)(?:(?:([0-9]{4})-?)?([0-9]{1,2})-?([0-9]{1,2}) )?([0-9]{1,2}):?([0-9]{2})(?::?([0-9]{2}))?\}",
    )
    .expect("static regex compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTemplate<'a> {
    /// The whole `{...}` match.
    pub part: &'a str,
    pub format: Option<&'a str>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: u32,
    pub minute: u32,
    pub second: Option<u32>,
}

impl<'a> DateTemplate<'a> {
    fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        Some(Self {
            part: caps.get(0)?.as_str(),
            format: caps
                .get(1)
                .map(|m| m.as_str().trim())
                .filter(|f| !f.is_empty()),
            year: caps.get(2).and_then(|m| m.as_str().parse().ok()),
            month: number(3),
            day: number(4),
            hour: number(5)?,
            minute: number(6)?,
            second: number(7),
        })
    }

    /// Slack date format string for this template.
    #[must_use]
    pub fn slack_format(&self) -> String {
        match self.format {
            Some("r") => "{ago}".to_string(),
            Some(format) => format.to_string(),
            None => {
                let date = if self.day.is_some() {
                    "{date_short} at "
                } else {
                    ""
                };
                let time = if self.second.is_some() {
                    "{time_secs}"
                } else {
                    "{time}"
                };
                format!("{date}{time}")
            }
        }
    }

    /// Unix seconds for this template in `tz`, or `None` if it names an
    /// impossible or skipped local time.
    #[must_use]
    pub fn timestamp(&self, tz: Tz, now: DateTime<Tz>) -> Option<i64> {
        tz.with_ymd_and_hms(
            self.year.unwrap_or_else(|| now.year()),
            self.month.unwrap_or_else(|| now.month()),
            self.day.unwrap_or_else(|| now.day()),
            self.hour,
            self.minute,
            self.second.unwrap_or(0),
        )
        .earliest()
        .map(|instant| instant.timestamp())
    }

    /// The `<!date^...>` token replacing this template.
    #[must_use]
    pub fn render(&self, tz: Tz, now: DateTime<Tz>) -> Option<String> {
        let timestamp = self.timestamp(tz, now)?;
        let fallback = &self.part[1..self.part.len() - 1];
        Some(format!(
            "<!date^{timestamp}^{}|{fallback}>",
            self.slack_format()
        ))
    }
}

/// All templates in `text`, left to right.
#[must_use]
pub fn find_templates(text: &str) -> Vec<DateTemplate<'_>> {
    TEMPLATE_RE
        .captures_iter(text)
        .filter_map(|caps| DateTemplate::from_captures(&caps))
        .collect()
}

/// Replaces each template with its date token. Invalid dates are left as typed.
#[must_use]
pub fn expand_templates(text: &str, tz: Tz, now: DateTime<Tz>) -> String {
    let mut expanded = text.to_string();

    for template in find_templates(text) {
        match template.render(tz, now) {
            Some(token) => expanded = expanded.replacen(template.part, &token, 1),
            None => debug!(part = template.part, "Skipping template with an invalid date"),
        }
    }

    expanded
}

/// Reposts the owner's `/me` messages with their templates expanded.
/// Returns `true` when the message was taken over.
pub async fn send_template_message(bot: &SlackBot, event: &MessageEvent) -> bool {
    if event.subtype != Some(MessageSubtype::MeMessage) || !bot.is_owner(event.user.as_deref()) {
        return false;
    }

    let text = event.text.clone().unwrap_or_default();
    let (_, expanded) = tokio::join!(
        bot.delete_as_owner(&event.channel, &event.ts),
        expand_for_owner(bot, &text),
    );

    let message = OutgoingMessage::new(&event.channel)
        .with_text(expanded)
        .with_thread_ts(event.thread_ts.as_deref());

    match bot.owner().post_message(&message).await {
        Ok(ts) => info!(channel = %event.channel, %ts, "Reposted templated message"),
        Err(e) => warn!(channel = %event.channel, "Failed to repost templated message: {}", e),
    }

    true
}

async fn expand_for_owner(bot: &SlackBot, text: &str) -> String {
    if !TEMPLATE_RE.is_match(text) {
        return text.to_string();
    }

    let tz = owner_timezone(bot).await;
    expand_templates(text, tz, Utc::now().with_timezone(&tz))
}

async fn owner_timezone(bot: &SlackBot) -> Tz {
    match bot.bot().get_user_timezone(bot.owner_id()).await {
        Ok(Some(name)) => name.parse().unwrap_or_else(|_| {
            warn!(tz = %name, "Unknown owner timezone, using UTC");
            Tz::UTC
        }),
        Ok(None) => Tz::UTC,
        Err(e) => {
            warn!("Failed to look up the owner's timezone, using UTC: {}", e);
            Tz::UTC
        }
    }
}
