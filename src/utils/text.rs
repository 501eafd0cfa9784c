use once_cell::sync::Lazy;
use regex::Regex;

static USER_MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@(U[0-9A-Z]+)>").expect("static regex compile"));

/// Removes the first `<@BOT>` mention and trims what is left.
#[must_use]
pub fn strip_bot_mention(text: &str, bot_user_id: &str) -> String {
    text.replacen(&format!("<@{bot_user_id}>"), "", 1)
        .trim()
        .to_string()
}

/// Turns the first literal `@channel` into a real broadcast token.
#[must_use]
pub fn transform_echo_text(text: &str) -> String {
    text.replacen("@channel", "<!channel>", 1)
}

/// The first user id mentioned as `<@U...>`.
#[must_use]
pub fn find_user_mention(text: &str) -> Option<&str> {
    USER_MENTION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Everything after the first `skip` bytes, or nothing if the text is shorter.
#[must_use]
pub fn text_after(text: &str, skip: usize) -> &str {
    text.get(skip..).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_only_the_bot_mention() {
        assert_eq!(strip_bot_mention("<@UBOT> /echo hi <@UBOT>", "UBOT"), "/echo hi <@UBOT>");
        assert_eq!(strip_bot_mention("  /del  ", "UBOT"), "/del");
    }

    #[test]
    fn echo_text_upgrades_first_channel_mention() {
        assert_eq!(
            transform_echo_text("hey @channel and @channel"),
            "hey <!channel> and @channel"
        );
    }

    #[test]
    fn finds_user_mentions() {
        assert_eq!(find_user_mention("/watch <@U12AB>"), Some("U12AB"));
        assert_eq!(find_user_mention("/watch <@W12AB>"), None);
        assert_eq!(find_user_mention("/watch bob"), None);
    }

    #[test]
    fn text_after_tolerates_short_input() {
        assert_eq!(text_after("/echo hello", 6), "hello");
        assert_eq!(text_after("/echo", 6), "");
    }
}
