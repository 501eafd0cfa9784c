//! Block Kit document tree
//!
//! A typed view over the `blocks` array Slack attaches to a message. Only the
//! node kinds that carry user-visible text are modelled; every other block,
//! element or span is kept verbatim as JSON so a message can be edited and sent
//! back without losing anything. Fields the model does not name (`block_id`,
//! `style`, `unicode`, ...) are kept in the `extra` map of each node.

pub mod substitute;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use substitute::{Substitute, substitute_text};

/// A top-level block of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section(SectionBlock),
    Header(HeaderBlock),
    Context(ContextBlock),
    Markdown(MarkdownBlock),
    Table(TableBlock),
    RichText(RichTextBlock),
    /// Dividers, images, actions, inputs and anything newer than this model.
    #[serde(untagged)]
    Other(Value),
}

impl Block {
    /// A section block with a single `mrkdwn` text object.
    #[must_use]
    pub fn mrkdwn_section(text: impl Into<String>) -> Self {
        Block::Section(SectionBlock {
            text: Some(TextObject::mrkdwn(text)),
            extra: Map::new(),
        })
    }

    /// A `markdown` block holding raw markdown.
    #[must_use]
    pub fn markdown(text: impl Into<String>) -> Self {
        Block::Markdown(MarkdownBlock {
            text: text.into(),
            extra: Map::new(),
        })
    }

    /// The Block Kit `type` tag of this block.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Block::Section(_) => "section",
            Block::Header(_) => "header",
            Block::Context(_) => "context",
            Block::Markdown(_) => "markdown",
            Block::Table(_) => "table",
            Block::RichText(_) => "rich_text",
            Block::Other(value) => value.get("type").and_then(Value::as_str).unwrap_or(""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    PlainText,
    Mrkdwn,
}

/// A composition text object (`plain_text` or `mrkdwn`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextObject {
    #[must_use]
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::Mrkdwn,
            text: text.into(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::PlainText,
            text: text.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionBlock {
    /// Sections made only of `fields` or an accessory have no text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextObject>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub text: TextObject,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBlock {
    pub elements: Vec<ContextElement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Context blocks mix text objects with image elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextElement {
    Text(TextObject),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownBlock {
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub rows: Vec<Vec<TableCell>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableCell {
    RawText(RawTextCell),
    RichText(RichTextBlock),
    #[serde(untagged)]
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTextCell {
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `rich_text` block, also used as the content of rich table cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    pub elements: Vec<RichTextElement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextElement {
    RichTextSection(RichTextSpans),
    RichTextQuote(RichTextSpans),
    RichTextPreformatted(RichTextSpans),
    RichTextList(RichTextList),
    #[serde(untagged)]
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextSpans {
    pub elements: Vec<InlineSpan>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lists nest further rich text elements; indentation lives in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextList {
    pub elements: Vec<RichTextElement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineSpan {
    Text(TextSpan),
    Link(LinkSpan),
    Emoji(EmojiSpan),
    Color(ColorSpan),
    /// Mentions, broadcasts, dates and other spans without replaceable text.
    #[serde(untagged)]
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpan {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiSpan {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSpan {
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
