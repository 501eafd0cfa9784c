use serde::{Deserialize, Serialize};

use crate::blocks::Block;

/// Message subtypes the bot reacts to; everything else collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSubtype {
    FileShare,
    MessageDeleted,
    MeMessage,
    #[serde(other)]
    Other,
}

/// Inbound Events API payloads the bot handles.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Message(MessageEvent),
    AppMention(AppMentionEvent),
    MemberJoinedChannel(MembershipEvent),
    MemberLeftChannel(MembershipEvent),
    FunctionExecuted(FunctionExecutedEvent),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub channel: String,
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub subtype: Option<MessageSubtype>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub blocks: Option<Vec<Block>>,
    /// The removed message, set on `message_deleted`.
    #[serde(default)]
    pub previous_message: Option<Box<MessageEvent>>,
}

impl MessageEvent {
    /// Plain messages and file shares are the only ones worth correcting later.
    #[must_use]
    pub fn is_cacheable_kind(&self) -> bool {
        matches!(self.subtype, None | Some(MessageSubtype::FileShare))
    }

    #[must_use]
    pub fn is_from(&self, user_id: &str) -> bool {
        self.user.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppMentionEvent {
    pub channel: String,
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MembershipEvent {
    pub channel: String,
    pub user: String,
}

/// A workflow step backed by one of the bot's functions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionExecutedEvent {
    pub function_execution_id: String,
    pub function: WorkflowFunction,
    #[serde(default)]
    pub inputs: FunctionInputs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowFunction {
    pub callback_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionInputs {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<Block>>,
    #[serde(default)]
    pub num: Option<f64>,
}

/// A message authored by the owner that may later be corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMessage {
    pub channel: String,
    pub ts: String,
    pub thread_ts: Option<String>,
    pub subtype: Option<MessageSubtype>,
    pub text: Option<String>,
    pub blocks: Option<Vec<Block>>,
}

impl From<MessageEvent> for CachedMessage {
    fn from(event: MessageEvent) -> Self {
        Self {
            channel: event.channel,
            ts: event.ts,
            thread_ts: event.thread_ts,
            subtype: event.subtype,
            text: event.text,
            blocks: event.blocks,
        }
    }
}

impl CachedMessage {
    #[must_use]
    pub fn is_correctable(&self) -> bool {
        matches!(self.subtype, None | Some(MessageSubtype::FileShare))
    }
}
