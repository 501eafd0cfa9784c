#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use sidekick::blocks::Block;
use sidekick::core::cache::{DuplicatePolicy, MessageCache};
use sidekick::core::config::AppConfig;
use sidekick::core::models::{MessageEvent, MessageSubtype};
use sidekick::errors::SlackError;
use sidekick::slack::{MessagingService, OutgoingMessage, SlackBot};
use sidekick::store::MemoryStore;

pub const OWNER: &str = "UOWNER";
pub const BOT_USER: &str = "UBOT";
pub const CHANNEL: &str = "C1";
pub const ANNOUNCED_CHANNEL: &str = "CANNOUNCE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Bot,
    Owner,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Post {
        identity: Identity,
        message: OutgoingMessage,
    },
    Ephemeral {
        identity: Identity,
        channel: String,
        user: String,
        text: String,
        thread_ts: Option<String>,
    },
    Update {
        identity: Identity,
        channel: String,
        ts: String,
        text: Option<String>,
        blocks: Option<Vec<Block>>,
    },
    Delete {
        identity: Identity,
        channel: String,
        ts: String,
    },
    Reaction {
        identity: Identity,
        channel: String,
        ts: String,
        name: String,
    },
    CompleteSuccess {
        identity: Identity,
        execution_id: String,
        outputs: Value,
    },
    CompleteError {
        identity: Identity,
        execution_id: String,
        error: String,
    },
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn all(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }

    pub fn posts(&self) -> Vec<(Identity, OutgoingMessage)> {
        self.all()
            .into_iter()
            .filter_map(|call| match call {
                Call::Post { identity, message } => Some((identity, message)),
                _ => None,
            })
            .collect()
    }

    /// `(identity, channel, user, text, thread_ts)`
    pub fn ephemerals(&self) -> Vec<(Identity, String, String, String, Option<String>)> {
        self.all()
            .into_iter()
            .filter_map(|call| match call {
                Call::Ephemeral {
                    identity,
                    channel,
                    user,
                    text,
                    thread_ts,
                } => Some((identity, channel, user, text, thread_ts)),
                _ => None,
            })
            .collect()
    }

    /// `(identity, channel, ts, text, blocks)`
    pub fn updates(&self) -> Vec<(Identity, String, String, Option<String>, Option<Vec<Block>>)> {
        self.all()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update {
                    identity,
                    channel,
                    ts,
                    text,
                    blocks,
                } => Some((identity, channel, ts, text, blocks)),
                _ => None,
            })
            .collect()
    }

    /// `(identity, channel, ts)`
    pub fn deletes(&self) -> Vec<(Identity, String, String)> {
        self.all()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete {
                    identity,
                    channel,
                    ts,
                } => Some((identity, channel, ts)),
                _ => None,
            })
            .collect()
    }

    /// `(identity, ts, name)`
    pub fn reactions(&self) -> Vec<(Identity, String, String)> {
        self.all()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reaction {
                    identity, ts, name, ..
                } => Some((identity, ts, name)),
                _ => None,
            })
            .collect()
    }

    /// Workflow completions only, in call order.
    pub fn completions(&self) -> Vec<Call> {
        self.all()
            .into_iter()
            .filter(|call| matches!(call, Call::CompleteSuccess { .. } | Call::CompleteError { .. }))
            .collect()
    }
}

/// Records every Slack call instead of making it.
pub struct RecordingMessenger {
    identity: Identity,
    log: CallLog,
    fail_deletes: bool,
    fail_updates: bool,
    presence: HashMap<String, Option<String>>,
    timezone: Option<String>,
    next_ts: Mutex<u64>,
}

impl RecordingMessenger {
    pub fn new(identity: Identity, log: &CallLog) -> Self {
        Self {
            identity,
            log: log.clone(),
            fail_deletes: false,
            fail_updates: false,
            presence: HashMap::new(),
            timezone: None,
            next_ts: Mutex::new(0),
        }
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    /// `None` makes the presence lookup fail.
    pub fn with_presence(mut self, user: &str, status: Option<&str>) -> Self {
        self.presence
            .insert(user.to_string(), status.map(ToString::to_string));
        self
    }

    pub fn with_timezone(mut self, tz: &str) -> Self {
        self.timezone = Some(tz.to_string());
        self
    }
}

#[async_trait]
impl MessagingService for RecordingMessenger {
    async fn post_message(&self, message: &OutgoingMessage) -> Result<String, SlackError> {
        self.log.push(Call::Post {
            identity: self.identity,
            message: message.clone(),
        });
        let mut next = self.next_ts.lock().unwrap();
        *next += 1;
        Ok(format!("9000.{:06}", *next))
    }

    async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), SlackError> {
        self.log.push(Call::Ephemeral {
            identity: self.identity,
            channel: channel.to_string(),
            user: user.to_string(),
            text: text.to_string(),
            thread_ts: thread_ts.map(ToString::to_string),
        });
        Ok(())
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        text: Option<&str>,
        blocks: Option<&[Block]>,
    ) -> Result<(), SlackError> {
        self.log.push(Call::Update {
            identity: self.identity,
            channel: channel.to_string(),
            ts: ts.to_string(),
            text: text.map(ToString::to_string),
            blocks: blocks.map(<[Block]>::to_vec),
        });
        if self.fail_updates {
            return Err(SlackError::api("chat.update", "cant_update_message"));
        }
        Ok(())
    }

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<(), SlackError> {
        self.log.push(Call::Delete {
            identity: self.identity,
            channel: channel.to_string(),
            ts: ts.to_string(),
        });
        if self.fail_deletes {
            return Err(SlackError::api("chat.delete", "message_not_found"));
        }
        Ok(())
    }

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<(), SlackError> {
        self.log.push(Call::Reaction {
            identity: self.identity,
            channel: channel.to_string(),
            ts: ts.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn get_user_presence(&self, user_id: &str) -> Result<String, SlackError> {
        match self.presence.get(user_id) {
            Some(Some(status)) => Ok(status.clone()),
            Some(None) => Err(SlackError::api("users.getPresence", "user_not_found")),
            None => Ok("unknown".to_string()),
        }
    }

    async fn get_user_timezone(&self, _user_id: &str) -> Result<Option<String>, SlackError> {
        Ok(self.timezone.clone())
    }

    async fn complete_function_success(
        &self,
        execution_id: &str,
        outputs: Value,
    ) -> Result<(), SlackError> {
        self.log.push(Call::CompleteSuccess {
            identity: self.identity,
            execution_id: execution_id.to_string(),
            outputs,
        });
        Ok(())
    }

    async fn complete_function_error(
        &self,
        execution_id: &str,
        error: &str,
    ) -> Result<(), SlackError> {
        self.log.push(Call::CompleteError {
            identity: self.identity,
            execution_id: execution_id.to_string(),
            error: error.to_string(),
        });
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        slack_bot_token: "xoxb-test".to_string(),
        slack_user_token: "xoxp-test".to_string(),
        slack_app_token: "xapp-test".to_string(),
        slack_owner: OWNER.to_string(),
        slack_bot_user_id: BOT_USER.to_string(),
        slack_channel: Some(ANNOUNCED_CHANNEL.to_string()),
        kv_param_prefix: "/sidekick/test/".to_string(),
        message_cache_size: 100,
        message_cache_duplicates: DuplicatePolicy::Keep,
        refresh_cache_on_correction: false,
        presence_poll_seconds: 0,
    }
}

pub struct Harness {
    pub bot: SlackBot,
    pub calls: CallLog,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(test_config(), |m| m, |m| m)
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, |m| m, |m| m)
    }

    /// `bot` and `owner` customise the two recording identities.
    pub fn build(
        config: AppConfig,
        bot: impl FnOnce(RecordingMessenger) -> RecordingMessenger,
        owner: impl FnOnce(RecordingMessenger) -> RecordingMessenger,
    ) -> Self {
        let calls = CallLog::default();
        let store = Arc::new(MemoryStore::new());
        let cache = MessageCache::new(config.message_cache_size, config.message_cache_duplicates);

        let bot = SlackBot::new(
            config,
            Arc::new(bot(RecordingMessenger::new(Identity::Bot, &calls))),
            Arc::new(owner(RecordingMessenger::new(Identity::Owner, &calls))),
            Arc::new(cache),
            store.clone(),
        );

        Self { bot, calls, store }
    }
}

pub fn message(user: &str, ts: &str, text: &str, thread_ts: Option<&str>) -> MessageEvent {
    MessageEvent {
        channel: CHANNEL.to_string(),
        ts: ts.to_string(),
        thread_ts: thread_ts.map(ToString::to_string),
        user: Some(user.to_string()),
        text: Some(text.to_string()),
        ..MessageEvent::default()
    }
}

pub fn owner_message(ts: &str, text: &str) -> MessageEvent {
    message(OWNER, ts, text, None)
}

pub fn owner_reply(ts: &str, text: &str, thread_ts: &str) -> MessageEvent {
    message(OWNER, ts, text, Some(thread_ts))
}

pub fn deleted(previous: MessageEvent) -> MessageEvent {
    MessageEvent {
        channel: previous.channel.clone(),
        ts: format!("{}.deleted", previous.ts),
        subtype: Some(MessageSubtype::MessageDeleted),
        previous_message: Some(Box::new(previous)),
        ..MessageEvent::default()
    }
}
