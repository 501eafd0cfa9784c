//! Slack Web API client
//!
//! Wraps the handful of Web API methods the bot needs behind
//! [`MessagingService`]. Transport failures are retried with jittered
//! exponential backoff; calls Slack rejects (`ok: false`) are returned as
//! [`SlackError::ApiError`] straight away.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::SlackApiChatDeleteRequest;
use slack_morphism::{SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackTs};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::warn;

use crate::blocks::Block;
use crate::errors::SlackError;

const SLACK_API_BASE: &str = "https://slack.com/api";

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a SlackError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// The messaging operations the bot performs, as one identity (bot or owner).
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Posts a message and returns its timestamp.
    async fn post_message(&self, message: &OutgoingMessage) -> Result<String, SlackError>;

    async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), SlackError>;

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        text: Option<&str>,
        blocks: Option<&[Block]>,
    ) -> Result<(), SlackError>;

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<(), SlackError>;

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<(), SlackError>;

    /// `active`, `away`, or whatever Slack reports.
    async fn get_user_presence(&self, user_id: &str) -> Result<String, SlackError>;

    /// IANA timezone name from the user's profile.
    async fn get_user_timezone(&self, user_id: &str) -> Result<Option<String>, SlackError>;

    /// Reports a workflow step as finished with the given outputs.
    async fn complete_function_success(
        &self,
        execution_id: &str,
        outputs: Value,
    ) -> Result<(), SlackError>;

    async fn complete_function_error(
        &self,
        execution_id: &str,
        error: &str,
    ) -> Result<(), SlackError>;
}

/// A `chat.postMessage` request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub channel: String,
    pub text: Option<String>,
    pub blocks: Option<Vec<Block>>,
    pub thread_ts: Option<String>,
}

impl OutgoingMessage {
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = Some(blocks);
        self
    }

    #[must_use]
    pub fn with_thread_ts(mut self, thread_ts: Option<&str>) -> Self {
        self.thread_ts = thread_ts.map(ToString::to_string);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload builders (extracted for testability)
// ─────────────────────────────────────────────────────────────────────────────

/// Build the JSON payload for `chat.postMessage`.
///
/// # Errors
///
/// Returns an error if the blocks cannot be serialized.
pub fn build_post_message_payload(message: &OutgoingMessage) -> Result<Value, SlackError> {
    let mut payload = json!({ "channel": message.channel });

    if let Some(text) = &message.text {
        payload["text"] = Value::String(text.clone());
    }
    if let Some(blocks) = &message.blocks {
        payload["blocks"] = serde_json::to_value(blocks)?;
    }
    if let Some(thread_ts) = &message.thread_ts {
        payload["thread_ts"] = Value::String(thread_ts.clone());
    }

    Ok(payload)
}

/// Build the JSON payload for `chat.postEphemeral`.
#[must_use]
pub fn build_ephemeral_payload(
    channel: &str,
    user: &str,
    text: &str,
    thread_ts: Option<&str>,
) -> Value {
    let mut payload = json!({
        "channel": channel,
        "user": user,
        "text": text,
    });

    if let Some(ts) = thread_ts {
        payload["thread_ts"] = Value::String(ts.to_string());
    }

    payload
}

/// Build the JSON payload for `chat.update`.
///
/// # Errors
///
/// Returns an error if the blocks cannot be serialized.
pub fn build_update_payload(
    channel: &str,
    ts: &str,
    text: Option<&str>,
    blocks: Option<&[Block]>,
) -> Result<Value, SlackError> {
    let mut payload = json!({
        "channel": channel,
        "ts": ts,
    });

    if let Some(t) = text {
        payload["text"] = Value::String(t.to_string());
    }

    if let Some(b) = blocks {
        payload["blocks"] = serde_json::to_value(b)?;
    }

    Ok(payload)
}

/// Build the JSON payload for `functions.completeSuccess`.
#[must_use]
pub fn build_function_success_payload(execution_id: &str, outputs: Value) -> Value {
    json!({
        "function_execution_id": execution_id,
        "outputs": outputs,
    })
}

/// Build the JSON payload for `functions.completeError`.
#[must_use]
pub fn build_function_error_payload(execution_id: &str, error: &str) -> Value {
    json!({
        "function_execution_id": execution_id,
        "error": error,
    })
}

/// Check the `ok` flag of a Web API response body.
///
/// # Errors
///
/// Returns [`SlackError::ApiError`] carrying Slack's error code when `ok` is not `true`.
pub fn check_api_response(method: &str, body: Value) -> Result<Value, SlackError> {
    if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        Ok(body)
    } else {
        let code = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        Err(SlackError::api(method, code))
    }
}

/// Slack API client with retry logic and error handling
pub struct SlackClient {
    token: SlackApiToken,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
        }
    }

    #[must_use]
    pub fn token(&self) -> &SlackApiToken {
        &self.token
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, SlackError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, SlackError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(5);

        RetryIf::start(strategy, operation, SlackError::is_transient).await
    }

    async fn post_api(&self, method: &str, payload: &Value) -> Result<Value, SlackError> {
        self.with_retry(|| async {
            let resp = HTTP_CLIENT
                .post(format!("{SLACK_API_BASE}/{method}"))
                .bearer_auth(&self.token.token_value.0)
                .json(payload)
                .send()
                .await
                .map_err(|e| SlackError::HttpError(format!("{method}: {e}")))?;

            Self::read_response(method, resp).await
        })
        .await
    }

    async fn get_api(&self, method: &str, query: &[(&str, &str)]) -> Result<Value, SlackError> {
        self.with_retry(|| async {
            let resp = HTTP_CLIENT
                .get(format!("{SLACK_API_BASE}/{method}"))
                .bearer_auth(&self.token.token_value.0)
                .query(query)
                .send()
                .await
                .map_err(|e| SlackError::HttpError(format!("{method}: {e}")))?;

            Self::read_response(method, resp).await
        })
        .await
    }

    async fn read_response(method: &str, resp: reqwest::Response) -> Result<Value, SlackError> {
        if !resp.status().is_success() {
            return Err(SlackError::HttpError(format!(
                "{method} HTTP {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| SlackError::HttpError(format!("{method} JSON parse error: {e}")))?;

        check_api_response(method, body)
    }
}

#[async_trait]
impl MessagingService for SlackClient {
    async fn post_message(&self, message: &OutgoingMessage) -> Result<String, SlackError> {
        let payload = build_post_message_payload(message)?;
        let body = self.post_api("chat.postMessage", &payload).await?;

        Ok(body
            .get("ts")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), SlackError> {
        let payload = build_ephemeral_payload(channel, user, text, thread_ts);
        self.post_api("chat.postEphemeral", &payload).await?;
        Ok(())
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        text: Option<&str>,
        blocks: Option<&[Block]>,
    ) -> Result<(), SlackError> {
        let payload = build_update_payload(channel, ts, text, blocks)?;
        self.post_api("chat.update", &payload).await?;
        Ok(())
    }

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<(), SlackError> {
        self.with_retry(|| async {
            let session = SLACK_CLIENT
                .as_ref()
                .ok_or_else(|| {
                    SlackError::GeneralError("Slack HTTP connector not initialized".to_string())
                })?
                .open_session(&self.token);

            let delete_req = SlackApiChatDeleteRequest::new(
                SlackChannelId(channel.to_string()),
                SlackTs(ts.to_string()),
            );

            session.chat_delete(&delete_req).await?;
            Ok(())
        })
        .await
    }

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<(), SlackError> {
        let payload = json!({
            "channel": channel,
            "timestamp": ts,
            "name": name,
        });
        self.post_api("reactions.add", &payload).await?;
        Ok(())
    }

    async fn get_user_presence(&self, user_id: &str) -> Result<String, SlackError> {
        let body = self.get_api("users.getPresence", &[("user", user_id)]).await?;

        Ok(body
            .get("presence")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    async fn get_user_timezone(&self, user_id: &str) -> Result<Option<String>, SlackError> {
        let body = self.get_api("users.info", &[("user", user_id)]).await?;

        Ok(body
            .get("user")
            .and_then(|u| u.get("tz"))
            .and_then(Value::as_str)
            .map(ToString::to_string))
    }

    async fn complete_function_success(
        &self,
        execution_id: &str,
        outputs: Value,
    ) -> Result<(), SlackError> {
        let payload = build_function_success_payload(execution_id, outputs);
        self.post_api("functions.completeSuccess", &payload).await?;
        Ok(())
    }

    async fn complete_function_error(
        &self,
        execution_id: &str,
        error: &str,
    ) -> Result<(), SlackError> {
        let payload = build_function_error_payload(execution_id, error);
        self.post_api("functions.completeError", &payload).await?;
        Ok(())
    }
}
