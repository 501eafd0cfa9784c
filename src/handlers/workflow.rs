//! Workflow steps that run one of the bot's functions.

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::core::models::FunctionExecutedEvent;
use crate::errors::SlackError;
use crate::slack::SlackBot;
use crate::slack::response_builder::{
    BroadcastKind, MISCONFIGURED_STEP_TEXT, NO_CHANNEL_INPUT_TEXT, build_broadcast_message,
};

const TEST_STEP_OFFSET: f64 = 10000.0;

/// The functions a workflow step can be wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Test,
    Ping(BroadcastKind),
}

impl WorkflowStep {
    #[must_use]
    pub fn from_callback_id(callback_id: &str) -> Option<Self> {
        match callback_id {
            "test-step" => Some(Self::Test),
            "user-channel-ping" => Some(Self::Ping(BroadcastKind::Channel)),
            "user-here-ping" => Some(Self::Ping(BroadcastKind::Here)),
            _ => None,
        }
    }
}

/// Runs the step and reports its outcome back to Slack.
pub async fn handle_function_executed(bot: &SlackBot, event: FunctionExecutedEvent) {
    let execution_id = event.function_execution_id.clone();
    let callback_id = event.function.callback_id.clone();
    info!(%callback_id, %execution_id, "Running workflow step");

    let completed = match WorkflowStep::from_callback_id(&callback_id) {
        Some(step) => match run_step(bot, step, event).await {
            Ok(outputs) => bot.bot().complete_function_success(&execution_id, outputs).await,
            Err(e) => {
                warn!(%callback_id, "Workflow step failed: {}", e);
                bot.bot()
                    .complete_function_error(&execution_id, &e.to_string())
                    .await
            }
        },
        None => {
            bot.bot()
                .complete_function_error(&execution_id, MISCONFIGURED_STEP_TEXT)
                .await
        }
    };

    if let Err(e) = completed {
        warn!(%callback_id, "Failed to complete workflow step: {}", e);
    }
}

async fn run_step(
    bot: &SlackBot,
    step: WorkflowStep,
    event: FunctionExecutedEvent,
) -> Result<Value, SlackError> {
    match step {
        WorkflowStep::Test => {
            let num = event.inputs.num.unwrap_or_default();
            Ok(json!({ "outnum": num + TEST_STEP_OFFSET }))
        }
        WorkflowStep::Ping(kind) => {
            let channel = event
                .inputs
                .channel
                .ok_or_else(|| SlackError::GeneralError(NO_CHANNEL_INPUT_TEXT.to_string()))?;
            let content = event.inputs.content.unwrap_or_default();

            let message = build_broadcast_message(&channel, None, kind, "", content);
            bot.owner().post_message(&message).await?;
            Ok(json!({}))
        }
    }
}
