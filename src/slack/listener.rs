//! Socket Mode connection that feeds Slack push events to the handlers.

use std::sync::Arc;

use anyhow::anyhow;
use slack_morphism::prelude::*;
use tracing::{error, info, warn};

use super::SlackBot;
use crate::core::models::InboundEvent;
use crate::errors::SlackError;
use crate::handlers::handle_event;

/// Shared state injected into the listener via `with_user_state`.
#[derive(Clone)]
pub struct ListenerState {
    pub bot: Arc<SlackBot>,
}

/// Re-reads a slack-morphism event body as one of our own event types.
///
/// # Errors
///
/// Returns [`SlackError::ParseError`] if the body does not fit the expected shape.
pub fn to_inbound_event(body: &SlackEventCallbackBody) -> Result<InboundEvent, SlackError> {
    let raw = serde_json::to_value(body)?;
    Ok(serde_json::from_value(raw)?)
}

pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bot = {
        let states = states.read().await;
        states
            .get_user_state::<ListenerState>()
            .map(|state| state.bot.clone())
    };
    let Some(bot) = bot else {
        error!("Listener state missing, dropping event");
        return Ok(());
    };

    match to_inbound_event(&event.event) {
        Ok(inbound) => handle_event(&bot, inbound).await,
        Err(e) => warn!("Failed to read push event: {}", e),
    }

    Ok(())
}

pub fn error_handler(
    err: Box<dyn std::error::Error + Send + Sync>,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> HttpStatusCode {
    error!(error = %err, "Slack socket mode error");
    HttpStatusCode::OK
}

/// Connects with the app-level token and processes events until shutdown.
///
/// # Errors
///
/// Returns an error if the connector cannot be built or the connection fails.
pub async fn run_socket_mode(bot: Arc<SlackBot>, app_token: &str) -> anyhow::Result<()> {
    let connector = SlackClientHyperConnector::new()
        .map_err(|e| anyhow!("failed to create Slack HTTP connector: {e}"))?;
    let client = Arc::new(SlackHyperClient::new(connector));

    let callbacks = SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event);

    let environment = Arc::new(
        SlackClientEventsListenerEnvironment::new(client)
            .with_error_handler(error_handler)
            .with_user_state(ListenerState { bot }),
    );

    let listener = SlackClientSocketModeListener::new(
        &SlackClientSocketModeConfig::new(),
        environment,
        callbacks,
    );

    let token = SlackApiToken::new(SlackApiTokenValue::new(app_token.to_string()));
    listener.listen_for(&token).await?;

    info!("Connected to Slack via Socket Mode");
    listener.serve().await;

    Ok(())
}
