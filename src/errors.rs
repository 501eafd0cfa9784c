use slack_morphism::errors::SlackClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Failed to parse Slack event: {0}")]
    ParseError(String),

    #[error("Slack API rejected the call ({code}): {message}")]
    ApiError { code: String, message: String },

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to access the key/value store: {0}")]
    StoreError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl SlackError {
    /// Builds an [`SlackError::ApiError`] from the `error` code of an `ok: false` response.
    #[must_use]
    pub fn api(method: &str, code: impl Into<String>) -> Self {
        let code = code.into();
        let message = format!("{method} returned {code}");
        SlackError::ApiError { code, message }
    }

    /// Transport failures are worth another attempt; upstream rejections are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, SlackError::HttpError(_))
    }
}

impl From<SlackClientError> for SlackError {
    fn from(error: SlackClientError) -> Self {
        let message = error.to_string();
        match error {
            SlackClientError::ApiError(api) => SlackError::ApiError {
                code: api.code,
                message,
            },
            _ => SlackError::HttpError(message),
        }
    }
}

impl From<reqwest::Error> for SlackError {
    fn from(error: reqwest::Error) -> Self {
        SlackError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(error: serde_json::Error) -> Self {
        SlackError::ParseError(error.to_string())
    }
}

impl From<anyhow::Error> for SlackError {
    fn from(error: anyhow::Error) -> Self {
        SlackError::GeneralError(error.to_string())
    }
}
