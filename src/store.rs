//! Durable key/value state: watched users and snippets.
//!
//! Values are JSON documents. The production backend keeps one AWS SSM
//! parameter per key under a common prefix.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_ssm::{Client as SsmClient, types::ParameterType};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::SlackError;

pub const WATCHED_USERS_KEY: &str = "watched_users";
pub const SNIPPETS_KEY: &str = "snippets";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key has never been written.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, SlackError>;

    async fn set_raw(&self, key: &str, value: String) -> Result<(), SlackError>;

    /// Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), SlackError>;
}

/// # Errors
///
/// Returns an error if the store fails or the stored value is not valid JSON for `T`.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, SlackError> {
    match store.get_raw(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SlackError::StoreError(format!("{key} parse: {e}"))),
        None => Ok(None),
    }
}

/// # Errors
///
/// Returns an error if serialization or the store write fails.
pub async fn set_json<T: Serialize + ?Sized + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), SlackError> {
    let raw = serde_json::to_string(value)
        .map_err(|e| SlackError::StoreError(format!("{key} serialize: {e}")))?;
    store.set_raw(key, raw).await
}

fn key_with_prefix(prefix: &str, key: &str) -> String {
    let mut p = prefix.to_string();
    if !p.ends_with('/') {
        p.push('/');
    }
    format!("{p}{key}")
}

/// AWS SSM Parameter Store backend.
pub struct SsmStore {
    client: SsmClient,
    prefix: String,
}

impl SsmStore {
    pub async fn from_env(prefix: impl Into<String>) -> Self {
        let shared = aws_config::from_env().load().await;
        Self {
            client: SsmClient::new(&shared),
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl KeyValueStore for SsmStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, SlackError> {
        let name = key_with_prefix(&self.prefix, key);

        match self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(resp) => Ok(resp
                .parameter
                .and_then(|param| param.value().map(ToString::to_string))),
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|se| se.is_parameter_not_found())
                {
                    Ok(None)
                } else {
                    Err(SlackError::StoreError(format!("ssm get_parameter: {e}")))
                }
            }
        }
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), SlackError> {
        let name = key_with_prefix(&self.prefix, key);

        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(ParameterType::String)
            .overwrite(true)
            .send()
            .await
            .map_err(|e| SlackError::StoreError(format!("ssm put_parameter: {e}")))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SlackError> {
        let name = key_with_prefix(&self.prefix, key);

        match self.client.delete_parameter().name(name).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|se| se.is_parameter_not_found())
                {
                    Ok(())
                } else {
                    Err(SlackError::StoreError(format!("ssm delete_parameter: {e}")))
                }
            }
        }
    }
}

/// Process-local backend for tests and offline runs.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, SlackError> {
        Ok(self.values().get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), SlackError> {
        self.values().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SlackError> {
        self.values().remove(key);
        Ok(())
    }
}
