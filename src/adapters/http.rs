use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ENVELOPE_KEY: &str = "users";
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            attempts: config.retry_attempts(),
            delay: config.retry_delay(),
            timeout: config.timeout(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: DEFAULT_RETRY_DELAY,
            timeout: Duration::from_secs(30),
        }
    }
}

/// GET 員工資料，失敗時依固定間隔重試
pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
    envelope_key: String,
}

impl HttpFetcher {
    pub fn new(policy: RetryPolicy, envelope_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            policy,
            envelope_key: envelope_key.into(),
        }
    }

    /// Returns the raw record list, or `FetchExhausted` once every attempt failed.
    pub async fn fetch(&self, endpoint: &str) -> Result<Vec<Value>> {
        let attempts = self.policy.attempts.max(1);
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=attempts {
            tracing::debug!("Making API request to: {} (attempt {}/{})", endpoint, attempt, attempts);

            match self.attempt(endpoint).await {
                Ok(records) => {
                    tracing::info!("📥 Fetched {} raw records on attempt {}", records.len(), attempt);
                    return Ok(records);
                }
                Err(e) => {
                    tracing::error!("Attempt {}: {}", attempt, e);
                    last_error = e.to_string();
                    if !e.is_retryable() {
                        break;
                    }
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        tracing::error!("Failed to fetch data after {} attempts", attempts);
        Err(EtlError::FetchExhausted {
            attempts,
            last_error,
        })
    }

    async fn attempt(&self, endpoint: &str) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(endpoint)
            .timeout(self.policy.timeout)
            .send()
            .await?;

        tracing::debug!("API response status: {}", response.status());
        if response.status() != StatusCode::OK {
            return Err(EtlError::HttpStatusError {
                status: response.status().as_u16(),
                url: endpoint.to_string(),
            });
        }

        let body = response.bytes().await?;
        let payload: Value = serde_json::from_slice(&body)?;
        unwrap_envelope(payload, &self.envelope_key)
    }
}

/// 先找信封鍵，找不到再把整個 payload 當成清單
pub fn unwrap_envelope(payload: Value, envelope_key: &str) -> Result<Vec<Value>> {
    match payload {
        Value::Object(mut object) => match object.remove(envelope_key) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(EtlError::UnexpectedPayload {
                message: format!(
                    "envelope field '{}' is {} instead of a list",
                    envelope_key,
                    json_type(&other)
                ),
            }),
            None => Err(EtlError::UnexpectedPayload {
                message: format!("object response has no '{}' list", envelope_key),
            }),
        },
        Value::Array(items) => Ok(items),
        other => Err(EtlError::UnexpectedPayload {
            message: format!("expected an object or a list, got {}", json_type(&other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
