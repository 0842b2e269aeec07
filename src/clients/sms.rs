//! SMS delivery client
//!
//! Posts outbound messages to the SMS provider API. Authentication is an
//! `x-api-key` header; the body is `{to, content, from}` with `from` falling
//! back to the configured sender number.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ClientError, SmsReceipt, SmsSender};
use crate::config::SmsConfig;

#[derive(Debug)]
pub struct HttpSmsSender {
    client: reqwest::Client,
    config: SmsConfig,
}

#[derive(Serialize)]
struct SendSmsRequest<'a> {
    to: &'a str,
    content: &'a str,
    from: &'a str,
}

#[derive(Deserialize)]
struct SendSmsResponse {
    #[serde(default)]
    id: String,
}

impl HttpSmsSender {
    pub fn new(config: SmsConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send(&self, to: &str, content: &str) -> Result<SmsReceipt, ClientError> {
        let body = SendSmsRequest {
            to,
            content,
            from: &self.config.sender,
        };

        let response = self
            .client
            .post(&self.config.base_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SendSmsResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        debug!(to = %to, message_id = %parsed.id, "SMS submitted");
        Ok(SmsReceipt {
            message_id: parsed.id,
        })
    }
}
