//! Name registry client
//!
//! Registers human-readable names (`<label>.<domain>`) pointing at wallet
//! addresses. The remote service owns availability checking and the on-chain
//! registration; callers treat any failure as "no name".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ClientError, NameRegistry};
use crate::config::NamesConfig;

#[derive(Debug)]
pub struct HttpNameRegistry {
    client: reqwest::Client,
    config: NamesConfig,
}

#[derive(Serialize)]
struct RegisterNameRequest<'a> {
    label: &'a str,
    address: &'a str,
}

#[derive(Deserialize)]
struct RegisterNameResponse {
    #[serde(default)]
    name: String,
}

impl HttpNameRegistry {
    pub fn new(config: NamesConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl NameRegistry for HttpNameRegistry {
    async fn register_name(&self, label: &str, address: &str) -> Result<String, ClientError> {
        let url = format!("{}/api/v1/names", self.config.base_url);
        let body = RegisterNameRequest { label, address };

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: RegisterNameResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        let name = if parsed.name.is_empty() {
            format!("{}.{}", label, self.config.domain)
        } else {
            parsed.name
        };

        debug!(label = %label, name = %name, "Name registered");
        Ok(name)
    }
}

/// Derive a registrable label from a username: lowercase, alphanumerics and
/// hyphens only. Returns `None` when nothing usable remains.
pub fn sanitize_label(username: &str) -> Option<String> {
    let label: String = username
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    if label.is_empty() { None } else { Some(label) }
}
