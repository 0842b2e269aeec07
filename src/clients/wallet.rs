//! Custodial wallet provider client
//!
//! Two calls: create a wallet for a new user and submit a token transfer
//! signed with the provider-side wallet id.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ClientError, TransferReceipt, WalletInfo, WalletProvider};
use crate::config::WalletConfig;

#[derive(Debug)]
pub struct HttpWalletProvider {
    client: reqwest::Client,
    config: WalletConfig,
}

#[derive(Serialize)]
struct CreateWalletRequest<'a> {
    owner: &'a str,
    chain_type: &'a str,
}

#[derive(Deserialize)]
struct CreateWalletResponse {
    id: String,
    address: String,
}

#[derive(Serialize)]
struct TransferRequest<'a> {
    to: &'a str,
    amount: Decimal,
    token: &'a str,
}

#[derive(Deserialize)]
struct TransferResponse {
    tx_hash: String,
}

impl HttpWalletProvider {
    pub fn new(config: WalletConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl WalletProvider for HttpWalletProvider {
    async fn create_wallet(&self, phone: &str) -> Result<WalletInfo, ClientError> {
        let url = format!("{}/api/v1/wallets", self.config.base_url);
        let body = CreateWalletRequest {
            owner: phone,
            chain_type: "ethereum",
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: CreateWalletResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        debug!(phone = %phone, wallet_id = %parsed.id, "Wallet created");
        Ok(WalletInfo {
            address: parsed.address,
            wallet_id: parsed.id,
        })
    }

    async fn transfer(
        &self,
        from_wallet_id: &str,
        to: &str,
        amount: Decimal,
        token: &str,
    ) -> Result<TransferReceipt, ClientError> {
        let url = format!(
            "{}/api/v1/wallets/{}/transfers",
            self.config.base_url, from_wallet_id
        );
        let body = TransferRequest { to, amount, token };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: TransferResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        debug!(
            wallet_id = %from_wallet_id,
            to = %to,
            tx_hash = %parsed.tx_hash,
            "Transfer submitted"
        );
        Ok(TransferReceipt {
            tx_hash: parsed.tx_hash,
        })
    }
}
