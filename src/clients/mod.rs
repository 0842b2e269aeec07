//! Outbound collaborator clients
//!
//! Three upstream services sit behind traits so the dispatcher never touches
//! HTTP directly: the custodial wallet provider, the name registry, and the
//! SMS delivery API. Production impls use `reqwest`; the `mock` module holds
//! recording fakes for tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt::Debug;
use thiserror::Error;

pub mod mock;
pub mod names;
pub mod sms;
pub mod wallet;

pub use mock::{MockNames, MockSms, MockWallet};
pub use names::HttpNameRegistry;
pub use sms::HttpSmsSender;
pub use wallet::HttpWalletProvider;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

/// A custodial wallet created by the provider
#[derive(Debug, Clone)]
pub struct WalletInfo {
    pub address: String,
    pub wallet_id: String,
}

/// Result of a submitted on-chain transfer
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub tx_hash: String,
}

/// Result of a submitted SMS
#[derive(Debug, Clone)]
pub struct SmsReceipt {
    pub message_id: String,
}

/// Custodial wallet provider
///
/// The provider holds the keys; transfers are signed with the provider-side
/// wallet id, never with anything the service stores.
#[async_trait]
pub trait WalletProvider: Send + Sync + Debug {
    /// Create a wallet for a new user, keyed by their phone number
    async fn create_wallet(&self, phone: &str) -> Result<WalletInfo, ClientError>;

    /// Submit a token transfer from a custodial wallet
    ///
    /// `to` is an address or a registered name; resolution happens upstream.
    async fn transfer(
        &self,
        from_wallet_id: &str,
        to: &str,
        amount: Decimal,
        token: &str,
    ) -> Result<TransferReceipt, ClientError>;
}

/// Human-readable name registry
#[async_trait]
pub trait NameRegistry: Send + Sync + Debug {
    /// Register `label` under the service domain, pointing at `address`.
    /// Returns the fully-qualified name on success.
    async fn register_name(&self, label: &str, address: &str) -> Result<String, ClientError>;
}

/// Outbound SMS delivery
#[async_trait]
pub trait SmsSender: Send + Sync + Debug {
    async fn send(&self, to: &str, content: &str) -> Result<SmsReceipt, ClientError>;
}
