//! Recording fakes for the collaborator traits
//!
//! Deterministic in-process implementations used by unit and integration
//! tests. Each records its calls and can be toggled to fail.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use super::{
    ClientError, NameRegistry, SmsReceipt, SmsSender, TransferReceipt, WalletInfo, WalletProvider,
};

#[derive(Debug, Clone)]
pub struct TransferCall {
    pub from_wallet_id: String,
    pub to: String,
    pub amount: Decimal,
    pub token: String,
}

#[derive(Debug, Default)]
pub struct MockWallet {
    counter: AtomicU64,
    created: Mutex<Vec<String>>,
    transfers: Mutex<Vec<TransferCall>>,
    fail_create: Mutex<bool>,
    fail_transfer: Mutex<bool>,
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_create(&self, fail: bool) {
        *self.fail_create.lock().unwrap() = fail;
    }

    pub fn set_fail_transfer(&self, fail: bool) {
        *self.fail_transfer.lock().unwrap() = fail;
    }

    /// Phones passed to `create_wallet`, in call order
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    /// Transfers submitted, in call order
    pub fn transfers(&self) -> Vec<TransferCall> {
        self.transfers.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn create_wallet(&self, phone: &str) -> Result<WalletInfo, ClientError> {
        if *self.fail_create.lock().unwrap() {
            return Err(ClientError::Network(
                "wallet service unavailable".to_string(),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.created.lock().unwrap().push(phone.to_string());
        Ok(WalletInfo {
            address: format!("0x{:040x}", n),
            wallet_id: format!("wallet-{}", n),
        })
    }

    async fn transfer(
        &self,
        from_wallet_id: &str,
        to: &str,
        amount: Decimal,
        token: &str,
    ) -> Result<TransferReceipt, ClientError> {
        if *self.fail_transfer.lock().unwrap() {
            return Err(ClientError::Network(
                "wallet service unavailable".to_string(),
            ));
        }

        self.transfers.lock().unwrap().push(TransferCall {
            from_wallet_id: from_wallet_id.to_string(),
            to: to.to_string(),
            amount,
            token: token.to_string(),
        });
        Ok(TransferReceipt {
            tx_hash: format!("0x{:x}", Uuid::new_v4().simple()),
        })
    }
}

#[derive(Debug)]
pub struct MockNames {
    domain: String,
    registered: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl Default for MockNames {
    fn default() -> Self {
        Self {
            domain: "cell.eth".to_string(),
            registered: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }
}

impl MockNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// `(label, address)` pairs registered, in call order
    pub fn registered(&self) -> Vec<(String, String)> {
        self.registered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NameRegistry for MockNames {
    async fn register_name(&self, label: &str, address: &str) -> Result<String, ClientError> {
        if *self.fail.lock().unwrap() {
            return Err(ClientError::Upstream {
                status: 409,
                message: "name not available".to_string(),
            });
        }

        self.registered
            .lock()
            .unwrap()
            .push((label.to_string(), address.to_string()));
        Ok(format!("{}.{}", label, self.domain))
    }
}

#[derive(Debug, Clone)]
pub struct SentSms {
    pub to: String,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct MockSms {
    counter: AtomicU64,
    sent: Mutex<Vec<SentSms>>,
    fail: Mutex<bool>,
}

impl MockSms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Messages submitted, in call order
    pub fn sent(&self) -> Vec<SentSms> {
        self.sent.lock().unwrap().clone()
    }

    /// Contents of messages sent to one phone, in call order
    pub fn sent_to(&self, phone: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to == phone)
            .map(|m| m.content.clone())
            .collect()
    }
}

#[async_trait]
impl SmsSender for MockSms {
    async fn send(&self, to: &str, content: &str) -> Result<SmsReceipt, ClientError> {
        if *self.fail.lock().unwrap() {
            return Err(ClientError::Network("sms service unavailable".to_string()));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.lock().unwrap().push(SentSms {
            to: to.to_string(),
            content: content.to_string(),
        });
        Ok(SmsReceipt {
            message_id: format!("mock-{}", n),
        })
    }
}
