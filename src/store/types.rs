//! Persistent record types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::status::{PaymentStatus, ReviewStatus, TransactionKind, TransactionStatus};

/// A registered wallet holder, keyed by phone number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub phone_number: String,
    pub username: String,
    pub wallet_address: String,
    /// Provider-side wallet id
    pub wallet_id: String,
    /// Fully-qualified registered name, when registration succeeded
    pub registered_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// How this user is shown to other participants
    pub fn display_name(&self) -> &str {
        self.registered_name
            .as_deref()
            .unwrap_or(&self.phone_number)
    }

    /// How this user's wallet is shown to themselves
    pub fn wallet_display(&self) -> &str {
        self.registered_name
            .as_deref()
            .unwrap_or(&self.wallet_address)
    }
}

/// Insert shape for users
#[derive(Debug, Clone)]
pub struct NewUser {
    pub phone_number: String,
    pub username: String,
    pub wallet_address: String,
    pub wallet_id: String,
    pub registered_name: Option<String>,
}

/// One cosigner nomination; NOMINATE writes one row per nominee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominationRecord {
    pub id: Uuid,
    /// The nominator
    pub user_id: Uuid,
    pub nominee_id: Uuid,
    pub status: ReviewStatus,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One required sign-off on a pending transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRecord {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub approver_id: Uuid,
    pub code: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A transfer of value out of (or into) a user's wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: Uuid,
    /// Owner of the moving funds
    pub user_id: Uuid,
    pub kind: TransactionKind,
    /// Address or name exactly as the user typed it
    pub destination: String,
    pub token: String,
    pub amount: Decimal,
    /// Empty until the transfer executed
    pub tx_hash: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for transactions
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub destination: String,
    pub token: String,
    pub amount: Decimal,
    pub tx_hash: String,
    pub status: TransactionStatus,
}

/// An outstanding "please pay me" issued by REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub requester_id: Uuid,
    /// The party asked to pay
    pub recipient_id: Uuid,
    pub code: String,
    pub token: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for payments
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub code: String,
    pub token: String,
    pub amount: Decimal,
}
