//! Workflow state persistence
//!
//! The [`Store`] trait is everything the dispatcher needs from storage.
//! [`PgStore`] backs it with PostgreSQL; [`MemStore`] backs it with an
//! in-process map for tests and gateway-less development. Both honor the
//! same contract: every code-consuming transition is a compare-and-set
//! that reports whether this caller won the write.

pub mod mem;
pub mod pg;
pub mod status;
pub mod types;

pub use mem::MemStore;
pub use pg::PgStore;
pub use status::{PaymentStatus, ReviewStatus, TransactionKind, TransactionStatus};
pub use types::{
    ApprovalRecord, NewPayment, NewTransaction, NewUser, NominationRecord, PaymentRecord,
    TransactionRecord, UserRecord,
};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Storage error types
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    /// Unique-constraint violation (duplicate phone, duplicate pending code)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = e
            && db.kind() == sqlx::error::ErrorKind::UniqueViolation
        {
            return StoreError::Conflict(db.to_string());
        }
        StoreError::Database(e.to_string())
    }
}

/// Persistence operations behind the dispatcher.
///
/// Methods named `*_if_pending` are atomic conditional writes: they succeed
/// (return `true`) for exactly one caller when racing, and `false` once the
/// row has left `pending`.
#[async_trait]
pub trait Store: Send + Sync {
    // === Users ===

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    // === Nominations ===

    async fn create_nomination(
        &self,
        user_id: Uuid,
        nominee_id: Uuid,
        code: &str,
    ) -> Result<NominationRecord, StoreError>;

    /// Pending nomination addressed to this nominee under this code
    async fn find_pending_nomination_by_code(
        &self,
        code: &str,
        nominee_id: Uuid,
    ) -> Result<Option<NominationRecord>, StoreError>;

    async fn set_nomination_status_if_pending(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<bool, StoreError>;

    /// Users whose accepted nomination makes them cosigners of `user_id`
    async fn list_accepted_nominees(&self, user_id: Uuid) -> Result<Vec<UserRecord>, StoreError>;

    async fn nomination_code_pending(&self, code: &str) -> Result<bool, StoreError>;

    // === Transactions ===

    async fn create_transaction(
        &self,
        tx: NewTransaction,
    ) -> Result<TransactionRecord, StoreError>;

    async fn find_transaction(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError>;

    async fn set_transaction_status_if_pending(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<bool, StoreError>;

    /// Unconditional result write (tx hash after execution, or a post-CAS
    /// success-to-failed downgrade when the transfer itself fails)
    async fn set_transaction_result(
        &self,
        id: Uuid,
        status: TransactionStatus,
        tx_hash: &str,
    ) -> Result<(), StoreError>;

    // === Approvals ===

    async fn create_approval(
        &self,
        transaction_id: Uuid,
        approver_id: Uuid,
        code: &str,
    ) -> Result<ApprovalRecord, StoreError>;

    /// Pending approval addressed to this approver under this code
    async fn find_pending_approval_by_code(
        &self,
        code: &str,
        approver_id: Uuid,
    ) -> Result<Option<ApprovalRecord>, StoreError>;

    async fn set_approval_status_if_pending(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<bool, StoreError>;

    async fn list_approvals_for_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, StoreError>;

    async fn approval_code_pending(&self, code: &str) -> Result<bool, StoreError>;

    // === Payments ===

    async fn create_payment(&self, payment: NewPayment) -> Result<PaymentRecord, StoreError>;

    /// Pending payment addressed to this recipient under this code
    async fn find_pending_payment_by_code(
        &self,
        code: &str,
        recipient_id: Uuid,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    async fn set_payment_paid_if_pending(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn payment_code_pending(&self, code: &str) -> Result<bool, StoreError>;
}
